//! # Similarity Index
//!
//! The index a query runs against: either an exact scan or a clustered
//! (IVF) index, chosen by `IndexMode`. Both store unit-normalized vectors
//! and score by inner product, which equals cosine similarity.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use genomevec_core::error::{Error, Result};
use genomevec_core::{IndexConfig, IndexMode, VectorMatrix};

use crate::flat::FlatIndex;
use crate::ivf::IvfIndex;
use crate::persist;
use crate::simd::normalize_rows;
use crate::traits::{SearchResult, VectorIndex};

/// Per-call search parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchParams {
    /// Number of results; `None` ranks every reachable row
    pub top_k: Option<usize>,
    /// Cells to probe in clustered mode; `None` uses the index default.
    /// Ignored by exact indexes.
    pub nprobe: Option<usize>,
}

/// Exact or clustered similarity index
#[derive(Debug, Clone, PartialEq)]
pub enum SimilarityIndex {
    Exact(FlatIndex),
    Clustered(IvfIndex),
}

impl SimilarityIndex {
    /// Normalize the matrix and build an index of the configured mode
    pub fn build(matrix: &VectorMatrix, config: &IndexConfig) -> Result<Self> {
        config.mode.validate()?;

        match config.mode {
            IndexMode::Exact => {
                let index = FlatIndex::from_matrix(matrix);
                info!(
                    "Built exact index: {} rows, dim={}",
                    index.len(),
                    index.dimension()
                );
                Ok(SimilarityIndex::Exact(index))
            }
            IndexMode::Clustered { nlist, nprobe } => {
                let dimension = matrix.dimension();
                let mut normalized = matrix.as_slice().to_vec();
                normalize_rows(&mut normalized, dimension);

                let mut index = IvfIndex::new(dimension, nlist, nprobe);
                index.train(&normalized, &config.kmeans)?;
                index.add(&normalized)?;
                info!(
                    "Built clustered index: {} rows, dim={}, nlist={}, nprobe={}",
                    index.len(),
                    dimension,
                    nlist,
                    nprobe
                );
                Ok(SimilarityIndex::Clustered(index))
            }
        }
    }

    /// The mode this index was built with
    pub fn mode(&self) -> IndexMode {
        match self {
            SimilarityIndex::Exact(_) => IndexMode::Exact,
            SimilarityIndex::Clustered(ivf) => IndexMode::Clustered {
                nlist: ivf.nlist(),
                nprobe: ivf.nprobe(),
            },
        }
    }

    /// Rank rows against a unit-normalized query.
    ///
    /// `top_k = None` returns every reachable row.
    pub fn search(&self, query: &[f32], top_k: Option<usize>) -> Result<Vec<SearchResult>> {
        self.search_with(query, SearchParams { top_k, nprobe: None })
    }

    pub fn search_with(&self, query: &[f32], params: SearchParams) -> Result<Vec<SearchResult>> {
        let k = params.top_k.unwrap_or_else(|| self.len());
        let results = match self {
            SimilarityIndex::Exact(flat) => flat.search(query, k)?,
            SimilarityIndex::Clustered(ivf) => {
                let nprobe = params.nprobe.unwrap_or_else(|| ivf.nprobe());
                ivf.search_with_nprobe(query, k, nprobe)?
            }
        };
        debug!(k, returned = results.len(), "Similarity search");
        Ok(results)
    }

    /// Stored (normalized) vector of a row
    pub fn vector(&self, row: usize) -> Option<&[f32]> {
        self.as_index().vector(row)
    }

    pub fn len(&self) -> usize {
        self.as_index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> usize {
        self.as_index().dimension()
    }

    fn as_index(&self) -> &dyn VectorIndex {
        match self {
            SimilarityIndex::Exact(flat) => flat,
            SimilarityIndex::Clustered(ivf) => ivf,
        }
    }

    /// Serialize into any writer
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        persist::write_index(self, w)
    }

    /// Deserialize from an in-memory image
    pub fn read_from(bytes: &[u8]) -> Result<Self> {
        persist::read_index(bytes)
    }

    /// Save index to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io_at(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush().map_err(|e| Error::io_at(path, e))?;

        info!(
            "Saved {} index ({} rows) to {}",
            self.mode().name(),
            self.len(),
            path.display()
        );
        Ok(())
    }

    /// Load index from disk
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| Error::io_at(path, e))?;
        let index = Self::read_from(&bytes)?;

        info!(
            "Loaded {} index ({} rows, dim={}) from {}",
            index.mode().name(),
            index.len(),
            index.dimension(),
            path.display()
        );
        Ok(index)
    }
}
