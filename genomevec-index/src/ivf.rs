//! # Inverted File Index (Clustered Search)
//!
//! Partitions normalized vectors into `nlist` cells around k-means centroids.
//! A query scores only the rows in its `nprobe` nearest cells.
//!
//! ## Lifecycle
//! ```text
//! new(dim, nlist, nprobe) ──train()──▶ trained ──add()──▶ searchable
//! ```
//! Adding before training is an error. Cells are never re-trained.
//!
//! ## Invariants
//! - Rows are added in order, so row ids are `0..len` without gaps
//! - Cell probing and row assignment use the same nearest-centroid rule
//! - With `nprobe == nlist` every row is scored and results equal the flat index

use tracing::{debug, info};

use genomevec_core::error::{Error, Result};
use genomevec_core::KMeansConfig;

use crate::kmeans::{self, nearest_centroid, nearest_centroids};
use crate::simd::dot_product;
use crate::traits::{check_dimension, SearchResult, TopK, VectorIndex};

/// Rows assigned to one cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvertedList {
    pub(crate) rows: Vec<usize>,
    pub(crate) vectors: Vec<f32>,
}

impl InvertedList {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }
}

/// Clustered (IVF) index for approximate cosine search
#[derive(Debug, Clone, PartialEq)]
pub struct IvfIndex {
    dimension: usize,
    nlist: usize,
    nprobe: usize,
    /// nlist * dimension; empty until trained
    centroids: Vec<f32>,
    lists: Vec<InvertedList>,
    /// row -> (cell, offset within cell)
    locations: Vec<(u32, u32)>,
}

impl IvfIndex {
    /// Create an untrained index
    pub fn new(dimension: usize, nlist: usize, nprobe: usize) -> Self {
        Self {
            dimension,
            nlist,
            nprobe,
            centroids: Vec::new(),
            lists: Vec::new(),
            locations: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        dimension: usize,
        nprobe: usize,
        centroids: Vec<f32>,
        lists: Vec<InvertedList>,
    ) -> Result<Self> {
        let nlist = lists.len();
        let total: usize = lists.iter().map(InvertedList::len).sum();
        let mut locations = vec![(u32::MAX, u32::MAX); total];

        for (cell, list) in lists.iter().enumerate() {
            for (offset, &row) in list.rows.iter().enumerate() {
                match locations.get_mut(row) {
                    Some(slot) if slot.0 == u32::MAX => *slot = (cell as u32, offset as u32),
                    _ => {
                        return Err(Error::IndexCorruption {
                            details: format!("row id {} duplicated or out of range", row),
                        })
                    }
                }
            }
        }

        Ok(Self {
            dimension,
            nlist,
            nprobe,
            centroids,
            lists,
            locations,
        })
    }

    pub fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }

    pub fn nlist(&self) -> usize {
        self.nlist
    }

    /// Default number of cells probed per query
    pub fn nprobe(&self) -> usize {
        self.nprobe
    }

    pub fn centroids(&self) -> &[f32] {
        &self.centroids
    }

    pub fn lists(&self) -> &[InvertedList] {
        &self.lists
    }

    /// Learn the cell centroids from normalized training vectors
    pub fn train(&mut self, normalized: &[f32], config: &KMeansConfig) -> Result<()> {
        if self.is_trained() {
            return Err(Error::Configuration {
                message: "clustered index is already trained".to_string(),
            });
        }
        if normalized.len() % self.dimension != 0 {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: normalized.len() % self.dimension,
            });
        }

        self.centroids = kmeans::train(normalized, self.dimension, self.nlist, config)?;
        self.lists = vec![InvertedList::default(); self.nlist];
        Ok(())
    }

    /// Append normalized vectors; each takes the next row id
    pub fn add(&mut self, normalized: &[f32]) -> Result<()> {
        if !self.is_trained() {
            return Err(Error::NotTrained);
        }
        if normalized.len() % self.dimension != 0 {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: normalized.len() % self.dimension,
            });
        }

        for v in normalized.chunks_exact(self.dimension) {
            let row = self.locations.len();
            let (cell, _) = nearest_centroid(v, &self.centroids, self.dimension);
            let list = &mut self.lists[cell];
            self.locations.push((cell as u32, list.rows.len() as u32));
            list.rows.push(row);
            list.vectors.extend_from_slice(v);
        }

        let largest = self.lists.iter().map(InvertedList::len).max().unwrap_or(0);
        let empty = self.lists.iter().filter(|l| l.is_empty()).count();
        info!(
            "Clustered index holds {} rows in {} cells (largest={}, empty={})",
            self.locations.len(),
            self.nlist,
            largest,
            empty
        );
        Ok(())
    }

    /// Search with an explicit probe count. Values above `nlist` probe every cell.
    pub fn search_with_nprobe(
        &self,
        query: &[f32],
        k: usize,
        nprobe: usize,
    ) -> Result<Vec<SearchResult>> {
        check_dimension(self.dimension, query.len())?;
        if !self.is_trained() {
            return Err(Error::NotTrained);
        }
        if nprobe == 0 {
            return Err(Error::Configuration {
                message: "nprobe must be at least 1".to_string(),
            });
        }

        let nprobe = nprobe.min(self.nlist);
        let cells = nearest_centroids(query, &self.centroids, self.dimension, nprobe);

        let mut top = TopK::new(k);
        let mut scanned = 0usize;
        for cell in cells {
            let list = &self.lists[cell];
            scanned += list.len();
            for (&row, v) in list.rows.iter().zip(list.vectors.chunks_exact(self.dimension)) {
                top.push(SearchResult::new(row, dot_product(query, v)));
            }
        }
        debug!(nprobe, scanned, "Clustered search");

        Ok(top.into_sorted_vec())
    }
}

impl VectorIndex for IvfIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        self.search_with_nprobe(query, k, self.nprobe)
    }

    fn vector(&self, row: usize) -> Option<&[f32]> {
        let &(cell, offset) = self.locations.get(row)?;
        let start = offset as usize * self.dimension;
        self.lists
            .get(cell as usize)?
            .vectors
            .get(start..start + self.dimension)
    }

    fn len(&self) -> usize {
        self.locations.len()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
