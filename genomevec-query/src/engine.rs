//! # Search Engine
//!
//! Runs one query end to end:
//!
//! ```text
//! Query::Row(r) ──stored vector──┐
//!                                ├──▶ SimilarityIndex ──▶ drop own row ──▶ annotate ──▶ ResultSet
//! Query::Vector(v) ──normalize───┘
//! ```
//!
//! A `ResultSet` keeps hits in similarity order for previews and hands out
//! a position-ordered view for result files. Both views come from the same
//! search.

use tracing::debug;

use genomevec_core::error::{Error, Result};
use genomevec_core::{position_to_row, SearchConfig};
use genomevec_index::{normalized, SearchParams, SimilarityIndex};

use crate::annotation::{AnnotationIndex, NOT_AVAILABLE};

/// What to search for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Query<'a> {
    /// A row of the indexed matrix, by 0-based row index
    Row(usize),
    /// An external vector; normalized before searching
    Vector(&'a [f32]),
}

impl Query<'_> {
    /// Row query for a 1-based genomic position
    pub fn position(position: i64, len: usize) -> Result<Self> {
        Ok(Query::Row(position_to_row(position, len)?))
    }
}

/// One ranked, annotated position
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub row: usize,
    pub similarity: f32,
    /// `None` when no feature overlaps or no annotations were supplied
    pub feature: Option<(String, String)>,
}

impl Hit {
    /// 1-based genomic position
    pub fn position(&self) -> u64 {
        self.row as u64 + 1
    }

    pub fn kind(&self) -> &str {
        self.feature.as_ref().map_or(NOT_AVAILABLE, |(k, _)| k.as_str())
    }

    pub fn description(&self) -> &str {
        self.feature.as_ref().map_or(NOT_AVAILABLE, |(_, d)| d.as_str())
    }
}

/// Hits from one query, best first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    hits: Vec<Hit>,
}

impl ResultSet {
    pub fn new(hits: Vec<Hit>) -> Self {
        Self { hits }
    }

    /// All hits by descending similarity, ties by ascending row
    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    /// The top `m` hits by similarity
    pub fn preview(&self, m: usize) -> &[Hit] {
        &self.hits[..m.min(self.hits.len())]
    }

    /// All hits by ascending position
    pub fn by_position(&self) -> Vec<&Hit> {
        let mut ordered: Vec<&Hit> = self.hits.iter().collect();
        ordered.sort_by_key(|hit| hit.row);
        ordered
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn into_hits(self) -> Vec<Hit> {
        self.hits
    }
}

/// Query orchestrator over a built index and optional annotations.
///
/// Borrows both, so one index can serve many engines (and threads).
#[derive(Debug, Clone)]
pub struct SearchEngine<'a> {
    index: &'a SimilarityIndex,
    annotations: Option<&'a AnnotationIndex>,
    config: SearchConfig,
}

impl<'a> SearchEngine<'a> {
    pub fn new(index: &'a SimilarityIndex) -> Self {
        Self {
            index,
            annotations: None,
            config: SearchConfig::default(),
        }
    }

    pub fn with_annotations(mut self, annotations: &'a AnnotationIndex) -> Self {
        self.annotations = Some(annotations);
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn index(&self) -> &'a SimilarityIndex {
        self.index
    }

    /// Run a query.
    ///
    /// `exclude_self` applies to row queries only and defaults to
    /// `config.exclude_self`. The own row is removed before truncating to
    /// `top_k`, so a self-excluded query still returns `top_k` hits.
    pub fn query(&self, query: Query<'_>, exclude_self: Option<bool>) -> Result<ResultSet> {
        let (vector, own_row) = match query {
            Query::Row(row) => {
                let vector = self.index.vector(row).ok_or(Error::PositionOutOfRange {
                    position: row as i64 + 1,
                    len: self.index.len(),
                })?;
                let exclude = exclude_self.unwrap_or(self.config.exclude_self);
                (vector.to_vec(), exclude.then_some(row))
            }
            Query::Vector(raw) => {
                if raw.len() != self.index.dimension() {
                    return Err(Error::DimensionMismatch {
                        expected: self.index.dimension(),
                        actual: raw.len(),
                    });
                }
                (normalized(raw), None)
            }
        };

        let top_k = self.config.top_k;
        let params = SearchParams {
            top_k: match own_row {
                Some(_) => top_k.map(|k| k.saturating_add(1)),
                None => top_k,
            },
            nprobe: self.config.nprobe,
        };

        let mut results = self.index.search_with(&vector, params)?;
        if let Some(own) = own_row {
            results.retain(|r| r.row != own);
        }
        if let Some(k) = top_k {
            results.truncate(k);
        }

        let hits: Vec<Hit> = results
            .into_iter()
            .map(|r| Hit {
                row: r.row,
                similarity: r.similarity,
                feature: self.annotate(r.row),
            })
            .collect();

        debug!(
            hits = hits.len(),
            excluded = own_row.is_some(),
            "Query complete"
        );
        Ok(ResultSet::new(hits))
    }

    fn annotate(&self, row: usize) -> Option<(String, String)> {
        let annotation = self.annotations?.lookup(row as u64 + 1);
        annotation
            .is_found()
            .then(|| (annotation.kind().to_string(), annotation.description().to_string()))
    }
}
