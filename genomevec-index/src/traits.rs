//! # Vector Index Traits
//!
//! Common interface for the exact and clustered indexes, plus the ranking
//! order shared by both.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use genomevec_core::error::{Error, Result};

/// A ranked row: index into the matrix and its cosine similarity to the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub row: usize,
    pub similarity: f32,
}

impl SearchResult {
    #[inline]
    pub fn new(row: usize, similarity: f32) -> Self {
        // -0.0 and 0.0 must tie
        let similarity = if similarity == 0.0 { 0.0 } else { similarity };
        Self { row, similarity }
    }

    /// 1-based genomic position of the row
    #[inline]
    pub fn position(&self) -> usize {
        self.row + 1
    }
}

impl Eq for SearchResult {}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchResult {
    /// Ranking order: higher similarity sorts first, ties by ascending row.
    /// In a `BinaryHeap` the top is therefore the worst-ranked entry.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .similarity
            .total_cmp(&self.similarity)
            .then_with(|| self.row.cmp(&other.row))
    }
}

/// Bounded collector that keeps the `k` best-ranked results
pub struct TopK {
    k: usize,
    heap: BinaryHeap<SearchResult>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.saturating_add(1).min(4096)),
        }
    }

    #[inline]
    pub fn push(&mut self, result: SearchResult) {
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(result);
        } else if let Some(worst) = self.heap.peek() {
            if result < *worst {
                self.heap.pop();
                self.heap.push(result);
            }
        }
    }

    /// Results best first
    pub fn into_sorted_vec(self) -> Vec<SearchResult> {
        self.heap.into_sorted_vec()
    }
}

/// Vector index trait - implemented by the flat and clustered indexes.
///
/// Indexes are immutable once built, so concurrent `search` calls need no
/// locking.
pub trait VectorIndex: Send + Sync {
    /// Rank stored rows against a unit-normalized query.
    /// Returns at most `k` results, best first.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Stored (normalized) vector for a row
    fn vector(&self, row: usize) -> Option<&[f32]>;

    /// Number of vectors in index
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension
    fn dimension(&self) -> usize;
}

#[inline]
pub(crate) fn check_dimension(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::DimensionMismatch { expected, actual });
    }
    Ok(())
}
