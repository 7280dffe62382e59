//! # Flat Index (Exact Search)
//!
//! Compares the query against every stored row. Used for:
//! 1. Exact mode
//! 2. Ground truth when checking the clustered index
//!
//! ## Layout
//! - Normalized vectors stored contiguously in row order; row id == offset
//! - Search: O(N·D), top-K kept in a bounded heap

use genomevec_core::error::Result;
use genomevec_core::VectorMatrix;

use crate::simd::{dot_product, normalize_rows};
use crate::traits::{check_dimension, SearchResult, TopK, VectorIndex};

/// Flat index for exact cosine search
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    /// [v0_d0, v0_d1, ..., v0_dn, v1_d0, ...], each row unit length or zero
    vectors: Vec<f32>,
}

impl FlatIndex {
    /// Normalize every row of the matrix and store it
    pub fn from_matrix(matrix: &VectorMatrix) -> Self {
        let dimension = matrix.dimension();
        let mut vectors = matrix.as_slice().to_vec();
        normalize_rows(&mut vectors, dimension);
        Self { dimension, vectors }
    }

    pub(crate) fn from_parts(dimension: usize, vectors: Vec<f32>) -> Self {
        Self { dimension, vectors }
    }

    /// Contiguous normalized storage
    pub fn as_slice(&self) -> &[f32] {
        &self.vectors
    }
}

impl VectorIndex for FlatIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        check_dimension(self.dimension, query.len())?;

        let mut top = TopK::new(k);
        for (row, v) in self.vectors.chunks_exact(self.dimension).enumerate() {
            top.push(SearchResult::new(row, dot_product(query, v)));
        }
        Ok(top.into_sorted_vec())
    }

    fn vector(&self, row: usize) -> Option<&[f32]> {
        let start = row.checked_mul(self.dimension)?;
        self.vectors.get(start..start + self.dimension)
    }

    fn len(&self) -> usize {
        self.vectors.len() / self.dimension
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
