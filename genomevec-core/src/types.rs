//! # Core Data Types
//!
//! `VectorMatrix` holds one embedding per sequence position. Row `i` is
//! genomic position `i + 1`.

use crate::error::{Error, Result};

/// Convert a 0-based row index into a 1-based genomic position
#[inline]
pub fn row_to_position(row: usize) -> usize {
    row + 1
}

/// Convert a 1-based genomic position into a row index, checking bounds
pub fn position_to_row(position: i64, len: usize) -> Result<usize> {
    if position < 1 || position as u64 > len as u64 {
        return Err(Error::PositionOutOfRange { position, len });
    }
    Ok((position - 1) as usize)
}

/// N row vectors of a fixed dimension D, stored contiguously:
/// [r0_d0, r0_d1, ..., r0_dn, r1_d0, ...]
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatrix {
    dimension: usize,
    data: Vec<f32>,
}

impl VectorMatrix {
    /// Wrap contiguous row-major data. Requires D > 0 and at least one row.
    pub fn new(dimension: usize, data: Vec<f32>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::EmptyInput {
                source_name: "vector matrix".to_string(),
            });
        }
        if dimension == 0 {
            return Err(Error::Configuration {
                message: "vector dimension must be > 0".to_string(),
            });
        }
        if data.len() % dimension != 0 {
            return Err(Error::format(
                "vector matrix",
                0,
                format!("{} values do not divide into rows of {}", data.len(), dimension),
            ));
        }
        Ok(Self { dimension, data })
    }

    /// Build from individual rows; every row must share the first row's length.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let dimension = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * dimension);
        for row in rows {
            let row = row.as_ref();
            if row.len() != dimension {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::new(dimension, data)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of rows (N)
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row slice, or `None` past the end
    #[inline]
    pub fn row(&self, row: usize) -> Option<&[f32]> {
        let start = row.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Row at a 1-based genomic position
    pub fn position(&self, position: i64) -> Result<&[f32]> {
        let row = position_to_row(position, self.len())?;
        Ok(&self.data[row * self.dimension..(row + 1) * self.dimension])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(self.dimension)
    }

    /// Contiguous backing storage
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }
}
