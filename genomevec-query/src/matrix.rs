//! # Matrix and Query Vector Files
//!
//! Comma-separated text sources:
//! - the embedding matrix: `header_rows` label rows, then one row per
//!   sequence position with D numeric columns
//! - a query vector: a header containing a `Value` cell, then one value
//!   per line in that column
//!
//! Blank lines are ignored. Cells may be wrapped in double quotes.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use genomevec_core::error::{Error, Result};
use genomevec_core::{InputConfig, VectorMatrix};

/// Header cell naming the query vector column
pub const VALUE_HEADER: &str = "Value";

/// Load a matrix file
pub fn load_matrix(path: &Path, config: &InputConfig) -> Result<VectorMatrix> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
    let matrix = parse_matrix(&text, &path.display().to_string(), config)?;
    debug!(
        "Loaded {} rows x {} columns from {}",
        matrix.len(),
        matrix.dimension(),
        path.display()
    );
    Ok(matrix)
}

/// Parse matrix text. `source_name` only labels errors.
pub fn parse_matrix(text: &str, source_name: &str, config: &InputConfig) -> Result<VectorMatrix> {
    let mut dimension = 0usize;
    let mut data = Vec::new();

    for (idx, line) in text.lines().enumerate().skip(config.header_rows) {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let before = data.len();
        for cell in line.split(',') {
            data.push(parse_cell(cell, source_name, line_no)?);
        }
        let columns = data.len() - before;

        if dimension == 0 {
            dimension = columns;
        } else if columns != dimension {
            return Err(Error::format(
                source_name,
                line_no,
                format!("expected {} columns, found {}", dimension, columns),
            ));
        }
    }

    if data.is_empty() {
        return Err(Error::EmptyInput {
            source_name: source_name.to_string(),
        });
    }
    VectorMatrix::new(dimension, data)
}

/// Read a query vector file
pub fn read_query_vector(path: &Path) -> Result<Vec<f32>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
    parse_query_vector(&text, &path.display().to_string())
}

/// Parse query vector text: locate the `Value` column, collect one float per row
pub fn parse_query_vector(text: &str, source_name: &str) -> Result<Vec<f32>> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((header_idx, header)) = lines.next() else {
        return Err(Error::EmptyInput {
            source_name: source_name.to_string(),
        });
    };
    let column = header
        .split(',')
        .position(|cell| unquote(cell) == VALUE_HEADER)
        .ok_or_else(|| {
            Error::format(
                source_name,
                header_idx + 1,
                format!("missing `{}` header cell", VALUE_HEADER),
            )
        })?;

    let mut values = Vec::new();
    for (idx, line) in lines {
        let cell = line.split(',').nth(column).ok_or_else(|| {
            Error::format(source_name, idx + 1, format!("no cell in column {}", column + 1))
        })?;
        values.push(parse_cell(cell, source_name, idx + 1)?);
    }

    if values.is_empty() {
        return Err(Error::EmptyInput {
            source_name: source_name.to_string(),
        });
    }
    Ok(values)
}

/// Write `values` as a query vector file body
pub fn write_query_vector<W: Write>(w: &mut W, values: &[f32]) -> Result<()> {
    writeln!(w, "{}", VALUE_HEADER)?;
    for v in values {
        writeln!(w, "{}", v)?;
    }
    Ok(())
}

fn unquote(cell: &str) -> &str {
    let cell = cell.trim();
    cell.strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .unwrap_or(cell)
        .trim()
}

fn parse_cell(cell: &str, source_name: &str, line: usize) -> Result<f32> {
    let cell = unquote(cell);
    let value: f32 = cell
        .parse()
        .map_err(|_| Error::format(source_name, line, format!("non-numeric cell `{}`", cell)))?;
    if !value.is_finite() {
        return Err(Error::format(
            source_name,
            line,
            format!("non-finite cell `{}`", cell),
        ));
    }
    Ok(value)
}
