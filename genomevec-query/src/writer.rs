//! # Result Files and Previews
//!
//! Result files list every hit by ascending position:
//!
//! ```text
//! Position,Similarity,Feature Type,Description
//! 3,0.99388373,gene,cas9
//! 7,0.12,NA,NA
//! ```
//!
//! Commas inside descriptions become `;` so each row keeps four fields.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use genomevec_core::error::{Error, Result};

use crate::engine::{Hit, ResultSet};

pub const RESULT_HEADER: &str = "Position,Similarity,Feature Type,Description";

/// Write a result set in position order
pub fn write_results<W: Write>(w: &mut W, results: &ResultSet) -> Result<()> {
    writeln!(w, "{}", RESULT_HEADER)?;
    for hit in results.by_position() {
        writeln!(
            w,
            "{},{},{},{}",
            hit.position(),
            hit.similarity,
            hit.kind(),
            hit.description().replace(',', ";")
        )?;
    }
    Ok(())
}

/// Write a result file. The file appears only once fully written.
pub fn write_results_file(path: &Path, results: &ResultSet) -> Result<()> {
    let tmp = temp_sibling(path);

    let written = File::create(&tmp)
        .map_err(|e| Error::io_at(&tmp, e))
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write_results(&mut writer, results)?;
            writer.flush().map_err(|e| Error::io_at(&tmp, e))
        })
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| Error::io_at(path, e)));

    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    } else {
        info!("Wrote {} results to {}", results.len(), path.display());
    }
    written
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Values shown at each end of a long query vector
const VECTOR_EDGE: usize = 5;

/// The query vector line. Vectors longer than ten values show only their
/// first and last five.
pub fn render_query_vector(position: i64, values: &[f32]) -> String {
    if values.len() > 2 * VECTOR_EDGE {
        format!(
            "Query vector (position {}): {:?} ... {:?}",
            position,
            &values[..VECTOR_EDGE],
            &values[values.len() - VECTOR_EDGE..]
        )
    } else {
        format!("Query vector (position {}): {:?}", position, values)
    }
}

/// One preview line
pub fn render_hit(hit: &Hit) -> String {
    let mut line = format!("Position {} ({:.2})", hit.position(), hit.similarity);
    match &hit.feature {
        Some((kind, description)) => {
            let _ = write!(line, " | {} (product={})", kind, description);
        }
        None => line.push_str(" (no overlapping feature)"),
    }
    line
}

/// The top `m` hits, one line each, best first
pub fn render_preview(results: &ResultSet, m: usize) -> String {
    results
        .preview(m)
        .iter()
        .map(render_hit)
        .collect::<Vec<_>>()
        .join("\n")
}
