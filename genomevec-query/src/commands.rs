//! # Commands
//!
//! File-level operations behind the command line: build and persist an
//! index, search it, pull a query vector out of a matrix, and the one-shot
//! query-by-position flow.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use genomevec_core::error::{Error, Result};
use genomevec_core::{Config, VectorMatrix};
use genomevec_index::SimilarityIndex;

use crate::annotation::AnnotationIndex;
use crate::engine::{Query, ResultSet, SearchEngine};
use crate::matrix::{load_matrix, read_query_vector, write_query_vector};
use crate::writer::write_results_file;

/// Load a matrix and build an index in the configured mode
pub fn build_index(matrix_path: &Path, config: &Config) -> Result<SimilarityIndex> {
    config.validate()?;
    let matrix = load_matrix(matrix_path, &config.input)?;
    SimilarityIndex::build(&matrix, &config.index)
}

/// Build an index and save it to `output`
pub fn build_index_file(
    matrix_path: &Path,
    output: &Path,
    config: &Config,
) -> Result<SimilarityIndex> {
    let index = build_index(matrix_path, config)?;
    index.save(output)?;
    Ok(index)
}

/// Load annotations, if a source was given
pub fn load_annotations(path: Option<&Path>, config: &Config) -> Result<Option<AnnotationIndex>> {
    path.map(|p| AnnotationIndex::from_path(p, &config.annotation))
        .transpose()
}

/// Search an index. `top_k` overrides `config.search.top_k`.
pub fn search(
    index: &SimilarityIndex,
    annotations: Option<&AnnotationIndex>,
    query: Query<'_>,
    top_k: Option<usize>,
    config: &Config,
) -> Result<ResultSet> {
    let mut search_config = config.search.clone();
    if top_k.is_some() {
        search_config.top_k = top_k;
    }

    let mut engine = SearchEngine::new(index).with_config(search_config);
    if let Some(annotations) = annotations {
        engine = engine.with_annotations(annotations);
    }
    engine.query(query, None)
}

/// Search a saved index with a query vector file and write the result file.
/// Nothing is written when the search fails.
pub fn search_file(
    index_path: &Path,
    query_path: &Path,
    annotations: Option<&AnnotationIndex>,
    output: &Path,
    config: &Config,
) -> Result<ResultSet> {
    let index = SimilarityIndex::load(index_path)?;
    let vector = read_query_vector(query_path)?;
    let results = search(&index, annotations, Query::Vector(&vector), None, config)?;
    write_results_file(output, &results)?;
    Ok(results)
}

/// Write the raw row at a 1-based `position` as a query vector file
pub fn extract_row(
    matrix_path: &Path,
    position: i64,
    output: &Path,
    config: &Config,
) -> Result<Vec<f32>> {
    let matrix = load_matrix(matrix_path, &config.input)?;
    let row = matrix.position(position)?.to_vec();

    let file = File::create(output).map_err(|e| Error::io_at(output, e))?;
    let mut writer = BufWriter::new(file);
    write_query_vector(&mut writer, &row)?;
    writer.flush().map_err(|e| Error::io_at(output, e))?;

    info!(
        "Extracted position {} ({} values) to {}",
        position,
        row.len(),
        output.display()
    );
    Ok(row)
}

/// Build an in-memory index and self-query the row at `position`.
/// `config.search.exclude_self` decides whether the row itself is returned.
pub fn query_position(
    matrix_path: &Path,
    position: i64,
    annotations: Option<&AnnotationIndex>,
    config: &Config,
) -> Result<ResultSet> {
    config.validate()?;
    let matrix = load_matrix(matrix_path, &config.input)?;
    query_matrix_position(&matrix, position, annotations, config)
}

/// `query_position` over an already loaded matrix
pub fn query_matrix_position(
    matrix: &VectorMatrix,
    position: i64,
    annotations: Option<&AnnotationIndex>,
    config: &Config,
) -> Result<ResultSet> {
    let query = Query::position(position, matrix.len())?;
    let index = SimilarityIndex::build(matrix, &config.index)?;

    let mut engine = SearchEngine::new(&index).with_config(config.search.clone());
    if let Some(annotations) = annotations {
        engine = engine.with_annotations(annotations);
    }
    engine.query(query, None)
}
