//! # genomevec Query Layer
//!
//! Everything between files on disk and the similarity index:
//!
//! ```text
//! matrix.csv ──▶ matrix ──▶ SimilarityIndex ──┐
//! query.csv  ──▶ matrix ──────────────────────┼──▶ SearchEngine ──▶ writer ──▶ results.csv
//! genes.gff3 ──▶ annotation ──────────────────┘
//! ```
//!
//! - `matrix`: matrix and query vector files
//! - `annotation`: GFF3 reader and first-match `AnnotationIndex`
//! - `engine`: `SearchEngine`, `Query`, `ResultSet`
//! - `writer`: result files and previews
//! - `commands`: file-level operations used by the CLI

pub mod annotation;
pub mod commands;
pub mod engine;
pub mod matrix;
pub mod writer;

pub use annotation::{Annotation, AnnotationIndex, Feature, FeatureLabel, Interval, NOT_AVAILABLE};
pub use engine::{Hit, Query, ResultSet, SearchEngine};
pub use matrix::{load_matrix, parse_matrix, parse_query_vector, read_query_vector};
pub use writer::{
    render_preview, render_query_vector, write_results, write_results_file, RESULT_HEADER,
};
