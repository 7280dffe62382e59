//! # genomevec Core
//!
//! Shared building blocks for the genomevec crates:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 genomevec-core                  │
//! ├─────────────────────────────────────────────────┤
//! │  • types   - VectorMatrix, position helpers     │
//! │  • config  - explicit build/search settings     │
//! │  • error   - typed errors                       │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AnnotationConfig, Config, IndexConfig, IndexMode, InputConfig, KMeansConfig, LogLevel,
    LoggingConfig, SearchConfig, DEFAULT_NLIST, QUERY_PREVIEW_SIZE, SEARCH_PREVIEW_SIZE,
};
pub use error::{Error, Result};
pub use types::{position_to_row, row_to_position, VectorMatrix};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
