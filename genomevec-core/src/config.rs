//! # Configuration Management
//!
//! Every build and search call takes its configuration explicitly; nothing
//! here is process-wide state.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of clusters for a clustered index
pub const DEFAULT_NLIST: usize = 50;

/// Preview length for searches with a query vector file
pub const SEARCH_PREVIEW_SIZE: usize = 30;

/// Preview length for query-by-position
pub const QUERY_PREVIEW_SIZE: usize = 5;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub index: IndexConfig,
    pub search: SearchConfig,
    pub annotation: AnnotationConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Configuration {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.index.mode.validate()?;
        if self.index.kmeans.max_iterations == 0 {
            return Err(Error::Configuration {
                message: "kmeans.max_iterations must be > 0".to_string(),
            });
        }
        if self.search.nprobe == Some(0) {
            return Err(Error::Configuration {
                message: "search.nprobe must be >= 1".to_string(),
            });
        }
        if self.index.kmeans.max_points_per_centroid == 0 {
            return Err(Error::Configuration {
                message: "kmeans.max_points_per_centroid must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Matrix source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Leading rows discarded as column labels
    pub header_rows: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { header_rows: 1 }
    }
}

/// Index build mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexMode {
    /// Compare the query against every stored vector
    #[default]
    Exact,
    /// Partition into `nlist` k-means cells and scan the `nprobe` nearest.
    /// Results may miss true matches that live in unvisited cells.
    Clustered { nlist: usize, nprobe: usize },
}

impl IndexMode {
    /// Clustered mode with explicit cell and probe counts
    pub fn clustered(nlist: usize, nprobe: usize) -> Result<Self> {
        let mode = IndexMode::Clustered { nlist, nprobe };
        mode.validate()?;
        Ok(mode)
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            IndexMode::Exact => Ok(()),
            IndexMode::Clustered { nlist, nprobe } => {
                if nlist == 0 {
                    return Err(Error::Configuration {
                        message: "nlist must be >= 1".to_string(),
                    });
                }
                if nprobe == 0 {
                    return Err(Error::Configuration {
                        message: "nprobe must be >= 1".to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IndexMode::Exact => "exact",
            IndexMode::Clustered { .. } => "clustered",
        }
    }
}

/// Index configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub mode: IndexMode,
    pub kmeans: KMeansConfig,
}

/// k-means training parameters for clustered indexes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    pub max_iterations: usize,
    pub seed: u64,
    /// Training set is subsampled to `nlist * max_points_per_centroid` rows
    pub max_points_per_centroid: usize,
    /// Below `nlist * min_points_per_centroid` rows a warning is logged
    pub min_points_per_centroid: usize,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            seed: 1234,
            max_points_per_centroid: 256,
            min_points_per_centroid: 39,
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of results; `None` ranks every reachable row
    pub top_k: Option<usize>,
    /// Drop the query row itself when querying by row
    pub exclude_self: bool,
    /// Number of hits shown in the similarity-ordered preview; `None` uses
    /// the command's own default
    pub preview_size: Option<usize>,
    /// Cells probed by a clustered index; `None` keeps the index's own value
    pub nprobe: Option<usize>,
}

impl SearchConfig {
    pub fn preview_size_or(&self, default: usize) -> usize {
        self.preview_size.unwrap_or(default)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: None,
            exclude_self: true,
            preview_size: None,
            nprobe: None,
        }
    }
}

/// Feature annotation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Drop whole-sequence `region` features
    pub skip_region: bool,
    /// Ignore child features (those carrying a `Parent` attribute)
    pub top_level_only: bool,
    /// Abort on the first malformed feature line instead of skipping it
    pub strict: bool,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            skip_region: true,
            top_level_only: true,
            strict: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}
