//! # genomevec Similarity Index
//!
//! Cosine similarity search over per-position embedding vectors.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SimilarityIndex                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │    Flat     │    │     IVF     │    │   k-means   │      │
//! │  │   Index     │    │   Index     │◀───│  training   │      │
//! │  │  (Exact)    │    │ (Clustered) │    │             │      │
//! │  └─────────────┘    └─────────────┘    └─────────────┘      │
//! │         │                  │                                │
//! │         └────────┬─────────┘                                │
//! │                  │                                          │
//! │     VectorIndex trait + SIMD math (AVX2/FMA, NEON)          │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `simd`: dot product, squared L2, normalization
//! - `traits`: `VectorIndex`, `SearchResult` and the shared ranking order
//! - `flat`: brute-force exact search
//! - `kmeans`: centroid training for the clustered index
//! - `ivf`: inverted-file clustered search
//! - `similarity`: mode-selecting wrapper with save/load
//! - `persist`: binary container format

pub mod simd;
pub mod traits;
pub mod flat;
pub mod kmeans;
pub mod ivf;
pub mod persist;
pub mod similarity;

pub use simd::{
    cosine_similarity, dot_product, l2_distance_squared, normalize, normalize_rows, normalized,
    NORM_EPSILON,
};
pub use traits::{SearchResult, TopK, VectorIndex};
pub use flat::FlatIndex;
pub use ivf::{InvertedList, IvfIndex};
pub use similarity::{SearchParams, SimilarityIndex};
