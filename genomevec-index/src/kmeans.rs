//! # k-means Training
//!
//! Learns the cell centroids of a clustered index from normalized vectors.
//!
//! ## Algorithm
//! 1. Subsample to `k * max_points_per_centroid` rows (seeded)
//! 2. Seed centroids with `k` distinct random rows
//! 3. Assign every row to its nearest centroid (squared L2, lowest index wins ties)
//! 4. Recompute centroids as member means; split the largest cell into any empty one
//! 5. Repeat until no assignment changes or `max_iterations`
//!
//! Assignment runs on the rayon pool but is collected in row order, so a
//! fixed seed gives the same centroids on any thread count.

use std::borrow::Cow;

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use genomevec_core::error::{Error, Result};
use genomevec_core::KMeansConfig;

use crate::simd::l2_distance_squared;

/// Relative perturbation applied when splitting a cell
const SPLIT_EPS: f32 = 1.0 / 1024.0;

/// Index and squared distance of the centroid nearest to `v`
#[inline]
pub fn nearest_centroid(v: &[f32], centroids: &[f32], dimension: usize) -> (usize, f32) {
    let mut best = (0usize, f32::INFINITY);
    for (i, c) in centroids.chunks_exact(dimension).enumerate() {
        let d = l2_distance_squared(v, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

/// The `n` centroids nearest to `v`, closest first
pub fn nearest_centroids(v: &[f32], centroids: &[f32], dimension: usize, n: usize) -> Vec<usize> {
    let mut scored: Vec<(f32, usize)> = centroids
        .chunks_exact(dimension)
        .enumerate()
        .map(|(i, c)| (l2_distance_squared(v, c), i))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    scored.into_iter().take(n).map(|(_, i)| i).collect()
}

/// Train `k` centroids over `data` (row-major, `dimension` wide).
///
/// Fails with `InsufficientData` when there are fewer rows than centroids.
pub fn train(data: &[f32], dimension: usize, k: usize, config: &KMeansConfig) -> Result<Vec<f32>> {
    let n = data.len() / dimension;
    if k == 0 {
        return Err(Error::Configuration {
            message: "cannot train zero centroids".to_string(),
        });
    }
    if n < k {
        return Err(Error::InsufficientData {
            required: k,
            available: n,
        });
    }
    if n < k.saturating_mul(config.min_points_per_centroid) {
        warn!(
            "Clustering {} points into {} centroids: at least {} points recommended",
            n,
            k,
            k.saturating_mul(config.min_points_per_centroid)
        );
    }

    let mut rng = StdRng::seed_from_u64(config.seed);

    let max_points = k.saturating_mul(config.max_points_per_centroid);
    let training: Cow<'_, [f32]> = if n > max_points {
        debug!("Subsampling training set from {} to {} rows", n, max_points);
        let mut rows = sample(&mut rng, n, max_points).into_vec();
        rows.sort_unstable();
        Cow::Owned(gather(data, dimension, &rows))
    } else {
        Cow::Borrowed(data)
    };
    let nt = training.len() / dimension;

    let seeds = sample(&mut rng, nt, k).into_vec();
    let mut centroids = gather(&training, dimension, &seeds);
    let mut assignment: Vec<usize> = vec![usize::MAX; nt];

    for iteration in 0..config.max_iterations {
        let nearest: Vec<(usize, f32)> = training
            .par_chunks_exact(dimension)
            .map(|v| nearest_centroid(v, &centroids, dimension))
            .collect();

        let inertia: f64 = nearest.iter().map(|&(_, d)| d as f64).sum();
        let mut changed = 0usize;
        for (slot, &(cell, _)) in assignment.iter_mut().zip(nearest.iter()) {
            if *slot != cell {
                *slot = cell;
                changed += 1;
            }
        }

        debug!(iteration, inertia, changed, "k-means iteration");
        if changed == 0 {
            break;
        }

        let mut counts = recompute_centroids(&training, dimension, &assignment, &mut centroids);
        let splits = split_empty_cells(&mut centroids, &mut counts, dimension);
        if splits > 0 {
            debug!("Split {} empty cells", splits);
        }
    }

    info!("Trained {} centroids over {} rows (dim={})", k, nt, dimension);
    Ok(centroids)
}

/// Copy the listed rows into a new contiguous buffer
fn gather(data: &[f32], dimension: usize, rows: &[usize]) -> Vec<f32> {
    let mut out = Vec::with_capacity(rows.len() * dimension);
    for &row in rows {
        out.extend_from_slice(&data[row * dimension..(row + 1) * dimension]);
    }
    out
}

/// Replace each centroid with the mean of its members. Returns member counts.
fn recompute_centroids(
    data: &[f32],
    dimension: usize,
    assignment: &[usize],
    centroids: &mut [f32],
) -> Vec<usize> {
    let k = centroids.len() / dimension;
    let mut sums = vec![0.0f64; centroids.len()];
    let mut counts = vec![0usize; k];

    for (v, &cell) in data.chunks_exact(dimension).zip(assignment) {
        counts[cell] += 1;
        let acc = &mut sums[cell * dimension..(cell + 1) * dimension];
        for (s, &x) in acc.iter_mut().zip(v) {
            *s += x as f64;
        }
    }

    for (cell, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let range = cell * dimension..(cell + 1) * dimension;
        for (c, &s) in centroids[range.clone()].iter_mut().zip(&sums[range]) {
            *c = (s / count as f64) as f32;
        }
    }
    counts
}

/// Re-seed empty cells by splitting the most populated one into two
/// symmetrically perturbed copies.
fn split_empty_cells(centroids: &mut [f32], counts: &mut [usize], dimension: usize) -> usize {
    let mut splits = 0;
    for empty in 0..counts.len() {
        if counts[empty] != 0 {
            continue;
        }
        let Some((largest, _)) = counts
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        else {
            break;
        };
        if counts[largest] < 2 {
            break;
        }

        for d in 0..dimension {
            let x = centroids[largest * dimension + d];
            let (grow, shrink) = (x * (1.0 + SPLIT_EPS), x * (1.0 - SPLIT_EPS));
            if d % 2 == 0 {
                centroids[empty * dimension + d] = grow;
                centroids[largest * dimension + d] = shrink;
            } else {
                centroids[empty * dimension + d] = shrink;
                centroids[largest * dimension + d] = grow;
            }
        }
        counts[empty] = counts[largest] / 2;
        counts[largest] -= counts[empty];
        splits += 1;
    }
    splits
}
