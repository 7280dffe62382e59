//! # Recall Tests
//!
//! Compare the clustered index against the exact index (ground truth).
//! Metric: Recall@K = |Clustered results ∩ Exact results| / K

use genomevec_core::{IndexConfig, IndexMode, KMeansConfig, VectorMatrix};
use genomevec_index::{normalized, SearchParams, SimilarityIndex};
use rand::Rng;
use std::collections::HashSet;

/// Vectors drawn around a handful of directions, like neighbouring
/// positions sharing sequence context
fn clustered_vectors(n: usize, dim: usize, groups: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    let centers: Vec<Vec<f32>> = (0..groups)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();
    (0..n)
        .flat_map(|i| {
            let c = &centers[i % groups];
            c.iter()
                .map(|x| x + rng.gen_range(-0.2..0.2))
                .collect::<Vec<f32>>()
        })
        .collect()
}

fn recall_at_k(approx: &[usize], exact: &[usize], k: usize) -> f32 {
    let approx_set: HashSet<_> = approx.iter().take(k).collect();
    let exact_set: HashSet<_> = exact.iter().take(k).collect();
    approx_set.intersection(&exact_set).count() as f32 / k as f32
}

#[test]
fn test_recall_improves_with_nprobe() {
    let n = 5_000;
    let dim = 64;
    let k = 10;
    let nlist = 50;
    let num_queries = 50;

    println!("\n=== Recall Test: {} vectors, dim={}, nlist={}, k={} ===\n", n, dim, nlist, k);

    let matrix = VectorMatrix::new(dim, clustered_vectors(n, dim, 20)).unwrap();
    let exact = SimilarityIndex::build(&matrix, &IndexConfig::default()).unwrap();
    let ivf = SimilarityIndex::build(
        &matrix,
        &IndexConfig {
            mode: IndexMode::clustered(nlist, 10).unwrap(),
            kmeans: KMeansConfig::default(),
        },
    )
    .unwrap();

    let mut rng = rand::thread_rng();
    let queries: Vec<Vec<f32>> = (0..num_queries)
        .map(|_| {
            let row = rng.gen_range(0..n);
            normalized(matrix.row(row).unwrap())
        })
        .collect();

    let mut previous = 0.0f32;
    for nprobe in [1, 10, nlist] {
        let mut total = 0.0f32;
        for query in &queries {
            let truth: Vec<usize> = exact
                .search(query, Some(k))
                .unwrap()
                .iter()
                .map(|r| r.row)
                .collect();
            let params = SearchParams {
                top_k: Some(k),
                nprobe: Some(nprobe),
            };
            let approx: Vec<usize> = ivf
                .search_with(query, params)
                .unwrap()
                .iter()
                .map(|r| r.row)
                .collect();
            total += recall_at_k(&approx, &truth, k);
        }
        let recall = total / num_queries as f32;
        println!("nprobe={:>3}  Recall@{}: {:.1}%", nprobe, k, recall * 100.0);

        assert!(recall + 1e-6 >= previous, "recall dropped as nprobe grew");
        previous = recall;
    }

    // Every cell visited: identical to exact search
    assert!((previous - 1.0).abs() < 1e-6);
}
