//! Search Benchmarks
//!
//! Exact scan vs clustered probing over a synthetic embedding matrix.
//!
//! Run with: cargo bench --package genomevec-index

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use genomevec_core::{IndexConfig, IndexMode, KMeansConfig, VectorMatrix};
use genomevec_index::{normalized, SearchParams, SimilarityIndex};
use rand::Rng;

fn random_matrix(n: usize, dim: usize) -> VectorMatrix {
    let mut rng = rand::thread_rng();
    let data = (0..n * dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
    VectorMatrix::new(dim, data).expect("valid matrix")
}

fn bench_dot_product(c: &mut Criterion) {
    let mut group = c.benchmark_group("dot_product");

    for dim in [64, 256, 768] {
        let m = random_matrix(2, dim);
        let (a, b) = (m.row(0).unwrap().to_vec(), m.row(1).unwrap().to_vec());

        group.throughput(Throughput::Elements(1));
        group.bench_function(format!("dim_{}", dim), |bencher| {
            bencher.iter(|| black_box(genomevec_index::dot_product(black_box(&a), black_box(&b))))
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let n = 20_000;
    let dim = 256;
    let matrix = random_matrix(n, dim);
    let query = normalized(matrix.row(17).unwrap());

    let exact = SimilarityIndex::build(&matrix, &IndexConfig::default()).expect("exact build");
    let ivf = SimilarityIndex::build(
        &matrix,
        &IndexConfig {
            mode: IndexMode::Clustered { nlist: 50, nprobe: 10 },
            kmeans: KMeansConfig::default(),
        },
    )
    .expect("clustered build");

    let mut group = c.benchmark_group("search_20k");
    group.throughput(Throughput::Elements(1));

    group.bench_function("exact_full_ranking", |bencher| {
        bencher.iter(|| black_box(exact.search(black_box(&query), None).unwrap()))
    });
    group.bench_function("exact_top30", |bencher| {
        bencher.iter(|| black_box(exact.search(black_box(&query), Some(30)).unwrap()))
    });

    for nprobe in [1, 10, 50] {
        let params = SearchParams {
            top_k: Some(30),
            nprobe: Some(nprobe),
        };
        group.bench_function(format!("clustered_top30_nprobe_{}", nprobe), |bencher| {
            bencher.iter(|| black_box(ivf.search_with(black_box(&query), params).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dot_product, bench_search);
criterion_main!(benches);
