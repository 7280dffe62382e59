//! Unit tests for the exact and clustered indexes, persistence and
//! concurrent read-only search

use genomevec_core::{Error, IndexConfig, IndexMode, KMeansConfig, VectorMatrix};
use genomevec_index::{
    cosine_similarity, dot_product, normalize, normalized, FlatIndex, IvfIndex, SearchParams,
    SearchResult, SimilarityIndex, TopK, VectorIndex,
};
use rand::Rng;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn random_matrix(n: usize, dim: usize) -> VectorMatrix {
    let mut rng = rand::thread_rng();
    let data = (0..n * dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
    VectorMatrix::new(dim, data).unwrap()
}

fn scenario_matrix() -> VectorMatrix {
    VectorMatrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.9, 0.1]]).unwrap()
}

fn clustered(nlist: usize, nprobe: usize) -> IndexConfig {
    IndexConfig {
        mode: IndexMode::clustered(nlist, nprobe).unwrap(),
        kmeans: KMeansConfig::default(),
    }
}

fn rows(results: &[SearchResult]) -> Vec<usize> {
    results.iter().map(|r| r.row).collect()
}

// ============================================================================
// SIMD / normalization tests
// ============================================================================

mod simd_tests {
    use super::*;

    #[test]
    fn test_normalize_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((dot_product(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_stays_zero() {
        let v = normalized(&[0.0, 0.0, 0.0]);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
        assert_eq!(cosine_similarity(&v, &[1.0, 0.0, 0.0]), 0.0);

        let tiny = normalized(&[1e-20, 0.0]);
        assert_eq!(tiny, vec![0.0, 0.0]);
    }

    #[test]
    fn test_cosine_matches_dot_of_normalized() {
        let a = [0.3, -1.2, 4.0, 0.5];
        let b = [1.0, 0.1, -0.4, 2.2];
        let dot = dot_product(&normalized(&a), &normalized(&b));
        assert!((cosine_similarity(&a, &b) - dot).abs() < 1e-5);
    }
}

// ============================================================================
// Ranking tests
// ============================================================================

mod ranking_tests {
    use super::*;

    #[test]
    fn test_top_k_orders_by_similarity_then_row() {
        let mut top = TopK::new(3);
        top.push(SearchResult::new(4, 0.5));
        top.push(SearchResult::new(1, 0.9));
        top.push(SearchResult::new(3, 0.5));
        top.push(SearchResult::new(0, 0.1));
        top.push(SearchResult::new(2, 0.5));
        assert_eq!(rows(&top.into_sorted_vec()), vec![1, 2, 3]);
    }

    #[test]
    fn test_top_k_zero_is_empty() {
        let mut top = TopK::new(0);
        top.push(SearchResult::new(0, 1.0));
        assert!(top.into_sorted_vec().is_empty());
    }

    #[test]
    fn test_negative_zero_ties_with_zero() {
        let a = SearchResult::new(1, -0.0);
        let b = SearchResult::new(0, 0.0);
        assert_eq!(a.similarity.to_bits(), 0.0f32.to_bits());
        assert!(b < a);
        assert_eq!(a.position(), 2);
    }
}

// ============================================================================
// Exact index tests
// ============================================================================

mod exact_tests {
    use super::*;

    #[test]
    fn test_scenario_ranks_closer_direction_first() {
        let index = FlatIndex::from_matrix(&scenario_matrix());
        let query = index.vector(0).unwrap().to_vec();
        let results = index.search(&query, 3).unwrap();

        assert_eq!(rows(&results), vec![0, 2, 1]);
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
        assert!((results[1].similarity - 0.9939).abs() < 1e-3);
        assert_eq!(results[2].similarity, 0.0);
    }

    #[test]
    fn test_self_similarity_is_one() {
        let matrix = random_matrix(200, 24);
        let index = SimilarityIndex::build(&matrix, &IndexConfig::default()).unwrap();
        for row in [0, 57, 199] {
            let query = index.vector(row).unwrap().to_vec();
            let results = index.search(&query, None).unwrap();
            let own = results.iter().find(|r| r.row == row).unwrap();
            assert!((own.similarity - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_symmetry() {
        let matrix = random_matrix(50, 16);
        let index = SimilarityIndex::build(&matrix, &IndexConfig::default()).unwrap();
        let (a, b) = (3, 41);

        let from_a = index.search(index.vector(a).unwrap(), None).unwrap();
        let from_b = index.search(index.vector(b).unwrap(), None).unwrap();
        let ab = from_a.iter().find(|r| r.row == b).unwrap().similarity;
        let ba = from_b.iter().find(|r| r.row == a).unwrap().similarity;
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn test_full_ranking_by_default() {
        let matrix = random_matrix(120, 8);
        let index = SimilarityIndex::build(&matrix, &IndexConfig::default()).unwrap();
        let results = index.search(index.vector(0).unwrap(), None).unwrap();
        assert_eq!(results.len(), 120);
        assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));

        let top = index.search(index.vector(0).unwrap(), Some(7)).unwrap();
        assert_eq!(top.as_slice(), &results[..7]);
    }

    #[test]
    fn test_repeated_search_is_identical() {
        let matrix = random_matrix(300, 32);
        let index = SimilarityIndex::build(&matrix, &IndexConfig::default()).unwrap();
        let query = index.vector(10).unwrap().to_vec();
        let first = index.search(&query, None).unwrap();
        for _ in 0..3 {
            assert_eq!(index.search(&query, None).unwrap(), first);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = SimilarityIndex::build(&scenario_matrix(), &IndexConfig::default()).unwrap();
        let err = index.search(&[1.0, 0.0, 0.0], None).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_zero_row_scores_zero() {
        let matrix = VectorMatrix::from_rows(&[vec![0.0, 0.0], vec![2.0, 0.0]]).unwrap();
        let index = SimilarityIndex::build(&matrix, &IndexConfig::default()).unwrap();
        let results = index.search(&[1.0, 0.0], None).unwrap();
        assert_eq!(rows(&results), vec![1, 0]);
        assert_eq!(results[1].similarity, 0.0);
        assert!(!results[1].similarity.is_nan());
    }
}

// ============================================================================
// Clustered index tests
// ============================================================================

mod clustered_tests {
    use super::*;

    #[test]
    fn test_full_probe_equals_exact() {
        let matrix = random_matrix(600, 16);
        let exact = SimilarityIndex::build(&matrix, &IndexConfig::default()).unwrap();
        let ivf = SimilarityIndex::build(&matrix, &clustered(8, 8)).unwrap();
        assert_eq!(ivf.len(), 600);

        for row in [0, 99, 312, 599] {
            let query = exact.vector(row).unwrap().to_vec();
            assert_eq!(ivf.vector(row).unwrap(), query.as_slice());
            assert_eq!(
                ivf.search(&query, None).unwrap(),
                exact.search(&query, None).unwrap()
            );
        }
    }

    #[test]
    fn test_nprobe_above_nlist_is_clamped() {
        let matrix = random_matrix(400, 8);
        let exact = SimilarityIndex::build(&matrix, &IndexConfig::default()).unwrap();
        let ivf = SimilarityIndex::build(&matrix, &clustered(4, 1)).unwrap();
        let query = exact.vector(5).unwrap().to_vec();
        let params = SearchParams {
            top_k: None,
            nprobe: Some(50),
        };
        assert_eq!(
            ivf.search_with(&query, params).unwrap(),
            exact.search(&query, None).unwrap()
        );
    }

    #[test]
    fn test_partial_probe_bounded_by_exact() {
        let matrix = random_matrix(800, 16);
        let exact = SimilarityIndex::build(&matrix, &IndexConfig::default()).unwrap();
        let ivf = SimilarityIndex::build(&matrix, &clustered(16, 2)).unwrap();

        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let raw: Vec<f32> = (0..16).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let query = normalized(&raw);
            let approx = ivf.search(&query, None).unwrap();
            let truth = exact.search(&query, None).unwrap();
            assert!(approx.len() <= truth.len());
            if let Some(best) = approx.first() {
                assert!(best.similarity <= truth[0].similarity);
            }
        }
    }

    #[test]
    fn test_own_cell_always_probed() {
        let matrix = random_matrix(500, 12);
        let ivf = SimilarityIndex::build(&matrix, &clustered(10, 1)).unwrap();
        for row in (0..500).step_by(37) {
            let query = ivf.vector(row).unwrap().to_vec();
            let results = ivf.search(&query, None).unwrap();
            assert!(results.iter().any(|r| r.row == row));
        }
    }

    #[test]
    fn test_insufficient_data() {
        let err = SimilarityIndex::build(&scenario_matrix(), &clustered(50, 10)).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { required: 50, available: 3 }));
    }

    #[test]
    fn test_nlist_equal_to_rows() {
        let ivf = SimilarityIndex::build(&scenario_matrix(), &clustered(3, 3)).unwrap();
        let results = ivf.search(ivf.vector(0).unwrap(), None).unwrap();
        assert_eq!(rows(&results), vec![0, 2, 1]);
    }

    #[test]
    fn test_untrained_lifecycle() {
        let mut ivf = IvfIndex::new(2, 2, 1);
        assert!(!ivf.is_trained());
        assert!(matches!(ivf.add(&[1.0, 0.0]), Err(Error::NotTrained)));

        let data = [1.0, 0.0, 0.0, 1.0, 0.9, 0.1, 0.1, 0.9];
        ivf.train(&data, &KMeansConfig::default()).unwrap();
        assert!(ivf.is_trained());
        ivf.add(&data).unwrap();
        assert_eq!(ivf.len(), 4);
        assert!(ivf.train(&data, &KMeansConfig::default()).is_err());
    }

    #[test]
    fn test_build_is_deterministic() {
        let matrix = random_matrix(400, 8);
        let a = SimilarityIndex::build(&matrix, &clustered(6, 2)).unwrap();
        let b = SimilarityIndex::build(&matrix, &clustered(6, 2)).unwrap();
        assert_eq!(a, b);
    }
}

// ============================================================================
// Persistence tests
// ============================================================================

mod persistence_tests {
    use super::*;

    fn roundtrip(index: &SimilarityIndex) -> SimilarityIndex {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.gvi");
        index.save(&path).unwrap();
        SimilarityIndex::load(&path).unwrap()
    }

    #[test]
    fn test_exact_roundtrip_is_bit_identical() {
        let matrix = random_matrix(150, 20);
        let index = SimilarityIndex::build(&matrix, &IndexConfig::default()).unwrap();
        let loaded = roundtrip(&index);

        assert_eq!(loaded, index);
        assert_eq!(loaded.mode(), IndexMode::Exact);
        let query = index.vector(7).unwrap().to_vec();
        assert_eq!(loaded.search(&query, None).unwrap(), index.search(&query, None).unwrap());
    }

    #[test]
    fn test_clustered_roundtrip_is_bit_identical() {
        let matrix = random_matrix(400, 10);
        let index = SimilarityIndex::build(&matrix, &clustered(5, 2)).unwrap();
        let loaded = roundtrip(&index);

        assert_eq!(loaded, index);
        assert_eq!(loaded.mode(), IndexMode::Clustered { nlist: 5, nprobe: 2 });
        let query = index.vector(123).unwrap().to_vec();
        assert_eq!(loaded.search(&query, None).unwrap(), index.search(&query, None).unwrap());
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = Vec::new();
        let index = SimilarityIndex::build(&scenario_matrix(), &IndexConfig::default()).unwrap();
        index.write_to(&mut bytes).unwrap();
        bytes[0] = b'X';
        let err = SimilarityIndex::read_from(&bytes).unwrap_err();
        assert_eq!(err.error_code(), "INDEX_CORRUPTION");
    }

    #[test]
    fn test_unknown_mode_and_version() {
        let mut bytes = Vec::new();
        let index = SimilarityIndex::build(&scenario_matrix(), &IndexConfig::default()).unwrap();
        index.write_to(&mut bytes).unwrap();

        let mut bad_version = bytes.clone();
        bad_version[8] = 99;
        assert!(matches!(
            SimilarityIndex::read_from(&bad_version),
            Err(Error::IndexCorruption { .. })
        ));

        let mut bad_mode = bytes.clone();
        bad_mode[12] = 7;
        assert!(matches!(
            SimilarityIndex::read_from(&bad_mode),
            Err(Error::IndexCorruption { .. })
        ));
    }

    #[test]
    fn test_truncated_and_trailing() {
        let mut bytes = Vec::new();
        let index = SimilarityIndex::build(&random_matrix(100, 4), &clustered(4, 1)).unwrap();
        index.write_to(&mut bytes).unwrap();

        for cut in [4, 20, 40, bytes.len() - 1] {
            assert!(matches!(
                SimilarityIndex::read_from(&bytes[..cut]),
                Err(Error::IndexCorruption { .. })
            ));
        }

        bytes.push(0);
        assert!(matches!(
            SimilarityIndex::read_from(&bytes),
            Err(Error::IndexCorruption { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = SimilarityIndex::load(&dir.path().join("absent.gvi")).unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
    }
}

// ============================================================================
// Concurrency tests
// ============================================================================

mod concurrency_tests {
    use super::*;

    #[test]
    fn test_concurrent_search_shared_index() {
        let matrix = random_matrix(1000, 32);
        let index = Arc::new(SimilarityIndex::build(&matrix, &clustered(10, 3)).unwrap());
        let expected: Vec<Vec<SearchResult>> = (0..8)
            .map(|t| index.search(index.vector(t * 100).unwrap(), Some(10)).unwrap())
            .collect();
        let expected = Arc::new(expected);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let index = Arc::clone(&index);
                let expected = Arc::clone(&expected);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let query = index.vector(t * 100).unwrap();
                        let results = index.search(query, Some(10)).unwrap();
                        assert_eq!(results, expected[t]);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().expect("search thread panicked");
        }
    }
}
