//! # SIMD-Accelerated Vector Math
//!
//! Inner products and squared L2 distances for per-position embeddings.
//! Similarity is the inner product of unit vectors, so `dot_product` is the
//! hot path for both index modes; `l2_distance_squared` drives k-means cell
//! assignment and probing.
//!
//! Dispatch order: AVX2+FMA > scalar on x86_64, NEON on aarch64. The choice
//! is made once per process so every score in a run comes from the same
//! kernel.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

/// Vectors with a Euclidean norm below this are treated as zero vectors
pub const NORM_EPSILON: f32 = 1e-12;

/// Compute dot product of two vectors using best available SIMD
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if has_avx2_fma() {
            return unsafe { dot_product_avx2_fma(a, b) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        return unsafe { dot_product_neon(a, b) };
    }

    #[allow(unreachable_code)]
    dot_product_scalar(a, b)
}

/// Compute squared L2 (Euclidean) distance
#[inline]
pub fn l2_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if has_avx2_fma() {
            return unsafe { l2_squared_avx2_fma(a, b) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        return unsafe { l2_squared_neon(a, b) };
    }

    #[allow(unreachable_code)]
    l2_squared_scalar(a, b)
}

/// Euclidean norm
#[inline]
pub fn norm(v: &[f32]) -> f32 {
    dot_product(v, v).sqrt()
}

/// Scale `v` to unit length in place. Near-zero vectors become exact zeros,
/// so their similarity with anything is 0 rather than NaN.
#[inline]
pub fn normalize(v: &mut [f32]) {
    let n = norm(v);
    if n.is_nan() || n < NORM_EPSILON {
        v.fill(0.0);
        return;
    }
    let inv_n = 1.0 / n;
    for x in v.iter_mut() {
        *x *= inv_n;
    }
}

/// Normalize vector, returning new vec
#[inline]
pub fn normalized(v: &[f32]) -> Vec<f32> {
    let mut result = v.to_vec();
    normalize(&mut result);
    result
}

/// Normalize every `dimension`-wide row of a contiguous buffer in place
pub fn normalize_rows(data: &mut [f32], dimension: usize) {
    for row in data.chunks_exact_mut(dimension) {
        normalize(row);
    }
}

/// Cosine similarity of two arbitrary (not necessarily unit) vectors
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denom = norm(a) * norm(b);
    if denom > 0.0 {
        dot_product(a, b) / denom
    } else {
        0.0
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn has_avx2_fma() -> bool {
    use std::sync::OnceLock;
    static DETECTED: OnceLock<bool> = OnceLock::new();
    *DETECTED.get_or_init(|| is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma"))
}

// ============================================================================
// Scalar implementations (fallback)
// ============================================================================

#[inline]
fn dot_product_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
fn l2_squared_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

// ============================================================================
// AVX2 + FMA implementations (8 lanes)
// ============================================================================

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn dot_product_avx2_fma(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = _mm256_setzero_ps();
    let a_chunks = a.chunks_exact(8);
    let b_chunks = b.chunks_exact(8);
    let tail: f32 = a_chunks
        .remainder()
        .iter()
        .zip(b_chunks.remainder())
        .map(|(x, y)| x * y)
        .sum();

    for (ca, cb) in a_chunks.zip(b_chunks) {
        let va = _mm256_loadu_ps(ca.as_ptr());
        let vb = _mm256_loadu_ps(cb.as_ptr());
        acc = _mm256_fmadd_ps(va, vb, acc);
    }

    hsum256_ps(acc) + tail
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn l2_squared_avx2_fma(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = _mm256_setzero_ps();
    let a_chunks = a.chunks_exact(8);
    let b_chunks = b.chunks_exact(8);
    let tail: f32 = a_chunks
        .remainder()
        .iter()
        .zip(b_chunks.remainder())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();

    for (ca, cb) in a_chunks.zip(b_chunks) {
        let diff = _mm256_sub_ps(_mm256_loadu_ps(ca.as_ptr()), _mm256_loadu_ps(cb.as_ptr()));
        acc = _mm256_fmadd_ps(diff, diff, acc);
    }

    hsum256_ps(acc) + tail
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
#[inline]
unsafe fn hsum256_ps(v: __m256) -> f32 {
    // Fold high lane onto low, then 4 -> 2 -> 1
    let sum128 = _mm_add_ps(_mm256_extractf128_ps(v, 1), _mm256_castps256_ps128(v));
    let shuf = _mm_movehdup_ps(sum128);
    let sums = _mm_add_ps(sum128, shuf);
    let shuf = _mm_movehl_ps(sums, sums);
    _mm_cvtss_f32(_mm_add_ss(sums, shuf))
}

// ============================================================================
// ARM NEON implementations (4 lanes)
// ============================================================================

#[cfg(target_arch = "aarch64")]
#[inline]
unsafe fn dot_product_neon(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = vdupq_n_f32(0.0);
    let a_chunks = a.chunks_exact(4);
    let b_chunks = b.chunks_exact(4);
    let tail: f32 = a_chunks
        .remainder()
        .iter()
        .zip(b_chunks.remainder())
        .map(|(x, y)| x * y)
        .sum();

    for (ca, cb) in a_chunks.zip(b_chunks) {
        acc = vfmaq_f32(acc, vld1q_f32(ca.as_ptr()), vld1q_f32(cb.as_ptr()));
    }

    vaddvq_f32(acc) + tail
}

#[cfg(target_arch = "aarch64")]
#[inline]
unsafe fn l2_squared_neon(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = vdupq_n_f32(0.0);
    let a_chunks = a.chunks_exact(4);
    let b_chunks = b.chunks_exact(4);
    let tail: f32 = a_chunks
        .remainder()
        .iter()
        .zip(b_chunks.remainder())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();

    for (ca, cb) in a_chunks.zip(b_chunks) {
        let diff = vsubq_f32(vld1q_f32(ca.as_ptr()), vld1q_f32(cb.as_ptr()));
        acc = vfmaq_f32(acc, diff, diff);
    }

    vaddvq_f32(acc) + tail
}
