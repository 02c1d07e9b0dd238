//! Common test helpers for ALICE-EDT integration tests
//!
//! Author: Moroya Sakamoto

// ============================================================================
// Reference transform
// ============================================================================

/// Naive O(n^2) reference: `min_q (f[q] + |p - q|^2)` in f64 over all pairs.
///
/// Only usable on small grids, which is the point: it has no envelope, no
/// passes, and no copy-back to get wrong.
#[allow(dead_code)]
pub fn naive_edt(f: &[f32], shape: &[usize]) -> Vec<f32> {
    let nd = shape.len();
    let coords = |mut idx: usize| -> Vec<i64> {
        let mut c = vec![0i64; nd];
        for d in (0..nd).rev() {
            c[d] = (idx % shape[d]) as i64;
            idx /= shape[d];
        }
        c
    };

    (0..f.len())
        .map(|p| {
            let cp = coords(p);
            let mut best = f64::INFINITY;
            for (q, &fq) in f.iter().enumerate() {
                let cq = coords(q);
                let dist2: f64 = cp
                    .iter()
                    .zip(&cq)
                    .map(|(a, b)| {
                        let d = (a - b) as f64;
                        d * d
                    })
                    .sum();
                best = best.min(fq as f64 + dist2);
            }
            best as f32
        })
        .collect()
}

// ============================================================================
// Deterministic test data
// ============================================================================

/// Deterministic pseudo-random mask (sin-hash, no RNG dependency).
///
/// `density` in (0, 1) is the approximate foreground fraction.
pub fn test_mask(len: usize, salt: f32, density: f32) -> Vec<bool> {
    (0..len)
        .map(|i| ((i as f32 + salt) * 12.9898).sin().abs() < density)
        .collect()
}

/// Deterministic non-negative grid for exercising the general (non-indicator)
/// contract.
#[allow(dead_code)]
pub fn test_field(len: usize, salt: f32, scale: f32) -> Vec<f32> {
    (0..len)
        .map(|i| ((i as f32 + salt) * 7.5312).sin().abs() * scale)
        .collect()
}

// ============================================================================
// Assertion helpers
// ============================================================================

/// Assert two grids agree element-wise within an absolute tolerance.
#[allow(dead_code)]
pub fn assert_grids_close(actual: &[f32], expected: &[f32], tol: f32, msg: &str) {
    assert_eq!(actual.len(), expected.len(), "{}: length mismatch", msg);
    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            (a - e).abs() <= tol,
            "{}: mismatch at {}: actual={}, expected={} (diff={}, tol={})",
            msg,
            i,
            a,
            e,
            (a - e).abs(),
            tol
        );
    }
}

// ============================================================================
// Shared scenario grids
// ============================================================================

/// The 7x5 two-ring scenario mask (foreground = nonzero cells).
#[allow(dead_code)]
pub fn ring_mask_7x5() -> Vec<bool> {
    const GRID: [u8; 35] = [
        0, 1, 1, 1, 0, //
        1, 1, 1, 1, 1, //
        1, 0, 0, 0, 1, //
        1, 0, 0, 0, 1, //
        1, 0, 0, 0, 1, //
        1, 1, 1, 1, 1, //
        0, 1, 1, 1, 0, //
    ];
    GRID.iter().map(|&x| x != 0).collect()
}

/// Expected squared distances for [`ring_mask_7x5`]: the cavity center is
/// two steps from the nearest foreground in every direction.
#[allow(dead_code)]
pub fn ring_expected_7x5() -> Vec<f32> {
    vec![
        1.0, 0.0, 0.0, 0.0, 1.0, //
        0.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 1.0, 1.0, 0.0, //
        0.0, 1.0, 4.0, 1.0, 0.0, //
        0.0, 1.0, 1.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, 0.0, 1.0, //
    ]
}
