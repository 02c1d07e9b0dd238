//! Separable CPU squared Euclidean distance transforms (Deep Fried Edition)
//!
//! 2D and 3D transforms decompose into independent 1D envelope sweeps, one
//! per fiber per axis. Between passes the partial result is copied back into
//! the input buffer with a cyclic axis rotation, so every pass reads
//! contiguous fibers and writes contiguous fibers.
//!
//! # Deep Fried Optimizations
//! - **Contiguous Fibers**: the rotating copy-back means no strided inner
//!   loops; every sweep runs on a flat slice.
//! - **Slab Parallelism**: fibers are distributed with `par_chunks_mut`,
//!   one fiber per task, disjoint scratch slices per fiber.
//! - **Shared Body**: serial and threaded paths drive the identical
//!   per-fiber code, so their results are bitwise identical.
//!
//! Author: Moroya Sakamoto

use rayon::prelude::*;

use crate::envelope::lower_envelope_1d;

// ── Scratch ──────────────────────────────────────────────────

/// Reusable scratch buffers for the envelope sweeps.
///
/// `v` stores per-fiber parabola indices and `z` per-fiber envelope
/// intercepts. One scratch serves every axis pass of a transform of the
/// shape it was created for; the sweeps re-initialize their slices on entry,
/// so the buffers never need clearing between calls or passes.
#[derive(Debug, Clone)]
pub struct EdtScratch {
    pub(crate) v: Vec<i32>,
    pub(crate) z: Vec<f32>,
}

impl EdtScratch {
    /// Scratch for a 1D transform of length `n`.
    pub fn new_1d(n: usize) -> Self {
        Self::with_shape(&[n])
    }

    /// Scratch for a 2D transform of shape `[rows, cols]`.
    pub fn new_2d(shape: [usize; 2]) -> Self {
        Self::with_shape(&shape)
    }

    /// Scratch for a 3D transform of shape `[planes, rows, cols]`.
    pub fn new_3d(shape: [usize; 3]) -> Self {
        Self::with_shape(&shape)
    }

    /// `v` matches the element count; `z` extends every axis by one so the
    /// same buffer covers the fiber-plus-sentinel slices of every pass.
    fn with_shape(shape: &[usize]) -> Self {
        let total: usize = shape.iter().product();
        let zlen: usize = shape.iter().map(|&s| s + 1).product();
        EdtScratch {
            v: vec![0; total],
            z: vec![0.0; zlen],
        }
    }
}

// ── 1D ───────────────────────────────────────────────────────

/// 1D transform, in place: `output[q] = min_i (f[i] + (q - i)^2)`.
///
/// Unlike the 2D/3D entry points, `f` is read-only: a single pass never
/// needs a copy-back.
///
/// # Panics
/// If `output` does not match `f` in length, or `scratch` was built for a
/// smaller extent.
pub fn edt_1d_into(f: &[f32], output: &mut [f32], scratch: &mut EdtScratch) {
    let n = f.len();
    assert_eq!(output.len(), n, "output length {} != input length {}", output.len(), n);
    assert!(scratch.v.len() >= n, "index scratch too small: {} < {}", scratch.v.len(), n);
    assert!(
        scratch.z.len() >= n + 1,
        "intercept scratch too small: {} < {}",
        scratch.z.len(),
        n + 1
    );
    lower_envelope_1d(f, output, &mut scratch.v[..n], &mut scratch.z[..n + 1]);
}

/// 1D transform, allocating.
pub fn edt_1d(f: &[f32]) -> Vec<f32> {
    let mut output = vec![0.0f32; f.len()];
    let mut scratch = EdtScratch::new_1d(f.len());
    edt_1d_into(f, &mut output, &mut scratch);
    output
}

// ── 2D ───────────────────────────────────────────────────────

/// 2D transform, in place.
///
/// `f` and `output` are row-major `[rows, cols]` grids. `f` is used as the
/// inter-pass staging buffer and holds unspecified contents on return;
/// callers that need it preserved should use [`edt_2d`].
///
/// # Panics
/// On any length/shape mismatch between `f`, `output`, `shape`, and
/// `scratch`, before any element is written.
pub fn edt_2d_into(
    f: &mut [f32],
    output: &mut [f32],
    shape: [usize; 2],
    scratch: &mut EdtScratch,
    threaded: bool,
) {
    let [s0, s1] = shape;
    let total = s0 * s1;
    check_buffers(total, (s0 * (s1 + 1)).max(s1 * (s0 + 1)), f, output, scratch);
    if total == 0 {
        return;
    }

    // Pass along axis 1: rows are contiguous fibers.
    axis_pass(f, output, scratch, s1, threaded);
    // Copy back, transposing so the axis-0 fibers become contiguous.
    rotate_axes(output, f, [1, s0, s1], threaded);
    // Pass along axis 0.
    axis_pass(f, output, scratch, s0, threaded);
    // Rotate back into the original layout; `f` then holds the result.
    rotate_axes(output, f, [1, s1, s0], threaded);
    output.copy_from_slice(f);
}

/// 2D transform, allocating.
///
/// `f` is a row-major `[rows, cols]` grid in the indicator encoding
/// (foreground 0, background a large sentinel). `threaded` distributes the
/// fibers of each pass over the rayon pool; the result is bitwise identical
/// either way.
pub fn edt_2d(f: &[f32], shape: [usize; 2], threaded: bool) -> Vec<f32> {
    let mut work = f.to_vec();
    let mut output = vec![0.0f32; f.len()];
    let mut scratch = EdtScratch::new_2d(shape);
    edt_2d_into(&mut work, &mut output, shape, &mut scratch, threaded);
    output
}

// ── 3D ───────────────────────────────────────────────────────

/// 3D transform, in place.
///
/// `f` and `output` are row-major `[planes, rows, cols]` grids. `f` is the
/// inter-pass staging buffer and holds unspecified contents on return.
///
/// # Panics
/// On any length/shape mismatch, before any element is written.
pub fn edt_3d_into(
    f: &mut [f32],
    output: &mut [f32],
    shape: [usize; 3],
    scratch: &mut EdtScratch,
    threaded: bool,
) {
    let [s0, s1, s2] = shape;
    let total = s0 * s1 * s2;
    let z_needed = (s0 * s1 * (s2 + 1))
        .max(s2 * s0 * (s1 + 1))
        .max(s1 * s2 * (s0 + 1));
    check_buffers(total, z_needed, f, output, scratch);
    if total == 0 {
        return;
    }

    // Axis 2, then axis 1, then axis 0; each rotation makes the next pass's
    // fibers contiguous and the final one restores the original layout.
    axis_pass(f, output, scratch, s2, threaded);
    rotate_axes(output, f, [s0, s1, s2], threaded);
    axis_pass(f, output, scratch, s1, threaded);
    rotate_axes(output, f, [s2, s0, s1], threaded);
    axis_pass(f, output, scratch, s0, threaded);
    rotate_axes(output, f, [s1, s2, s0], threaded);
    output.copy_from_slice(f);
}

/// 3D transform, allocating.
pub fn edt_3d(f: &[f32], shape: [usize; 3], threaded: bool) -> Vec<f32> {
    let mut work = f.to_vec();
    let mut output = vec![0.0f32; f.len()];
    let mut scratch = EdtScratch::new_3d(shape);
    edt_3d_into(&mut work, &mut output, shape, &mut scratch, threaded);
    output
}

// ── Pass machinery ───────────────────────────────────────────

fn check_buffers(total: usize, z_needed: usize, f: &[f32], output: &[f32], scratch: &EdtScratch) {
    assert_eq!(f.len(), total, "input length {} does not match shape", f.len());
    assert_eq!(output.len(), total, "output length {} does not match shape", output.len());
    assert!(
        scratch.v.len() >= total,
        "index scratch too small: {} < {}",
        scratch.v.len(),
        total
    );
    assert!(
        scratch.z.len() >= z_needed,
        "intercept scratch too small: {} < {}",
        scratch.z.len(),
        z_needed
    );
}

/// Sweep every contiguous `fiber_len` fiber of `f` into `output`.
///
/// Fibers write disjoint output chunks and use disjoint scratch slices, so
/// the threaded branch needs no synchronization.
fn axis_pass(
    f: &[f32],
    output: &mut [f32],
    scratch: &mut EdtScratch,
    fiber_len: usize,
    threaded: bool,
) {
    let z_len = fiber_len + 1;
    if threaded {
        output
            .par_chunks_mut(fiber_len)
            .zip(f.par_chunks(fiber_len))
            .zip(
                scratch
                    .v
                    .par_chunks_mut(fiber_len)
                    .zip(scratch.z.par_chunks_mut(z_len)),
            )
            .for_each(|((d, f), (v, z))| lower_envelope_1d(f, d, v, z));
    } else {
        output
            .chunks_mut(fiber_len)
            .zip(f.chunks(fiber_len))
            .zip(scratch.v.chunks_mut(fiber_len).zip(scratch.z.chunks_mut(z_len)))
            .for_each(|((d, f), (v, z))| lower_envelope_1d(f, d, v, z));
    }
}

/// Copy `src` into `dst` while cyclically rotating the axis order
/// `(a, b, c) -> (c, a, b)`.
///
/// `dims` are the dimensions of `src` in memory order. The axis that was
/// innermost in `src` becomes outermost in `dst`, which turns the next
/// pass's fibers into contiguous rows. A 2D transpose is the `a = 1` case.
fn rotate_axes(src: &[f32], dst: &mut [f32], dims: [usize; 3], threaded: bool) {
    let [a_len, b_len, c_len] = dims;
    debug_assert_eq!(src.len(), a_len * b_len * c_len);
    debug_assert_eq!(dst.len(), src.len());

    let fill = |(row_idx, row): (usize, &mut [f32])| {
        let c = row_idx / a_len;
        let a = row_idx % a_len;
        let base = a * b_len * c_len + c;
        for (b, out) in row.iter_mut().enumerate() {
            *out = src[base + b * c_len];
        }
    };

    if threaded {
        dst.par_chunks_mut(b_len).enumerate().for_each(fill);
    } else {
        dst.chunks_mut(b_len).enumerate().for_each(fill);
    }
}

// ── Tests ────────────────────────────────────────────────────
