//! # ALICE-EDT
//!
//! Exact squared Euclidean distance transforms for 1D/2D/3D lattice grids,
//! on the CPU (serial or rayon-threaded) and the GPU (wgpu compute).
//!
//! Given a sampled function `f` over a regular 1D/2D/3D grid, computes at
//! every grid point `p` the value `D(p) = min_q (f(q) + |p - q|^2)` with
//! `|.|` the Euclidean distance on the integer lattice. With the indicator
//! encoding (foreground 0, background a large sentinel) `D(p)` is the
//! squared distance from `p` to the nearest foreground point.
//!
//! ## Features
//!
//! - **Exact**: separable O(n) parabola-envelope sweep per axis
//!   (Felzenszwalb & Huttenlocher), no chamfer approximation
//! - **Parallel**: rayon fiber parallelism behind a `threaded` switch,
//!   bitwise identical to the serial path
//! - **GPU**: wgpu compute kernels with bounded brute search (`gpu` feature)
//! - **No hidden state**: in-place entry points with caller-owned scratch,
//!   allocating wrappers for convenience
//!
//! ## Example
//!
//! ```rust
//! use alice_edt::prelude::*;
//!
//! let mask = [false, true, false, false, false];
//! let f = boolean_indicator(&mask);
//! let d = edt_1d(&f);
//! assert_eq!(d, vec![1.0, 0.0, 1.0, 4.0, 9.0]);
//! ```
//!
//! ## Author
//!
//! Moroya Sakamoto

#![warn(missing_docs)]

mod envelope;

pub mod indicator;
pub mod transform;

#[cfg(feature = "gpu")]
pub mod gpu;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    #[cfg(feature = "gpu")]
    pub use crate::gpu::{gpu_edt_2d, gpu_edt_3d, GpuEdt, GpuError};
    pub use crate::indicator::{boolean_indicator, boolean_indicator_threshold, BACKGROUND};
    pub use crate::transform::{
        edt_1d, edt_1d_into, edt_2d, edt_2d_into, edt_3d, edt_3d_into, EdtScratch,
    };
}

// Re-exports for convenience
pub use indicator::{boolean_indicator, BACKGROUND};
pub use transform::{edt_1d, edt_2d, edt_3d, EdtScratch};
