//! Indicator encoding helpers.
//!
//! The CPU transform operates on a sampled function where foreground lattice
//! points carry 0 and background points a large positive sentinel. These
//! helpers build that encoding from binary masks; the GPU path consumes the
//! raw mask directly and applies the same 0.5 threshold in-kernel.
//!
//! Author: Moroya Sakamoto

/// Sentinel carried by background points in the indicator encoding.
///
/// Large enough to dominate any squared lattice distance a realistic grid
/// can produce, while staying comfortably finite in `f32`.
pub const BACKGROUND: f32 = 1e10;

/// Encode a boolean mask as an indicator function.
///
/// Foreground (`true`) points map to 0, background points to [`BACKGROUND`].
#[inline]
pub fn boolean_indicator(mask: &[bool]) -> Vec<f32> {
    mask.iter()
        .map(|&fg| if fg { 0.0 } else { BACKGROUND })
        .collect()
}

/// Encode a thresholded grid as an indicator function.
///
/// Values `>= 0.5` count as foreground, matching the GPU input contract.
#[inline]
pub fn boolean_indicator_threshold(grid: &[f32]) -> Vec<f32> {
    grid.iter()
        .map(|&x| if x >= 0.5 { 0.0 } else { BACKGROUND })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_encoding() {
        let f = boolean_indicator(&[true, false, true]);
        assert_eq!(f, vec![0.0, BACKGROUND, 0.0]);
    }

    #[test]
    fn threshold_encoding_matches_gpu_contract() {
        let f = boolean_indicator_threshold(&[0.0, 0.49, 0.5, 1.0]);
        assert_eq!(f, vec![BACKGROUND, BACKGROUND, 0.0, 0.0]);
    }

    #[test]
    fn empty_mask() {
        assert!(boolean_indicator(&[]).is_empty());
    }
}
