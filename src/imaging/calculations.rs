//! Pure calculation functions for decode dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Subsampling decision for one decode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSize {
    /// Power-of-two reduction applied while decoding.
    pub factor: u32,
    /// Remaining scale ratio after subsampling, always `>= 0.5`.
    pub ratio: f64,
}

/// Longest and shortest side of a `(width, height)` pair.
pub fn long_short(dims: (u32, u32)) -> (u32, u32) {
    let (w, h) = dims;
    (w.max(h), w.min(h))
}

/// Ratio that fits `dims` inside the `(long, short)` target box.
///
/// Values below 1.0 mean the image is larger than the box.
pub fn fit_ratio(dims: (u32, u32), target_long: u32, target_short: u32) -> f64 {
    let (long, short) = long_short(dims);
    let long_ratio = target_long as f64 / long.max(1) as f64;
    let short_ratio = target_short as f64 / short.max(1) as f64;
    long_ratio.min(short_ratio)
}

/// Choose the subsample factor for a raw image.
///
/// Doubles the factor (and the ratio with it) while the ratio stays below
/// 0.5, so the result is the smallest power of two that leaves at most a
/// halving for the precise scale pass.
///
/// # Examples
/// ```
/// # use phototable::imaging::sample_size;
/// // 4000x3000 into an 800x600 box: ratio 0.2 → factor 4, ratio 0.8
/// let s = sample_size((4000, 3000), 800, 600);
/// assert_eq!(s.factor, 4);
/// assert!((s.ratio - 0.8).abs() < 1e-9);
/// ```
pub fn sample_size(raw: (u32, u32), target_long: u32, target_short: u32) -> SampleSize {
    let mut ratio = fit_ratio(raw, target_long, target_short);
    let mut factor = 1u32;
    while ratio < 0.5 && factor < (1 << 30) {
        factor *= 2;
        ratio *= 2.0;
    }
    SampleSize { factor, ratio }
}

/// Dimensions after an integer subsample, never below 1x1.
pub fn subsampled_dimensions(dims: (u32, u32), factor: u32) -> (u32, u32) {
    let factor = factor.max(1);
    ((dims.0 / factor).max(1), (dims.1 / factor).max(1))
}

/// Dimensions after the precise scale pass. Truncates like an integer cast.
pub fn scaled_dimensions(dims: (u32, u32), ratio: f64) -> (u32, u32) {
    (
        (dims.0 as f64 * ratio) as u32,
        (dims.1 as f64 * ratio) as u32,
    )
}

/// Decode target box for a surface: `image_ratio` of each surface side.
pub fn target_sides(surface: (u32, u32), image_ratio: f64) -> (u32, u32) {
    let (long, short) = long_short(surface);
    (
        (image_ratio * long as f64) as u32,
        (image_ratio * short as f64) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // sample_size tests
    // =========================================================================

    #[test]
    fn sample_size_no_reduction_when_close() {
        // 1000x750 into 800x600: ratio 0.8, no subsampling
        let s = sample_size((1000, 750), 800, 600);
        assert_eq!(s.factor, 1);
        assert!((s.ratio - 0.8).abs() < 1e-9);
    }

    #[test]
    fn sample_size_small_image_keeps_factor_one() {
        let s = sample_size((200, 100), 800, 600);
        assert_eq!(s.factor, 1);
        assert!(s.ratio > 1.0);
    }

    #[test]
    fn sample_size_exactly_half_is_not_reduced() {
        let s = sample_size((1600, 1200), 800, 600);
        assert_eq!(s.factor, 1);
        assert!((s.ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn sample_size_is_smallest_power_of_two() {
        for raw in [(4000, 3000), (3000, 4000), (12000, 9000), (801, 7), (640, 480)] {
            let s = sample_size(raw, 320, 240);
            assert!(s.factor.is_power_of_two());
            assert!(s.ratio >= 0.5, "{raw:?} left ratio {}", s.ratio);
            if s.factor > 1 {
                // One fewer doubling would have left the ratio below 0.5
                assert!(s.ratio / 2.0 < 0.5, "{raw:?} over-reduced");
            }
        }
    }

    #[test]
    fn sample_size_uses_short_side_for_narrow_images() {
        // Panorama: long side fits easily, short side is the limiting factor
        let s = sample_size((1000, 1000), 4000, 100);
        assert_eq!(s.factor, 8);
    }

    // =========================================================================
    // dimension helpers
    // =========================================================================

    #[test]
    fn subsample_never_reaches_zero() {
        assert_eq!(subsampled_dimensions((3, 1), 4), (1, 1));
        assert_eq!(subsampled_dimensions((4000, 3000), 4), (1000, 750));
    }

    #[test]
    fn scaled_dimensions_stay_inside_box() {
        let dims = (1000, 750);
        let ratio = fit_ratio(dims, 800, 600);
        assert_eq!(scaled_dimensions(dims, ratio), (800, 600));

        let odd = (1003, 517);
        let ratio = fit_ratio(odd, 640, 480);
        let (w, h) = scaled_dimensions(odd, ratio);
        assert!(w <= 640 && h <= 480);
    }

    #[test]
    fn target_sides_follow_surface_orientation_free() {
        assert_eq!(target_sides((1920, 1080), 0.5), (960, 540));
        assert_eq!(target_sides((1080, 1920), 0.5), (960, 540));
    }
}
