//! Placement math for the table.
//!
//! Everything here is a pure function of its inputs (plus an injected RNG for
//! the randomized drops), so the table's motion can be tested without a
//! clock or a render surface.
//!
//! ## Coordinates
//!
//! Surface pixels, origin top-left, y down. An item's [`Transform`] stores
//! the position of its *unscaled* top-left corner; rotation (degrees,
//! clockwise) and scale pivot on the item's center:
//!
//! ```text
//! (x, y) ──────────┐
//!   │              │
//!   │    center ●  │  h
//!   │              │
//!   └──────────────┘
//!          w
//! ```
//!
//! ## Drop
//!
//! A drop targets a Gaussian-scattered point around the surface center:
//! `center = (0.5W + 0.15W·i, 0.5H + 0.15H·j)` with `i, j ~ N(0, 1)`. The
//! result is not clamped, so a drop can occasionally land partly off-surface.
//!
//! ## Fling
//!
//! Velocity decays geometrically by `damping` per 100 ms step until it falls
//! below one pixel per step:
//!
//! ```text
//! steps = -ln v / ln damping
//! stop  = v (1 - damping^steps) / (1 - damping)
//! ```

use kurbo::{Affine, Point, Rect, Vec2};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Animation time per fling step.
pub const FLING_STEP: Duration = Duration::from_millis(100);

/// Drop travel speed, pixels per second.
pub const DROP_SPEED: f64 = 400.0;

pub const MIN_DROP_DURATION: Duration = Duration::from_millis(1000);
pub const MIN_PICKUP_DURATION: Duration = Duration::from_millis(500);

/// Spread of the drop scatter, as a fraction of the surface dimension.
const DROP_SPREAD: f64 = 0.15;

/// Where and how an item is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    /// Degrees, clockwise.
    pub rotation: f64,
    pub scale: f64,
    pub alpha: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale: 1.0,
            alpha: 1.0,
        }
    }
}

impl Transform {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Map item-local coordinates (`0..w`, `0..h`) to surface coordinates.
    pub fn affine(&self, width: f64, height: f64) -> Affine {
        let half = Vec2::new(width / 2.0, height / 2.0);
        Affine::translate(Vec2::new(self.x, self.y) + half)
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale(self.scale)
            * Affine::translate(-half)
    }

    /// Surface coordinates of the item center.
    pub fn center(&self, width: f64, height: f64) -> Point {
        Point::new(self.x + width / 2.0, self.y + height / 2.0)
    }

    /// Linear interpolation of every component; `t` is clamped to `[0, 1]`.
    pub fn lerp(&self, to: &Transform, t: f64) -> Transform {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Transform {
            x: mix(self.x, to.x),
            y: mix(self.y, to.y),
            rotation: mix(self.rotation, to.rotation),
            scale: mix(self.scale, to.scale),
            alpha: mix(self.alpha, to.alpha),
        }
    }
}

/// Axis-aligned box around the rotated and scaled item.
pub fn item_bounds(transform: &Transform, width: f64, height: f64) -> Rect {
    transform
        .affine(width, height)
        .transform_rect_bbox(Rect::new(0.0, 0.0, width, height))
}

/// Whether `point` (surface coordinates) lies on the item.
///
/// Tests against the rotated rectangle itself, not its bounding box.
pub fn hit_test(transform: &Transform, width: f64, height: f64, point: Point) -> bool {
    if transform.scale <= 0.0 {
        return false;
    }
    let local = transform.affine(width, height).inverse() * point;
    Rect::new(0.0, 0.0, width, height).contains(local)
}

/// Randomized drop target for an unscaled `item` on `surface`.
///
/// Returns the top-left corner so that the item center lands on the scattered
/// point.
pub fn drop_position<R: Rng + ?Sized>(surface: (f64, f64), item: (f64, f64), rng: &mut R) -> Point {
    let i: f64 = rng.sample(StandardNormal);
    let j: f64 = rng.sample(StandardNormal);
    drop_position_for(surface, item, i, j)
}

/// [`drop_position`] with the normal deviates supplied.
pub fn drop_position_for(surface: (f64, f64), item: (f64, f64), i: f64, j: f64) -> Point {
    let (w, h) = surface;
    let center = Point::new(0.5 * w + DROP_SPREAD * w * i, 0.5 * h + DROP_SPREAD * h * j);
    Point::new(center.x - item.0 / 2.0, center.y - item.1 / 2.0)
}

/// Uniform rotation in `[-limit, limit]` degrees.
pub fn drop_rotation<R: Rng + ?Sized>(limit: f64, rng: &mut R) -> f64 {
    let limit = limit.abs();
    if limit == 0.0 {
        return 0.0;
    }
    rng.gen_range(-limit..=limit)
}

/// Time to travel `distance` pixels at [`DROP_SPEED`], never under a second.
pub fn drop_duration(distance: f64) -> Duration {
    let millis = 1000.0 * distance / DROP_SPEED;
    Duration::from_millis(millis.max(0.0) as u64).max(MIN_DROP_DURATION)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlingTrajectory {
    pub steps: f64,
    pub stop_distance: f64,
}

impl FlingTrajectory {
    pub fn duration(&self) -> Duration {
        FLING_STEP.mul_f64(self.steps.max(0.0))
    }
}

/// Geometric-decay projection of a fling with speed `velocity`.
///
/// `damping` must be in `(0, 1)`. Velocities of one or less do not move.
pub fn fling_trajectory(velocity: f64, damping: f64) -> FlingTrajectory {
    if velocity <= 1.0 || !(damping > 0.0 && damping < 1.0) {
        return FlingTrajectory {
            steps: 0.0,
            stop_distance: 0.0,
        };
    }
    let steps = -velocity.ln() / damping.ln();
    let stop_distance = velocity * (1.0 - damping.powf(steps)) / (1.0 - damping);
    FlingTrajectory {
        steps,
        stop_distance,
    }
}

/// True when `bounds` misses `[0, W) x [0, H)` entirely on either axis.
pub fn is_off_surface(bounds: Rect, width: f64, height: f64) -> bool {
    let x_out = bounds.x1 <= 0.0 || bounds.x0 >= width;
    let y_out = bounds.y1 <= 0.0 || bounds.y0 >= height;
    x_out || y_out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupTarget {
    pub position: Point,
    pub scale: f64,
}

/// Centered, scaled to fill the surface's limiting dimension.
pub fn pickup_target(surface: (f64, f64), item: (f64, f64)) -> PickupTarget {
    let (sw, sh) = surface;
    let (w, h) = item;
    PickupTarget {
        position: Point::new((sw - w) / 2.0, (sh - h) / 2.0),
        scale: (sh / h).min(sw / w),
    }
}

/// One millisecond per pixel, never under half a second.
pub fn pickup_duration(distance: f64) -> Duration {
    Duration::from_millis(distance.max(0.0) as u64).max(MIN_PICKUP_DURATION)
}

/// Wrap into `[-180, 180)`.
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceOrientation {
    Landscape,
    Portrait,
}

impl SurfaceOrientation {
    /// Square counts as portrait.
    pub fn of(width: f64, height: f64) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// How the renderer should fit an item into its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    FillCrop,
    FitInside,
}

/// `FillCrop` when the item is smaller than the surface in both dimensions
/// or shares its orientation, `FitInside` otherwise.
pub fn choose_fit_mode(surface: (f64, f64), item: (f64, f64)) -> FitMode {
    let smaller = item.0 < surface.0 && item.1 < surface.1;
    let same = SurfaceOrientation::of(surface.0, surface.1) == SurfaceOrientation::of(item.0, item.1);
    if smaller || same {
        FitMode::FillCrop
    } else {
        FitMode::FitInside
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    // =========================================================================
    // Drop
    // =========================================================================

    #[test]
    fn drop_position_centers_item_on_scatter_point() {
        let p = drop_position_for((1000.0, 800.0), (200.0, 100.0), 0.0, 0.0);
        assert_eq!(p, Point::new(400.0, 350.0));

        let p = drop_position_for((1000.0, 800.0), (200.0, 100.0), 1.0, -1.0);
        assert!(close(p.x, 650.0 - 100.0));
        assert!(close(p.y, 280.0 - 50.0));
    }

    #[test]
    fn drop_center_within_band_for_unit_deviates() {
        let (w, h) = (1920.0, 1080.0);
        for &i in &[-1.0, -0.5, 0.0, 0.5, 1.0] {
            for &j in &[-1.0, 0.0, 1.0] {
                let p = drop_position_for((w, h), (300.0, 200.0), i, j);
                let cx = p.x + 150.0;
                let cy = p.y + 100.0;
                assert!(cx >= 0.35 * w - EPS && cx <= 0.65 * w + EPS);
                assert!(cy >= 0.35 * h - EPS && cy <= 0.65 * h + EPS);
            }
        }
    }

    #[test]
    fn drop_position_is_unclamped() {
        // Far-tail deviates push the item off the surface
        let p = drop_position_for((100.0, 100.0), (10.0, 10.0), 5.0, 0.0);
        assert!(p.x > 100.0);
    }

    #[test]
    fn drop_position_seeded_is_reproducible() {
        let mut a = StdRng::seed_from_u64(5);
        let mut b = StdRng::seed_from_u64(5);
        assert_eq!(
            drop_position((800.0, 600.0), (100.0, 100.0), &mut a),
            drop_position((800.0, 600.0), (100.0, 100.0), &mut b)
        );
    }

    #[test]
    fn drop_rotation_within_limit() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            let a = drop_rotation(45.0, &mut rng);
            assert!((-45.0..=45.0).contains(&a));
        }
        assert_eq!(drop_rotation(0.0, &mut rng), 0.0);
    }

    #[test]
    fn drop_duration_has_floor() {
        assert_eq!(drop_duration(0.0), Duration::from_millis(1000));
        assert_eq!(drop_duration(200.0), Duration::from_millis(1000));
        assert_eq!(drop_duration(800.0), Duration::from_millis(2000));
    }

    // =========================================================================
    // Fling
    // =========================================================================

    #[test]
    fn fling_below_one_does_not_move() {
        for v in [0.0, 0.5, 1.0] {
            let t = fling_trajectory(v, 0.5);
            assert_eq!(t.steps, 0.0);
            assert_eq!(t.stop_distance, 0.0);
            assert_eq!(t.duration(), Duration::ZERO);
        }
    }

    #[test]
    fn fling_matches_closed_form() {
        let t = fling_trajectory(1000.0, 0.5);
        let steps = 1000f64.ln() / 2f64.ln();
        assert!(close(t.steps, steps));
        // damping^steps == 1/v, so stop == (v - 1) / (1 - damping)
        assert!(close(t.stop_distance, 999.0 / 0.5));
        assert!(close(t.duration().as_secs_f64(), 0.1 * steps));
    }

    #[test]
    fn fling_stop_distance_monotonic_in_velocity() {
        for damping in [0.1, 0.5, 0.9] {
            let mut last = 0.0;
            for v in (2..200).map(|v| v as f64 * 7.5) {
                let t = fling_trajectory(v, damping);
                assert!(t.stop_distance > last, "v={v} damping={damping}");
                last = t.stop_distance;
            }
        }
    }

    #[test]
    fn fling_rejects_bad_damping() {
        assert_eq!(fling_trajectory(100.0, 1.0).stop_distance, 0.0);
        assert_eq!(fling_trajectory(100.0, 0.0).stop_distance, 0.0);
    }

    // =========================================================================
    // Bounds
    // =========================================================================

    #[test]
    fn bounds_of_unrotated_item() {
        let t = Transform::at(10.0, 20.0);
        assert_eq!(item_bounds(&t, 100.0, 50.0), Rect::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn bounds_scale_about_center() {
        let t = Transform {
            scale: 2.0,
            ..Transform::at(0.0, 0.0)
        };
        let b = item_bounds(&t, 100.0, 50.0);
        assert!(close(b.x0, -50.0) && close(b.x1, 150.0));
        assert!(close(b.y0, -25.0) && close(b.y1, 75.0));
    }

    #[test]
    fn bounds_quarter_turn_swaps_extent() {
        let t = Transform {
            rotation: 90.0,
            ..Transform::at(0.0, 0.0)
        };
        let b = item_bounds(&t, 100.0, 50.0);
        assert!(close(b.width(), 50.0));
        assert!(close(b.height(), 100.0));
        assert!(close(b.center().x, 50.0) && close(b.center().y, 25.0));
    }

    #[test]
    fn hit_test_respects_rotation() {
        let t = Transform {
            rotation: 45.0,
            ..Transform::at(0.0, 0.0)
        };
        // Center is always a hit
        assert!(hit_test(&t, 100.0, 100.0, Point::new(50.0, 50.0)));
        // Original corner is cut away by the rotation
        assert!(!hit_test(&t, 100.0, 100.0, Point::new(2.0, 2.0)));
        assert!(!hit_test(&Transform::at(0.0, 0.0), 10.0, 10.0, Point::new(11.0, 5.0)));
    }

    #[test]
    fn off_surface_on_either_axis() {
        let (w, h) = (800.0, 600.0);
        assert!(!is_off_surface(Rect::new(10.0, 10.0, 50.0, 50.0), w, h));
        // Straddling an edge is still on-surface
        assert!(!is_off_surface(Rect::new(-20.0, 10.0, 5.0, 50.0), w, h));
        assert!(is_off_surface(Rect::new(-100.0, 10.0, -1.0, 50.0), w, h));
        assert!(is_off_surface(Rect::new(800.0, 10.0, 900.0, 50.0), w, h));
        assert!(is_off_surface(Rect::new(10.0, 600.0, 50.0, 700.0), w, h));
        assert!(is_off_surface(Rect::new(10.0, -80.0, 50.0, -10.0), w, h));
    }

    // =========================================================================
    // Pickup & fit
    // =========================================================================

    #[test]
    fn pickup_centers_and_fills_limiting_side() {
        let target = pickup_target((1000.0, 500.0), (200.0, 200.0));
        assert_eq!(target.position, Point::new(400.0, 150.0));
        assert_eq!(target.scale, 2.5);

        // Scaled extent is centered on the surface
        let t = Transform {
            scale: target.scale,
            ..Transform::at(target.position.x, target.position.y)
        };
        let b = item_bounds(&t, 200.0, 200.0);
        assert!(close(b.center().x, 500.0) && close(b.center().y, 250.0));
        assert!(close(b.height(), 500.0));
    }

    #[test]
    fn pickup_duration_has_floor() {
        assert_eq!(pickup_duration(10.0), Duration::from_millis(500));
        assert_eq!(pickup_duration(1234.9), Duration::from_millis(1234));
    }

    #[test]
    fn wrap_angle_half_open_interval() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert_eq!(wrap_angle(180.0), -180.0);
        assert_eq!(wrap_angle(-180.0), -180.0);
        assert_eq!(wrap_angle(190.0), -170.0);
        assert_eq!(wrap_angle(-540.0), -180.0);
        assert_eq!(wrap_angle(725.0), 5.0);
    }

    #[test]
    fn fit_mode_selection() {
        let landscape = (1920.0, 1080.0);
        // Smaller in both dimensions
        assert_eq!(choose_fit_mode(landscape, (300.0, 900.0)), FitMode::FillCrop);
        // Same orientation, larger
        assert_eq!(choose_fit_mode(landscape, (4000.0, 3000.0)), FitMode::FillCrop);
        // Opposite orientation, larger
        assert_eq!(choose_fit_mode(landscape, (1000.0, 3000.0)), FitMode::FitInside);
    }

    #[test]
    fn transform_lerp_clamps() {
        let a = Transform::at(0.0, 0.0);
        let b = Transform {
            rotation: 90.0,
            alpha: 0.0,
            ..Transform::at(100.0, 50.0)
        };
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.x, 50.0);
        assert_eq!(mid.rotation, 45.0);
        assert_eq!(mid.alpha, 0.5);
        assert_eq!(a.lerp(&b, 2.0), b);
    }
}
