//! Planar geometry on tracker coordinates.
//!
//! Positions are pixel coordinates as reported by the tracker. The small
//! offsets added inside `atan2` calls keep headings defined for zero-length
//! segments and must stay exactly as they are: detection thresholds and
//! sector boundaries were calibrated against them.

use nalgebra::{Point2, Vector2};

/// Tracker position in pixels.
pub type Position = Point2<f64>;

/// Offset added to the `y` difference when computing headings and bearings.
pub const HEADING_EPS: f64 = 0.000_000_1;

/// Offset added to the `x` difference when computing polar angles around the center.
pub const POLAR_EPS: f64 = 0.000_000_001;

/// Returns `true` for the `(0, 0)` position the tracker reports when it loses the subject.
#[inline]
#[must_use]
pub fn is_missing(p: &Position) -> bool {
    p.x == 0.0 && p.y == 0.0
}

/// Heading of the segment `from -> to` in degrees, measured as `atan2(dx, dy)`.
#[inline]
#[must_use]
pub fn heading_deg(from: &Position, to: &Position) -> f64 {
    (to.x - from.x).atan2(to.y - from.y + HEADING_EPS).to_degrees()
}

/// Bearing of `p` as seen from `center`, in degrees (same convention as [`heading_deg`]).
#[inline]
#[must_use]
pub fn bearing_deg(center: &Position, p: &Position) -> f64 {
    heading_deg(center, p)
}

/// Signed change of bearing around `center` when moving from `p0` to `p1`, folded to `[-180, 180)`.
#[must_use]
pub fn signed_bearing_change(center: &Position, p0: &Position, p1: &Position) -> f64 {
    (bearing_deg(center, p1) - bearing_deg(center, p0) + 180.0).rem_euclid(360.0) - 180.0
}

/// Polar angle of `p` around `center` in radians, counterclockwise with image `y` pointing down.
#[inline]
#[must_use]
pub fn polar_angle(center: &Position, p: &Position) -> f64 {
    (center.y - p.y).atan2(p.x - center.x + POLAR_EPS)
}

/// The `step`-th of `steps - 1` evenly spaced points strictly between `a` and `b`.
///
/// `steps` is the number of intervals between `a` and `b`, so `step` runs from
/// `1` to `steps - 1`.
#[inline]
#[must_use]
pub fn interpolate(a: &Position, b: &Position, steps: usize, step: usize) -> Position {
    let delta: Vector2<f64> = (b - a) / steps as f64;
    Point2::new(delta.x * step as f64 + a.x, delta.y * step as f64 + a.y)
}

/// Speed in cm/s for a displacement of `distance_px` pixels over `dt_ms` milliseconds.
///
/// Returns `0.0` when the time difference is not positive.
#[inline]
#[must_use]
pub fn speed_cm_s(distance_px: f64, dt_ms: f64, resolution: f64) -> f64 {
    if dt_ms <= 0.0 {
        return 0.0;
    }
    distance_px / ((dt_ms / 1000.0) * resolution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_position() {
        assert!(is_missing(&Position::new(0.0, 0.0)));
        assert!(!is_missing(&Position::new(0.0, 1.0)));
    }

    #[test]
    fn test_heading_convention() {
        let origin = Position::new(0.0, 0.0);
        assert!((heading_deg(&origin, &Position::new(0.0, 10.0))).abs() < 1e-6);
        assert!((heading_deg(&origin, &Position::new(10.0, 0.0)) - 90.0).abs() < 1e-6);
        assert!((heading_deg(&origin, &Position::new(-10.0, 0.0)) + 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_signed_bearing_change_folds() {
        let center = Position::new(0.0, 0.0);
        let p0 = Position::new(-1.0, -10.0);
        let p1 = Position::new(1.0, -10.0);
        let change = signed_bearing_change(&center, &p0, &p1);
        assert!(change.abs() < 20.0);
        assert!((-180.0..180.0).contains(&change));
    }

    #[test]
    fn test_polar_angle_quadrants() {
        let center = Position::new(100.0, 100.0);
        assert!(polar_angle(&center, &Position::new(110.0, 100.0)).abs() < 1e-6);
        let up = polar_angle(&center, &Position::new(100.0, 90.0));
        assert!((up - std::f64::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_interpolate_even_spacing() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(30.0, -60.0);
        let mid = interpolate(&a, &b, 3, 1);
        assert!((mid.x - 10.0).abs() < 1e-12);
        assert!((mid.y + 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_speed_guards_zero_interval() {
        assert_eq!(speed_cm_s(10.0, 0.0, 5.0), 0.0);
        assert!((speed_cm_s(100.0, 1000.0, 10.0) - 10.0).abs() < 1e-12);
    }
}
