//! Metrics of the square open field arena.
//!
//! The arena is the axis-aligned square centered at the session center with
//! half-side equal to the session radius.

use crate::math::{polar_angle, Position};
use crate::trajectory::Trajectory;

use super::{through_end, MetricValue, TimeWindow};

/// Signed distance (pixels) from `position` to the nearest side; negative outside.
fn distance_from_side(trajectory: &Trajectory, position: &Position) -> f64 {
    let center = trajectory.center();
    let r = trajectory.radius();
    let (left, right) = (center.x - r, center.x + r);
    let (bottom, top) = (center.y - r, center.y + r);
    (position.x - left)
        .min(right - position.x)
        .min(position.y - bottom)
        .min(top - position.y)
}

/// Number of records more than `margin` pixels outside the square.
#[must_use]
pub fn outside_points(trajectory: &Trajectory, window: TimeWindow, margin: f64) -> MetricValue {
    let slot = trajectory.primary_slot();
    let outside = through_end(trajectory, window)
        .filter(|(_, r)| distance_from_side(trajectory, &r.position(slot)) < -margin)
        .count();
    MetricValue::Count(outside)
}

/// Share of records outside the central square, one value per annulus width
/// in `percents` of the half-side.
#[must_use]
pub fn thigmotaxis(trajectory: &Trajectory, window: TimeWindow, percents: &[f64]) -> MetricValue {
    let slot = trajectory.primary_slot();
    let center = trajectory.center();
    let positions: Vec<Position> = through_end(trajectory, window)
        .map(|(_, r)| r.position(slot))
        .collect();
    if positions.is_empty() {
        return MetricValue::Na;
    }
    let values = percents
        .iter()
        .map(|percent| {
            let half = (1.0 - percent / 100.0) * trajectory.radius();
            let inside = |v: f64, c: f64| c - half < v && v < c + half;
            let periphery = positions
                .iter()
                .filter(|p| !(inside(p.x, center.x) && inside(p.y, center.y)))
                .count();
            MetricValue::number(periphery as f64 / positions.len() as f64, 3)
        })
        .collect();
    MetricValue::List(values)
}

/// Share of records in each of four quadrants.
///
/// Corner quadrants are centered on the diagonals, edge quadrants on the axes.
#[must_use]
pub fn time_in_quadrants(
    trajectory: &Trajectory,
    window: TimeWindow,
    corner: bool,
) -> MetricValue {
    let offset = if corner { 45.0 } else { 0.0 };
    let center = trajectory.center();
    let mut boxes = [0.0; 4];
    for (index, _) in through_end(trajectory, window) {
        let degrees = polar_angle(&center, &trajectory.position(index)).to_degrees();
        let angle = (degrees - offset + 405.0).rem_euclid(360.0);
        boxes[((angle / 90.0) as usize).min(3)] += 1.0;
    }
    MetricValue::proportions(&boxes, 3)
}

/// Mean distance (cm) from the nearest side; positions outside count as zero.
#[must_use]
pub fn mean_distance_from_side(trajectory: &Trajectory, window: TimeWindow) -> MetricValue {
    let slot = trajectory.primary_slot();
    let (sum, count) = through_end(trajectory, window).fold((0.0, 0usize), |(sum, n), (_, r)| {
        let distance = distance_from_side(trajectory, &r.position(slot)).max(0.0);
        (sum + distance, n + 1)
    });
    if count == 0 {
        return MetricValue::Na;
    }
    MetricValue::number(sum / count as f64 / trajectory.resolution(), 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use crate::trajectory::test_support::{constants, room_track};

    const WHOLE: TimeWindow = TimeWindow::new(0.0, 10.0);

    /// Square of half-side 100 px centered at (100, 100), 2 px/cm.
    fn field(points: &[(f64, f64)]) -> Trajectory {
        let points: Vec<_> = points.iter().map(|&(x, y)| (x, y, 0)).collect();
        room_track(Task::OpenField, constants(2.0, (100.0, 100.0), 100.0), 1000.0, &points)
    }

    #[test]
    fn test_outside_points() {
        let trajectory = field(&[(100.0, 100.0), (-0.5, 100.0), (100.0, 202.0), (250.0, 250.0)]);
        assert_eq!(outside_points(&trajectory, WHOLE, 1.0), MetricValue::Count(2));
        assert_eq!(outside_points(&trajectory, WHOLE, 0.0), MetricValue::Count(3));
    }

    #[test]
    fn test_thigmotaxis() {
        // central square of half-side 80 px at 20 percent
        let trajectory = field(&[(100.0, 100.0), (150.0, 60.0), (190.0, 100.0), (100.0, 15.0)]);
        assert_eq!(thigmotaxis(&trajectory, WHOLE, &[20.0]).to_string(), "0.500");
        assert_eq!(thigmotaxis(&trajectory, WHOLE, &[20.0, 60.0]).to_string(), "0.500|0.750");
        assert!(thigmotaxis(&trajectory, TimeWindow::new(5.0, 6.0), &[20.0]).is_na());
    }

    #[test]
    fn test_time_in_quadrants() {
        // east, north, west and south of the center; y points down
        let trajectory = field(&[(150.0, 100.0), (100.0, 50.0), (50.0, 100.0), (100.0, 150.0)]);
        let value = time_in_quadrants(&trajectory, WHOLE, false);
        assert_eq!(value.to_string(), "0.250|0.250|0.250|0.250");

        let trajectory = field(&[(150.0, 90.0), (150.0, 110.0), (160.0, 60.0)]);
        let value = time_in_quadrants(&trajectory, WHOLE, false);
        assert_eq!(value.to_string(), "1.000|0.000|0.000|0.000");
        // against the diagonals the point below the center moves to the last box
        let value = time_in_quadrants(&trajectory, WHOLE, true);
        assert_eq!(value.to_string(), "0.667|0.000|0.000|0.333");
    }

    #[test]
    fn test_mean_distance_from_side() {
        let trajectory = field(&[(100.0, 100.0), (20.0, 100.0), (-10.0, 100.0)]);
        // (100 + 20 + 0) / 3 px at 2 px/cm
        assert_eq!(mean_distance_from_side(&trajectory, WHOLE).to_string(), "20.00");
    }
}
