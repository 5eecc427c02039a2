//! Data quality and session extent.

use crate::reflection::count_in_window;
use crate::trajectory::Trajectory;

use super::{through_end, MetricValue, TimeWindow};

/// Percentage of records in the window whose position was synthesized.
#[must_use]
pub fn percent_bad_points(trajectory: &Trajectory, window: TimeWindow) -> MetricValue {
    let (count, bad) = through_end(trajectory, window).fold((0usize, 0usize), |(n, bad), (i, _)| {
        (n + 1, bad + usize::from(trajectory.is_interpolated(i)))
    });
    if count == 0 {
        return MetricValue::Na;
    }
    MetricValue::number(bad as f64 / count as f64 * 100.0, 2)
}

/// Number of reflection points (concern and problem) detected in the window.
#[must_use]
pub fn reflections(trajectory: &Trajectory, window: TimeWindow) -> MetricValue {
    MetricValue::Count(count_in_window(trajectory, window).total())
}

/// Number of records farther than `margin` pixels beyond the circular arena edge.
#[must_use]
pub fn outside_points(trajectory: &Trajectory, window: TimeWindow, margin: f64) -> MetricValue {
    let slot = trajectory.primary_slot();
    let center = trajectory.center();
    let limit = trajectory.radius() + margin;
    let outside = through_end(trajectory, window)
        .filter(|(_, r)| (r.position(slot) - center).norm() > limit)
        .count();
    MetricValue::Count(outside)
}

/// Timestamp (ms) of the first record.
#[must_use]
pub fn real_minimum_time(trajectory: &Trajectory) -> MetricValue {
    MetricValue::number(trajectory.real_min_time(), 0)
}

/// Timestamp (ms) of the last record.
#[must_use]
pub fn real_maximum_time(trajectory: &Trajectory) -> MetricValue {
    MetricValue::number(trajectory.real_max_time(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::task::Task;
    use crate::trajectory::test_support::{constants, room_track};

    const WHOLE: TimeWindow = TimeWindow::new(0.0, 1.0);

    #[test]
    fn test_percent_bad_points() {
        let points: Vec<_> = (0..8).map(|i| (50.0 + f64::from(i), 50.0, 0)).collect();
        let trajectory =
            room_track(Task::OpenField, constants(1.0, (50.0, 50.0), 40.0), 1000.0, &points);
        let interpolated: BTreeSet<usize> = [2, 3].into_iter().collect();
        let trajectory = Trajectory::from_parts(
            trajectory.task(),
            trajectory.constants().clone(),
            trajectory.records().to_vec(),
            interpolated,
        )
        .unwrap();
        assert_eq!(percent_bad_points(&trajectory, WHOLE).to_string(), "25.00");
        // records 2..=4 only
        let window = TimeWindow::new(1.5 / 60.0, 4.5 / 60.0);
        assert_eq!(percent_bad_points(&trajectory, window).to_string(), "66.67");
        assert!(percent_bad_points(&trajectory, TimeWindow::new(5.0, 6.0)).is_na());
    }

    #[test]
    fn test_outside_points() {
        let points = [(50.0, 50.0, 0), (90.5, 50.0, 0), (92.0, 50.0, 0), (50.0, 5.0, 0)];
        let trajectory =
            room_track(Task::CarouselMaze, constants(1.0, (50.0, 50.0), 40.0), 1000.0, &points);
        assert_eq!(outside_points(&trajectory, WHOLE, 1.0), MetricValue::Count(2));
        assert_eq!(outside_points(&trajectory, WHOLE, 0.0), MetricValue::Count(3));
    }

    #[test]
    fn test_real_times() {
        let points = [(0.0, 0.0, 0); 4];
        let trajectory =
            room_track(Task::CarouselMaze, constants(1.0, (0.0, 0.0), 40.0), 250.0, &points);
        assert_eq!(real_minimum_time(&trajectory).to_string(), "0");
        assert_eq!(real_maximum_time(&trajectory).to_string(), "750");
    }
}
