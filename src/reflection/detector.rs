//! Kinematic reflection classifier.
//!
//! Every consecutive triple of samples `(t0, t1, t2)` is scored by the speed of
//! the second segment and by how sharply the heading turns between the two
//! segments. The index of `t2` is reported when the pair falls past one of two
//! calibrated decision boundaries. The coefficients are empirical and must not
//! be simplified.

use crate::math::heading_deg;
use crate::metrics::TimeWindow;
use crate::trajectory::Trajectory;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Confidence that a sample follows a reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Severity {
    /// Lower confidence.
    Concern,
    /// Higher confidence.
    Problem,
}

/// Classify a segment speed (cm/s) and turn angle (degrees in `[0, 180]`).
#[must_use]
pub fn classify(speed: f64, angle_diff: f64) -> Option<Severity> {
    if (7.0 / 9.0) * (90.0 - angle_diff).abs() + (5.0 / 9.0) * angle_diff - speed < -180.0 {
        Some(Severity::Problem)
    } else if (19.0 / 18.0) * (90.0 - angle_diff).abs() + (17.0 / 18.0) * angle_diff - speed
        < -155.0
    {
        Some(Severity::Concern)
    } else {
        None
    }
}

/// Flagged sample indices, in ascending order per tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReflectionPoints {
    /// Lower confidence indices.
    pub concern: Vec<usize>,
    /// Higher confidence indices.
    pub problem: Vec<usize>,
}

impl ReflectionPoints {
    /// Concern indices followed by problem indices.
    #[must_use]
    pub fn all(&self) -> Vec<usize> {
        self.concern.iter().chain(&self.problem).copied().collect()
    }

    /// Total number of flagged indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.concern.len() + self.problem.len()
    }

    /// Returns `true` if nothing was flagged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.concern.is_empty() && self.problem.is_empty()
    }
}

/// Number of flagged samples inside a time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReflectionCounts {
    pub concern: usize,
    pub problem: usize,
}

impl ReflectionCounts {
    /// Sum of both tiers.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.concern + self.problem
    }
}

/// Scan the whole trajectory, calling `flag` for every flagged triple end.
fn scan(trajectory: &Trajectory, mut flag: impl FnMut(usize, Severity)) {
    if trajectory.len() < 3 {
        return;
    }
    let resolution = trajectory.resolution();
    let mut p1 = trajectory.position(1);
    let mut t1 = trajectory.timestamp(1);
    let mut angle1 = heading_deg(&trajectory.position(0), &p1) + 180.0;

    for index in 2..trajectory.len() {
        let p2 = trajectory.position(index);
        let t2 = trajectory.timestamp(index);
        let angle2 = heading_deg(&p1, &p2) + 180.0;

        let dt = t2 - t1;
        if dt > 0.0 {
            let speed = (p2 - p1).norm() / (resolution * dt / 1000.0);
            let angle_diff = 180.0 - ((angle2 - angle1).abs() - 180.0).abs();
            if let Some(severity) = classify(speed, angle_diff) {
                flag(index, severity);
            }
        }

        p1 = p2;
        t1 = t2;
        angle1 = angle2;
    }
}

/// Flag suspected reflections over the whole trajectory.
#[must_use]
pub fn detect(trajectory: &Trajectory) -> ReflectionPoints {
    let mut points = ReflectionPoints::default();
    scan(trajectory, |index, severity| match severity {
        Severity::Concern => points.concern.push(index),
        Severity::Problem => points.problem.push(index),
    });
    points
}

/// Count flagged samples whose timestamp lies in `window`.
///
/// The scan still covers the whole trajectory so samples at the window edges
/// keep their neighbours.
#[must_use]
pub fn count_in_window(trajectory: &Trajectory, window: TimeWindow) -> ReflectionCounts {
    let mut counts = ReflectionCounts::default();
    scan(trajectory, |index, severity| {
        if window.contains_ms(trajectory.timestamp(index)) {
            match severity {
                Severity::Concern => counts.concern += 1,
                Severity::Problem => counts.problem += 1,
            }
        }
    });
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use crate::trajectory::test_support::{constants, room_track};

    fn reflected_line() -> Trajectory {
        let mut points: Vec<(f64, f64, i32)> =
            (0..10).map(|i| (100.0 + 120.0 * i as f64, 500.0, 0)).collect();
        // mirror of sample 4 across sample 3
        points[5] = (2.0 * points[3].0 - points[4].0, 500.0, 0);
        room_track(Task::OpenField, constants(10.0, (0.0, 0.0), 1000.0), 100.0, &points)
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(0.0, 0.0), None);
        // straight motion: problem above 250 cm/s
        assert_eq!(classify(249.0, 0.0), None);
        assert_eq!(classify(251.0, 0.0), Some(Severity::Problem));
        // reversal: problem above 350 cm/s
        assert_eq!(classify(349.0, 180.0), None);
        assert_eq!(classify(351.0, 180.0), Some(Severity::Problem));
        assert_eq!(classify(231.0, 90.0), Some(Severity::Problem));
    }

    #[test]
    fn test_reflection_flagged_after_jump() {
        let points = detect(&reflected_line());
        assert_eq!(points.problem, vec![6]);
        assert!(points.concern.is_empty());
        assert_eq!(points.all(), vec![6]);
    }

    #[test]
    fn test_clean_line_has_no_points() {
        let points: Vec<_> = (0..10).map(|i| (100.0 + 120.0 * i as f64, 500.0, 0)).collect();
        let trajectory =
            room_track(Task::OpenField, constants(10.0, (0.0, 0.0), 1000.0), 100.0, &points);
        assert!(detect(&trajectory).is_empty());
    }

    #[test]
    fn test_short_trajectory() {
        let trajectory = room_track(
            Task::OpenField,
            constants(10.0, (0.0, 0.0), 1000.0),
            100.0,
            &[(1.0, 1.0, 0), (900.0, 900.0, 0)],
        );
        assert!(detect(&trajectory).is_empty());
    }

    #[test]
    fn test_count_in_window() {
        let trajectory = reflected_line();
        // sample 6 is at 600 ms = 0.01 min
        let counts = count_in_window(&trajectory, TimeWindow::new(0.0, 0.01));
        assert_eq!(counts.problem, 1);
        let counts = count_in_window(&trajectory, TimeWindow::new(0.0, 0.005));
        assert_eq!(counts.total(), 0);
    }
}
