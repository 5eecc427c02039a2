//! Robot avoidance metrics.
//!
//! The room slot of a robot avoidance record holds the robot, the arena slot
//! the rat.

use crate::math::median;
use crate::record::Slot;
use crate::trajectory::Trajectory;

use super::zones::reaction_shocks;
use super::{before_end, MetricValue, TimeWindow};

/// Rat to robot distances in pixels.
fn robot_distances(trajectory: &Trajectory, window: TimeWindow) -> Vec<f64> {
    before_end(trajectory, window)
        .map(|(_, r)| (r.position(Slot::Room) - r.position(Slot::Arena)).norm())
        .collect()
}

/// Mean distance (cm) between the rat and the robot.
#[must_use]
pub fn distance_from_robot(trajectory: &Trajectory, window: TimeWindow) -> MetricValue {
    let distances = robot_distances(trajectory, window);
    if distances.is_empty() {
        return MetricValue::Na;
    }
    let mean = distances.iter().sum::<f64>() / distances.len() as f64;
    MetricValue::number(mean / trajectory.resolution(), 2)
}

/// Share of time spent in each `width` cm bracket of rat to robot distance.
///
/// Brackets cover the arena diameter; larger distances fall into the last one.
#[must_use]
pub fn distance_boxes(trajectory: &Trajectory, window: TimeWindow, width: f64) -> MetricValue {
    if width.is_nan() || width <= 0.0 {
        return MetricValue::Na;
    }
    let count = ((trajectory.constants().arena_diameter * 100.0 / width).ceil() as usize).max(1);
    let mut boxes = vec![0.0; count];
    for distance in robot_distances(trajectory, window) {
        let slot = ((distance / trajectory.resolution() / width).floor() as usize).min(count - 1);
        boxes[slot] += 1.0;
    }
    MetricValue::proportions(&boxes, 3)
}

/// Median speed (cm/s) of the rat between each reaction shock and the record
/// `after` records later.
#[must_use]
pub fn speed_after_shock(
    trajectory: &Trajectory,
    window: TimeWindow,
    after: usize,
) -> MetricValue {
    let speeds: Vec<f64> = reaction_shocks(trajectory, window, after)
        .into_iter()
        .take_while(|&shock| shock + after < trajectory.len())
        .map(|shock| trajectory.speed_between(shock, shock + after))
        .collect();
    median(&speeds).map_or(MetricValue::Na, |m| MetricValue::number(m, 2))
}
