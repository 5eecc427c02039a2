//! Travelled distance and distance from the arena center.

use crate::trajectory::Trajectory;

use super::{before_end, MetricValue, TimeWindow};

/// Distance in pixels travelled over every `stride`-th record of the window.
///
/// Steps not longer than `min_difference` pixels are not counted but still
/// move the reference point.
#[must_use]
pub fn travelled_px(
    trajectory: &Trajectory,
    window: TimeWindow,
    stride: usize,
    min_difference: f64,
) -> f64 {
    let start = trajectory.find_start(window.start_minutes);
    if start >= trajectory.len() || stride == 0 {
        return 0.0;
    }
    let slot = trajectory.primary_slot();
    let end = window.end_ms();
    let mut previous = trajectory.position(start);
    let mut total = 0.0;
    for record in trajectory.records()[start..]
        .iter()
        .skip(stride)
        .step_by(stride)
        .take_while(|r| r.timestamp <= end)
    {
        let current = record.position(slot);
        let step = (current - previous).norm();
        if step > min_difference {
            total += step;
        }
        previous = current;
    }
    total
}

/// Total distance in meters.
#[must_use]
pub fn total_distance(
    trajectory: &Trajectory,
    window: TimeWindow,
    stride: usize,
    min_difference: f64,
) -> MetricValue {
    let px = travelled_px(trajectory, window, stride, min_difference);
    MetricValue::number(px / (trajectory.resolution() * 100.0), 2)
}

/// Mean distance from the arena center in centimeters.
#[must_use]
pub fn mean_distance_from_center(trajectory: &Trajectory, window: TimeWindow) -> MetricValue {
    let slot = trajectory.primary_slot();
    let center = trajectory.center();
    let (sum, count) = before_end(trajectory, window).fold((0.0, 0usize), |(sum, count), (_, r)| {
        (sum + (r.position(slot) - center).norm(), count + 1)
    });
    if count == 0 {
        return MetricValue::Na;
    }
    MetricValue::number(sum / trajectory.resolution() / count as f64, 2)
}
