//! Morris water maze metrics.
//!
//! State codes of a water maze log: `0` swimming, `1` crossing the platform,
//! `2`/`3` on the platform, `5` a bad spot.

use crate::config::{AvgDistanceParams, LastTime};
use crate::math::{round_to, Position};
use crate::record::ZoneState;
use crate::trajectory::{Trajectory, MS_PER_MINUTE};

use super::distance::travelled_px;
use super::zones::{finish_time_to_event, time_to_event};
use super::{through_end, MetricValue, TimeWindow};

fn on_platform(state: ZoneState) -> bool {
    matches!(state.code(), 2 | 3)
}

fn in_platform_zone(state: ZoneState) -> bool {
    state.code() > 0 && state != ZoneState::BadSpot
}

/// Seconds to the first record on the platform.
#[must_use]
pub fn time_to_platform(
    trajectory: &Trajectory,
    window: TimeWindow,
    last_time: LastTime,
) -> MetricValue {
    time_to_event(trajectory, window, last_time, on_platform)
}

/// Seconds to the first pass through the platform zone.
#[must_use]
pub fn time_to_first_pass(
    trajectory: &Trajectory,
    window: TimeWindow,
    last_time: LastTime,
) -> MetricValue {
    time_to_event(trajectory, window, last_time, in_platform_zone)
}

/// Seconds to the first stay near the platform.
///
/// A stay starts when the subject crosses the platform and lasts while it
/// remains within `adjustment` platform radii of it; it counts once it has
/// lasted the session's entrance latency. Reaching the platform counts
/// immediately.
#[must_use]
pub fn time_to_first_stay(
    trajectory: &Trajectory,
    window: TimeWindow,
    adjustment: f64,
    last_time: LastTime,
) -> MetricValue {
    let Some((platform, platform_radius)) = trajectory.constants().platform() else {
        return MetricValue::Na;
    };
    let latency = trajectory.constants().entrance_latency;
    let vicinity = platform_radius * adjustment;
    let start = trajectory.find_start(window.start_minutes);
    let slot = trajectory.primary_slot();

    let mut pass_time: Option<f64> = None;
    let mut found = None;
    for record in &trajectory.records()[start..] {
        let t = record.timestamp;
        match record.state().code() {
            0 => {
                if let Some(since) = pass_time {
                    if (record.position(slot) - platform).norm() < vicinity {
                        if t - since >= latency {
                            found = Some(t);
                            break;
                        }
                    } else {
                        pass_time = None;
                    }
                }
            }
            2 | 3 => {
                found = Some(t);
                break;
            }
            1 => match pass_time {
                None => pass_time = Some(t),
                Some(since) if t - since >= latency => {
                    found = Some(t);
                    break;
                }
                Some(_) => {}
            },
            _ => {}
        }
    }
    let found = found.map(|t| t - window.start_ms());
    finish_time_to_event(trajectory, window, last_time, found)
}

/// Number of passes through the platform zone.
#[must_use]
pub fn passes(trajectory: &Trajectory, window: TimeWindow) -> MetricValue {
    let mut count = 0;
    let mut inside = false;
    for (_, record) in through_end(trajectory, window) {
        let state = record.state();
        if state == ZoneState::OutsideSector {
            inside = false;
        } else if in_platform_zone(state) && !inside {
            count += 1;
            inside = true;
        }
    }
    MetricValue::Count(count)
}

/// Minutes after the session start the subject would need to swim from its
/// first position to the edge of the platform at its speed before the first
/// pass.
fn time_to_reach(
    trajectory: &Trajectory,
    window: TimeWindow,
    target: &Position,
    platform_radius: f64,
    params: &AvgDistanceParams,
) -> f64 {
    let start = trajectory.find_start(window.start_minutes);
    let first_pass = trajectory.records()[start..]
        .iter()
        .find(|r| matches!(r.state().code(), 1 | 2))
        .map(|r| r.timestamp - window.start_ms());
    let t1 = match first_pass {
        Some(t) if t != 0.0 && t <= window.length_ms() => t,
        _ => window.end_ms().min(trajectory.real_max_time()) - window.start_ms(),
    };

    let beginning = trajectory.real_min_time() / MS_PER_MINUTE;
    let t = window.end_ms().min(t1);
    let swum = TimeWindow::new(beginning, t / MS_PER_MINUTE);
    let resolution = trajectory.resolution();
    let meters = round_to(
        travelled_px(trajectory, swum, params.stride, params.min_difference) / (resolution * 100.0),
        2,
    );
    let speed = meters * resolution * 100.0 / (t - beginning * MS_PER_MINUTE);
    let distance = (trajectory.position(0) - target).norm() - platform_radius;
    distance / (speed * MS_PER_MINUTE)
}

/// Mean distance (cm) from the edge of a platform-sized disk around `target`.
///
/// With `params.remove_beginning` the averaging starts only after the time the
/// subject needed to reach the target.
#[must_use]
pub fn avg_distance(
    trajectory: &Trajectory,
    window: TimeWindow,
    target: &Position,
    params: &AvgDistanceParams,
) -> MetricValue {
    let Some((_, platform_radius)) = trajectory.constants().platform() else {
        return MetricValue::Na;
    };

    let start = if params.remove_beginning {
        let reach = time_to_reach(trajectory, window, target, platform_radius, params);
        if !reach.is_finite() {
            return MetricValue::Na;
        }
        let beginning = trajectory.real_min_time() / MS_PER_MINUTE;
        trajectory.find_start((reach + beginning).max(window.start_minutes))
    } else {
        trajectory.find_start(window.start_minutes)
    };
    if start >= trajectory.len() {
        return MetricValue::Na;
    }

    let end = window.end_ms();
    let slot = trajectory.primary_slot();
    let mut sum = 0.0;
    let mut last = start;
    for (index, record) in trajectory.records().iter().enumerate().skip(start) {
        last = index;
        if record.timestamp > end {
            break;
        }
        let distance = (record.position(slot) - target).norm() - platform_radius;
        if distance > 0.0 {
            sum += distance;
        }
    }

    let samples = last - start;
    if samples == 0 {
        return MetricValue::Na;
    }
    MetricValue::number(sum / samples as f64 / trajectory.resolution(), 2)
}

/// Point at the platform's distance from the center, `angle` degrees from the platform.
#[must_use]
pub fn chosen_location(trajectory: &Trajectory, angle: f64) -> Option<Position> {
    let (platform, _) = trajectory.constants().platform()?;
    let center = trajectory.center();
    let distance = (center - platform).norm();
    let angle = (angle + trajectory.constants().center_angle).to_radians();
    Some(Position::new(
        center.x + angle.cos() * distance,
        center.y - angle.sin() * distance,
    ))
}

/// [`avg_distance`] from each chosen location in `angles`.
#[must_use]
pub fn avg_distance_chosen(
    trajectory: &Trajectory,
    window: TimeWindow,
    angles: &[f64],
    params: &AvgDistanceParams,
) -> MetricValue {
    let values = angles
        .iter()
        .map(|&angle| {
            chosen_location(trajectory, angle).map_or(MetricValue::Na, |target| {
                avg_distance(trajectory, window, &target, params)
            })
        })
        .collect();
    MetricValue::List(values)
}

/// Mean distance (cm) from the platform edge.
#[must_use]
pub fn avg_distance_from_platform(
    trajectory: &Trajectory,
    window: TimeWindow,
    params: &AvgDistanceParams,
) -> MetricValue {
    match trajectory.constants().platform() {
        Some((platform, _)) => avg_distance(trajectory, window, &platform, params),
        None => MetricValue::Na,
    }
}
