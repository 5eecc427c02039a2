//! Metrics on the zone/state field: shocks, entrances and time to events.
//!
//! A shock episode starts at the first record in state [`ZoneState::Shock`].
//! What ends an episode differs: for shock counts any state except a bad spot,
//! for entrances only a return to [`ZoneState::OutsideSector`], and for the
//! avoided time a move outside the sector (refractory or not).

use crate::config::LastTime;
use crate::math::{median, signed_bearing_change};
use crate::record::ZoneState;
use crate::trajectory::Trajectory;

use super::{before_end, through_end, MetricValue, TimeWindow};

/// Indices of episode starts in the window.
fn episode_starts(
    trajectory: &Trajectory,
    window: TimeWindow,
    ends_episode: impl Fn(ZoneState) -> bool,
) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut inside = false;
    for (index, record) in through_end(trajectory, window) {
        let state = record.state();
        if state.is_shock() {
            if !inside {
                starts.push(index);
                inside = true;
            }
        } else if inside && ends_episode(state) {
            inside = false;
        }
    }
    starts
}

/// Record indices of shock onsets in the window.
#[must_use]
pub fn shock_indices(trajectory: &Trajectory, window: TimeWindow) -> Vec<usize> {
    episode_starts(trajectory, window, |state| state != ZoneState::BadSpot)
}

/// Number of shocks.
#[must_use]
pub fn shocks(trajectory: &Trajectory, window: TimeWindow) -> MetricValue {
    MetricValue::Count(shock_indices(trajectory, window).len())
}

/// Number of entrances into the reinforced sector.
#[must_use]
pub fn entrances(trajectory: &Trajectory, window: TimeWindow) -> MetricValue {
    let starts = episode_starts(trajectory, window, |state| {
        state == ZoneState::OutsideSector
    });
    MetricValue::Count(starts.len())
}

/// Longest interval in seconds without a shock.
///
/// Intervals are measured from the window start or from the moment the
/// subject left the sector after a shock.
#[must_use]
pub fn max_time_avoided(
    trajectory: &Trajectory,
    window: TimeWindow,
    last_time: LastTime,
) -> MetricValue {
    let start = trajectory.find_start(window.start_minutes);
    let end = window.end_ms();
    let mut max_t: f64 = 0.0;
    let mut since = window.start_ms();
    let mut inside = false;
    let mut final_time = trajectory.real_max_time();

    for record in &trajectory.records()[start..] {
        if record.timestamp > end {
            final_time = record.timestamp;
            break;
        }
        let state = record.state();
        if state.is_shock() {
            if !inside {
                max_t = max_t.max(record.timestamp - since);
                inside = true;
            }
        } else if inside
            && matches!(state, ZoneState::OutsideSector | ZoneState::OutsideRefractory)
        {
            inside = false;
            since = record.timestamp;
        }
    }

    let tail = match last_time {
        LastTime::FromParameter => end - since,
        LastTime::FromData => (final_time - since).min(window.length_ms()),
    };
    MetricValue::number(max_t.max(tail) / 1000.0, 1)
}

/// Seconds from the window start to the first record matching `is_event`.
///
/// An event found at the window start or after the window end counts as no
/// event, in which case the window length (or the recorded part of it) is
/// reported.
#[must_use]
pub fn time_to_event(
    trajectory: &Trajectory,
    window: TimeWindow,
    last_time: LastTime,
    is_event: impl Fn(ZoneState) -> bool,
) -> MetricValue {
    let start = trajectory.find_start(window.start_minutes);
    let found = trajectory.records()[start..]
        .iter()
        .find(|r| is_event(r.state()))
        .map(|r| r.timestamp - window.start_ms());
    finish_time_to_event(trajectory, window, last_time, found)
}

/// Report a time to event in seconds, applying the end-of-session policy.
pub(crate) fn finish_time_to_event(
    trajectory: &Trajectory,
    window: TimeWindow,
    last_time: LastTime,
    found: Option<f64>,
) -> MetricValue {
    let elapsed = match found {
        Some(t) if t != 0.0 && t <= window.length_ms() => t,
        _ => match last_time {
            LastTime::FromParameter => window.length_ms(),
            LastTime::FromData => {
                window.end_ms().min(trajectory.real_max_time()) - window.start_ms()
            }
        },
    };
    MetricValue::number(elapsed / 1000.0, 1)
}

/// Seconds to the first shock.
#[must_use]
pub fn time_to_first_shock(
    trajectory: &Trajectory,
    window: TimeWindow,
    last_time: LastTime,
) -> MetricValue {
    time_to_event(trajectory, window, last_time, ZoneState::is_shock)
}

/// Shocks that start a reaction period: the first one and every one more than
/// `after` records past the previous shock record.
pub(crate) fn reaction_shocks(
    trajectory: &Trajectory,
    window: TimeWindow,
    after: usize,
) -> Vec<usize> {
    let shocks: Vec<usize> = before_end(trajectory, window)
        .filter(|(_, r)| r.state().is_shock())
        .map(|(i, _)| i)
        .collect();
    let Some(&first) = shocks.first() else {
        return Vec::new();
    };
    let mut selected = vec![first];
    for pair in shocks.windows(2) {
        if pair[1] - pair[0] > after {
            selected.push(pair[1]);
        }
    }
    selected
}

/// Median change (degrees) of the bearing around the center between each
/// reaction shock and the record `after` records later.
#[must_use]
pub fn angle_after_shock(
    trajectory: &Trajectory,
    window: TimeWindow,
    after: usize,
    absolute: bool,
) -> MetricValue {
    let center = trajectory.center();
    let angles: Vec<f64> = reaction_shocks(trajectory, window, after)
        .into_iter()
        .take_while(|&shock| shock + after < trajectory.len())
        .map(|shock| {
            let angle = signed_bearing_change(
                &center,
                &trajectory.position(shock),
                &trajectory.position(shock + after),
            );
            if absolute {
                angle.abs()
            } else {
                angle
            }
        })
        .collect();
    median(&angles).map_or(MetricValue::Na, |m| MetricValue::number(m, 2))
}
