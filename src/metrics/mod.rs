//! Time-windowed behavioral metrics.
//!
//! Every metric reduces the records of a [`TimeWindow`] of a cleaned
//! [`Trajectory`] to a [`MetricValue`]. Reductions start at
//! [`Trajectory::find_start`] of the window start and use the tracked subject's
//! position ([`Trajectory::primary_slot`]). Insufficient data yields
//! [`MetricValue::Na`], never an error.
//!
//! This module provides:
//! - [`distance`]: travelled distance and distance from the arena center
//! - [`zones`]: shock, entrance and time-to-event metrics on the state field
//! - [`sectors`]: angular occupancy, thigmotaxis and circular statistics
//! - [`mobility`]: smoothed speed series, immobility, periodicity, rotation
//! - [`strategy`]: movement strategy classification
//! - [`quality`]: data quality and session extent
//! - [`water_maze`], [`open_field`], [`robot`]: task-specific metrics
//! - [`registry`]: the per-task metric catalogue

pub mod distance;
pub mod mobility;
pub mod open_field;
pub mod quality;
pub mod registry;
pub mod robot;
pub mod sectors;
pub mod strategy;
pub mod value;
pub mod water_maze;
pub mod window;
pub mod zones;

pub use registry::Metric;
pub use strategy::{Strategy, StrategyPeriod, StrategyTimeline};
pub use value::MetricValue;
pub use window::TimeWindow;

use crate::record::Record;
use crate::trajectory::Trajectory;

/// Records from the window start while `timestamp <= end`.
pub(crate) fn through_end(
    trajectory: &Trajectory,
    window: TimeWindow,
) -> impl Iterator<Item = (usize, &Record)> + '_ {
    let start = trajectory.find_start(window.start_minutes);
    let end = window.end_ms();
    trajectory
        .records()
        .iter()
        .enumerate()
        .skip(start)
        .take_while(move |(_, r)| r.timestamp <= end)
}

/// Records from the window start while `timestamp < end`.
pub(crate) fn before_end(
    trajectory: &Trajectory,
    window: TimeWindow,
) -> impl Iterator<Item = (usize, &Record)> + '_ {
    let start = trajectory.find_start(window.start_minutes);
    let end = window.end_ms();
    trajectory
        .records()
        .iter()
        .enumerate()
        .skip(start)
        .take_while(move |(_, r)| r.timestamp < end)
}
