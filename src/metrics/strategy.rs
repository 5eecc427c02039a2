//! Movement strategy classification.
//!
//! The window is cut into bins of a fixed number of records. A bin that starts
//! at a shock is classified by the angular speed around the center (reaction
//! strategies); any other bin by its linear speed, the direction of travel
//! around the center and whether it touches the central disk. A bin that
//! would run into the next shock is truncated at it. Consecutive bins with
//! the same strategy are merged into one period.

use std::collections::VecDeque;
use std::fmt;

use crate::config::StrategyParams;
use crate::math::{signed_bearing_change, speed_cm_s};
use crate::trajectory::Trajectory;

use super::zones::shock_indices;
use super::{MetricValue, TimeWindow};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Behavior in one bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Turned counterclockwise after a shock.
    ReactionCounterclockwise,
    /// Turned clockwise after a shock.
    ReactionClockwise,
    /// Did not turn after a shock.
    NoReaction,
    /// Moved counterclockwise along the wall.
    Counterclockwise,
    /// Moved clockwise along the wall.
    Clockwise,
    /// Did not move.
    Immobile,
    /// Moved through the central disk.
    Center,
}

impl Strategy {
    /// All strategies in reporting order.
    pub const ALL: [Self; 7] = [
        Self::ReactionCounterclockwise,
        Self::ReactionClockwise,
        Self::NoReaction,
        Self::Counterclockwise,
        Self::Clockwise,
        Self::Immobile,
        Self::Center,
    ];

    /// Identifier of the strategy.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReactionCounterclockwise => "reaction_counterclockwise",
            Self::ReactionClockwise => "reaction_clockwise",
            Self::NoReaction => "no_reaction",
            Self::Counterclockwise => "counterclockwise",
            Self::Clockwise => "clockwise",
            Self::Immobile => "immobile",
            Self::Center => "center",
        }
    }

    /// Parse an identifier.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stretch of time with one strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrategyPeriod {
    pub strategy: Strategy,
    /// Start in ms.
    pub start_ms: f64,
    /// End in ms.
    pub end_ms: f64,
}

impl StrategyPeriod {
    /// Duration in ms.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }
}

/// Strategy periods of a window, in time order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrategyTimeline {
    pub periods: Vec<StrategyPeriod>,
}

impl StrategyTimeline {
    /// Total time (ms) spent in `strategy`.
    #[must_use]
    pub fn total_ms(&self, strategy: Strategy) -> f64 {
        self.periods
            .iter()
            .filter(|p| p.strategy == strategy)
            .map(StrategyPeriod::duration_ms)
            .sum()
    }

    /// Share of classified time per strategy, in [`Strategy::ALL`] order.
    #[must_use]
    pub fn summary(&self) -> MetricValue {
        let times: Vec<f64> = Strategy::ALL.iter().map(|&s| self.total_ms(s)).collect();
        MetricValue::proportions(&times, 4)
    }
}

/// Classify the reaction between a shock at `i0` and record `i1`.
#[must_use]
pub fn classify_after_shock(
    trajectory: &Trajectory,
    i0: usize,
    i1: usize,
    min_angle: f64,
) -> Strategy {
    let angle = signed_bearing_change(
        &trajectory.center(),
        &trajectory.position(i0),
        &trajectory.position(i1),
    );
    let dt = trajectory.timestamp(i1) - trajectory.timestamp(i0);
    let angular_speed = if dt == 0.0 { 0.0 } else { angle * 1000.0 / dt };
    if angular_speed > min_angle {
        Strategy::ReactionCounterclockwise
    } else if angular_speed < -min_angle {
        Strategy::ReactionClockwise
    } else {
        Strategy::NoReaction
    }
}

/// Classify the movement between records `i0` and `i1` without a shock.
#[must_use]
pub fn classify_movement(
    trajectory: &Trajectory,
    i0: usize,
    i1: usize,
    min_speed: f64,
    border_percent: f64,
) -> Strategy {
    let (p0, p1) = (trajectory.position(i0), trajectory.position(i1));
    let dt = trajectory.timestamp(i1) - trajectory.timestamp(i0);
    let speed = speed_cm_s((p1 - p0).norm(), dt, trajectory.resolution());
    if speed <= min_speed {
        return Strategy::Immobile;
    }

    let center = trajectory.center();
    let border = trajectory.radius() * (1.0 - border_percent / 100.0);
    if (i0..=i1).any(|i| (trajectory.position(i) - center).norm() < border) {
        return Strategy::Center;
    }
    let angle = signed_bearing_change(&center, &p0, &p1);
    if angle > 0.0 {
        Strategy::Counterclockwise
    } else if angle < 0.0 {
        Strategy::Clockwise
    } else {
        Strategy::Immobile
    }
}

/// Classify the window into strategy periods.
///
/// Returns `None` when the window holds no record or `params.rows` is zero.
#[must_use]
pub fn strategies(
    trajectory: &Trajectory,
    window: TimeWindow,
    params: &StrategyParams,
) -> Option<StrategyTimeline> {
    let rows = params.rows;
    let last = trajectory.len().checked_sub(1)?;
    let i0 = trajectory.find_start(window.start_minutes);
    if rows == 0 || i0 > last {
        return None;
    }
    let i1 = trajectory.find_start(window.end_minutes).min(last);
    let at = |i: usize| i.min(last);
    let time_before = |i: usize| trajectory.timestamp(at(i.saturating_sub(1)));
    let after_shock =
        |a: usize, b: usize| classify_after_shock(trajectory, at(a), at(b), params.min_angle);
    let movement = |a: usize, b: usize| {
        classify_movement(trajectory, at(a), at(b), params.min_speed, params.border_percent)
    };

    let no_shock = i1 + 2 * rows + 2;
    let mut shocks: VecDeque<usize> = shock_indices(trajectory, window).into();
    let mut next_shock = shocks.pop_front().unwrap_or(no_shock);

    let mut current = if i0 < next_shock && next_shock < i0 + rows {
        movement(i0, next_shock)
    } else if i0 == next_shock {
        after_shock(i0, i0 + rows)
    } else {
        movement(i0, i0 + rows)
    };
    let mut beginning = trajectory.timestamp(i0);
    let mut timeline = StrategyTimeline::default();

    let mut i = i0;
    let end = i1.saturating_sub(rows);
    while i < end {
        let mut truncated = false;
        let strategy = if i == next_shock {
            next_shock = shocks.pop_front().unwrap_or(no_shock);
            if next_shock < i + rows {
                truncated = true;
                after_shock(i, next_shock)
            } else {
                after_shock(i, i + rows)
            }
        } else if i + 2 * rows > next_shock {
            truncated = true;
            movement(i, next_shock)
        } else {
            movement(i, i + rows)
        };

        if strategy != current {
            let t = time_before(i);
            timeline.periods.push(StrategyPeriod {
                strategy: current,
                start_ms: beginning,
                end_ms: t,
            });
            beginning = t;
        }
        current = strategy;
        i = if truncated && next_shock > i {
            next_shock
        } else {
            i + rows
        };
    }

    timeline.periods.push(StrategyPeriod {
        strategy: current,
        start_ms: beginning,
        end_ms: time_before(i1),
    });
    Some(timeline)
}

/// Share of time per strategy, pipe-joined in [`Strategy::ALL`] order.
#[must_use]
pub fn strategy_summary(
    trajectory: &Trajectory,
    window: TimeWindow,
    params: &StrategyParams,
) -> MetricValue {
    strategies(trajectory, window, params).map_or(MetricValue::Na, |t| t.summary())
}

/// Time in the numerator strategies divided by time in the denominator strategies.
#[must_use]
pub fn proportion_of_strategies(
    trajectory: &Trajectory,
    window: TimeWindow,
    params: &StrategyParams,
) -> MetricValue {
    let Some(timeline) = strategies(trajectory, window, params) else {
        return MetricValue::Na;
    };
    let sum = |set: &[Strategy]| set.iter().map(|&s| timeline.total_ms(s)).sum::<f64>();
    let denominator = sum(&params.denominator);
    if denominator == 0.0 {
        return MetricValue::Na;
    }
    MetricValue::number(sum(&params.numerator) / denominator, 3)
}
