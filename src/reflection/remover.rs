//! Reflection repair.
//!
//! A flagged index marks the sample right after the anomalous jump, so the
//! repair starts at its predecessor. Around every such sample a bad span is
//! grown until it is bounded by kinematically plausible samples, and the span
//! is replaced by a linear interpolation between those bounds. A span that
//! runs off the end of the trajectory is backfilled with the sample before it.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use crate::math::{interpolate, speed_cm_s, Position};
use crate::record::{Record, Slot};
use crate::task::Task;
use crate::trajectory::Trajectory;

use super::detector::detect;

/// Speed ratio by which a candidate must be closer to the reflection than to
/// the last good sample to be absorbed into the span.
pub const REFLECTION_SPEED_RATIO: f64 = 30.0;

/// Rat-robot distance (pixels) below which a robot avoidance sample is repaired.
pub const ROBOT_CONTACT_DISTANCE: f64 = 8.0;

/// Options of [`remove_reflections`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalOptions {
    /// Flagged indices; `None` runs the detector.
    pub points: Option<Vec<usize>>,
    /// Also repair samples whose exact position repeats among the suspects.
    pub delete_same: bool,
    /// Repair every tracked frame in lockstep; `None` uses the task default.
    pub symmetric: Option<bool>,
}

impl Default for RemovalOptions {
    fn default() -> Self {
        Self {
            points: None,
            delete_same: true,
            symmetric: None,
        }
    }
}

impl RemovalOptions {
    /// Repair the given flagged indices.
    #[must_use]
    pub fn with_points(points: Vec<usize>) -> Self {
        Self {
            points: Some(points),
            ..Self::default()
        }
    }
}

/// What a removal pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalSummary {
    /// Samples initially scheduled for repair.
    pub scheduled: usize,
    /// Repaired spans.
    pub spans: usize,
    /// Indices whose position was rewritten, ascending.
    pub repaired: Vec<usize>,
}

/// Flagged indices used when the caller gives none.
///
/// Robot avoidance additionally schedules every sample where the rat and the
/// robot are closer than [`ROBOT_CONTACT_DISTANCE`].
#[must_use]
pub fn default_points(trajectory: &Trajectory) -> Vec<usize> {
    let mut points = detect(trajectory).all();
    if trajectory.task() == Task::RobotAvoidance {
        points.extend(trajectory.records().iter().enumerate().filter_map(|(i, r)| {
            let gap = (r.position(Slot::Room) - r.position(Slot::Arena)).norm();
            (gap < ROBOT_CONTACT_DISTANCE).then_some(i + 1)
        }));
    }
    points
}

/// Positions among `rows` that occur at least twice in `slot`.
fn repeated_positions(records: &[Record], rows: &BTreeSet<usize>, slot: Slot) -> HashSet<[u64; 2]> {
    let mut seen: HashMap<[u64; 2], usize> = HashMap::new();
    for &row in rows {
        *seen.entry(position_key(&records[row].position(slot))).or_default() += 1;
    }
    seen.into_iter()
        .filter_map(|(key, count)| (count > 1).then_some(key))
        .collect()
}

fn position_key(p: &Position) -> [u64; 2] {
    [p.x.to_bits(), p.y.to_bits()]
}

fn record_speed(a: &Record, b: &Record, slot: Slot, resolution: f64) -> f64 {
    let distance = (a.position(slot) - b.position(slot)).norm();
    speed_cm_s(distance, (b.timestamp - a.timestamp).abs(), resolution)
}

/// Repair suspected reflections in place.
///
/// Every rewritten index ends up in the trajectory's interpolated set.
pub fn remove_reflections(trajectory: &mut Trajectory, options: &RemovalOptions) -> RemovalSummary {
    let points = options
        .points
        .clone()
        .unwrap_or_else(|| default_points(trajectory));
    let len = trajectory.len();
    let mut worklist: BTreeSet<usize> = points
        .iter()
        .filter_map(|&p| p.checked_sub(1))
        .filter(|&row| row < len)
        .collect();

    let task = trajectory.task();
    if options.delete_same && !worklist.is_empty() {
        let records = trajectory.records();
        let repeated: Vec<(Slot, HashSet<[u64; 2]>)> = task
            .same_position_slots()
            .iter()
            .map(|&slot| (slot, repeated_positions(records, &worklist, slot)))
            .collect();
        let extra: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                repeated
                    .iter()
                    .any(|(slot, set)| set.contains(&position_key(&r.position(*slot))))
            })
            .map(|(i, _)| i)
            .collect();
        worklist.extend(extra);
    }

    let mut summary = RemovalSummary {
        scheduled: worklist.len(),
        ..RemovalSummary::default()
    };
    let symmetric = options
        .symmetric
        .unwrap_or_else(|| task.default_symmetric_removal());
    let primary_only = [task.primary_slot()];
    let slots: &[Slot] = if symmetric {
        task.tracked_slots()
    } else {
        &primary_only
    };

    while let Some(row) = worklist.pop_first() {
        let span = repair_span(trajectory, row, &worklist, slots);
        for &index in &span {
            worklist.remove(&index);
            trajectory.interpolated_mut().insert(index);
        }
        summary.spans += 1;
        summary.repaired.extend(span);
    }
    summary.repaired.sort_unstable();
    summary.repaired.dedup();

    info!(
        task = task.code(),
        scheduled = summary.scheduled,
        spans = summary.spans,
        repaired = summary.repaired.len(),
        "removed reflections"
    );
    summary
}

fn set_positions(
    trajectory: &mut Trajectory,
    index: usize,
    slots: &[Slot],
    position: impl Fn(Slot) -> Position,
) {
    let record = &mut trajectory.records_mut()[index];
    for &slot in slots {
        record.set_position(slot, position(slot));
    }
}

/// Repair the span around `row` and return the rewritten indices.
fn repair_span(
    trajectory: &mut Trajectory,
    row: usize,
    worklist: &BTreeSet<usize>,
    slots: &[Slot],
) -> Vec<usize> {
    let task = trajectory.task();
    let len = trajectory.len();

    let mut start = row;
    while start > 0 && trajectory.is_interpolated(start - 1) {
        start -= 1;
    }

    let before_id = start.checked_sub(1);
    let reflection = trajectory.records()[row];
    let after_id = {
        let records = trajectory.records();
        let before = before_id.map(|b| records[b]);
        let primary = task.primary_slot();
        let ceiling = task.removal_speed_ceiling();
        let resolution = trajectory.resolution();
        let absorbed = |c: usize| {
            let candidate = &records[c];
            let implausible = before.is_some_and(|before| {
                let from_before = record_speed(&before, candidate, primary, resolution);
                from_before > ceiling
                    || record_speed(&reflection, candidate, primary, resolution)
                        * REFLECTION_SPEED_RATIO
                        < from_before
            });
            worklist.contains(&c)
                || implausible
                || task
                    .same_position_slots()
                    .iter()
                    .any(|&slot| candidate.position(slot) == reflection.position(slot))
                || trajectory.is_interpolated(c)
        };
        (row + 1..len).find(|&c| !absorbed(c))
    };

    let Some(before_id) = before_id else {
        // nothing good precedes the span: hold the first plausible sample after it
        let Some(after_id) = after_id else {
            return Vec::new();
        };
        let after = trajectory.records()[after_id];
        for index in 0..after_id {
            set_positions(trajectory, index, slots, |slot| after.position(slot));
        }
        debug!(row, after_id, "held span at trajectory start");
        return (0..after_id).collect();
    };
    let before = trajectory.records()[before_id];

    let Some(after_id) = after_id else {
        for index in before_id + 1..len {
            set_positions(trajectory, index, slots, |slot| before.position(slot));
        }
        debug!(row, before_id, "backfilled span at trajectory end");
        return (before_id + 1..len).collect();
    };

    let after = trajectory.records()[after_id];
    let steps = after_id - before_id;
    for index in before_id + 1..after_id {
        set_positions(trajectory, index, slots, |slot| {
            interpolate(
                &before.position(slot),
                &after.position(slot),
                steps,
                index - before_id,
            )
        });
    }
    (before_id + 1..after_id).collect()
}
