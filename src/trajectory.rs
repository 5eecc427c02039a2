//! Loaded session trajectory.
//!
//! A [`Trajectory`] is a dense, index-addressable sequence of [`Record`]s
//! together with the session constants and the set of record indices whose
//! position was synthesized rather than measured.
//!
//! Invariants upheld by every constructor:
//! - the trajectory is non-empty;
//! - `records[i].frame == i`;
//! - every index in `interpolated` is a valid record index.

use std::collections::BTreeSet;

use crate::cache::FileKey;
use crate::error::{Result, TrackError};
use crate::header::SessionConstants;
use crate::math::{speed_cm_s, Position};
use crate::record::{Record, Slot};
use crate::task::Task;

/// Milliseconds per minute.
pub const MS_PER_MINUTE: f64 = 60_000.0;

/// A cleaned, densely indexed session.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    task: Task,
    source: Option<FileKey>,
    constants: SessionConstants,
    records: Vec<Record>,
    interpolated: BTreeSet<usize>,
}

impl Trajectory {
    /// Assemble a trajectory from already cleaned records.
    ///
    /// Frame indices are rewritten to `0..N-1` and interpolated indices
    /// outside the record range are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::EmptyTrajectory`] if `records` is empty.
    pub fn from_parts(
        task: Task,
        constants: SessionConstants,
        mut records: Vec<Record>,
        interpolated: BTreeSet<usize>,
    ) -> Result<Self> {
        if records.is_empty() {
            return Err(TrackError::EmptyTrajectory);
        }
        for (i, record) in records.iter_mut().enumerate() {
            record.frame = i;
        }
        let len = records.len();
        let interpolated = interpolated.into_iter().filter(|&i| i < len).collect();
        Ok(Self {
            task,
            source: None,
            constants,
            records,
            interpolated,
        })
    }

    #[must_use]
    pub(crate) fn with_source(mut self, source: FileKey) -> Self {
        self.source = Some(source);
        self
    }

    /// Task the session was recorded in.
    #[inline]
    #[must_use]
    pub const fn task(&self) -> Task {
        self.task
    }

    /// Files the trajectory was loaded from, if any.
    #[must_use]
    pub const fn source(&self) -> Option<&FileKey> {
        self.source.as_ref()
    }

    /// Session constants.
    #[inline]
    #[must_use]
    pub const fn constants(&self) -> &SessionConstants {
        &self.constants
    }

    /// All records.
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    /// Number of records (always at least one).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Indices of synthesized positions.
    #[must_use]
    pub const fn interpolated(&self) -> &BTreeSet<usize> {
        &self.interpolated
    }

    pub(crate) fn interpolated_mut(&mut self) -> &mut BTreeSet<usize> {
        &mut self.interpolated
    }

    /// Returns `true` if the position at `index` was synthesized.
    #[inline]
    #[must_use]
    pub fn is_interpolated(&self, index: usize) -> bool {
        self.interpolated.contains(&index)
    }

    /// Frame of the tracked subject.
    #[inline]
    #[must_use]
    pub const fn primary_slot(&self) -> Slot {
        self.task.primary_slot()
    }

    /// Position of the tracked subject at `index`.
    #[inline]
    #[must_use]
    pub fn position(&self, index: usize) -> Position {
        self.records[index].position(self.primary_slot())
    }

    /// Timestamp (ms) at `index`.
    #[inline]
    #[must_use]
    pub fn timestamp(&self, index: usize) -> f64 {
        self.records[index].timestamp
    }

    /// Pixels per centimeter.
    #[inline]
    #[must_use]
    pub const fn resolution(&self) -> f64 {
        self.constants.resolution
    }

    /// Arena center in pixels.
    #[inline]
    #[must_use]
    pub const fn center(&self) -> Position {
        self.constants.center
    }

    /// Arena radius in pixels.
    #[inline]
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.constants.radius
    }

    /// First record index whose timestamp is at or after `start_minutes`.
    ///
    /// Equals [`len`](Self::len) when the whole session ends before that time.
    #[must_use]
    pub fn find_start(&self, start_minutes: f64) -> usize {
        let start_ms = start_minutes * MS_PER_MINUTE;
        self.records.partition_point(|r| r.timestamp < start_ms)
    }

    /// Timestamp (ms) of the first record.
    #[must_use]
    pub fn real_min_time(&self) -> f64 {
        self.records.first().map_or(0.0, |r| r.timestamp)
    }

    /// Timestamp (ms) of the last record.
    #[must_use]
    pub fn real_max_time(&self) -> f64 {
        self.records.last().map_or(0.0, |r| r.timestamp)
    }

    /// Speed in cm/s of the tracked subject between records `a` and `b`.
    #[must_use]
    pub fn speed_between(&self, a: usize, b: usize) -> f64 {
        self.speed_between_in(a, b, self.primary_slot())
    }

    /// Speed in cm/s between records `a` and `b` in the given frame.
    #[must_use]
    pub fn speed_between_in(&self, a: usize, b: usize, slot: Slot) -> f64 {
        let (ra, rb) = (&self.records[a], &self.records[b]);
        let distance = (ra.position(slot) - rb.position(slot)).norm();
        speed_cm_s(distance, (rb.timestamp - ra.timestamp).abs(), self.resolution())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Synthetic trajectories for unit tests.

    use super::*;
    use crate::header::{SessionConstants, TrackerKind};
    use crate::record::{FrameSample, ZoneState};

    pub(crate) fn constants(resolution: f64, center: (f64, f64), radius: f64) -> SessionConstants {
        SessionConstants {
            center: Position::new(center.0, center.1),
            resolution,
            arena_diameter: 2.0 * radius / resolution / 100.0,
            radius,
            tracker: TrackerKind::Unknown,
            zone: None,
            center_angle: 0.0,
            sector_width: 60.0,
            entrance_latency: 0.0,
        }
    }

    /// Room-frame trajectory with states, sampled every `dt` ms.
    pub(crate) fn room_track(
        task: Task,
        constants: SessionConstants,
        dt: f64,
        points: &[(f64, f64, i32)],
    ) -> Trajectory {
        let records = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y, state))| Record {
                frame: i,
                timestamp: i as f64 * dt,
                room: FrameSample {
                    position: Position::new(x, y),
                    state: ZoneState::from_code(state),
                    ..FrameSample::default()
                },
                arena: FrameSample::default(),
            })
            .collect();
        Trajectory::from_parts(task, constants, records, BTreeSet::new()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn line(n: usize) -> Trajectory {
        let points: Vec<_> = (0..n).map(|i| (10.0 + i as f64, 10.0, 0)).collect();
        room_track(Task::OpenField, constants(1.0, (0.0, 0.0), 100.0), 1000.0, &points)
    }

    #[test]
    fn test_from_parts_rejects_empty() {
        let err = Trajectory::from_parts(
            Task::OpenField,
            constants(1.0, (0.0, 0.0), 10.0),
            Vec::new(),
            BTreeSet::new(),
        )
        .unwrap_err();
        assert!(matches!(err, TrackError::EmptyTrajectory));
    }

    #[test]
    fn test_from_parts_renumbers_frames() {
        let mut records = vec![Record::default(); 3];
        records[0].frame = 7;
        records[2].frame = 42;
        let interpolated = [1, 5].into_iter().collect();
        let trajectory = Trajectory::from_parts(
            Task::OpenField,
            constants(1.0, (0.0, 0.0), 10.0),
            records,
            interpolated,
        )
        .unwrap();
        let frames: Vec<_> = trajectory.records().iter().map(|r| r.frame).collect();
        assert_eq!(frames, vec![0, 1, 2]);
        assert_eq!(trajectory.interpolated().iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_find_start() {
        // timestamps 0, 1000, ..., 299000 ms
        let trajectory = line(300);
        assert_eq!(trajectory.find_start(0.0), 0);
        assert_eq!(trajectory.find_start(1.0), 60);
        assert_eq!(trajectory.find_start(0.99), 60);
        assert_eq!(trajectory.find_start(10.0), 300);
    }

    #[test]
    fn test_real_times_and_speed() {
        let trajectory = line(5);
        assert_eq!(trajectory.real_min_time(), 0.0);
        assert_eq!(trajectory.real_max_time(), 4000.0);
        // 1 px per second at 1 px/cm
        assert!((trajectory.speed_between(0, 1) - 1.0).abs() < 1e-12);
        assert!((trajectory.speed_between(3, 1) - 1.0).abs() < 1e-12);
    }
}
