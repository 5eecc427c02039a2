//! Trajectory loading.
//!
//! Body lines are whitespace separated numbers:
//!
//! ```text
//! frame timestamp_ms x y sectors state [current_level] ...
//! ```
//!
//! Fields past the seventh are ignored. Loading one stream proceeds in a
//! single pass:
//!
//! 1. lines that do not parse are skipped and do not advance the frame counter;
//! 2. skipped frame numbers are filled with rows at `(0, 0)` whose timestamps
//!    are spread evenly between the neighbours;
//! 3. `(0, 0)` positions form a missing run that is interpolated as soon as a
//!    good sample follows, or backfilled with the last good sample at the end.
//!
//! A missing run without any good sample before it is left at `(0, 0)` and
//! removed by the start correction, which also drops leading samples missing
//! in any tracked frame of a paired session.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use nalgebra::Vector2;
use tracing::{debug, trace};

use crate::cache::FileKey;
use crate::error::{LineParseError, Result, TrackError};
use crate::header::{parse_header, SessionConstants};
use crate::math::{interpolate, is_missing, Position};
use crate::record::{FrameSample, Record, ZoneState};
use crate::task::{HeaderSource, PositionLayout, Task};
use crate::trajectory::Trajectory;

/// Minimum number of numeric fields of a body line.
pub const MIN_FIELDS: usize = 6;
/// Number of leading fields read from a body line.
pub const SPLIT_FIELDS: usize = 7;

/// One parsed body line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawLine {
    /// Frame number as written in the file.
    pub frame: usize,
    /// Timestamp in milliseconds.
    pub timestamp: f64,
    /// Sample fields.
    pub sample: FrameSample,
}

fn integral(value: f64) -> Option<i64> {
    (value.fract() == 0.0 && value.is_finite()).then_some(value as i64)
}

/// Parse one body line.
///
/// # Errors
///
/// Returns a [`LineParseError`] if the line has too few fields, a field is not
/// numeric, or the frame, sectors or state field is not a whole number.
pub fn parse_line(line: &str) -> std::result::Result<RawLine, LineParseError> {
    let mut values = [0.0_f64; SPLIT_FIELDS];
    let mut count = 0;
    for (index, text) in line.split_whitespace().take(SPLIT_FIELDS).enumerate() {
        values[index] = text.parse().map_err(|_| LineParseError::NotNumeric {
            index,
            text: text.to_string(),
        })?;
        count += 1;
    }
    if count < MIN_FIELDS {
        return Err(LineParseError::TooFewFields {
            expected: MIN_FIELDS,
            actual: count,
        });
    }

    let frame = integral(values[0])
        .and_then(|f| usize::try_from(f).ok())
        .ok_or_else(|| LineParseError::InvalidFrame(values[0].to_string()))?;
    let whole = |index: usize| {
        integral(values[index])
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| LineParseError::NotNumeric {
                index,
                text: values[index].to_string(),
            })
    };

    Ok(RawLine {
        frame,
        timestamp: values[1],
        sample: FrameSample {
            position: Position::new(values[2], values[3]),
            sectors: whole(4)?,
            state: ZoneState::from_code(whole(5)?),
            level: values[6],
        },
    })
}

/// One position stream after gap filling and missing-run repair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stream {
    /// Timestamp and sample of every row.
    pub rows: Vec<(f64, FrameSample)>,
    /// Rows whose position was synthesized.
    pub interpolated: BTreeSet<usize>,
}

/// Read body lines into a [`Stream`].
///
/// When `offset` is given, every measured (non-missing) position is shifted by it.
///
/// # Errors
///
/// Returns an I/O error if reading fails.
pub fn read_stream<R: BufRead>(reader: R, offset: Option<Vector2<f64>>) -> Result<Stream> {
    let mut stream = Stream::default();
    let mut missing: Vec<usize> = Vec::new();
    let mut last_good: Option<Position> = None;
    let mut skipped = 0_usize;
    let mut filled = 0_usize;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut raw = match parse_line(&line) {
            Ok(raw) => raw,
            Err(err) => {
                trace!(%err, "skipping body line");
                skipped += 1;
                continue;
            }
        };
        if let Some(offset) = offset {
            if !is_missing(&raw.sample.position) {
                raw.sample.position += offset;
            }
        }

        // frames count from 0 so both streams of a pair stay aligned
        let expected = stream.rows.len();
        if raw.frame > expected {
            let (prev_ts, prev) = stream.rows.last().copied().unwrap_or((0.0, raw.sample));
            let gap = raw.frame - expected;
            let step = (raw.timestamp - prev_ts) / (gap + 1) as f64;
            for j in 1..=gap {
                let index = stream.rows.len();
                let filler = FrameSample {
                    position: Position::origin(),
                    ..prev
                };
                stream.rows.push((prev_ts + step * j as f64, filler));
                missing.push(index);
                stream.interpolated.insert(index);
            }
            filled += gap;
        }

        let index = stream.rows.len();
        stream.rows.push((raw.timestamp, raw.sample));
        let position = raw.sample.position;

        if is_missing(&position) {
            missing.push(index);
            stream.interpolated.insert(index);
            continue;
        }

        if !missing.is_empty() {
            if let Some(before) = last_good {
                let steps = missing.len() + 1;
                for (step, &row) in missing.iter().enumerate() {
                    stream.rows[row].1.position = interpolate(&before, &position, steps, step + 1);
                }
            }
            missing.clear();
        }
        last_good = Some(position);
    }

    if let Some(before) = last_good {
        for &row in &missing {
            stream.rows[row].1.position = before;
        }
    }

    debug!(
        rows = stream.rows.len(),
        skipped,
        filled,
        interpolated = stream.interpolated.len(),
        "read position stream"
    );
    Ok(stream)
}

/// Drop the leading records missing in any of the task's tracked frames.
///
/// Returns the number of dropped records. Frames are renumbered when the
/// trajectory is assembled.
fn correct_start(
    task: Task,
    records: &mut Vec<Record>,
    interpolated: &mut BTreeSet<usize>,
) -> usize {
    let slots = task.tracked_slots();
    let dropped = records
        .iter()
        .take_while(|r| slots.iter().any(|&slot| is_missing(&r.position(slot))))
        .count();
    if dropped > 0 {
        records.drain(..dropped);
        *interpolated = interpolated
            .iter()
            .filter_map(|&i| i.checked_sub(dropped))
            .collect();
        debug!(dropped, "dropped samples before tracker lock");
    }
    dropped
}

fn assemble(
    task: Task,
    constants: SessionConstants,
    primary: Stream,
    paired: Option<Stream>,
) -> Result<Trajectory> {
    let primary_slot = task.primary_file_slot();
    let mut interpolated = primary.interpolated;

    let mut records: Vec<Record> = match paired {
        None => primary
            .rows
            .into_iter()
            .map(|(timestamp, sample)| {
                let mut record = Record {
                    timestamp,
                    ..Record::default()
                };
                *record.sample_mut(primary_slot) = sample;
                record
            })
            .collect(),
        Some(paired) => {
            let paired_slot = primary_slot.other();
            let len = primary.rows.len().min(paired.rows.len());
            interpolated.extend(paired.interpolated);
            interpolated.retain(|&i| i < len);
            primary
                .rows
                .into_iter()
                .zip(paired.rows)
                .map(|((timestamp, first), (_, second))| {
                    let mut record = Record {
                        timestamp,
                        ..Record::default()
                    };
                    *record.sample_mut(primary_slot) = first;
                    *record.sample_mut(paired_slot) = second;
                    record
                })
                .collect()
        }
    };

    correct_start(task, &mut records, &mut interpolated);
    Trajectory::from_parts(task, constants, records, interpolated)
}

fn recentring_offset(task: Task, constants: &SessionConstants) -> Option<Vector2<f64>> {
    task.recentres_coordinates().then(|| {
        Vector2::new(
            constants.radius - constants.center.x,
            constants.radius - constants.center.y,
        )
    })
}

/// Load a session from in-memory readers.
///
/// `paired` must be given exactly for paired tasks.
///
/// # Errors
///
/// Returns [`TrackError::MalformedHeader`], [`TrackError::EmptyTrajectory`],
/// [`TrackError::InvalidInput`] for a missing or unexpected paired reader, or
/// an I/O error.
pub fn load_readers<R: BufRead>(
    task: Task,
    mut primary: R,
    paired: Option<R>,
) -> Result<Trajectory> {
    match (task.layout(), paired) {
        (PositionLayout::Single, None) => {
            let header = parse_header(&mut primary)?;
            let constants = SessionConstants::from_header(&header, task)?;
            let stream = read_stream(primary, None)?;
            assemble(task, constants, stream, None)
        }
        (PositionLayout::Paired, Some(mut paired)) => {
            let primary_header = parse_header(&mut primary)?;
            let paired_header = parse_header(&mut paired)?;
            let header = match task.header_source() {
                HeaderSource::Primary => primary_header,
                HeaderSource::Paired => paired_header,
            };
            let mut constants = SessionConstants::from_header(&header, task)?;
            let offset = recentring_offset(task, &constants);
            let first = read_stream(primary, offset)?;
            let second = read_stream(paired, offset)?;
            if offset.is_some() {
                constants.recentre();
            }
            assemble(task, constants, first, Some(second))
        }
        (PositionLayout::Single, Some(_)) => Err(TrackError::invalid_input(format!(
            "{task} sessions are recorded in a single file"
        ))),
        (PositionLayout::Paired, None) => Err(TrackError::invalid_input(format!(
            "{task} sessions need a paired file"
        ))),
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

/// Load the session identified by `key` from disk.
///
/// # Errors
///
/// Any failure is returned as [`TrackError::Load`] naming the primary file.
pub fn load_session(task: Task, key: &FileKey) -> Result<Trajectory> {
    let load = || -> Result<Trajectory> {
        let primary = open(key.primary())?;
        let paired = key.paired().map(open).transpose()?;
        load_readers(task, primary, paired)
    };
    load()
        .map(|trajectory| trajectory.with_source(key.clone()))
        .map_err(|err| TrackError::load(key.primary(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Slot;
    use std::io::Cursor;

    const HEADER: &str = "\
%ArenaCenterXY.0 ( 100 100 )
%TrackerResolution_PixPerCM.0 ( 2 )
%ArenaDiameter_m.0 ( 1 )
%END_HEADER
";

    fn load(task: Task, body: &str) -> Result<Trajectory> {
        load_readers(task, Cursor::new(format!("{HEADER}{body}")), None)
    }

    #[test]
    fn test_parse_line() {
        let raw = parse_line("3 120 10 20 1 2 0.5 99 99").unwrap();
        assert_eq!(raw.frame, 3);
        assert_eq!(raw.timestamp, 120.0);
        assert_eq!(raw.sample.position, Position::new(10.0, 20.0));
        assert_eq!(raw.sample.sectors, 1);
        assert!(raw.sample.state.is_shock());
        assert_eq!(raw.sample.level, 0.5);

        let raw = parse_line("3 120 10 20 1 0").unwrap();
        assert_eq!(raw.sample.level, 0.0);

        assert!(matches!(parse_line("1 2 3"), Err(LineParseError::TooFewFields { actual: 3, .. })));
        assert!(matches!(parse_line("1 2 x 4 0 0"), Err(LineParseError::NotNumeric { index: 2, .. })));
        assert!(matches!(parse_line("-1 2 3 4 0 0"), Err(LineParseError::InvalidFrame(_))));
        assert!(matches!(parse_line("1.5 2 3 4 0 0"), Err(LineParseError::InvalidFrame(_))));
    }

    #[test]
    fn test_single_missing_run_interpolated() {
        let body = "0 0 10 10 0 0\n1 40 0 0 0 0\n2 80 0 0 0 0\n3 120 0 0 0 0\n4 160 50 90 0 0\n";
        let t = load(Task::OpenField, body).unwrap();
        assert_eq!(t.len(), 5);
        for (i, expected) in [(1, (20.0, 30.0)), (2, (30.0, 50.0)), (3, (40.0, 70.0))] {
            let p = t.position(i);
            assert!((p.x - expected.0).abs() < 1e-9 && (p.y - expected.1).abs() < 1e-9);
        }
        assert_eq!(t.interpolated().iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_frame_gap_filled() {
        let body = "1 0 10 10 0 0\n2 40 20 10 0 0\n5 160 50 10 3 1\n6 200 60 10 0 0\n";
        let t = load(Task::OpenField, body).unwrap();
        assert_eq!(t.len(), 6);
        let frames: Vec<_> = t.records().iter().map(|r| r.frame).collect();
        assert_eq!(frames, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(t.timestamp(2), 80.0);
        assert_eq!(t.timestamp(3), 120.0);
        assert!((t.position(2).x - 30.0).abs() < 1e-9);
        assert!((t.position(3).x - 40.0).abs() < 1e-9);
        assert!(t.is_interpolated(2) && t.is_interpolated(3));
        assert!(!t.is_interpolated(4));
    }

    #[test]
    fn test_bad_lines_skipped() {
        let body = "0 0 10 10 0 0\ngarbage line\n1 40 20 10 0 0\n\n2 80 30 10\n";
        let t = load(Task::OpenField, body).unwrap();
        assert_eq!(t.len(), 2);
        assert!(t.interpolated().is_empty());
    }

    #[test]
    fn test_trailing_run_backfilled() {
        let body = "0 0 10 10 0 0\n1 40 20 10 0 0\n2 80 0 0 0 0\n3 120 0 0 0 0\n";
        let t = load(Task::OpenField, body).unwrap();
        assert_eq!(t.position(2), Position::new(20.0, 10.0));
        assert_eq!(t.position(3), Position::new(20.0, 10.0));
        assert!(t.is_interpolated(2) && t.is_interpolated(3));
    }

    #[test]
    fn test_start_correction() {
        let body = "0 0 0 0 0 0\n1 40 0 0 0 0\n2 80 10 10 0 0\n3 120 0 0 0 0\n4 160 30 10 0 0\n";
        let t = load(Task::OpenField, body).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.timestamp(0), 80.0);
        assert_eq!(t.records()[0].frame, 0);
        assert_eq!(t.interpolated().iter().copied().collect::<Vec<_>>(), vec![1]);
        assert!((t.position(1).x - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_missing_is_empty() {
        let err = load(Task::OpenField, "0 0 0 0 0 0\n1 40 0 0 0 0\n").unwrap_err();
        assert!(matches!(err, TrackError::EmptyTrajectory));
        let err = load(Task::OpenField, "not a record\n").unwrap_err();
        assert!(matches!(err, TrackError::EmptyTrajectory));
    }

    #[test]
    fn test_paired_zip_and_start_correction() {
        let arena = format!("{HEADER}0 0 0 0 0 0\n1 40 11 11 0 0\n2 80 12 12 0 0\n3 120 13 13 0 0\n");
        let room = format!("{HEADER}0 0 20 20 0 0\n1 40 21 21 0 0\n2 80 22 22 2 0\n");
        let t = load_readers(Task::CarouselMaze, Cursor::new(arena), Some(Cursor::new(room))).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.records()[0].position(Slot::Arena), Position::new(11.0, 11.0));
        assert_eq!(t.records()[0].position(Slot::Room), Position::new(21.0, 21.0));
        assert!(t.records()[1].state().is_shock());
    }

    #[test]
    fn test_paired_corrupt_first_line_stays_aligned() {
        let arena = format!("{HEADER}garbage\n1 40 11 11 0 0\n2 80 12 12 0 0\n3 120 13 13 0 0\n");
        let room = format!("{HEADER}0 0 20 20 0 0\n1 40 21 21 0 0\n2 80 22 22 0 0\n3 120 23 23 0 0\n");
        let t = load_readers(Task::CarouselMaze, Cursor::new(arena), Some(Cursor::new(room))).unwrap();
        assert_eq!(t.len(), 3);
        for (i, expected) in [(0, (11.0, 21.0)), (1, (12.0, 22.0)), (2, (13.0, 23.0))] {
            let record = &t.records()[i];
            assert_eq!(record.position(Slot::Arena), Position::new(expected.0, expected.0));
            assert_eq!(record.position(Slot::Room), Position::new(expected.1, expected.1));
        }
        assert_eq!(t.timestamp(0), 40.0);
        assert!(t.interpolated().is_empty());
    }

    #[test]
    fn test_leading_frame_gap_dropped() {
        let body = "3 120 10 10 0 0\n4 160 20 10 0 0\n";
        let t = load(Task::OpenField, body).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.timestamp(0), 120.0);
        assert_eq!(t.records()[0].frame, 0);
        assert!(t.interpolated().is_empty());
    }

    #[test]
    fn test_robot_avoidance_recentred() {
        // radius = 2 px/cm * 1 m * 100 / 2 = 100 px
        let header = "\
%ArenaCenterXY.0 ( 150 120 )
%TrackerResolution_PixPerCM.0 ( 2 )
%ArenaDiameter_m.0 ( 1 )
%END_HEADER
";
        let rat = format!("{header}0 0 160 130 0 0\n1 40 0 0 0 0\n2 80 170 130 0 0\n");
        let robot = format!("{header}0 0 150 120 0 0\n1 40 150 120 0 0\n2 80 150 120 0 0\n");
        let t = load_readers(Task::RobotAvoidance, Cursor::new(rat), Some(Cursor::new(robot))).unwrap();
        assert_eq!(t.center(), Position::new(100.0, 100.0));
        assert_eq!(t.position(0), Position::new(110.0, 110.0));
        assert_eq!(t.position(1), Position::new(115.0, 110.0));
        assert_eq!(t.records()[0].position(Slot::Room), Position::new(100.0, 100.0));
    }

    #[test]
    fn test_layout_mismatch() {
        let err = load_readers(Task::CarouselMaze, Cursor::new(HEADER), None).unwrap_err();
        assert!(matches!(err, TrackError::InvalidInput(_)));
    }
}
