//! Smoothed speed series and the metrics built on them.
//!
//! The speed series samples every `stride`-th record of the window. The first
//! interval starts at the window start time (not at the first record's
//! timestamp). Each interval speed is averaged with the `smooth - 1`
//! preceding ones; an interval is *mobile* when that average exceeds the
//! threshold.

use std::collections::VecDeque;

use crate::config::SpeedSampling;
use crate::math::{median, signed_bearing_change, speed_cm_s};
use crate::record::Slot;
use crate::trajectory::Trajectory;

use super::{MetricValue, TimeWindow};

/// One interval of a smoothed speed series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedStep {
    /// Interval start in ms.
    pub from_ms: f64,
    /// Interval end in ms.
    pub to_ms: f64,
    /// Whether the smoothed speed exceeds the threshold.
    pub mobile: bool,
}

/// Smoothed speed series of a window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedSeries {
    /// Intervals with a full smoothing window.
    pub steps: Vec<SpeedStep>,
    /// Time (ms) of the last sample, or the window start without samples.
    pub last_ms: f64,
}

/// Build the smoothed speed series of `window`.
#[must_use]
pub fn speed_series(
    trajectory: &Trajectory,
    window: TimeWindow,
    sampling: &SpeedSampling,
) -> SpeedSeries {
    let mut series = SpeedSeries {
        steps: Vec::new(),
        last_ms: window.start_ms(),
    };
    let start = trajectory.find_start(window.start_minutes);
    if start >= trajectory.len() || sampling.stride == 0 || sampling.smooth == 0 {
        return series;
    }

    let slot = trajectory.primary_slot();
    let resolution = trajectory.resolution();
    let end = window.end_ms();
    let mut previous = trajectory.position(start);
    let mut speeds: VecDeque<f64> = VecDeque::with_capacity(sampling.smooth);

    for record in trajectory.records()[start..]
        .iter()
        .skip(sampling.stride)
        .step_by(sampling.stride)
        .take_while(|r| r.timestamp <= end)
    {
        let current = record.position(slot);
        let from_ms = series.last_ms;
        speeds.push_back(speed_cm_s(
            (current - previous).norm(),
            record.timestamp - from_ms,
            resolution,
        ));
        if speeds.len() == sampling.smooth {
            let average = speeds.iter().sum::<f64>() / speeds.len() as f64;
            series.steps.push(SpeedStep {
                from_ms,
                to_ms: record.timestamp,
                mobile: average > sampling.min_speed,
            });
            speeds.pop_front();
        }
        previous = current;
        series.last_ms = record.timestamp;
    }
    series
}

/// Longest immobile stretch in minutes.
#[must_use]
pub fn max_time_of_immobility(
    trajectory: &Trajectory,
    window: TimeWindow,
    sampling: &SpeedSampling,
) -> MetricValue {
    let series = speed_series(trajectory, window, sampling);
    let mut since = window.start_ms();
    let mut longest: f64 = 0.0;
    for step in series.steps.iter().filter(|s| s.mobile) {
        longest = longest.max(step.from_ms - since);
        since = step.to_ms;
    }
    longest = longest.max(series.last_ms - since);
    MetricValue::number(longest / 60_000.0, 2)
}

/// Median time in seconds between mobile intervals at least `min_time` seconds apart.
///
/// One result per entry of `min_times`; [`MetricValue::Na`] where fewer than
/// two such gaps exist.
#[must_use]
pub fn periodicity(
    trajectory: &Trajectory,
    window: TimeWindow,
    sampling: &SpeedSampling,
    min_times: &[f64],
) -> MetricValue {
    let series = speed_series(trajectory, window, sampling);
    let values = min_times
        .iter()
        .map(|min_time| {
            let min_ms = min_time * 1000.0;
            let mut last_mobile: Option<f64> = None;
            let mut periods = Vec::new();
            for step in series.steps.iter().filter(|s| s.mobile) {
                if let Some(last) = last_mobile {
                    if step.from_ms - last > min_ms {
                        periods.push(step.from_ms - last);
                    }
                }
                last_mobile = Some(step.to_ms);
            }
            if periods.len() > 1 {
                median(&periods).map_or(MetricValue::Na, |m| MetricValue::number(m / 1000.0, 2))
            } else {
                MetricValue::Na
            }
        })
        .collect();
    MetricValue::List(values)
}

/// Proportion of mobile intervals.
#[must_use]
pub fn proportion_of_time_moving(
    trajectory: &Trajectory,
    window: TimeWindow,
    sampling: &SpeedSampling,
) -> MetricValue {
    let series = speed_series(trajectory, window, sampling);
    if series.steps.is_empty() {
        return MetricValue::Na;
    }
    let mobile = series.steps.iter().filter(|s| s.mobile).count();
    MetricValue::number(mobile as f64 / series.steps.len() as f64, 3)
}

/// Median arena rotation speed in degrees per minute.
///
/// Compares the bearing change of the room and arena positions over every
/// `rows` records between the window start and end.
#[must_use]
pub fn rotation_speed(trajectory: &Trajectory, window: TimeWindow, rows: usize) -> MetricValue {
    let start = trajectory.find_start(window.start_minutes);
    let end = trajectory.find_start(window.end_minutes);
    if rows == 0 || start >= end {
        return MetricValue::Na;
    }
    let center = trajectory.center();
    let records = trajectory.records();
    let mut previous = &records[start];
    let mut speeds = Vec::new();
    for current in records[start..end].iter().skip(rows).step_by(rows) {
        let arena = signed_bearing_change(
            &center,
            &previous.position(Slot::Arena),
            &current.position(Slot::Arena),
        );
        let room = signed_bearing_change(
            &center,
            &previous.position(Slot::Room),
            &current.position(Slot::Room),
        );
        let dt = current.timestamp - previous.timestamp;
        if dt != 0.0 {
            speeds.push((room - arena) * 60_000.0 / dt);
        }
        previous = current;
    }
    median(&speeds).map_or(MetricValue::Na, |m| MetricValue::number(m, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::math::Position;
    use crate::record::{FrameSample, Record};
    use crate::task::Task;
    use crate::trajectory::test_support::{constants, room_track};

    /// One record per second, moving `steps[i]` pixels along x before record i.
    fn walk(steps: &[f64]) -> Trajectory {
        let mut x = 100.0;
        let mut points = vec![(x, 100.0, 0)];
        for step in steps {
            x += step;
            points.push((x, 100.0, 0));
        }
        room_track(Task::OpenField, constants(1.0, (0.0, 0.0), 1000.0), 1000.0, &points)
    }

    fn sampling(min_speed: f64, stride: usize, smooth: usize) -> SpeedSampling {
        SpeedSampling::new(min_speed, stride, smooth)
    }

    const WHOLE: TimeWindow = TimeWindow::new(0.0, 10.0);

    #[test]
    fn test_speed_series() {
        let trajectory = walk(&[20.0, 0.0, 20.0, 20.0]);
        let series = speed_series(&trajectory, WHOLE, &sampling(10.0, 1, 1));
        let mobile: Vec<_> = series.steps.iter().map(|s| s.mobile).collect();
        assert_eq!(mobile, vec![true, false, true, true]);
        assert_eq!(series.last_ms, 4000.0);

        // smoothing over two intervals: (20 + 0) / 2 and (0 + 20) / 2 are not above 10
        let series = speed_series(&trajectory, WHOLE, &sampling(10.0, 1, 2));
        let mobile: Vec<_> = series.steps.iter().map(|s| s.mobile).collect();
        assert_eq!(mobile, vec![false, false, true]);
    }

    #[test]
    fn test_max_time_of_immobility() {
        // still for 120 s, then moving for 10 s, then still for 50 s
        let mut steps = vec![0.0; 120];
        steps.extend(vec![30.0; 10]);
        steps.extend(vec![0.0; 50]);
        let trajectory = walk(&steps);
        let value = max_time_of_immobility(&trajectory, WHOLE, &sampling(10.0, 1, 1));
        assert_eq!(value.to_string(), "2.00");
        let all_still = walk(&[0.0; 30]);
        let value = max_time_of_immobility(&all_still, WHOLE, &sampling(10.0, 1, 1));
        assert_eq!(value.to_string(), "0.50");
    }

    #[test]
    fn test_periodicity() {
        // bursts every 20 s
        let mut steps = Vec::new();
        for _ in 0..5 {
            steps.push(30.0);
            steps.extend(vec![0.0; 19]);
        }
        let trajectory = walk(&steps);
        let value = periodicity(&trajectory, WHOLE, &sampling(10.0, 1, 1), &[9.0, 30.0]);
        assert_eq!(value.to_string(), "19.00|NA");
    }

    #[test]
    fn test_periodicity_needs_two_gaps() {
        let mut steps = vec![30.0];
        steps.extend(vec![0.0; 19]);
        steps.push(30.0);
        let trajectory = walk(&steps);
        let value = periodicity(&trajectory, WHOLE, &sampling(10.0, 1, 1), &[9.0]);
        assert_eq!(value.to_string(), "NA");
    }

    #[test]
    fn test_proportion_of_time_moving() {
        let trajectory = walk(&[20.0, 0.0, 20.0, 20.0]);
        let value = proportion_of_time_moving(&trajectory, WHOLE, &sampling(5.0, 1, 1));
        assert_eq!(value.to_string(), "0.750");
        let single = walk(&[]);
        assert!(proportion_of_time_moving(&single, WHOLE, &sampling(5.0, 1, 1)).is_na());
    }

    #[test]
    fn test_rotation_speed() {
        // arena turns one degree per second more than the room position
        let center = Position::new(500.0, 500.0);
        let records: Vec<Record> = (0..200)
            .map(|i| {
                let angle = f64::from(i).to_radians();
                let arena =
                    Position::new(500.0 + 100.0 * angle.sin(), 500.0 + 100.0 * angle.cos());
                Record {
                    frame: 0,
                    timestamp: f64::from(i) * 1000.0,
                    room: FrameSample {
                        position: Position::new(500.0, 600.0),
                        ..FrameSample::default()
                    },
                    arena: FrameSample {
                        position: arena,
                        ..FrameSample::default()
                    },
                }
            })
            .collect();
        let constants = constants(1.0, (center.x, center.y), 100.0);
        let trajectory =
            Trajectory::from_parts(Task::CarouselMaze, constants, records, BTreeSet::new()).unwrap();
        let value = rotation_speed(&trajectory, TimeWindow::new(0.0, 3.0), 25);
        assert_eq!(value.to_string(), "-60.0");
        assert!(rotation_speed(&trajectory, TimeWindow::new(0.0, 3.0), 0).is_na());
    }
}
