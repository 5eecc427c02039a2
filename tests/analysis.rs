//! End-to-end analysis tests.
//!
//! Sessions are written to disk, loaded through the store, cleaned and
//! reduced to metric values, alone and in batch runs.

use std::fs;
use std::path::{Path, PathBuf};

use behavior_tracks::{
    process_files, AnalysisConfig, BatchRequest, Metric, MetricValue, Options, Pairing, Position,
    ReflectionPolicy, RemovalOptions, Slot, Task, TimeWindow, TrackStore,
};

// =============================================================================
// LOG WRITERS
// =============================================================================

const HEADER: &str = "\
%ArenaCenterXY.0 ( 100 100 )
%TrackerResolution_PixPerCM.0 ( 2 )
%ArenaDiameter_m.0 ( 1 )
%ArenaZone.0 ( 0 0 90 60 )
%END_HEADER
";

/// Write a log with one `(x, y, state)` line per frame, 40 ms per frame.
fn write_log(dir: &Path, name: &str, rows: &[(f64, f64, i32)]) -> PathBuf {
    let body: String = rows
        .iter()
        .enumerate()
        .map(|(i, &(x, y, state))| format!("{i} {} {x:.3} {y:.3} 0 {state}\n", i * 40))
        .collect();
    let path = dir.join(name);
    fs::write(&path, format!("{HEADER}{body}")).unwrap();
    path
}

/// Slow circle of radius 50 px around the center with a reflection at frame 10.
fn circle_with_reflection(n: usize) -> Vec<(f64, f64, i32)> {
    (0..n)
        .map(|i| {
            if i == 10 {
                return (190.0, 190.0, 0);
            }
            let angle = i as f64 * 0.05;
            (100.0 + 50.0 * angle.cos(), 100.0 + 50.0 * angle.sin(), 0)
        })
        .collect()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

// =============================================================================
// CLEANING
// =============================================================================

#[test]
fn test_reflection_repair_on_carousel_pair() {
    let dir = tempfile::tempdir().unwrap();
    let arena: Vec<_> = (0..40).map(|i| (100.0 + f64::from(i), 100.0, 0)).collect();
    let primary = write_log(dir.path(), "m1_Arena.dat", &arena);
    write_log(dir.path(), "m1_Room.dat", &circle_with_reflection(40));

    let mut store = TrackStore::new();
    let session = store.load(Task::CarouselMaze, &primary, Pairing::Auto).unwrap();
    let window = TimeWindow::unbounded();
    let config = AnalysisConfig::for_task(Task::CarouselMaze);
    assert_eq!(Metric::Reflections.evaluate(&session, window, &config), MetricValue::Count(2));

    let (cleaned, summary) = store.remove_reflections(&session, &RemovalOptions::default());
    let key = session.source().cloned().unwrap();
    assert!(store.cached(Task::CarouselMaze, &key).is_none());

    assert_eq!(summary.repaired, vec![9, 10]);
    assert_eq!(summary.spans, 1);
    // the repaired span lies on the chord between frames 8 and 11
    let (before, after) = (cleaned.position(8), cleaned.position(11));
    let expected = before + (after - before) * (2.0 / 3.0);
    assert!((cleaned.position(10) - expected).norm() < 1e-6);
    // both frames are repaired together
    assert!(approx(cleaned.records()[9].position(Slot::Arena).x, 109.0));

    assert_eq!(Metric::Reflections.evaluate(&cleaned, window, &config), MetricValue::Count(0));
    let bad = Metric::PercentBadPoints.evaluate(&cleaned, window, &config);
    assert_eq!(bad.to_string(), "5.00");
    // the loaded session is untouched
    assert_eq!(session.position(10), Position::new(190.0, 190.0));
}

#[test]
fn test_explicit_points_repair_only_their_span() {
    let dir = tempfile::tempdir().unwrap();
    let rows: Vec<_> = (0..20).map(|i| (100.0 + f64::from(i), 120.0, 0)).collect();
    let path = write_log(dir.path(), "line.dat", &rows);

    let mut store = TrackStore::new();
    let session = store.load(Task::CarouselSingleFrame, &path, Pairing::None).unwrap();
    let (cleaned, summary) =
        store.remove_reflections(&session, &RemovalOptions::with_points(vec![6]));
    assert_eq!(summary.repaired, vec![5]);
    assert!(cleaned.is_interpolated(5));
    // a straight line interpolates onto itself
    assert!(approx(cleaned.position(5).x, 105.0));
}

// =============================================================================
// METRICS
// =============================================================================

#[test]
fn test_shock_metrics_from_log() {
    let dir = tempfile::tempdir().unwrap();
    let states = [0, 0, 2, 2, 3, 2, 4, 0, 2, 0];
    let rows: Vec<_> = states.iter().map(|&s| (120.0, 100.0, s)).collect();
    let path = write_log(dir.path(), "shocks.dat", &rows);

    let mut store = TrackStore::new();
    let session = store.load(Task::CarouselSingleFrame, &path, Pairing::None).unwrap();
    let config = AnalysisConfig::for_task(Task::CarouselSingleFrame);
    let window = TimeWindow::unbounded();

    assert_eq!(Metric::Shocks.evaluate(&session, window, &config), MetricValue::Count(3));
    assert_eq!(Metric::Entrances.evaluate(&session, window, &config), MetricValue::Count(2));
    let angle = Metric::AngleOfTargetSector.evaluate(&session, window, &config);
    assert_eq!(angle.as_f64(), Some(90.0));
}

#[test]
fn test_options_file_drives_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let rows: Vec<_> = (0..20).map(|i| (100.0 + 2.0 * f64::from(i), 100.0, 0)).collect();
    let path = write_log(dir.path(), "walk.dat", &rows);
    let options_path = dir.path().join("options.txt");
    fs::write(
        &options_path,
        "%|OFStrideParTotalDistance|% 1\n%|OFMinDiffParTotalDistance|% abc\n",
    )
    .unwrap();

    let options = Options::from_path(&options_path).unwrap();
    let config = AnalysisConfig::from_options(Task::OpenField, &options);
    assert_eq!(config.distance_stride, 1);
    assert_eq!(config.distance_min_difference, 0.0);

    let mut store = TrackStore::new();
    let session = store.load(Task::OpenField, &path, Pairing::None).unwrap();
    let window = TimeWindow::unbounded();
    // 38 px at 2 px/cm
    let distance = Metric::TotalDistance.evaluate(&session, window, &config);
    assert_eq!(distance.to_string(), "0.19");
    // the preset stride skips past the session end
    let preset = AnalysisConfig::for_task(Task::OpenField);
    let distance = Metric::TotalDistance.evaluate(&session, window, &preset);
    assert_eq!(distance.to_string(), "0.00");
}

// =============================================================================
// BATCH
// =============================================================================

#[test]
fn test_batch_over_carousel_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let arena: Vec<_> = (0..40).map(|i| (100.0 + f64::from(i), 100.0, 0)).collect();
    let good = write_log(dir.path(), "g_Arena.dat", &arena);
    write_log(dir.path(), "g_Room.dat", &circle_with_reflection(40));
    let unpaired = write_log(dir.path(), "u_Arena.dat", &arena);

    let request = BatchRequest::new(Task::CarouselMaze, vec![good, unpaired.clone()])
        .with_metrics(vec![
            Metric::Reflections,
            Metric::PercentBadPoints,
            Metric::PairedFilename,
        ])
        .with_reflections(ReflectionPolicy::RemoveAll);

    let mut store = TrackStore::new();
    let report = process_files(&mut store, &request).unwrap();
    assert_eq!(
        report.header(),
        ["File", "Reflections", "Percent bad points", "Room frame filename"]
    );

    let values: Vec<String> = report.rows[0].values.iter().map(ToString::to_string).collect();
    assert_eq!(values, ["0", "5.00", "g_Room.dat"]);
    assert!(report.rows[1].failed());
    assert_eq!(report.failed_files(), vec![unpaired.as_path()]);
}

#[test]
fn test_batch_every_metric_of_every_task() {
    let dir = tempfile::tempdir().unwrap();
    let circle = circle_with_reflection(60);
    let single = write_log(dir.path(), "one.dat", &circle);

    for task in [Task::CarouselSingleFrame, Task::OpenField] {
        let request = BatchRequest::new(task, vec![single.clone()])
            .with_windows(vec![TimeWindow::new(0.0, 0.02), TimeWindow::new(0.02, 1.0)]);
        let report = process_files(&mut TrackStore::new(), &request).unwrap();
        let row = &report.rows[0];
        assert!(!row.failed(), "{task}: {:?}", row.error);
        assert_eq!(row.values.len(), report.columns.len());
    }
}

#[cfg(feature = "serde")]
#[test]
fn test_report_exports_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(dir.path(), "one.dat", &circle_with_reflection(20));
    let request = BatchRequest::new(Task::OpenField, vec![path])
        .with_metrics(vec![Metric::Reflections, Metric::TimeInQuadrants]);
    let report = process_files(&mut TrackStore::new(), &request).unwrap();

    let json = serde_json::to_string_pretty(&report).unwrap();
    let back: behavior_tracks::BatchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.columns, report.columns);
    assert_eq!(back.to_delimited(","), report.to_delimited(","));
}
