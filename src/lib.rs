//! Behavior Tracks
//!
//! Ingestion, cleaning and analysis of animal tracking logs recorded in
//! circular and square arenas.
//!
//! A tracking session is a text log with a `%`-prefixed header followed by one
//! whitespace-separated line per camera frame. Sessions of the carousel maze
//! and of robot avoidance come as two files (one per reference frame) that are
//! loaded into a single [`Trajectory`].
//!
//! # Features
//!
//! - **Gap-free loading**: missing frames are reconstructed by linear
//!   interpolation and every reconstructed sample is remembered
//! - **Reflection repair**: physically implausible excursions caused by
//!   reflections of the tracking light are detected and interpolated away
//! - **Shared caching**: a [`TrackStore`] caches loaded sessions per task
//! - **Metric library**: distance, avoidance, sector occupancy, mobility,
//!   strategy and data-quality metrics over arbitrary time windows
//! - **Batch runs**: one result row per file, see [`batch`]
//!
//! # Quick Start
//!
//! ```
//! use behavior_tracks::loader::load_readers;
//! use behavior_tracks::{AnalysisConfig, Metric, Task, TimeWindow};
//!
//! let log = "\
//! %ArenaCenterXY.0 ( 100 100 )
//! %TrackerResolution_PixPerCM.0 ( 1 )
//! %ArenaDiameter_m.0 ( 2 )
//! %ArenaZone.0 ( 0 0 30 60 )
//! %END_HEADER
//! 0 0 100 100 0 0
//! 1 40 110 100 0 0
//! 2 80 120 100 0 0
//! ";
//! let session = load_readers(Task::OpenField, log.as_bytes(), None)?;
//! assert_eq!(session.len(), 3);
//!
//! let config = AnalysisConfig::for_task(Task::OpenField);
//! let value = Metric::MeanDistanceFromCenter.evaluate(&session, TimeWindow::unbounded(), &config);
//! assert_eq!(value.to_string(), "10.00");
//! # Ok::<(), behavior_tracks::TrackError>(())
//! ```
//!
//! # Tasks
//!
//! | Task | Files | Arena |
//! |------|-------|-------|
//! | Carousel maze | `Arena` + `Room` | circle |
//! | Carousel maze, single frame | one | circle |
//! | Robot avoidance | `Rat` + `Robot` | circle |
//! | Morris water maze | one | circle |
//! | Open field | one | square |

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod header;
pub mod loader;
pub mod math;
pub mod metrics;
pub mod options;
pub mod pairing;
pub mod record;
pub mod reflection;
pub mod store;
pub mod task;
pub mod trajectory;

// Re-exports for convenient access
pub use batch::{process_files, BatchReport, BatchRequest, BatchRow, ReflectionPolicy};
pub use cache::{FileKey, TrajectoryCache};
pub use config::{AnalysisConfig, AvgDistanceParams, LastTime, SpeedSampling, StrategyParams};
pub use error::{Result, TrackError};
pub use header::{Header, ReinforcedZone, SessionConstants, TrackerKind};
pub use loader::load_session;
pub use math::Position;
pub use metrics::{Metric, MetricValue, Strategy, StrategyPeriod, StrategyTimeline, TimeWindow};
pub use options::Options;
pub use pairing::{recognize_files, Pairing, Recognized};
pub use record::{FrameSample, Record, Slot, ZoneState};
pub use reflection::{remove_reflections, RemovalOptions, RemovalSummary};
pub use store::TrackStore;
pub use task::{ArenaShape, Task};
pub use trajectory::Trajectory;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\
%ArenaCenterXY.0 ( 100 100 )
%TrackerResolution_PixPerCM.0 ( 2 )
%ArenaDiameter_m.0 ( 1 )
%ArenaZone.0 ( 0 0 90 60 )
%END_HEADER
";

    /// Circle around the center with a single far-off reflection at frame 10.
    fn circling_log() -> String {
        let body: String = (0..40)
            .map(|i| {
                let angle = f64::from(i) * 0.05;
                let (x, y) = if i == 10 {
                    (190.0, 190.0)
                } else {
                    (100.0 + 50.0 * angle.cos(), 100.0 + 50.0 * angle.sin())
                };
                format!("{i} {} {x:.1} {y:.1} 0 0\n", i * 40)
            })
            .collect();
        format!("{HEADER}{body}")
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_load_clean_and_measure() {
        let log = circling_log();
        let mut session =
            loader::load_readers(Task::CarouselSingleFrame, log.as_bytes(), None).unwrap();
        assert_eq!(session.len(), 40);
        assert!(session.interpolated().is_empty());

        let summary = remove_reflections(&mut session, &RemovalOptions::default());
        assert!(summary.repaired.contains(&10));
        assert!(session.is_interpolated(10));
        let repaired = session.position(10);
        assert!((repaired - session.center()).norm() < 60.0);

        let config = AnalysisConfig::for_task(Task::CarouselSingleFrame);
        for &metric in Metric::available(Task::CarouselSingleFrame) {
            // every metric reduces to a value without panicking
            let _ = metric.evaluate(&session, TimeWindow::unbounded(), &config);
        }
        let bad = Metric::PercentBadPoints.evaluate(&session, TimeWindow::unbounded(), &config);
        assert!(bad.as_f64().unwrap() > 0.0);
    }
}
