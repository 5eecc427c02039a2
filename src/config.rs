//! Configuration of metric computation.
//!
//! [`AnalysisConfig`] centralizes every tunable metric parameter. Defaults
//! differ slightly between tasks (sector widths of the water maze and robot
//! avoidance), so configurations are usually created with
//! [`AnalysisConfig::for_task`].
//!
//! # Example
//!
//! ```
//! use behavior_tracks::{AnalysisConfig, Task};
//!
//! let config = AnalysisConfig::for_task(Task::WaterMaze)
//!     .with_distance_stride(5)
//!     .with_thigmotaxis_percent(vec![10.0, 20.0]);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{Result, TrackError};
use crate::metrics::strategy::Strategy;
use crate::task::Task;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the end of a session is determined when nothing happens before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LastTime {
    /// The requested window end.
    #[default]
    FromParameter,
    /// The earlier of the window end and the last recorded timestamp.
    FromData,
}

/// Parameters of a smoothed, subsampled speed series.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpeedSampling {
    /// Speed threshold in cm/s.
    pub min_speed: f64,
    /// Records between two speed samples.
    pub stride: usize,
    /// Number of consecutive speed samples averaged.
    pub smooth: usize,
}

impl SpeedSampling {
    /// Create sampling parameters.
    #[must_use]
    pub const fn new(min_speed: f64, stride: usize, smooth: usize) -> Self {
        Self {
            min_speed,
            stride,
            smooth,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.stride == 0 {
            return Err(TrackError::invalid_config(format!(
                "{name}: stride must be at least 1"
            )));
        }
        if self.smooth == 0 {
            return Err(TrackError::invalid_config(format!(
                "{name}: smoothing window must be at least 1"
            )));
        }
        Ok(())
    }
}

/// Parameters of the movement strategy classification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrategyParams {
    /// Records per bin.
    pub rows: usize,
    /// Minimum linear speed (cm/s) counted as movement.
    pub min_speed: f64,
    /// Minimum angular speed (degrees/s) counted as a reaction after a shock.
    pub min_angle: f64,
    /// Width of the outer annulus in percent of the radius; the rest is the center.
    pub border_percent: f64,
    /// Strategies summed in the numerator of the proportion of strategies.
    pub numerator: Vec<Strategy>,
    /// Strategies summed in the denominator of the proportion of strategies.
    pub denominator: Vec<Strategy>,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            rows: 25,
            min_speed: 10.0,
            min_angle: 7.0,
            border_percent: 50.0,
            numerator: Vec::new(),
            denominator: Vec::new(),
        }
    }
}

/// Parameters of the average distance from a water maze location.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AvgDistanceParams {
    /// Skip the minimal time needed to swim to the location.
    pub remove_beginning: bool,
    /// Records between two samples of the travelled distance.
    pub stride: usize,
    /// Minimal step (pixels) counted in the travelled distance.
    pub min_difference: f64,
}

impl Default for AvgDistanceParams {
    fn default() -> Self {
        Self {
            remove_beginning: false,
            stride: 1,
            min_difference: 0.0,
        }
    }
}

/// Tunable parameters of the metric library.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisConfig {
    // Time handling
    /// End-of-session policy for time-to-event metrics.
    pub last_time: LastTime,

    // Distance
    /// Records between two samples of the total distance.
    pub distance_stride: usize,
    /// Minimal step in pixels counted in the total distance.
    pub distance_min_difference: f64,

    // Sectors; `None` widths use the session's sector width
    /// Width of the target sector in degrees.
    pub target_width: Option<f64>,
    /// Width of the sector opposite to the target in degrees.
    pub opposite_width: Option<f64>,
    /// Width of the angle boxes of "Time in sectors".
    pub sectors_width: Option<f64>,
    /// Offset (degrees) of the first angle box relative to the target.
    pub sectors_center: f64,
    /// Width of the chosen sector in degrees.
    pub chosen_sector_width: Option<f64>,
    /// Center of the chosen sector relative to the target, in degrees.
    pub chosen_sector_center: f64,
    /// Annulus widths (percent of the radius) of the thigmotaxis metric.
    pub thigmotaxis_percent: Vec<f64>,

    // Mobility
    /// Speed series of the maximum time of immobility.
    pub immobility: SpeedSampling,
    /// Speed series of the periodicity.
    pub periodicity: SpeedSampling,
    /// Minimum interval lengths (seconds) of the periodicity, one result each.
    pub periodicity_min_times: Vec<f64>,
    /// Speed series of the proportion of time moving.
    pub mobility: SpeedSampling,

    // Shocks
    /// Records between a shock and the sample compared with it.
    pub shock_after_rows: usize,
    /// Use absolute angle changes in the median angle after shock.
    pub shock_absolute: bool,

    /// Strategy classification.
    pub strategy: StrategyParams,

    // Data quality and arena
    /// Margin in pixels beyond the arena edge counted as outside.
    pub outside_distance: f64,
    /// Records between two samples of the arena rotation speed.
    pub rotation_rows: usize,

    // Water maze
    /// Platform radius multiplier defining its vicinity.
    pub platform_adjustment: f64,
    /// Average distance from the platform.
    pub avg_distance: AvgDistanceParams,
    /// Angles (degrees, relative to the platform) of the chosen locations.
    pub chosen_angles: Vec<f64>,
    /// Average distance from the chosen locations.
    pub avg_distance_chosen: AvgDistanceParams,

    // Open field
    /// Corner quadrants (otherwise edge quadrants).
    pub corner_quadrants: bool,

    // Robot avoidance
    /// Width (cm) of the rat-robot distance brackets.
    pub distance_box_width: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            last_time: LastTime::FromParameter,

            distance_stride: 25,
            distance_min_difference: 0.0,

            target_width: None,
            opposite_width: None,
            sectors_width: None,
            sectors_center: 0.0,
            chosen_sector_width: None,
            chosen_sector_center: 0.0,
            thigmotaxis_percent: vec![20.0],

            immobility: SpeedSampling::new(10.0, 12, 2),
            periodicity: SpeedSampling::new(10.0, 12, 2),
            periodicity_min_times: vec![9.0],
            mobility: SpeedSampling::new(5.0, 12, 2),

            shock_after_rows: 25,
            shock_absolute: false,

            strategy: StrategyParams::default(),

            outside_distance: 1.0,
            rotation_rows: 25,

            platform_adjustment: 2.0,
            avg_distance: AvgDistanceParams::default(),
            chosen_angles: vec![180.0],
            avg_distance_chosen: AvgDistanceParams::default(),

            corner_quadrants: true,

            distance_box_width: 10.0,
        }
    }
}

impl AnalysisConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for the given task.
    #[must_use]
    pub fn for_task(task: Task) -> Self {
        match task {
            Task::WaterMaze => Self {
                target_width: Some(90.0),
                opposite_width: Some(90.0),
                sectors_width: Some(90.0),
                chosen_sector_width: Some(90.0),
                ..Self::default()
            },
            Task::RobotAvoidance => Self {
                sectors_width: Some(90.0),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.distance_stride == 0 {
            return Err(TrackError::invalid_config(
                "distance_stride must be at least 1",
            ));
        }
        let widths = [
            ("target_width", self.target_width),
            ("opposite_width", self.opposite_width),
            ("sectors_width", self.sectors_width),
            ("chosen_sector_width", self.chosen_sector_width),
        ];
        for (name, width) in widths {
            if let Some(width) = width {
                if width.is_nan() || width <= 0.0 || width > 360.0 {
                    return Err(TrackError::invalid_config(format!(
                        "{name} must be in (0, 360], got {width}"
                    )));
                }
            }
        }
        if self
            .thigmotaxis_percent
            .iter()
            .any(|p| !(0.0..=100.0).contains(p))
        {
            return Err(TrackError::invalid_config(
                "thigmotaxis_percent values must be within [0, 100]",
            ));
        }
        self.immobility.validate("immobility")?;
        self.periodicity.validate("periodicity")?;
        self.mobility.validate("mobility")?;
        if self.strategy.rows == 0 {
            return Err(TrackError::invalid_config("strategy rows must be at least 1"));
        }
        if self.rotation_rows == 0 {
            return Err(TrackError::invalid_config("rotation_rows must be at least 1"));
        }
        if self.avg_distance.stride == 0 || self.avg_distance_chosen.stride == 0 {
            return Err(TrackError::invalid_config(
                "average distance stride must be at least 1",
            ));
        }
        if self.distance_box_width <= 0.0 {
            return Err(TrackError::invalid_config(
                "distance_box_width must be positive",
            ));
        }
        Ok(())
    }

    /// Set the total distance stride.
    #[must_use]
    pub const fn with_distance_stride(mut self, stride: usize) -> Self {
        self.distance_stride = stride;
        self
    }

    /// Set the minimal step counted in the total distance.
    #[must_use]
    pub const fn with_distance_min_difference(mut self, pixels: f64) -> Self {
        self.distance_min_difference = pixels;
        self
    }

    /// Set the end-of-session policy.
    #[must_use]
    pub const fn with_last_time(mut self, last_time: LastTime) -> Self {
        self.last_time = last_time;
        self
    }

    /// Set the thigmotaxis annulus widths.
    #[must_use]
    pub fn with_thigmotaxis_percent(mut self, percent: Vec<f64>) -> Self {
        self.thigmotaxis_percent = percent;
        self
    }

    /// Set the periodicity minimum interval lengths.
    #[must_use]
    pub fn with_periodicity_min_times(mut self, seconds: Vec<f64>) -> Self {
        self.periodicity_min_times = seconds;
        self
    }

    /// Set the chosen sector.
    #[must_use]
    pub const fn with_chosen_sector(mut self, width: Option<f64>, center: f64) -> Self {
        self.chosen_sector_width = width;
        self.chosen_sector_center = center;
        self
    }

    /// Set the strategy classification parameters.
    #[must_use]
    pub fn with_strategy(mut self, strategy: StrategyParams) -> Self {
        self.strategy = strategy;
        self
    }
}
