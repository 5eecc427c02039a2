//! Per-task metric catalogue.
//!
//! [`Metric`] names every metric of the library. Each task offers a subset of
//! them, in reporting order ([`Metric::available`]), under task-specific
//! display names. [`Metric::evaluate`] dispatches to the metric function with
//! the parameters of an [`AnalysisConfig`], choosing the task-specific variant
//! where one exists (square arena boundaries, platform events, robot speed).

use std::fmt;

use crate::config::AnalysisConfig;
use crate::task::{ArenaShape, Task};
use crate::trajectory::Trajectory;

use super::sectors::SectorCenter;
use super::{
    distance, mobility, open_field, quality, robot, sectors, strategy, water_maze, zones,
    MetricValue, TimeWindow,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A reportable metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Metric {
    TotalDistance,
    MaximumTimeAvoided,
    Entrances,
    /// Time to the first shock, or to the platform in the water maze.
    TimeToFirst,
    Shocks,
    TimeInTargetSector,
    TimeInOppositeSector,
    TimeInChosenSector,
    TimeInSectors,
    Thigmotaxis,
    DirectionalMean,
    CircularVariance,
    MaximumTimeOfImmobility,
    Periodicity,
    ProportionOfTimeMoving,
    MeanDistanceFromCenter,
    /// Angle after shock, or the rat's speed in robot avoidance.
    MedianSpeedAfterShock,
    AngleOfTargetSector,
    WidthOfTargetSector,
    RealMinimumTime,
    RealMaximumTime,
    /// Name of the room (or robot) file of a pair.
    PairedFilename,
    Strategies,
    ProportionOfStrategies,
    PercentBadPoints,
    Reflections,
    OutsidePoints,
    RotationSpeed,
    TimeToFirstPass,
    Passes,
    AverageDistanceFromTarget,
    TimeToFirstStay,
    AverageDistanceFromChosen,
    TimeInQuadrants,
    MeanDistanceFromSide,
    MeanDistanceFromRobot,
    TimeInDistances,
}

const CAROUSEL: &[Metric] = &[
    Metric::TotalDistance,
    Metric::MaximumTimeAvoided,
    Metric::Entrances,
    Metric::TimeToFirst,
    Metric::Shocks,
    Metric::TimeInTargetSector,
    Metric::TimeInOppositeSector,
    Metric::TimeInChosenSector,
    Metric::TimeInSectors,
    Metric::Thigmotaxis,
    Metric::DirectionalMean,
    Metric::CircularVariance,
    Metric::MaximumTimeOfImmobility,
    Metric::Periodicity,
    Metric::ProportionOfTimeMoving,
    Metric::MeanDistanceFromCenter,
    Metric::MedianSpeedAfterShock,
    Metric::AngleOfTargetSector,
    Metric::WidthOfTargetSector,
    Metric::RealMinimumTime,
    Metric::RealMaximumTime,
    Metric::PairedFilename,
    Metric::Strategies,
    Metric::ProportionOfStrategies,
    Metric::PercentBadPoints,
    Metric::Reflections,
    Metric::OutsidePoints,
    Metric::RotationSpeed,
];

const CAROUSEL_SINGLE_FRAME: &[Metric] = &[
    Metric::TotalDistance,
    Metric::MaximumTimeAvoided,
    Metric::Entrances,
    Metric::TimeToFirst,
    Metric::Shocks,
    Metric::TimeInTargetSector,
    Metric::TimeInOppositeSector,
    Metric::TimeInChosenSector,
    Metric::TimeInSectors,
    Metric::Thigmotaxis,
    Metric::DirectionalMean,
    Metric::CircularVariance,
    Metric::MaximumTimeOfImmobility,
    Metric::Periodicity,
    Metric::ProportionOfTimeMoving,
    Metric::MeanDistanceFromCenter,
    Metric::MedianSpeedAfterShock,
    Metric::AngleOfTargetSector,
    Metric::WidthOfTargetSector,
    Metric::RealMinimumTime,
    Metric::RealMaximumTime,
    Metric::Strategies,
    Metric::ProportionOfStrategies,
    Metric::PercentBadPoints,
    Metric::Reflections,
    Metric::OutsidePoints,
];

const WATER_MAZE: &[Metric] = &[
    Metric::TotalDistance,
    Metric::TimeToFirst,
    Metric::TimeInTargetSector,
    Metric::TimeInOppositeSector,
    Metric::TimeInChosenSector,
    Metric::TimeInSectors,
    Metric::Thigmotaxis,
    Metric::DirectionalMean,
    Metric::CircularVariance,
    Metric::MaximumTimeOfImmobility,
    Metric::ProportionOfTimeMoving,
    Metric::MeanDistanceFromCenter,
    Metric::RealMinimumTime,
    Metric::RealMaximumTime,
    Metric::PercentBadPoints,
    Metric::Reflections,
    Metric::OutsidePoints,
    Metric::TimeToFirstPass,
    Metric::Passes,
    Metric::AverageDistanceFromTarget,
    Metric::TimeToFirstStay,
    Metric::AverageDistanceFromChosen,
    Metric::AngleOfTargetSector,
];

const OPEN_FIELD: &[Metric] = &[
    Metric::TotalDistance,
    Metric::Thigmotaxis,
    Metric::DirectionalMean,
    Metric::CircularVariance,
    Metric::MaximumTimeOfImmobility,
    Metric::ProportionOfTimeMoving,
    Metric::MeanDistanceFromCenter,
    Metric::RealMinimumTime,
    Metric::RealMaximumTime,
    Metric::PercentBadPoints,
    Metric::Reflections,
    Metric::OutsidePoints,
    Metric::TimeInQuadrants,
    Metric::MeanDistanceFromSide,
];

const ROBOT_AVOIDANCE: &[Metric] = &[
    Metric::TotalDistance,
    Metric::MaximumTimeAvoided,
    Metric::Entrances,
    Metric::TimeToFirst,
    Metric::Shocks,
    Metric::Thigmotaxis,
    Metric::DirectionalMean,
    Metric::CircularVariance,
    Metric::MaximumTimeOfImmobility,
    Metric::ProportionOfTimeMoving,
    Metric::MeanDistanceFromCenter,
    Metric::RealMinimumTime,
    Metric::RealMaximumTime,
    Metric::PercentBadPoints,
    Metric::Reflections,
    Metric::OutsidePoints,
    Metric::TimeInSectors,
    Metric::MedianSpeedAfterShock,
    Metric::PairedFilename,
    Metric::MeanDistanceFromRobot,
    Metric::TimeInDistances,
];

impl Metric {
    /// Metrics offered for `task`, in reporting order.
    #[must_use]
    pub const fn available(task: Task) -> &'static [Self] {
        match task {
            Task::CarouselMaze => CAROUSEL,
            Task::CarouselSingleFrame => CAROUSEL_SINGLE_FRAME,
            Task::WaterMaze => WATER_MAZE,
            Task::OpenField => OPEN_FIELD,
            Task::RobotAvoidance => ROBOT_AVOIDANCE,
        }
    }

    /// Display name of the metric in `task`.
    #[must_use]
    pub const fn display_name(self, task: Task) -> &'static str {
        match (self, task) {
            (Self::AngleOfTargetSector, Task::WaterMaze) => "Angle of the platform",
            (Self::PairedFilename, Task::RobotAvoidance) => "Robot filename",
            _ => self.name(),
        }
    }

    /// Default display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TotalDistance => "Total distance",
            Self::MaximumTimeAvoided => "Maximum time avoided",
            Self::Entrances => "Entrances",
            Self::TimeToFirst => "Time to first",
            Self::Shocks => "Shocks",
            Self::TimeInTargetSector => "Time in target sector",
            Self::TimeInOppositeSector => "Time in opposite sector",
            Self::TimeInChosenSector => "Time in chosen sector",
            Self::TimeInSectors => "Time in sectors",
            Self::Thigmotaxis => "Thigmotaxis",
            Self::DirectionalMean => "Directional mean",
            Self::CircularVariance => "Circular variance",
            Self::MaximumTimeOfImmobility => "Maximum time of immobility",
            Self::Periodicity => "Periodicity",
            Self::ProportionOfTimeMoving => "Proportion of time moving",
            Self::MeanDistanceFromCenter => "Mean distance from center",
            Self::MedianSpeedAfterShock => "Median speed after shock",
            Self::AngleOfTargetSector => "Angle of target sector",
            Self::WidthOfTargetSector => "Width of target sector",
            Self::RealMinimumTime => "Real minimum time",
            Self::RealMaximumTime => "Real maximum time",
            Self::PairedFilename => "Room frame filename",
            Self::Strategies => "Strategies",
            Self::ProportionOfStrategies => "Proportion of strategies",
            Self::PercentBadPoints => "Percent bad points",
            Self::Reflections => "Reflections",
            Self::OutsidePoints => "Outside points",
            Self::RotationSpeed => "Rotation speed",
            Self::TimeToFirstPass => "Time to first pass",
            Self::Passes => "Passes",
            Self::AverageDistanceFromTarget => "Average distance from target",
            Self::TimeToFirstStay => "Time to first stay",
            Self::AverageDistanceFromChosen => "Average distance from chosen",
            Self::TimeInQuadrants => "Time in quadrants",
            Self::MeanDistanceFromSide => "Mean distance from side",
            Self::MeanDistanceFromRobot => "Mean distance from robot",
            Self::TimeInDistances => "Time in distances",
        }
    }

    /// Look up a metric of `task` by its display name.
    #[must_use]
    pub fn from_name(task: Task, name: &str) -> Option<Self> {
        Self::available(task)
            .iter()
            .copied()
            .find(|m| m.display_name(task) == name)
    }

    /// Whether the value does not depend on the time window.
    ///
    /// Batch runs over several windows report these once.
    #[must_use]
    pub const fn is_batch_invariant(self) -> bool {
        matches!(
            self,
            Self::RealMinimumTime
                | Self::RealMaximumTime
                | Self::PairedFilename
                | Self::AngleOfTargetSector
                | Self::WidthOfTargetSector
        )
    }

    /// Compute the metric over `window`.
    #[must_use]
    pub fn evaluate(
        self,
        trajectory: &Trajectory,
        window: TimeWindow,
        config: &AnalysisConfig,
    ) -> MetricValue {
        let task = trajectory.task();
        let constants = trajectory.constants();
        let width = |w: Option<f64>| w.unwrap_or(constants.sector_width);
        let square = task.arena_shape() == ArenaShape::Square;

        match self {
            Self::TotalDistance => distance::total_distance(
                trajectory,
                window,
                config.distance_stride,
                config.distance_min_difference,
            ),
            Self::MaximumTimeAvoided => {
                zones::max_time_avoided(trajectory, window, config.last_time)
            }
            Self::Entrances => zones::entrances(trajectory, window),
            Self::TimeToFirst if task == Task::WaterMaze => {
                water_maze::time_to_platform(trajectory, window, config.last_time)
            }
            Self::TimeToFirst => zones::time_to_first_shock(trajectory, window, config.last_time),
            Self::Shocks => zones::shocks(trajectory, window),
            Self::TimeInTargetSector => sectors::time_in_sector(
                trajectory,
                window,
                width(config.target_width),
                SectorCenter::Target,
            ),
            Self::TimeInOppositeSector => sectors::time_in_sector(
                trajectory,
                window,
                width(config.opposite_width),
                SectorCenter::Opposite,
            ),
            Self::TimeInChosenSector => sectors::time_in_sector(
                trajectory,
                window,
                width(config.chosen_sector_width),
                SectorCenter::Relative(config.chosen_sector_center),
            ),
            Self::TimeInSectors => sectors::angle_boxes(
                trajectory,
                window,
                width(config.sectors_width),
                SectorCenter::Relative(config.sectors_center),
            ),
            Self::Thigmotaxis if square => {
                open_field::thigmotaxis(trajectory, window, &config.thigmotaxis_percent)
            }
            Self::Thigmotaxis => {
                sectors::thigmotaxis(trajectory, window, &config.thigmotaxis_percent)
            }
            Self::DirectionalMean => sectors::directional_mean(trajectory, window),
            Self::CircularVariance => sectors::circular_variance(trajectory, window),
            Self::MaximumTimeOfImmobility => {
                mobility::max_time_of_immobility(trajectory, window, &config.immobility)
            }
            Self::Periodicity => mobility::periodicity(
                trajectory,
                window,
                &config.periodicity,
                &config.periodicity_min_times,
            ),
            Self::ProportionOfTimeMoving => {
                mobility::proportion_of_time_moving(trajectory, window, &config.mobility)
            }
            Self::MeanDistanceFromCenter => distance::mean_distance_from_center(trajectory, window),
            Self::MedianSpeedAfterShock if task == Task::RobotAvoidance => {
                robot::speed_after_shock(trajectory, window, config.shock_after_rows)
            }
            Self::MedianSpeedAfterShock => zones::angle_after_shock(
                trajectory,
                window,
                config.shock_after_rows,
                config.shock_absolute,
            ),
            Self::AngleOfTargetSector => MetricValue::number(constants.center_angle, 1),
            Self::WidthOfTargetSector => MetricValue::number(constants.sector_width, 1),
            Self::RealMinimumTime => quality::real_minimum_time(trajectory),
            Self::RealMaximumTime => quality::real_maximum_time(trajectory),
            Self::PairedFilename => trajectory
                .source()
                .and_then(|key| key.paired())
                .and_then(|path| path.file_name())
                .map_or(MetricValue::Na, |name| {
                    MetricValue::Text(name.to_string_lossy().into_owned())
                }),
            Self::Strategies => strategy::strategy_summary(trajectory, window, &config.strategy),
            Self::ProportionOfStrategies => {
                strategy::proportion_of_strategies(trajectory, window, &config.strategy)
            }
            Self::PercentBadPoints => quality::percent_bad_points(trajectory, window),
            Self::Reflections => quality::reflections(trajectory, window),
            Self::OutsidePoints if square => {
                open_field::outside_points(trajectory, window, config.outside_distance)
            }
            Self::OutsidePoints => {
                quality::outside_points(trajectory, window, config.outside_distance)
            }
            Self::RotationSpeed => {
                mobility::rotation_speed(trajectory, window, config.rotation_rows)
            }
            Self::TimeToFirstPass => {
                water_maze::time_to_first_pass(trajectory, window, config.last_time)
            }
            Self::Passes => water_maze::passes(trajectory, window),
            Self::AverageDistanceFromTarget => {
                water_maze::avg_distance_from_platform(trajectory, window, &config.avg_distance)
            }
            Self::TimeToFirstStay => water_maze::time_to_first_stay(
                trajectory,
                window,
                config.platform_adjustment,
                config.last_time,
            ),
            Self::AverageDistanceFromChosen => water_maze::avg_distance_chosen(
                trajectory,
                window,
                &config.chosen_angles,
                &config.avg_distance_chosen,
            ),
            Self::TimeInQuadrants => {
                open_field::time_in_quadrants(trajectory, window, config.corner_quadrants)
            }
            Self::MeanDistanceFromSide => open_field::mean_distance_from_side(trajectory, window),
            Self::MeanDistanceFromRobot => robot::distance_from_robot(trajectory, window),
            Self::TimeInDistances => {
                robot::distance_boxes(trajectory, window, config.distance_box_width)
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
