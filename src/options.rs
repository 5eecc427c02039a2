//! Typed parsing of stored analysis options.
//!
//! Options are stored one per line as `%|<TaskCode><Name>|% <value>`, for
//! example `%|CMStrideParTotalDistance|% 30`. Every recognized option is
//! declared in [`SCHEMA`] with the kind of value it accepts. Values are parsed
//! according to that kind; a value that does not parse is ignored with a
//! warning and the task preset is kept.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::task::Task;

const OPEN: &str = "%|";
const CLOSE: &str = "|%";

/// Kind of value an option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Whole number; a fractional value is truncated toward zero.
    Int,
    /// Any number.
    Number,
    /// A number or the word `default`.
    NumberOrDefault,
    /// `True`/`False` (any case) or `1`/`0`.
    Bool,
    /// A single number or a bracketed, comma separated list of numbers.
    NumberList,
}

/// A parsed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int(usize),
    Number(f64),
    Default,
    Bool(bool),
    NumberList(Vec<f64>),
}

/// Declaration of one option.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    /// Option name without the task prefix.
    pub name: &'static str,
    /// Accepted value kind.
    pub kind: OptionKind,
    /// Short description with the unit.
    pub description: &'static str,
}

const fn spec(name: &'static str, kind: OptionKind, description: &'static str) -> OptionSpec {
    OptionSpec {
        name,
        kind,
        description,
    }
}

/// All recognized options.
pub const SCHEMA: &[OptionSpec] = &[
    spec("StrideParTotalDistance", OptionKind::Int, "Computed from every [in rows]"),
    spec("MinDiffParTotalDistance", OptionKind::Number, "Minimal distance counted [in pixels]"),
    spec("WidthParTimeInTarget", OptionKind::NumberOrDefault, "Width of sector [in degrees]"),
    spec("WidthParTimeInOpposite", OptionKind::NumberOrDefault, "Width of sector [in degrees]"),
    spec("WidthParTimeInChosen", OptionKind::NumberOrDefault, "Width of sector [in degrees]"),
    spec("AngleParTimeInChosen", OptionKind::Number, "Center of sector relative to the target [in degrees]"),
    spec("WidthParTimeInSectors", OptionKind::NumberOrDefault, "Width of sector [in degrees]"),
    spec("CenterParTimeInSectors", OptionKind::Number, "Center of sector [in degrees]"),
    spec("ThigmotaxisPercentSize", OptionKind::NumberList, "Annulus width [in percents]"),
    spec("MinSpeedMaxTimeImmobility", OptionKind::Number, "Minimum speed counted [in cm/s]"),
    spec("SkipMaxTimeImmobility", OptionKind::Int, "Computed from every [in rows]"),
    spec("SmoothMaxTimeImmobility", OptionKind::Int, "Averaged across [in intervals]"),
    spec("MinSpeedPeriodicity", OptionKind::Number, "Minimum speed counted [in cm/s]"),
    spec("SkipPeriodicity", OptionKind::Int, "Computed from every [in rows]"),
    spec("SmoothPeriodicity", OptionKind::Int, "Averaged across [in intervals]"),
    spec("MinTimePeriodicity", OptionKind::NumberList, "Minimum time of interval [in seconds]"),
    spec("MinSpeedPercentMobility", OptionKind::Number, "Minimum speed counted [in cm/s]"),
    spec("SkipPercentMobility", OptionKind::Int, "Computed from every [in rows]"),
    spec("SmoothPercentMobility", OptionKind::Int, "Averaged across [in intervals]"),
    spec("SkipSpeedAfterShock", OptionKind::Int, "Computed from every [in rows]"),
    spec("AbsoluteSpeedAfterShock", OptionKind::Bool, "Computed from absolute values"),
    spec("rowsStrategies", OptionKind::Int, "Length of time bins [in rows]"),
    spec("minSpeedStrategies", OptionKind::Number, "Minimum speed counted [in cm/s]"),
    spec("minAngleStrategies", OptionKind::Number, "Minimum angle counted (after shock) [in deg/s]"),
    spec("borderPercentSizeStrategies", OptionKind::Number, "Annulus width [in percents]"),
    spec("OutsidePointsDistance", OptionKind::Number, "Distance from margin counted [in pixels]"),
    spec("platformAdjustmentT1Stay", OptionKind::Number, "Platform adjustment"),
    spec("RemoveBeginningAvgDistance", OptionKind::Bool, "Remove minimal time needed to reach target"),
    spec("StrideParAvgDistance", OptionKind::Int, "Computed from every [in rows]"),
    spec("MinDiffParAvgDistance", OptionKind::Number, "Minimal distance counted [in pixels]"),
    spec("angleParAvgDistanceCustom", OptionKind::NumberList, "Angle of chosen location relative to the target [in degrees]"),
    spec("RemoveBeginningAvgDistanceCustom", OptionKind::Bool, "Remove minimal time needed to reach target"),
    spec("StrideParAvgDistanceCustom", OptionKind::Int, "Computed from every [in rows]"),
    spec("MinDiffParAvgDistanceCustom", OptionKind::Number, "Minimal distance counted [in pixels]"),
    spec("CornerQuadrants", OptionKind::Bool, "Corner quadrants (otherwise edge)"),
    spec("WidthParTimeInDistances", OptionKind::Number, "Width of brackets [in cm]"),
];

/// Look up the declaration of an option.
#[must_use]
pub fn find_spec(name: &str) -> Option<&'static OptionSpec> {
    SCHEMA.iter().find(|spec| spec.name == name)
}

fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse `text` as a value of the given kind.
///
/// Returns `None` if the text does not match the kind.
#[must_use]
pub fn parse_value(kind: OptionKind, text: &str) -> Option<OptionValue> {
    let text = text.trim();
    match kind {
        OptionKind::Int => {
            let value = parse_number(text)?.trunc();
            (value >= 0.0).then(|| OptionValue::Int(value as usize))
        }
        OptionKind::Number => parse_number(text).map(OptionValue::Number),
        OptionKind::NumberOrDefault => {
            if text.trim_matches(|c| c == '\'' || c == '"') == "default" {
                Some(OptionValue::Default)
            } else {
                parse_number(text).map(OptionValue::Number)
            }
        }
        OptionKind::Bool => match text.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(OptionValue::Bool(true)),
            "false" | "0" => Some(OptionValue::Bool(false)),
            _ => None,
        },
        OptionKind::NumberList => {
            let inner = match text.strip_prefix('[') {
                Some(rest) => rest.strip_suffix(']')?,
                None => return parse_number(text).map(|v| OptionValue::NumberList(vec![v])),
            };
            inner
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(parse_number)
                .collect::<Option<Vec<_>>>()
                .filter(|values| !values.is_empty())
                .map(OptionValue::NumberList)
        }
    }
}

/// Raw option lines keyed by their full (task-prefixed) name.
#[derive(Debug, Clone, Default)]
pub struct Options {
    values: HashMap<String, String>,
}

impl Options {
    /// Collect option lines from text. The first occurrence of a name wins.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for line in text.lines() {
            let Some(rest) = line.trim_start().strip_prefix(OPEN) else {
                continue;
            };
            let Some((name, value)) = rest.split_once(CLOSE) else {
                continue;
            };
            values
                .entry(name.to_string())
                .or_insert_with(|| value.trim().to_string());
        }
        Self { values }
    }

    /// Read options from a file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Number of stored option lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no option line was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw text of a task-independent option.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Typed value of a declared option for `task`.
    ///
    /// Returns `None` if the option is absent or its value does not parse.
    #[must_use]
    pub fn get(&self, task: Task, spec: &OptionSpec) -> Option<OptionValue> {
        let key = format!("{}{}", task.code(), spec.name);
        let raw = self.values.get(&key)?;
        let value = parse_value(spec.kind, raw);
        if value.is_none() {
            warn!(option = %key, value = %raw, "ignoring malformed option value");
        }
        value
    }
}

impl AnalysisConfig {
    /// Build the preset of `task` and override it with stored options.
    #[must_use]
    pub fn from_options(task: Task, options: &Options) -> Self {
        let mut config = Self::for_task(task);
        for spec in SCHEMA {
            if let Some(value) = options.get(task, spec) {
                debug!(option = spec.name, ?value, "applying option");
                config.apply_option(spec.name, value);
            }
        }
        config
    }

    /// Set the field an option controls. Values of the wrong kind are ignored.
    pub fn apply_option(&mut self, name: &str, value: OptionValue) {
        use OptionValue::{Bool, Default, Int, Number, NumberList};

        match (name, value) {
            ("StrideParTotalDistance", Int(v)) => self.distance_stride = v,
            ("MinDiffParTotalDistance", Number(v)) => self.distance_min_difference = v,
            ("WidthParTimeInTarget", v @ (Number(_) | Default)) => self.target_width = width(&v),
            ("WidthParTimeInOpposite", v @ (Number(_) | Default)) => {
                self.opposite_width = width(&v);
            }
            ("WidthParTimeInChosen", v @ (Number(_) | Default)) => {
                self.chosen_sector_width = width(&v);
            }
            ("AngleParTimeInChosen", Number(v)) => self.chosen_sector_center = v,
            ("WidthParTimeInSectors", v @ (Number(_) | Default)) => self.sectors_width = width(&v),
            ("CenterParTimeInSectors", Number(v)) => self.sectors_center = v,
            ("ThigmotaxisPercentSize", NumberList(v)) => self.thigmotaxis_percent = v,
            ("MinSpeedMaxTimeImmobility", Number(v)) => self.immobility.min_speed = v,
            ("SkipMaxTimeImmobility", Int(v)) => self.immobility.stride = v,
            ("SmoothMaxTimeImmobility", Int(v)) => self.immobility.smooth = v,
            ("MinSpeedPeriodicity", Number(v)) => self.periodicity.min_speed = v,
            ("SkipPeriodicity", Int(v)) => self.periodicity.stride = v,
            ("SmoothPeriodicity", Int(v)) => self.periodicity.smooth = v,
            ("MinTimePeriodicity", NumberList(v)) => self.periodicity_min_times = v,
            ("MinSpeedPercentMobility", Number(v)) => self.mobility.min_speed = v,
            ("SkipPercentMobility", Int(v)) => self.mobility.stride = v,
            ("SmoothPercentMobility", Int(v)) => self.mobility.smooth = v,
            ("SkipSpeedAfterShock", Int(v)) => self.shock_after_rows = v,
            ("AbsoluteSpeedAfterShock", Bool(v)) => self.shock_absolute = v,
            ("rowsStrategies", Int(v)) => self.strategy.rows = v,
            ("minSpeedStrategies", Number(v)) => self.strategy.min_speed = v,
            ("minAngleStrategies", Number(v)) => self.strategy.min_angle = v,
            ("borderPercentSizeStrategies", Number(v)) => self.strategy.border_percent = v,
            ("OutsidePointsDistance", Number(v)) => self.outside_distance = v,
            ("platformAdjustmentT1Stay", Number(v)) => self.platform_adjustment = v,
            ("RemoveBeginningAvgDistance", Bool(v)) => self.avg_distance.remove_beginning = v,
            ("StrideParAvgDistance", Int(v)) => self.avg_distance.stride = v,
            ("MinDiffParAvgDistance", Number(v)) => self.avg_distance.min_difference = v,
            ("angleParAvgDistanceCustom", NumberList(v)) => self.chosen_angles = v,
            ("RemoveBeginningAvgDistanceCustom", Bool(v)) => {
                self.avg_distance_chosen.remove_beginning = v;
            }
            ("StrideParAvgDistanceCustom", Int(v)) => self.avg_distance_chosen.stride = v,
            ("MinDiffParAvgDistanceCustom", Number(v)) => {
                self.avg_distance_chosen.min_difference = v;
            }
            ("CornerQuadrants", Bool(v)) => self.corner_quadrants = v,
            ("WidthParTimeInDistances", Number(v)) => self.distance_box_width = v,
            (name, value) => debug!(option = name, ?value, "option not applicable"),
        }
    }
}

fn width(value: &OptionValue) -> Option<f64> {
    match value {
        OptionValue::Number(v) => Some(*v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_kinds() {
        assert_eq!(parse_value(OptionKind::Int, "25"), Some(OptionValue::Int(25)));
        assert_eq!(parse_value(OptionKind::Int, "2.7"), Some(OptionValue::Int(2)));
        assert_eq!(parse_value(OptionKind::Int, "-1"), None);
        assert_eq!(parse_value(OptionKind::Number, "0.5"), Some(OptionValue::Number(0.5)));
        assert_eq!(parse_value(OptionKind::Number, "abc"), None);
        assert_eq!(
            parse_value(OptionKind::NumberOrDefault, "'default'"),
            Some(OptionValue::Default)
        );
        assert_eq!(parse_value(OptionKind::Bool, "False"), Some(OptionValue::Bool(false)));
        assert_eq!(parse_value(OptionKind::Bool, "yes"), None);
        assert_eq!(
            parse_value(OptionKind::NumberList, "[9, 12.5]"),
            Some(OptionValue::NumberList(vec![9.0, 12.5]))
        );
        assert_eq!(
            parse_value(OptionKind::NumberList, "20"),
            Some(OptionValue::NumberList(vec![20.0]))
        );
        assert_eq!(parse_value(OptionKind::NumberList, "[9, x]"), None);
        assert_eq!(parse_value(OptionKind::NumberList, "__import__('os')"), None);
    }

    #[test]
    fn test_options_parse_first_wins() {
        let options = Options::parse("%|CMStrideParTotalDistance|% 30\n%|CMStrideParTotalDistance|% 40\nnoise\n");
        assert_eq!(options.len(), 1);
        assert_eq!(options.raw("CMStrideParTotalDistance"), Some("30"));
    }

    #[test]
    fn test_config_from_options() {
        let text = "\
%|CMStrideParTotalDistance|% 30
%|CMMinTimePeriodicity|% [5, 10]
%|CMAbsoluteSpeedAfterShock|% True
%|CMWidthParTimeInSectors|% 45
%|CMSkipPeriodicity|% twelve
%|OFStrideParTotalDistance|% 99
";
        let options = Options::parse(text);
        let config = AnalysisConfig::from_options(Task::CarouselMaze, &options);
        assert_eq!(config.distance_stride, 30);
        assert_eq!(config.periodicity_min_times, vec![5.0, 10.0]);
        assert!(config.shock_absolute);
        assert_eq!(config.sectors_width, Some(45.0));
        assert_eq!(config.periodicity.stride, 12);
    }

    #[test]
    fn test_default_width_restores_session_width() {
        let options = Options::parse("%|MWMWidthParTimeInTarget|% default\n");
        let config = AnalysisConfig::from_options(Task::WaterMaze, &options);
        assert_eq!(config.target_width, None);
        assert_eq!(config.opposite_width, Some(90.0));
    }

    #[test]
    fn test_schema_names_unique() {
        for (i, a) in SCHEMA.iter().enumerate() {
            assert!(SCHEMA[i + 1..].iter().all(|b| b.name != a.name), "{}", a.name);
            assert!(find_spec(a.name).is_some());
        }
    }
}
