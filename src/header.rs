//! Session header parsing.
//!
//! A tracking log starts with marker lines such as
//!
//! ```text
//! %ArenaCenterXY.0 ( 128 128 )
//! %TrackerResolution_PixPerCM.0 ( 2.5 )
//! %ArenaDiameter_m.0 ( 0.82 )
//! %ArenaZone.0 ( 0 0.41 0 60 )
//! %END_HEADER
//! ```
//!
//! in arbitrary order. Values follow the last `(` token of a line. Unknown
//! lines are ignored. Reading stops right after the end-of-header marker so the
//! same reader can be handed to the loader.

use std::io::BufRead;

use crate::error::{Result, TrackError};
use crate::math::{polar_angle, Position};
use crate::task::Task;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Marker of the arena center line.
pub const CENTER_MARKER: &str = "ArenaCenterXY";
/// Marker of the tracker resolution line.
pub const RESOLUTION_MARKER: &str = "TrackerResolution_PixPerCM";
/// Marker of the arena diameter line.
pub const DIAMETER_MARKER: &str = "ArenaDiameter";
/// Marker of the reinforced zone line.
pub const ZONE_MARKER: &str = "%ArenaZone";
/// Marker of the tracker version line.
pub const TRACKER_MARKER: &str = "TrackerVersion";
/// Marker of the entrance latency line.
pub const LATENCY_MARKER: &str = "EntranceLatency";
/// End-of-header marker.
pub const END_MARKER: &str = "END_HEADER";

/// Default width of the reinforced sector in degrees.
pub const DEFAULT_SECTOR_WIDTH: f64 = 60.0;

/// Tracker software that produced the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrackerKind {
    /// iTrack.
    ITrack,
    /// Kachna tracker.
    Kachna,
    /// Legacy Tracker.
    Tracker,
    /// Version line present but not recognized, or absent.
    #[default]
    Unknown,
}

/// Raw header values as found in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    /// Arena center in pixels.
    pub center: Option<(f64, f64)>,
    /// Pixels per centimeter.
    pub resolution: Option<f64>,
    /// Arena diameter in meters.
    pub arena_diameter: Option<f64>,
    /// Numbers of the reinforced zone line.
    pub zone: Option<Vec<f64>>,
    /// Tracker software.
    pub tracker: TrackerKind,
    /// Entrance latency in milliseconds.
    pub entrance_latency: Option<f64>,
}

/// Task-specific reading of the reinforced zone line.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReinforcedZone {
    /// Annular sector around the arena center.
    Sector {
        inner_radius: f64,
        outer_radius: f64,
        center_angle: f64,
        width: f64,
    },
    /// Hidden platform of the water maze.
    Platform { position: Position, radius: f64 },
    /// Avoided zone around the robot.
    Robot { radius: f64 },
}

/// Scalar constants of one session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionConstants {
    /// Arena center in pixels.
    pub center: Position,
    /// Pixels per centimeter, always positive.
    pub resolution: f64,
    /// Arena diameter in meters.
    pub arena_diameter: f64,
    /// Arena radius in pixels.
    pub radius: f64,
    /// Tracker software.
    pub tracker: TrackerKind,
    /// Reinforced zone, if the header declares one.
    pub zone: Option<ReinforcedZone>,
    /// Angle of the target (sector center or platform) in degrees.
    pub center_angle: f64,
    /// Width of the target sector in degrees.
    pub sector_width: f64,
    /// Entrance latency in milliseconds.
    pub entrance_latency: f64,
}

impl SessionConstants {
    /// Derive session constants for `task` from a parsed header.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::MalformedHeader`] if the center, the resolution or
    /// the diameter is missing, the resolution or the diameter is not positive,
    /// or the water maze platform is not declared.
    pub fn from_header(header: &Header, task: Task) -> Result<Self> {
        let (cx, cy) = header
            .center
            .ok_or_else(|| TrackError::malformed_header(CENTER_MARKER))?;
        let resolution = header
            .resolution
            .ok_or_else(|| TrackError::malformed_header(RESOLUTION_MARKER))?;
        let arena_diameter = header
            .arena_diameter
            .ok_or_else(|| TrackError::malformed_header(DIAMETER_MARKER))?;

        if resolution.is_nan() || resolution <= 0.0 {
            return Err(TrackError::malformed_header(format!(
                "{RESOLUTION_MARKER} must be positive, got {resolution}"
            )));
        }
        if arena_diameter.is_nan() || arena_diameter <= 0.0 {
            return Err(TrackError::malformed_header(format!(
                "{DIAMETER_MARKER} must be positive, got {arena_diameter}"
            )));
        }

        let radius = resolution * arena_diameter * 100.0 / 2.0;
        let center = Position::new(cx, cy);
        let zone = header.zone.as_deref().and_then(|v| read_zone(v, task));

        let (center_angle, sector_width) = match zone {
            Some(ReinforcedZone::Sector {
                center_angle,
                width,
                ..
            }) => (center_angle, width),
            Some(ReinforcedZone::Platform { position, .. }) => (
                (polar_angle(&center, &position).to_degrees() + 360.0) % 360.0,
                DEFAULT_SECTOR_WIDTH,
            ),
            _ => (0.0, DEFAULT_SECTOR_WIDTH),
        };

        if task == Task::WaterMaze && !matches!(zone, Some(ReinforcedZone::Platform { .. })) {
            return Err(TrackError::malformed_header(ZONE_MARKER));
        }

        Ok(Self {
            center,
            resolution,
            arena_diameter,
            radius,
            tracker: header.tracker,
            zone,
            center_angle,
            sector_width,
            entrance_latency: header.entrance_latency.unwrap_or(0.0),
        })
    }

    /// Platform position and radius (water maze sessions).
    #[must_use]
    pub fn platform(&self) -> Option<(Position, f64)> {
        match self.zone {
            Some(ReinforcedZone::Platform { position, radius }) => Some((position, radius)),
            _ => None,
        }
    }

    /// Move the coordinate origin so the arena center sits at `(radius, radius)`.
    pub(crate) fn recentre(&mut self) {
        self.center = Position::new(self.radius, self.radius);
    }
}

fn read_zone(values: &[f64], task: Task) -> Option<ReinforcedZone> {
    match task {
        Task::WaterMaze => match values {
            [x, y, radius, ..] => Some(ReinforcedZone::Platform {
                position: Position::new(*x, *y),
                radius: *radius,
            }),
            _ => None,
        },
        Task::RobotAvoidance => values
            .first()
            .map(|&radius| ReinforcedZone::Robot { radius }),
        _ => match values {
            [inner_radius, outer_radius, center_angle, width, ..] => {
                Some(ReinforcedZone::Sector {
                    inner_radius: *inner_radius,
                    outer_radius: *outer_radius,
                    center_angle: *center_angle,
                    width: *width,
                })
            }
            _ => None,
        },
    }
}

/// Numbers following the last `(` token of a header line.
fn values_after_paren(line: &str) -> Vec<f64> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(pos) = tokens.iter().rposition(|&t| t == "(") else {
        return Vec::new();
    };
    tokens[pos + 1..]
        .iter()
        .map_while(|t| t.parse::<f64>().ok())
        .collect()
}

fn tracker_kind(line: &str) -> TrackerKind {
    if line.contains("iTrack") {
        TrackerKind::ITrack
    } else if line.contains("Kachna") {
        TrackerKind::Kachna
    } else if line.contains("Tracker") {
        TrackerKind::Tracker
    } else {
        TrackerKind::Unknown
    }
}

/// Read header lines up to and including the end-of-header marker.
///
/// # Errors
///
/// Returns [`TrackError::Io`] on read failures and
/// [`TrackError::MalformedHeader`] if the stream ends before the end marker.
pub fn parse_header<R: BufRead>(reader: &mut R) -> Result<Header> {
    let mut header = Header::default();
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(TrackError::malformed_header(END_MARKER));
        }

        if line.contains(TRACKER_MARKER) {
            header.tracker = tracker_kind(&line);
        } else if line.contains(CENTER_MARKER) {
            if let [x, y, ..] = values_after_paren(&line)[..] {
                header.center = Some((x, y));
            }
        } else if line.contains(RESOLUTION_MARKER) {
            header.resolution = values_after_paren(&line).first().copied();
        } else if line.contains(ZONE_MARKER) && !line.contains("//") {
            header.zone = Some(values_after_paren(&line));
        } else if line.contains(DIAMETER_MARKER) {
            header.arena_diameter = values_after_paren(&line).first().copied();
        } else if line.contains(LATENCY_MARKER) {
            header.entrance_latency = values_after_paren(&line).first().copied();
        } else if line.contains(END_MARKER) {
            return Ok(header);
        }
    }
}
