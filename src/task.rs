//! Task variants and their capabilities.
//!
//! Every task shares the same loader, reflection repair and metric library.
//! What differs is captured here: which coordinate frames a session records,
//! which one is the tracked subject, how fast a repaired sample may move, how
//! the arena is shaped and whether loaded sessions are cached.

use crate::record::Slot;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Behavioral task a session was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Task {
    /// Carousel maze with paired arena and room files.
    CarouselMaze,
    /// Carousel maze recorded in a single (room) frame.
    CarouselSingleFrame,
    /// Robot avoidance with paired rat and robot files.
    RobotAvoidance,
    /// Morris water maze.
    WaterMaze,
    /// Open field (square arena).
    OpenField,
}

/// How many position streams a session carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionLayout {
    /// One position per record (room frame).
    Single,
    /// Room and arena positions per record, from two files.
    Paired,
}

/// Arena outline used by boundary metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaShape {
    /// Circular arena of the session radius.
    Circle,
    /// Square arena with half-side equal to the session radius.
    Square,
}

/// Which file of a pair carries the header used for the session constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSource {
    /// The primary file.
    Primary,
    /// The paired file.
    Paired,
}

const ROOM_ONLY: &[Slot] = &[Slot::Room];
const ARENA_ONLY: &[Slot] = &[Slot::Arena];
const BOTH: &[Slot] = &[Slot::Room, Slot::Arena];

impl Task {
    /// All tasks.
    pub const ALL: [Self; 5] = [
        Self::CarouselMaze,
        Self::CarouselSingleFrame,
        Self::RobotAvoidance,
        Self::WaterMaze,
        Self::OpenField,
    ];

    /// Short task identifier.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CarouselMaze => "CM",
            Self::CarouselSingleFrame => "CMSF",
            Self::RobotAvoidance => "RA",
            Self::WaterMaze => "MWM",
            Self::OpenField => "OF",
        }
    }

    /// Human readable task name.
    #[must_use]
    pub const fn full_name(self) -> &'static str {
        match self {
            Self::CarouselMaze => "Carousel maze",
            Self::CarouselSingleFrame => "Carousel maze (single frame)",
            Self::RobotAvoidance => "Robot avoidance",
            Self::WaterMaze => "Morris water maze",
            Self::OpenField => "Open field",
        }
    }

    /// Parse a short task identifier.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|task| task.code() == code)
    }

    /// Position layout of the records.
    #[must_use]
    pub const fn layout(self) -> PositionLayout {
        match self {
            Self::CarouselMaze | Self::RobotAvoidance => PositionLayout::Paired,
            _ => PositionLayout::Single,
        }
    }

    /// Frame holding the tracked subject for generic metrics.
    #[must_use]
    pub const fn primary_slot(self) -> Slot {
        match self {
            Self::RobotAvoidance => Slot::Arena,
            _ => Slot::Room,
        }
    }

    /// Frames loaded for this task.
    #[must_use]
    pub const fn tracked_slots(self) -> &'static [Slot] {
        match self.layout() {
            PositionLayout::Paired => BOTH,
            PositionLayout::Single => ROOM_ONLY,
        }
    }

    /// Frames whose exact position repeats mark a stuck reflection.
    #[must_use]
    pub const fn same_position_slots(self) -> &'static [Slot] {
        match self {
            Self::CarouselMaze => BOTH,
            Self::RobotAvoidance => ARENA_ONLY,
            _ => ROOM_ONLY,
        }
    }

    /// Slot filled from the primary file.
    #[must_use]
    pub const fn primary_file_slot(self) -> Slot {
        match self.layout() {
            PositionLayout::Paired => Slot::Arena,
            PositionLayout::Single => Slot::Room,
        }
    }

    /// Which file of a pair carries the header.
    #[must_use]
    pub const fn header_source(self) -> HeaderSource {
        match self {
            Self::RobotAvoidance => HeaderSource::Paired,
            _ => HeaderSource::Primary,
        }
    }

    /// File name tokens identifying the primary and the paired file.
    #[must_use]
    pub const fn pairing_tokens(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::CarouselMaze => Some(("Arena", "Room")),
            Self::RobotAvoidance => Some(("Rat", "Robot")),
            _ => None,
        }
    }

    /// Whether coordinates are re-centred so the arena center sits at `(radius, radius)`.
    #[must_use]
    pub const fn recentres_coordinates(self) -> bool {
        matches!(self, Self::RobotAvoidance)
    }

    /// Maximum plausible speed (cm/s) from the last good sample during reflection repair.
    #[must_use]
    pub const fn removal_speed_ceiling(self) -> f64 {
        match self {
            Self::WaterMaze => 50.0,
            _ => 250.0,
        }
    }

    /// Number of loaded sessions kept in the cache; `None` disables caching.
    #[must_use]
    pub const fn cache_capacity(self) -> Option<usize> {
        match self {
            Self::WaterMaze => None,
            Self::RobotAvoidance => Some(10),
            _ => Some(15),
        }
    }

    /// Arena outline.
    #[must_use]
    pub const fn arena_shape(self) -> ArenaShape {
        match self {
            Self::OpenField => ArenaShape::Square,
            _ => ArenaShape::Circle,
        }
    }

    /// Default session length in minutes.
    #[must_use]
    pub const fn default_session_minutes(self) -> f64 {
        match self {
            Self::WaterMaze => 1.0,
            Self::OpenField => 10.0,
            _ => 20.0,
        }
    }

    /// Whether reflection repair moves both frames together by default.
    #[must_use]
    pub const fn default_symmetric_removal(self) -> bool {
        matches!(self.layout(), PositionLayout::Paired)
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.full_name())
    }
}
