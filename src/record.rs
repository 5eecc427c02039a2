//! Per-frame tracking records.
//!
//! Each [`Record`] holds the frame index, the timestamp and one [`FrameSample`]
//! per coordinate frame. Single-stream sessions only fill the room sample; the
//! arena sample stays at its default and is never read for them.

use crate::math::Position;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Zone/state code reported by the tracker for every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ZoneState {
    /// Outside the reinforced sector.
    #[default]
    OutsideSector,
    /// Inside the sector, before the entrance latency elapsed.
    EntranceLatency,
    /// Shock delivered (or platform reached in the water maze).
    Shock,
    /// Between two shocks while staying in the sector.
    InterShockLatency,
    /// Left the sector, refractory period running.
    OutsideRefractory,
    /// Tracker reported a bad spot.
    BadSpot,
    /// Any other code.
    Other(i32),
}

impl ZoneState {
    /// Decode a raw state field.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::OutsideSector,
            1 => Self::EntranceLatency,
            2 => Self::Shock,
            3 => Self::InterShockLatency,
            4 => Self::OutsideRefractory,
            5 => Self::BadSpot,
            other => Self::Other(other),
        }
    }

    /// Raw state code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::OutsideSector => 0,
            Self::EntranceLatency => 1,
            Self::Shock => 2,
            Self::InterShockLatency => 3,
            Self::OutsideRefractory => 4,
            Self::BadSpot => 5,
            Self::Other(code) => code,
        }
    }

    /// Returns `true` for [`ZoneState::Shock`].
    #[must_use]
    pub const fn is_shock(self) -> bool {
        matches!(self, Self::Shock)
    }
}

/// Coordinate frame a position belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Slot {
    /// Room frame (robot position in robot-avoidance sessions).
    Room,
    /// Rotating arena frame (rat position in robot-avoidance sessions).
    Arena,
}

impl Slot {
    /// The other coordinate frame.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Room => Self::Arena,
            Self::Arena => Self::Room,
        }
    }
}

/// Fields reported for one coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameSample {
    /// Tracked position in pixels; `(0, 0)` marks a missing sample.
    pub position: Position,
    /// Sector flags (0 none, 1 room, 2 arena, 3 both).
    pub sectors: i32,
    /// Zone/state code.
    pub state: ZoneState,
    /// Stimulus current level in milliamperes.
    pub level: f64,
}

impl Default for FrameSample {
    fn default() -> Self {
        Self {
            position: Position::origin(),
            sectors: 0,
            state: ZoneState::OutsideSector,
            level: 0.0,
        }
    }
}

/// One sampled instant of a session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    /// Frame index, contiguous from 0 after loading.
    pub frame: usize,
    /// Timestamp in milliseconds.
    pub timestamp: f64,
    /// Room-frame sample.
    pub room: FrameSample,
    /// Arena-frame sample (paired sessions only).
    pub arena: FrameSample,
}

impl Record {
    /// Position in the given coordinate frame.
    #[inline]
    #[must_use]
    pub fn position(&self, slot: Slot) -> Position {
        self.sample(slot).position
    }

    /// Sample of the given coordinate frame.
    #[inline]
    #[must_use]
    pub const fn sample(&self, slot: Slot) -> &FrameSample {
        match slot {
            Slot::Room => &self.room,
            Slot::Arena => &self.arena,
        }
    }

    /// Mutable sample of the given coordinate frame.
    #[inline]
    pub fn sample_mut(&mut self, slot: Slot) -> &mut FrameSample {
        match slot {
            Slot::Room => &mut self.room,
            Slot::Arena => &mut self.arena,
        }
    }

    /// Overwrite the position in the given coordinate frame.
    #[inline]
    pub fn set_position(&mut self, slot: Slot, position: Position) {
        self.sample_mut(slot).position = position;
    }

    /// The universal zone/state field.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ZoneState {
        self.room.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes_round_trip() {
        for code in 0..8 {
            assert_eq!(ZoneState::from_code(code).code(), code);
        }
        assert!(ZoneState::from_code(2).is_shock());
        assert_eq!(ZoneState::from_code(9), ZoneState::Other(9));
    }

    #[test]
    fn test_slot_access() {
        let mut record = Record::default();
        record.set_position(Slot::Arena, Position::new(3.0, 4.0));
        assert_eq!(record.position(Slot::Arena), Position::new(3.0, 4.0));
        assert_eq!(record.position(Slot::Room), Position::origin());
    }
}
