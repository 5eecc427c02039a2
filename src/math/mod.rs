//! Mathematical utilities for trajectory analysis.
//!
//! This module provides:
//! - [`geometry`]: planar positions, headings, interpolation and speed
//! - [`stats`]: median and fixed-decimal rounding

pub mod geometry;
pub mod stats;

pub use geometry::{
    bearing_deg, heading_deg, interpolate, is_missing, polar_angle, signed_bearing_change,
    speed_cm_s, Position,
};
pub use stats::{mean, median, round_to};
