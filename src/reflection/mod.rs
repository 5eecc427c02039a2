//! Tracker reflection detection and repair.
//!
//! Reflections of the tracking light on the arena wall produce short
//! excursions that no animal could physically make. This module provides:
//! - [`detector`]: flag suspected samples by speed and turn angle
//! - [`remover`]: replace the surrounding spans by linear interpolation

pub mod detector;
pub mod remover;

pub use detector::{classify, count_in_window, detect, ReflectionCounts, ReflectionPoints, Severity};
pub use remover::{
    default_points, remove_reflections, RemovalOptions, RemovalSummary, REFLECTION_SPEED_RATIO,
    ROBOT_CONTACT_DISTANCE,
};
