//! Angular occupancy, thigmotaxis and circular statistics around the arena center.
//!
//! Angles are polar angles of the tracked position around the session center
//! ([`polar_angle`]), in degrees, counterclockwise with image `y` pointing down.

use crate::math::{polar_angle, round_to};
use crate::trajectory::Trajectory;

use super::{before_end, through_end, MetricValue, TimeWindow};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where the first angle box is centered.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SectorCenter {
    /// The reinforced sector (or the platform direction).
    Target,
    /// Opposite to the target.
    Opposite,
    /// The given angle (degrees) relative to the target.
    Relative(f64),
}

impl SectorCenter {
    fn angle(self, target: f64) -> f64 {
        match self {
            Self::Target => target,
            Self::Opposite => target + 180.0,
            Self::Relative(offset) => target + offset,
        }
    }
}

/// Polar angle in degrees of record `index` around the center.
fn angle_deg(trajectory: &Trajectory, index: usize) -> f64 {
    polar_angle(&trajectory.center(), &trajectory.position(index)).to_degrees()
}

/// Share of the window spent in each of the `ceil(360 / width)` angle boxes.
///
/// The first box is centered at `center`; when `width` does not divide 360 the
/// last box covers the remainder.
#[must_use]
pub fn angle_boxes(
    trajectory: &Trajectory,
    window: TimeWindow,
    width: f64,
    center: SectorCenter,
) -> MetricValue {
    if width.is_nan() || width <= 0.0 {
        return MetricValue::Na;
    }
    let first_center = center.angle(trajectory.constants().center_angle);
    let count = (360.0 / width).ceil() as usize;
    let mut boxes = vec![0.0; count];
    for (index, _) in through_end(trajectory, window) {
        let angle = (angle_deg(trajectory, index) - first_center + width / 2.0 + 360.0)
            .rem_euclid(360.0);
        let slot = ((angle / width).floor() as usize).min(count - 1);
        boxes[slot] += 1.0;
    }
    MetricValue::proportions(&boxes, 3)
}

/// Share of the window spent in a sector of `width` degrees centered at `center`.
#[must_use]
pub fn time_in_sector(
    trajectory: &Trajectory,
    window: TimeWindow,
    width: f64,
    center: SectorCenter,
) -> MetricValue {
    angle_boxes(trajectory, window, width, center).first()
}

/// Share of samples in the outer annulus of each width in `percents` of the radius.
#[must_use]
pub fn thigmotaxis(trajectory: &Trajectory, window: TimeWindow, percents: &[f64]) -> MetricValue {
    let slot = trajectory.primary_slot();
    let center = trajectory.center();
    let distances: Vec<f64> = through_end(trajectory, window)
        .map(|(_, r)| (r.position(slot) - center).norm())
        .collect();
    if distances.is_empty() {
        return MetricValue::Na;
    }
    let values = percents
        .iter()
        .map(|percent| {
            let border = trajectory.radius() * (1.0 - percent / 100.0);
            let periphery = distances.iter().filter(|&&d| d >= border).count();
            MetricValue::number(periphery as f64 / distances.len() as f64, 3)
        })
        .collect();
    MetricValue::List(values)
}

/// Sums of the sines and cosines of the polar angles, and the sample count.
fn angle_sums(trajectory: &Trajectory, window: TimeWindow) -> (f64, f64, usize) {
    before_end(trajectory, window).fold((0.0, 0.0, 0), |(sin, cos, n), (index, _)| {
        let angle = polar_angle(&trajectory.center(), &trajectory.position(index));
        (sin + angle.sin(), cos + angle.cos(), n + 1)
    })
}

fn directional_mean_deg(trajectory: &Trajectory, window: TimeWindow) -> f64 {
    let (sin, mut cos, _) = angle_sums(trajectory, window);
    if cos == 0.0 {
        cos = 0.000_000_001;
    }
    (sin.atan2(cos).to_degrees() + 360.0) % 360.0
}

/// Directional mean of the position angle in degrees, in `[0, 360)`.
#[must_use]
pub fn directional_mean(trajectory: &Trajectory, window: TimeWindow) -> MetricValue {
    MetricValue::number(directional_mean_deg(trajectory, window), 2)
}

/// Circular variance of the position angle, between 0 and 1.
///
/// Deviations are taken from the directional mean as reported (two decimals).
#[must_use]
pub fn circular_variance(trajectory: &Trajectory, window: TimeWindow) -> MetricValue {
    let mean = round_to(directional_mean_deg(trajectory, window), 2).to_radians();
    let (r, n) = before_end(trajectory, window).fold((0.0, 0usize), |(r, n), (index, _)| {
        let angle = polar_angle(&trajectory.center(), &trajectory.position(index));
        (r + (angle - mean).cos(), n + 1)
    });
    if n == 0 {
        return MetricValue::Na;
    }
    MetricValue::number(1.0 - r / n as f64, 2)
}
