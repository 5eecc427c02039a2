//! Metric results.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of a metric.
///
/// Numbers carry the number of decimals they are reported with; lists are
/// reported pipe-joined.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MetricValue {
    /// Fixed-decimal number.
    Number { value: f64, decimals: usize },
    /// Event count.
    Count(usize),
    /// Free text (file names).
    Text(String),
    /// Not enough data.
    Na,
    /// One result per parameter value or per box.
    List(Vec<MetricValue>),
}

impl MetricValue {
    /// Fixed-decimal number.
    #[must_use]
    pub const fn number(value: f64, decimals: usize) -> Self {
        Self::Number { value, decimals }
    }

    /// Proportions `counts[i] / sum`, or [`MetricValue::Na`] when the sum is zero.
    #[must_use]
    pub fn proportions(counts: &[f64], decimals: usize) -> Self {
        let total: f64 = counts.iter().sum();
        if total == 0.0 {
            return Self::Na;
        }
        Self::List(
            counts
                .iter()
                .map(|&count| Self::number(count / total, decimals))
                .collect(),
        )
    }

    /// Numeric value of a number or count.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number { value, .. } => Some(*value),
            Self::Count(count) => Some(*count as f64),
            _ => None,
        }
    }

    /// Returns `true` for [`MetricValue::Na`].
    #[must_use]
    pub const fn is_na(&self) -> bool {
        matches!(self, Self::Na)
    }

    /// First element of a list, the value itself otherwise.
    #[must_use]
    pub fn first(self) -> Self {
        match self {
            Self::List(values) => values.into_iter().next().unwrap_or(Self::Na),
            other => other,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number { value, decimals } => write!(f, "{value:.decimals$}"),
            Self::Count(count) => write!(f, "{count}"),
            Self::Text(text) => f.write_str(text),
            Self::Na => f.write_str("NA"),
            Self::List(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<usize> for MetricValue {
    fn from(count: usize) -> Self {
        Self::Count(count)
    }
}
