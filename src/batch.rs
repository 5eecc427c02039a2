//! Batch evaluation of metrics over many sessions.
//!
//! A [`BatchRequest`] names the files, metrics and time windows of a run;
//! [`process_files`] evaluates it into a [`BatchReport`] with one row per file.
//! Failures are local to their file: a session that cannot be loaded yields a
//! row of `NA` values and its error message, and the run carries on.
//!
//! # Example
//!
//! ```no_run
//! use behavior_tracks::batch::{process_files, BatchRequest};
//! use behavior_tracks::{Metric, Task, TimeWindow, TrackStore};
//!
//! let request = BatchRequest::new(Task::OpenField, vec!["rat1.dat".into(), "rat2.dat".into()])
//!     .with_metrics(vec![Metric::TotalDistance, Metric::TimeInQuadrants])
//!     .with_windows(vec![TimeWindow::new(0.0, 5.0), TimeWindow::new(5.0, 10.0)]);
//!
//! let mut store = TrackStore::new();
//! let report = process_files(&mut store, &request)?;
//! print!("{}", report.to_delimited(","));
//! # Ok::<(), behavior_tracks::TrackError>(())
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::error::{Result, TrackError};
use crate::metrics::{Metric, MetricValue, TimeWindow};
use crate::pairing::Pairing;
use crate::reflection::RemovalOptions;
use crate::store::TrackStore;
use crate::task::{PositionLayout, Task};
use crate::trajectory::Trajectory;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which sessions get their reflections repaired before evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReflectionPolicy {
    /// Evaluate sessions as loaded.
    #[default]
    Keep,
    /// Repair every session.
    RemoveAll,
}

/// Description of a batch run.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Task of every session.
    pub task: Task,
    /// Primary files, one per session.
    pub files: Vec<PathBuf>,
    /// Metrics in column order.
    pub metrics: Vec<Metric>,
    /// Time windows; window-dependent metrics get one column per window.
    pub windows: Vec<TimeWindow>,
    /// Reflection repair before evaluation.
    pub reflections: ReflectionPolicy,
    /// Repair points chosen per file; other files use the default points.
    pub reflection_points: HashMap<PathBuf, Vec<usize>>,
    /// Counterparts given explicitly; other files of paired tasks are paired
    /// by name.
    pub pairings: HashMap<PathBuf, PathBuf>,
    /// Metric parameters.
    pub config: AnalysisConfig,
}

impl BatchRequest {
    /// Request evaluating every metric of `task` over its default session
    /// window, with the task's preset parameters.
    #[must_use]
    pub fn new(task: Task, files: Vec<PathBuf>) -> Self {
        Self {
            task,
            files,
            metrics: Metric::available(task).to_vec(),
            windows: vec![TimeWindow::for_task(task)],
            reflections: ReflectionPolicy::Keep,
            reflection_points: HashMap::new(),
            pairings: HashMap::new(),
            config: AnalysisConfig::for_task(task),
        }
    }

    /// Set the metrics.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set the time windows.
    #[must_use]
    pub fn with_windows(mut self, windows: Vec<TimeWindow>) -> Self {
        self.windows = windows;
        self
    }

    /// Set the reflection policy.
    #[must_use]
    pub const fn with_reflections(mut self, reflections: ReflectionPolicy) -> Self {
        self.reflections = reflections;
        self
    }

    /// Repair `file` at `points` instead of the default points.
    #[must_use]
    pub fn with_reflection_points(mut self, file: impl Into<PathBuf>, points: Vec<usize>) -> Self {
        self.reflection_points.insert(file.into(), points);
        self
    }

    /// Pair `primary` with `paired` instead of deriving the name.
    #[must_use]
    pub fn with_pairing(
        mut self,
        primary: impl Into<PathBuf>,
        paired: impl Into<PathBuf>,
    ) -> Self {
        self.pairings.insert(primary.into(), paired.into());
        self
    }

    /// Set the metric parameters.
    #[must_use]
    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Check that the run can be evaluated.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::InvalidConfig`] if no window is given or a metric
    /// is not available for the task, [`TrackError::InvalidInput`] for an
    /// invalid window, and any error of [`AnalysisConfig::validate`].
    pub fn validate(&self) -> Result<()> {
        if self.windows.is_empty() {
            return Err(TrackError::invalid_config("batch needs at least one time window"));
        }
        let available = Metric::available(self.task);
        if let Some(metric) = self.metrics.iter().find(|m| !available.contains(m)) {
            return Err(TrackError::invalid_config(format!(
                "metric '{}' is not available for {}",
                metric.display_name(self.task),
                self.task
            )));
        }
        for window in &self.windows {
            window.validate()?;
        }
        self.config.validate()
    }

    /// Columns of the report in order.
    #[must_use]
    pub fn columns(&self) -> Vec<BatchColumn> {
        let several = self.windows.len() > 1;
        let mut columns = Vec::new();
        for &metric in &self.metrics {
            if metric.is_batch_invariant() {
                columns.push(BatchColumn::new(self.task, metric, None));
            } else if several {
                columns.extend(
                    self.windows
                        .iter()
                        .map(|&window| BatchColumn::new(self.task, metric, Some(window))),
                );
            } else {
                columns.push(BatchColumn {
                    window: self.windows.first().copied(),
                    ..BatchColumn::new(self.task, metric, None)
                });
            }
        }
        columns
    }

    fn pairing(&self, file: &Path) -> Pairing {
        match self.task.layout() {
            PositionLayout::Single => Pairing::None,
            PositionLayout::Paired => self
                .pairings
                .get(file)
                .map_or(Pairing::Auto, |paired| Pairing::Explicit(paired.clone())),
        }
    }

    fn removal_options(&self, file: &Path) -> Option<RemovalOptions> {
        match self.reflections {
            ReflectionPolicy::Keep => None,
            ReflectionPolicy::RemoveAll => Some(
                self.reflection_points
                    .get(file)
                    .map_or_else(RemovalOptions::default, |points| {
                        RemovalOptions::with_points(points.clone())
                    }),
            ),
        }
    }
}

/// One result column.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchColumn {
    /// Evaluated metric.
    pub metric: Metric,
    /// Evaluation window; `None` for window-independent metrics.
    pub window: Option<TimeWindow>,
    /// Column header.
    pub name: String,
}

impl BatchColumn {
    fn new(task: Task, metric: Metric, window: Option<TimeWindow>) -> Self {
        let label = metric.display_name(task);
        let name = match window {
            Some(w) => format!("{label} ({}-{})", w.start_minutes, w.end_minutes),
            None => label.to_owned(),
        };
        Self {
            metric,
            window,
            name,
        }
    }
}

/// Results of one file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchRow {
    /// Primary file of the session.
    pub file: PathBuf,
    /// One value per column.
    pub values: Vec<MetricValue>,
    /// Load failure, if any; all values are `NA` then.
    pub error: Option<String>,
}

impl BatchRow {
    /// Returns `true` if the session could not be loaded.
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Results of a batch run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchReport {
    /// Result columns, without the leading file column.
    pub columns: Vec<BatchColumn>,
    /// One row per requested file, in request order.
    pub rows: Vec<BatchRow>,
}

impl BatchReport {
    /// Header line fields: `File` followed by the column names.
    #[must_use]
    pub fn header(&self) -> Vec<&str> {
        std::iter::once("File")
            .chain(self.columns.iter().map(|c| c.name.as_str()))
            .collect()
    }

    /// Files whose session could not be loaded.
    #[must_use]
    pub fn failed_files(&self) -> Vec<&Path> {
        self.rows
            .iter()
            .filter(|row| row.failed())
            .map(|row| row.file.as_path())
            .collect()
    }

    /// Render the report as text, one line per row, fields joined by
    /// `separator`.
    ///
    /// A failed row renders as `NA` fields only; its error is kept in
    /// [`BatchRow::error`] and listed by [`BatchReport::failed_files`].
    #[must_use]
    pub fn to_delimited(&self, separator: &str) -> String {
        let mut out = self.header().join(separator);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.file.display().to_string());
            for value in &row.values {
                out.push_str(separator);
                out.push_str(&value.to_string());
            }
            out.push('\n');
        }
        out
    }
}

/// Evaluate `request` file by file, loading sessions through `store`.
///
/// # Errors
///
/// Returns an error only if the request is invalid (see
/// [`BatchRequest::validate`]); per-file failures are reported in the rows.
pub fn process_files(store: &mut TrackStore, request: &BatchRequest) -> Result<BatchReport> {
    request.validate()?;
    let columns = request.columns();
    info!(
        task = %request.task,
        files = request.files.len(),
        columns = columns.len(),
        "processing batch"
    );

    let rows = request
        .files
        .iter()
        .map(|file| match session(store, request, file) {
            Ok(trajectory) => BatchRow {
                file: file.clone(),
                values: evaluate_columns(&trajectory, &columns, &request.config),
                error: None,
            },
            Err(err) => {
                warn!(file = %file.display(), error = %err, "failed to load session");
                BatchRow {
                    file: file.clone(),
                    values: vec![MetricValue::Na; columns.len()],
                    error: Some(err.to_string()),
                }
            }
        })
        .collect();

    Ok(BatchReport { columns, rows })
}

fn session(
    store: &mut TrackStore,
    request: &BatchRequest,
    file: &Path,
) -> Result<Arc<Trajectory>> {
    let trajectory = store.load(request.task, file, request.pairing(file))?;
    Ok(match request.removal_options(file) {
        Some(options) => store.remove_reflections(&trajectory, &options).0,
        None => trajectory,
    })
}

fn evaluate_columns(
    trajectory: &Trajectory,
    columns: &[BatchColumn],
    config: &AnalysisConfig,
) -> Vec<MetricValue> {
    columns
        .iter()
        .map(|column| {
            let window = column.window.unwrap_or_else(TimeWindow::unbounded);
            column.metric.evaluate(trajectory, window, config)
        })
        .collect()
}
