//! Loading service with per-task caches.
//!
//! A [`TrackStore`] owns one [`TrajectoryCache`] per task that caches sessions
//! (see [`Task::cache_capacity`]) and hands out shared trajectories. Repairing
//! a trajectory drops its cache entry before the repaired copy is made, so the
//! cache only ever holds sessions as read from disk.
//!
//! # Example
//!
//! ```no_run
//! use behavior_tracks::{Pairing, RemovalOptions, Task, TrackStore};
//!
//! let mut store = TrackStore::new();
//! let session = store.load(Task::CarouselMaze, "data/rat1_Arena.dat", Pairing::Auto)?;
//! let (cleaned, summary) = store.remove_reflections(&session, &RemovalOptions::default());
//! println!("repaired {} of {} samples", summary.repaired.len(), cleaned.len());
//! # Ok::<(), behavior_tracks::TrackError>(())
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{FileKey, TrajectoryCache};
use crate::error::Result;
use crate::loader::load_session;
use crate::pairing::{session_key, Pairing};
use crate::reflection::{remove_reflections, RemovalOptions, RemovalSummary};
use crate::task::Task;
use crate::trajectory::Trajectory;

/// Session loader with one bounded cache per task.
#[derive(Debug, Default)]
pub struct TrackStore {
    caches: HashMap<Task, TrajectoryCache>,
}

impl TrackStore {
    /// Create a store with empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the session whose primary file is `primary`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::UnpairedFile`](crate::TrackError::UnpairedFile)
    /// if the counterpart of a paired session cannot be named, or
    /// [`TrackError::Load`](crate::TrackError::Load) if reading fails.
    pub fn load(
        &mut self,
        task: Task,
        primary: impl Into<PathBuf>,
        pairing: Pairing,
    ) -> Result<Arc<Trajectory>> {
        let key = session_key(task, primary, pairing)?;
        self.load_key(task, key)
    }

    /// Load the session identified by `key`, from the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Load`](crate::TrackError::Load) if reading fails.
    pub fn load_key(&mut self, task: Task, key: FileKey) -> Result<Arc<Trajectory>> {
        if let Some(cached) = self.cache(task).and_then(|cache| cache.get(&key)) {
            return Ok(cached);
        }
        let trajectory = Arc::new(load_session(task, &key)?);
        debug!(%key, records = trajectory.len(), "loaded session");
        if let Some(cache) = self.cache_mut(task) {
            cache.put(key, Arc::clone(&trajectory));
        }
        Ok(trajectory)
    }

    /// Repair reflections of `trajectory` into a new trajectory.
    ///
    /// The cache entry of the session is dropped first, so a later
    /// [`load`](Self::load) of the same files reads them again.
    pub fn remove_reflections(
        &mut self,
        trajectory: &Trajectory,
        options: &RemovalOptions,
    ) -> (Arc<Trajectory>, RemovalSummary) {
        if let Some(key) = trajectory.source() {
            self.invalidate(trajectory.task(), key);
        }
        let mut repaired = trajectory.clone();
        let summary = remove_reflections(&mut repaired, options);
        (Arc::new(repaired), summary)
    }

    /// Cached trajectory for `key`, without loading.
    #[must_use]
    pub fn cached(&self, task: Task, key: &FileKey) -> Option<Arc<Trajectory>> {
        self.cache(task).and_then(|cache| cache.get(key))
    }

    /// Drop the cache entry for `key`. Returns `true` if it was cached.
    pub fn invalidate(&mut self, task: Task, key: &FileKey) -> bool {
        self.cache_mut(task).is_some_and(|cache| cache.invalidate(key))
    }

    /// Drop every cached trajectory.
    pub fn clear(&mut self) {
        self.caches.values_mut().for_each(TrajectoryCache::clear);
    }

    /// Number of cached trajectories of `task`.
    #[must_use]
    pub fn cached_len(&self, task: Task) -> usize {
        self.cache(task).map_or(0, TrajectoryCache::len)
    }

    fn cache(&self, task: Task) -> Option<&TrajectoryCache> {
        self.caches.get(&task)
    }

    fn cache_mut(&mut self, task: Task) -> Option<&mut TrajectoryCache> {
        let capacity = task.cache_capacity()?;
        Some(
            self.caches
                .entry(task)
                .or_insert_with(|| TrajectoryCache::new(capacity)),
        )
    }
}
