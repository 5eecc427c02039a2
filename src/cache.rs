//! Bounded memo of loaded trajectories.
//!
//! Entries are evicted in insertion order once the capacity is exceeded;
//! reading an entry does not refresh it. Values are shared handles, so a
//! cache hit never copies the trajectory.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::trajectory::Trajectory;

/// Identity of the file(s) a trajectory was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileKey {
    /// A single-stream session.
    Single(PathBuf),
    /// A paired session: primary file and its counterpart.
    Paired { primary: PathBuf, paired: PathBuf },
}

impl FileKey {
    /// The primary file.
    #[must_use]
    pub fn primary(&self) -> &Path {
        match self {
            Self::Single(path) | Self::Paired { primary: path, .. } => path,
        }
    }

    /// The paired file, if any.
    #[must_use]
    pub fn paired(&self) -> Option<&Path> {
        match self {
            Self::Single(_) => None,
            Self::Paired { paired, .. } => Some(paired),
        }
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(path) => write!(f, "{}", path.display()),
            Self::Paired { primary, paired } => {
                write!(f, "{} + {}", primary.display(), paired.display())
            }
        }
    }
}

/// Insertion-ordered, capacity-bounded trajectory cache.
#[derive(Debug)]
pub struct TrajectoryCache {
    capacity: usize,
    order: VecDeque<FileKey>,
    entries: HashMap<FileKey, Arc<Trajectory>>,
}

impl TrajectoryCache {
    /// Create an empty cache holding at most `capacity` trajectories.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity + 1),
            entries: HashMap::with_capacity(capacity + 1),
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `key` is cached.
    #[must_use]
    pub fn contains(&self, key: &FileKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Shared handle to a cached trajectory.
    #[must_use]
    pub fn get(&self, key: &FileKey) -> Option<Arc<Trajectory>> {
        let hit = self.entries.get(key).cloned();
        debug!(%key, hit = hit.is_some(), "trajectory cache lookup");
        hit
    }

    /// Insert a trajectory and return the key evicted to make room, if any.
    ///
    /// Replacing an existing key keeps its original insertion position.
    pub fn put(&mut self, key: FileKey, trajectory: Arc<Trajectory>) -> Option<FileKey> {
        if self.entries.insert(key.clone(), trajectory).is_none() {
            self.order.push_back(key);
        }
        if self.entries.len() > self.capacity {
            let evicted = self.order.pop_front()?;
            self.entries.remove(&evicted);
            debug!(key = %evicted, "evicted trajectory from cache");
            return Some(evicted);
        }
        None
    }

    /// Drop the entry for `key`. Returns `true` if it was cached.
    pub fn invalidate(&mut self, key: &FileKey) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            debug!(%key, "invalidated cached trajectory");
            true
        } else {
            false
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::test_support::{constants, room_track};
    use crate::task::Task;

    fn key(n: usize) -> FileKey {
        FileKey::Single(PathBuf::from(format!("session{n}.dat")))
    }

    fn trajectory() -> Arc<Trajectory> {
        Arc::new(room_track(
            Task::OpenField,
            constants(1.0, (0.0, 0.0), 10.0),
            40.0,
            &[(1.0, 1.0, 0)],
        ))
    }

    #[test]
    fn test_evicts_oldest_inserted() {
        let mut cache = TrajectoryCache::new(3);
        for n in 0..3 {
            assert_eq!(cache.put(key(n), trajectory()), None);
        }
        // reading does not refresh the entry
        assert!(cache.get(&key(0)).is_some());
        assert_eq!(cache.put(key(3), trajectory()), Some(key(0)));
        assert!(cache.get(&key(0)).is_none());
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_replace_keeps_order() {
        let mut cache = TrajectoryCache::new(2);
        cache.put(key(0), trajectory());
        cache.put(key(1), trajectory());
        cache.put(key(0), trajectory());
        assert_eq!(cache.put(key(2), trajectory()), Some(key(0)));
    }

    #[test]
    fn test_invalidate() {
        let mut cache = TrajectoryCache::new(2);
        cache.put(key(0), trajectory());
        assert!(cache.invalidate(&key(0)));
        assert!(!cache.invalidate(&key(0)));
        assert!(cache.get(&key(0)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hit_shares_value() {
        let mut cache = TrajectoryCache::new(1);
        let value = trajectory();
        cache.put(key(0), Arc::clone(&value));
        let hit = cache.get(&key(0)).unwrap();
        assert!(Arc::ptr_eq(&hit, &value));
    }

    #[test]
    fn test_file_key_accessors() {
        let paired = FileKey::Paired {
            primary: PathBuf::from("a_Arena.dat"),
            paired: PathBuf::from("a_Room.dat"),
        };
        assert_eq!(paired.primary(), Path::new("a_Arena.dat"));
        assert_eq!(paired.paired(), Some(Path::new("a_Room.dat")));
        assert_eq!(key(1).paired(), None);
    }
}
