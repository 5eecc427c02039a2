//! File pairing for two-file sessions.
//!
//! Carousel maze sessions are recorded as an `Arena` file and a `Room` file,
//! robot avoidance sessions as a `Rat` file and a `Robot` file. The two file
//! names differ only in that token (in title case or lower case).

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::cache::FileKey;
use crate::error::{Result, TrackError};
use crate::task::{PositionLayout, Task};

/// How the counterpart of a primary file is found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Pairing {
    /// Derive the counterpart name from the primary file name.
    #[default]
    Auto,
    /// Use the given file.
    Explicit(PathBuf),
    /// No counterpart; only valid for single-file tasks.
    None,
}

fn swap_token(name: &str, from: &str, to: &str) -> Option<String> {
    if name.contains(from) {
        Some(name.replace(from, to))
    } else {
        let (from, to) = (from.to_lowercase(), to.to_lowercase());
        name.contains(&from).then(|| name.replace(&from, &to))
    }
}

fn swap_in_path(path: &Path, from: &str, to: &str) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    swap_token(name, from, to).map(|swapped| path.with_file_name(swapped))
}

/// Name of the counterpart of a primary file.
///
/// # Errors
///
/// Returns [`TrackError::UnpairedFile`] if the task has no pairing or the
/// file name does not contain the primary token.
pub fn paired_name(task: Task, primary: &Path) -> Result<PathBuf> {
    let unpaired = || TrackError::UnpairedFile {
        path: primary.to_path_buf(),
    };
    let (first, second) = task.pairing_tokens().ok_or_else(unpaired)?;
    swap_in_path(primary, first, second).ok_or_else(unpaired)
}

/// Cache/load key of a session.
///
/// # Errors
///
/// Returns [`TrackError::UnpairedFile`] if a paired task cannot find its
/// counterpart name.
pub fn session_key(task: Task, primary: impl Into<PathBuf>, pairing: Pairing) -> Result<FileKey> {
    let primary = primary.into();
    match task.layout() {
        PositionLayout::Single => Ok(FileKey::Single(primary)),
        PositionLayout::Paired => {
            let paired = match pairing {
                Pairing::Auto => paired_name(task, &primary)?,
                Pairing::Explicit(path) => path,
                Pairing::None => return Err(TrackError::UnpairedFile { path: primary }),
            };
            Ok(FileKey::Paired { primary, paired })
        }
    }
}

/// A file list split into loadable primaries and files without a counterpart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recognized {
    /// Primary files whose counterpart exists (or single-file sessions).
    pub primaries: Vec<PathBuf>,
    /// Files whose counterpart is neither listed nor on disk.
    pub nonmatching: Vec<PathBuf>,
}

/// Group a list of files into sessions.
///
/// For paired tasks a primary and its counterpart collapse into the primary.
/// A counterpart that is not listed but exists on disk is accepted too.
#[must_use]
pub fn recognize_files(task: Task, files: &[PathBuf]) -> Recognized {
    let mut files: Vec<PathBuf> = files.to_vec();
    files.sort();

    let Some((first, second)) = task.pairing_tokens() else {
        return Recognized {
            primaries: files,
            nonmatching: Vec::new(),
        };
    };

    let mut queue: VecDeque<PathBuf> = files.into();
    let mut recognized = Recognized::default();

    while let Some(file) = queue.pop_front() {
        let mut take = |candidate: &Path| -> bool {
            if let Some(pos) = queue.iter().position(|f| f == candidate) {
                queue.remove(pos);
                true
            } else {
                candidate.exists()
            }
        };

        if let Some(counterpart) = swap_in_path(&file, first, second) {
            if take(&counterpart) {
                recognized.primaries.push(file);
            } else {
                recognized.nonmatching.push(file);
            }
        } else if let Some(primary) = swap_in_path(&file, second, first) {
            if take(&primary) {
                recognized.primaries.push(primary);
            } else {
                recognized.nonmatching.push(file);
            }
        } else {
            recognized.nonmatching.push(file);
        }
    }
    recognized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paired_name() {
        assert_eq!(
            paired_name(Task::RobotAvoidance, Path::new("data/d1Rat3.dat")).unwrap(),
            PathBuf::from("data/d1Robot3.dat")
        );
        assert_eq!(
            paired_name(Task::RobotAvoidance, Path::new("d1rat3.dat")).unwrap(),
            PathBuf::from("d1robot3.dat")
        );
        assert_eq!(
            paired_name(Task::CarouselMaze, Path::new("Arena/s_Arena.dat")).unwrap(),
            PathBuf::from("Arena/s_Room.dat")
        );
        assert!(matches!(
            paired_name(Task::CarouselMaze, Path::new("session.dat")),
            Err(TrackError::UnpairedFile { .. })
        ));
        assert!(paired_name(Task::OpenField, Path::new("a_Arena.dat")).is_err());
    }

    #[test]
    fn test_session_key() {
        let key = session_key(Task::OpenField, "of.dat", Pairing::Auto).unwrap();
        assert_eq!(key, FileKey::Single(PathBuf::from("of.dat")));

        let key = session_key(Task::CarouselMaze, "x_Arena.dat", Pairing::Auto).unwrap();
        assert_eq!(key.paired(), Some(Path::new("x_Room.dat")));

        let key = session_key(
            Task::CarouselMaze,
            "x_Arena.dat",
            Pairing::Explicit(PathBuf::from("other.dat")),
        )
        .unwrap();
        assert_eq!(key.paired(), Some(Path::new("other.dat")));

        assert!(session_key(Task::CarouselMaze, "x_Arena.dat", Pairing::None).is_err());
    }

    #[test]
    fn test_recognize_listed_pairs() {
        let files = vec![
            PathBuf::from("missing_dir_xyz/b_Room.dat"),
            PathBuf::from("missing_dir_xyz/a_Arena.dat"),
            PathBuf::from("missing_dir_xyz/a_Room.dat"),
            PathBuf::from("missing_dir_xyz/c_Arena.dat"),
            PathBuf::from("missing_dir_xyz/notes.dat"),
        ];
        let recognized = recognize_files(Task::CarouselMaze, &files);
        assert_eq!(recognized.primaries, vec![PathBuf::from("missing_dir_xyz/a_Arena.dat")]);
        assert_eq!(
            recognized.nonmatching,
            vec![
                PathBuf::from("missing_dir_xyz/b_Room.dat"),
                PathBuf::from("missing_dir_xyz/c_Arena.dat"),
                PathBuf::from("missing_dir_xyz/notes.dat"),
            ]
        );
    }

    #[test]
    fn test_recognize_single_file_task() {
        let files = vec![PathBuf::from("b.dat"), PathBuf::from("a.dat")];
        let recognized = recognize_files(Task::WaterMaze, &files);
        assert_eq!(recognized.primaries, vec![PathBuf::from("a.dat"), PathBuf::from("b.dat")]);
        assert!(recognized.nonmatching.is_empty());
    }
}
