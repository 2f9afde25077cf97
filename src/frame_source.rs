//! Frame discovery.
//!
//! [`list_frames`] turns a directory into an ordered [`FramePaths`] list.
//! Entries are sorted lexicographically by file name, so running twice on
//! the same directory always yields the same video. Subdirectories are
//! skipped and never descended into.
//!
//! # Example
//!
//! ```no_run
//! use stillreel::{FrameSourceOptions, OverflowPolicy, StillreelError};
//!
//! let options = FrameSourceOptions::new()
//!     .with_max_count(100)
//!     .with_overflow_policy(OverflowPolicy::Error)
//!     .with_extensions(["jpg", "jpeg"]);
//! let frames = stillreel::list_frames("shots/", &options)?;
//! for path in frames.iter() {
//!     println!("{}", path.display());
//! }
//! # Ok::<(), StillreelError>(())
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StillreelError;

/// What to do when a directory holds more frames than the configured
/// capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Keep the first `max_count` frames in order and log a warning.
    #[default]
    Truncate,
    /// Fail with [`StillreelError::CapacityExceeded`].
    Error,
}

/// Settings for [`list_frames`].
#[derive(Debug, Clone, Default)]
pub struct FrameSourceOptions {
    /// Maximum number of frames. `None` means unbounded.
    pub max_count: Option<usize>,
    /// Behaviour once `max_count` is reached.
    pub overflow: OverflowPolicy,
    /// Lower-case extensions to accept. Empty accepts every file.
    pub extensions: Vec<String>,
}

impl FrameSourceOptions {
    /// Unbounded, unfiltered listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of frames collected.
    #[must_use]
    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = Some(max_count);
        self
    }

    /// Set the overflow policy.
    #[must_use]
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    /// Only accept files with one of these extensions (case-insensitive,
    /// leading dot optional).
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| *allowed == ext))
    }
}

/// An ordered, immutable list of frame image paths.
///
/// Position in the list is the frame index in the output video.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FramePaths {
    paths: Vec<PathBuf>,
}

impl FramePaths {
    /// Wrap an already-ordered list of paths.
    pub fn from_ordered(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if there are no frames.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Path of frame `index`.
    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    /// Iterate over the paths in frame order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// Borrow the paths as a slice.
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Take ownership of the underlying paths.
    pub fn into_vec(self) -> Vec<PathBuf> {
        self.paths
    }
}

impl<'a> IntoIterator for &'a FramePaths {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// List the frame files of `directory` in lexicographic file-name order.
///
/// Entries whose status reports a directory are skipped. An entry whose
/// status cannot be read (a dangling symlink, say) is kept; decoding it will
/// fail later with a precise error.
///
/// # Errors
///
/// - [`StillreelError::DirectoryUnreadable`] if the directory cannot be
///   opened or an entry cannot be enumerated.
/// - [`StillreelError::CapacityExceeded`] if more than `max_count` frames
///   exist and the policy is [`OverflowPolicy::Error`].
pub fn list_frames<P: AsRef<Path>>(
    directory: P,
    options: &FrameSourceOptions,
) -> Result<FramePaths, StillreelError> {
    let directory = directory.as_ref();
    let unreadable = |error: std::io::Error| StillreelError::DirectoryUnreadable {
        path: directory.to_path_buf(),
        reason: error.to_string(),
    };

    let mut names: Vec<OsString> = fs::read_dir(directory)
        .map_err(unreadable)?
        .map(|entry| entry.map(|entry| entry.file_name()))
        .collect::<Result<_, _>>()
        .map_err(unreadable)?;
    names.sort();

    let mut paths = Vec::new();
    for name in names {
        let path = directory.join(&name);
        if fs::metadata(&path).is_ok_and(|metadata| metadata.is_dir()) {
            log::trace!("Skipping subdirectory {}", path.display());
            continue;
        }
        if !options.accepts(&path) {
            continue;
        }

        if options.max_count == Some(paths.len()) {
            let capacity = paths.len();
            match options.overflow {
                OverflowPolicy::Truncate => {
                    log::warn!(
                        "{} holds more than {capacity} frames; ignoring {} and later entries",
                        directory.display(),
                        path.display(),
                    );
                    break;
                }
                OverflowPolicy::Error => {
                    return Err(StillreelError::CapacityExceeded {
                        path: directory.to_path_buf(),
                        capacity,
                    });
                }
            }
        }
        paths.push(path);
    }

    log::debug!("Found {} frame(s) in {}", paths.len(), directory.display());
    Ok(FramePaths { paths })
}
