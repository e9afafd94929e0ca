//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and collecting a [`PathEntry`] for every regular file that passes
//! the size floor. Directories are descended into but never yielded.
//!
//! Every entry that cannot be enumerated or inspected is yielded as a
//! [`ScanError`]. Whether that aborts the scan is the caller's decision.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().collect::<Result<_, _>>().unwrap();
//! println!("Found {} files", files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{PathEntry, ScanError, WalkerConfig};

/// Recursive directory walker.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the directory tree, yielding file entries.
    ///
    /// Entries are visited depth-first, in file-name order within each
    /// directory. The root itself is never yielded.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathEntry, ScanError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        walk_dir
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => self.process_entry(&entry),
                Err(e) => Some(Err(self.convert_walkdir_error(e))),
            })
    }

    fn process_entry(&self, entry: &walkdir::DirEntry) -> Option<Result<PathEntry, ScanError>> {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return None;
        }

        // With follow_links enabled walkdir reports the target's type, so a
        // symlink here is either unfollowed or dangling.
        if file_type.is_symlink() {
            log::trace!("Skipping symlink: {}", entry.path().display());
            return None;
        }

        if !file_type.is_file() {
            log::trace!("Skipping special file: {}", entry.path().display());
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.convert_walkdir_error(e))),
        };

        let size = metadata.len();
        if size < self.config.min_size {
            log::trace!(
                "Skipping file below minimum size ({} < {}): {}",
                size,
                self.config.min_size,
                entry.path().display()
            );
            return None;
        }

        Some(Ok(PathEntry::new(entry.path(), size)))
    }

    fn convert_walkdir_error(&self, error: walkdir::Error) -> ScanError {
        use std::io::ErrorKind;

        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if error.loop_ancestor().is_some() {
            log::warn!("Symlink loop at {}", path.display());
            return ScanError::Loop(path);
        }

        match error.into_io_error() {
            Some(io) if io.kind() == ErrorKind::PermissionDenied => {
                log::debug!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(io) if io.kind() == ErrorKind::NotFound => {
                log::debug!("Path not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path)
            }
            Some(io) => {
                log::debug!("I/O error for {}: {}", path.display(), io);
                ScanError::Io { path, source: io }
            }
            None => ScanError::Io {
                path,
                source: std::io::Error::other("directory traversal failed"),
            },
        }
    }
}
