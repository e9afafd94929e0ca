//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Recursive directory walking using walkdir
//! - Streaming content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//!
//! # Example
//!
//! ```no_run
//! use dupscan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     min_size: 1024, // Skip files under 1KB
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{Digest, Hasher, DEFAULT_BUFFER_SIZE};
pub use walker::Walker;

/// A regular file discovered during traversal.
///
/// Produced once per file and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathEntry {
    /// Path to the file, as reached from the scan root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl PathEntry {
    /// Create a new PathEntry.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// When disabled, symlinks are skipped entirely.
    pub follow_symlinks: bool,

    /// Minimum file size to include (in bytes, inclusive).
    /// Files strictly smaller than this are skipped.
    pub min_size: u64,
}

impl WalkerConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(follow_symlinks: bool, min_size: u64) -> Self {
        Self {
            follow_symlinks,
            min_size,
        }
    }
}

/// Errors that can occur while enumerating the directory tree.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The entry disappeared between listing and inspection.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A symlink loop was detected while following links.
    #[error("Symlink loop detected at {0}")]
    Loop(PathBuf),

    /// An I/O error occurred while accessing an entry.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A candidate file could not be hashed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ScanError {
    /// Path of the entry this error refers to, if known.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Loop(p) => Some(p),
            Self::Io { path, .. } => Some(path),
            Self::Hash(e) => e.path(),
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when opening the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// A hashing worker thread panicked.
    #[error("Hash worker {0} panicked")]
    WorkerPanicked(usize),

    /// The thread feeding candidate paths to the workers panicked.
    #[error("Candidate producer panicked")]
    ProducerPanicked,
}

impl HashError {
    /// Build a hash error from an I/O error, keeping the common kinds distinct.
    #[must_use]
    pub fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path of the file this error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Interrupted(p) => Some(p),
            Self::Io { path, .. } => Some(path),
            Self::WorkerPanicked(_) | Self::ProducerPanicked => None,
        }
    }
}
