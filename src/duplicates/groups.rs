//! Size-based file grouping and the final duplicate set type.
//!
//! # Overview
//!
//! Size grouping is the first stage of duplicate detection. Files of
//! different sizes cannot be identical, so only sizes shared by two or more
//! files are forwarded to hashing. Singleton sizes are dropped here and
//! never cost a read.
//!
//! # Example
//!
//! ```
//! use dupscan::scanner::PathEntry;
//! use dupscan::duplicates::group_by_size;
//!
//! let files = vec![
//!     PathEntry::new("/a.txt", 1),
//!     PathEntry::new("/b.txt", 1),
//!     PathEntry::new("/c.txt", 1),
//!     PathEntry::new("/d.txt", 2),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 4);
//! assert_eq!(stats.potential_duplicates, 3);
//! assert_eq!(groups.len(), 1); // d.txt has a unique size
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scanner::{Digest, PathEntry};

/// Candidate groups keyed by file size. Every group holds 2+ entries.
pub type SizeGroups = HashMap<u64, Vec<PathEntry>>;

/// Statistics from size grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total files fed to the grouper
    pub total_files: usize,
    /// Combined size of all files fed to the grouper
    pub total_size: u64,
    /// Files dropped because no other file has their size
    pub unique_sizes: usize,
    /// Files forwarded to hashing
    pub potential_duplicates: usize,
    /// Number of size groups with 2+ files
    pub size_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size comparison.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.unique_sizes as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Incremental size grouper, fed one entry at a time during traversal.
///
/// Within a group, entries keep the order they were added in.
#[derive(Debug, Default)]
pub struct SizeGrouper {
    groups: HashMap<u64, Vec<PathEntry>>,
    total_files: usize,
    total_size: u64,
}

impl SizeGrouper {
    /// Create an empty grouper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the group for its size.
    pub fn add(&mut self, entry: PathEntry) {
        self.total_files += 1;
        self.total_size += entry.size;
        self.groups.entry(entry.size).or_default().push(entry);
    }

    /// Number of files added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.total_files
    }

    /// Whether no files have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_files == 0
    }

    /// Drop singleton groups and return the candidates.
    #[must_use]
    pub fn finish(self) -> (SizeGroups, GroupingStats) {
        let mut stats = GroupingStats {
            total_files: self.total_files,
            total_size: self.total_size,
            ..Default::default()
        };

        let groups: SizeGroups = self
            .groups
            .into_iter()
            .filter(|(size, files)| {
                if files.len() < 2 {
                    stats.unique_sizes += files.len();
                    log::trace!("Eliminated unique size {}: {:?}", size, files[0].path);
                    false
                } else {
                    stats.potential_duplicates += files.len();
                    stats.size_groups += 1;
                    log::debug!("Size group {} bytes: {} candidates", size, files.len());
                    true
                }
            })
            .collect();

        (groups, stats)
    }
}

/// Group files by size, keeping only sizes shared by 2+ files.
#[must_use]
pub fn group_by_size<I>(files: I) -> (SizeGroups, GroupingStats)
where
    I: IntoIterator<Item = PathEntry>,
{
    let mut grouper = SizeGrouper::new();
    for file in files {
        grouper.add(file);
    }
    grouper.finish()
}

/// Flatten size groups into the stream of paths to hash.
pub fn candidates(groups: SizeGroups) -> impl Iterator<Item = PathEntry> {
    groups.into_values().flatten()
}

/// A confirmed set of files with identical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSet {
    /// BLAKE3 digest shared by every member
    pub digest: Digest,
    /// File size in bytes, shared by every member
    pub size: u64,
    /// Paths of the identical files (2 or more)
    pub paths: Vec<PathBuf>,
}

impl DuplicateSet {
    /// Create a new duplicate set.
    #[must_use]
    pub fn new(digest: Digest, size: u64, paths: Vec<PathBuf>) -> Self {
        Self { digest, size, paths }
    }

    /// Number of files in this set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Bytes that would be freed by keeping a single copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * (self.paths.len().saturating_sub(1) as u64)
    }
}
