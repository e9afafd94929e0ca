//! Duplicate finder implementation.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Walk** - Enumerate regular files at or above the size floor
//! 2. **Size grouping** - Keep only sizes shared by 2+ files (see [`crate::duplicates::groups`])
//! 3. **Hashing** - Hash every candidate on the worker pool (see [`crate::duplicates::pool`])
//! 4. **Aggregation** - Merge worker maps and keep digests shared by 2+ files
//!
//! # Example
//!
//! ```no_run
//! use dupscan::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let config = FinderConfig::default().with_min_size(1024).with_workers(8);
//! let finder = DuplicateFinder::new(config);
//! let (sets, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! println!("{} duplicate sets, {} reclaimable", sets.len(), summary.reclaimable_display());
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::groups::{candidates, DuplicateSet, SizeGrouper};
use super::pool::{default_workers, hash_candidates, PoolConfig, DEFAULT_QUEUE_CAPACITY};
use crate::progress::{ProgressCallback, PHASE_HASHING, PHASE_WALKING};
use crate::scanner::{HashError, Hasher, PathEntry, ScanError, Walker, WalkerConfig};

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Walker configuration (size floor, symlink handling).
    pub walker_config: WalkerConfig,
    /// Number of hashing workers.
    pub workers: usize,
    /// Capacity of the bounded path stream feeding the workers.
    pub queue_capacity: usize,
    /// Skip unreadable entries with a warning instead of aborting.
    pub skip_errors: bool,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderConfig")
            .field("walker_config", &self.walker_config)
            .field("workers", &self.workers)
            .field("queue_capacity", &self.queue_capacity)
            .field("skip_errors", &self.skip_errors)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            walker_config: WalkerConfig::default(),
            workers: default_workers(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            skip_errors: false,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the inclusive minimum file size in bytes.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.walker_config.min_size = min_size;
        self
    }

    /// Follow symbolic links during traversal.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.walker_config.follow_symlinks = follow;
        self
    }

    /// Set the number of hashing workers (minimum 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the path stream capacity (minimum 1).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Skip unreadable entries instead of aborting the scan.
    #[must_use]
    pub fn with_skip_errors(mut self, skip: bool) -> Self {
        self.skip_errors = skip;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            skip_errors: self.skip_errors,
            shutdown_flag: self.shutdown_flag.clone(),
            progress_callback: self.progress_callback.clone(),
        }
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Total number of files at or above the size floor
    pub total_files: usize,
    /// Total size of those files in bytes
    pub total_size: u64,
    /// Number of files eliminated because their size was unique
    pub eliminated_by_size: usize,
    /// Number of files sent to the hashing pool
    pub candidate_files: usize,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Number of confirmed duplicate sets
    pub duplicate_groups: usize,
    /// Total number of redundant copies (set members beyond the first)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by keeping one copy per set
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Entries skipped because they could not be read (only with `skip_errors`)
    pub skipped: Vec<ScanError>,
}

impl ScanSummary {
    /// Whether any entry was skipped.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Directory traversal failed.
    #[error("Traversal failed: {0}")]
    Scan(#[from] ScanError),

    /// A candidate file could not be hashed.
    #[error("Hashing failed: {0}")]
    Hash(#[from] HashError),
}

/// Duplicate finder that runs the walk, group, hash and merge pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration this finder runs with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under the given directory.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist or is not a directory
    /// - An entry cannot be enumerated or a candidate cannot be read and
    ///   `skip_errors` is off
    /// - The scan is interrupted by shutdown signal
    pub fn find_duplicates(
        &self,
        root: &Path,
    ) -> Result<(Vec<DuplicateSet>, ScanSummary), FinderError> {
        let start_time = Instant::now();

        if !root.exists() {
            return Err(FinderError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(FinderError::NotADirectory(root.to_path_buf()));
        }
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!("Scanning {}", root.display());

        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_WALKING, 0);
        }

        let mut grouper = SizeGrouper::new();
        let mut skipped = Vec::new();

        for result in walker.walk() {
            match result {
                Ok(entry) => {
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(
                            grouper.len() + 1,
                            entry.path.to_string_lossy().as_ref(),
                        );
                    }
                    grouper.add(entry);
                }
                Err(e) if self.config.skip_errors => {
                    log::warn!("Skipping entry: {}", e);
                    skipped.push(e);
                }
                Err(e) => {
                    log::error!("Traversal failed: {}", e);
                    return Err(FinderError::Scan(e));
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        self.run_pipeline(grouper, skipped, start_time)
    }

    /// Find duplicates among an already-enumerated set of files.
    ///
    /// Entries below the configured size floor are ignored.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if a candidate cannot be read and `skip_errors`
    /// is off, or if the scan is interrupted.
    pub fn find_duplicates_from_entries<I>(
        &self,
        entries: I,
    ) -> Result<(Vec<DuplicateSet>, ScanSummary), FinderError>
    where
        I: IntoIterator<Item = PathEntry>,
    {
        let start_time = Instant::now();
        let min_size = self.config.walker_config.min_size;

        let mut grouper = SizeGrouper::new();
        for entry in entries.into_iter().filter(|e| e.size >= min_size) {
            grouper.add(entry);
        }

        self.run_pipeline(grouper, Vec::new(), start_time)
    }

    fn run_pipeline(
        &self,
        grouper: SizeGrouper,
        skipped: Vec<ScanError>,
        start_time: Instant,
    ) -> Result<(Vec<DuplicateSet>, ScanSummary), FinderError> {
        let (size_groups, size_stats) = grouper.finish();

        let mut summary = ScanSummary {
            total_files: size_stats.total_files,
            total_size: size_stats.total_size,
            eliminated_by_size: size_stats.unique_sizes,
            candidate_files: size_stats.potential_duplicates,
            skipped,
            ..Default::default()
        };

        log::info!(
            "Found {} files ({})",
            summary.total_files,
            summary.total_size_display()
        );
        log::info!(
            "Size grouping: {} → {} candidates in {} groups ({:.1}% eliminated)",
            size_stats.total_files,
            size_stats.potential_duplicates,
            size_stats.size_groups,
            size_stats.elimination_rate()
        );

        if size_groups.is_empty() {
            log::info!("No files share a size, nothing to hash");
            summary.scan_duration = start_time.elapsed();
            return Ok((Vec::new(), summary));
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_HASHING, summary.candidate_files);
        }

        log::info!(
            "Hashing {} candidates with {} workers",
            summary.candidate_files,
            self.config.workers
        );

        let result = hash_candidates(
            candidates(size_groups),
            &self.hasher,
            &self.config.pool_config(),
        );

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_HASHING);
        }

        let mut aggregator = match result {
            Ok(aggregator) => aggregator,
            Err(HashError::Interrupted(_)) => return Err(FinderError::Interrupted),
            Err(e) => {
                log::error!("Hashing failed: {}", e);
                return Err(FinderError::Hash(e));
            }
        };

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        summary.hashed_files = aggregator.hashed_files();
        summary
            .skipped
            .extend(aggregator.take_skipped().into_iter().map(ScanError::from));

        let sets = aggregator.into_duplicate_sets();

        summary.duplicate_groups = sets.len();
        summary.duplicate_files = sets.iter().map(|s| s.len() - 1).sum();
        summary.reclaimable_space = sets.iter().map(DuplicateSet::wasted_space).sum();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate sets, {} redundant files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );
        if summary.is_partial() {
            log::warn!("{} entries were skipped", summary.skipped.len());
        }

        Ok((sets, summary))
    }
}
