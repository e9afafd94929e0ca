//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (stage 1)
//! - Parallel full-content hashing with a bounded worker pool (stage 2)
//! - Merging worker results into duplicate sets
//! - Pipeline orchestration

pub mod aggregate;
pub mod finder;
pub mod groups;
pub mod pool;

pub use aggregate::{collect_partials, DigestAggregator};
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{candidates, group_by_size, DuplicateSet, GroupingStats, SizeGrouper, SizeGroups};
pub use pool::{
    default_workers, hash_candidates, DigestMap, PartialDigests, PoolConfig,
    DEFAULT_QUEUE_CAPACITY,
};
