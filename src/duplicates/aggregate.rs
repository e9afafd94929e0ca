//! Merging per-worker digest maps into duplicate sets.
//!
//! Workers never share their maps while hashing. Each finished
//! [`PartialDigests`] is moved into the [`DigestAggregator`] on the
//! coordinating thread, which concatenates file lists for matching digests
//! and finally keeps only digests shared by two or more files.

use crossbeam_channel::Receiver;

use super::groups::DuplicateSet;
use super::pool::{DigestMap, PartialDigests};
use crate::scanner::HashError;

/// Global digest map built from completed worker partials.
#[derive(Debug, Default)]
pub struct DigestAggregator {
    digests: DigestMap,
    partials: usize,
    hashed: usize,
    skipped: Vec<HashError>,
}

impl DigestAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one worker's completed map.
    pub fn merge(&mut self, partial: PartialDigests) {
        self.partials += 1;
        self.hashed += partial.hashed;
        self.skipped.extend(partial.skipped);

        for (digest, mut entries) in partial.digests {
            self.digests.entry(digest).or_default().append(&mut entries);
        }
    }

    /// Number of partials merged so far.
    #[must_use]
    pub fn partials_received(&self) -> usize {
        self.partials
    }

    /// Number of files hashed across all merged partials.
    #[must_use]
    pub fn hashed_files(&self) -> usize {
        self.hashed
    }

    /// Number of distinct digests seen.
    #[must_use]
    pub fn distinct_digests(&self) -> usize {
        self.digests.len()
    }

    /// Files that could not be hashed.
    #[must_use]
    pub fn skipped(&self) -> &[HashError] {
        &self.skipped
    }

    /// Take ownership of the skipped-file errors.
    pub fn take_skipped(&mut self) -> Vec<HashError> {
        std::mem::take(&mut self.skipped)
    }

    /// Keep digests shared by 2+ files and turn them into duplicate sets.
    ///
    /// Paths are sorted within each set and sets are ordered by their first
    /// path. The order carries no meaning beyond making output repeatable.
    #[must_use]
    pub fn into_duplicate_sets(self) -> Vec<DuplicateSet> {
        let mut sets: Vec<DuplicateSet> = self
            .digests
            .into_iter()
            .filter(|(_, entries)| entries.len() >= 2)
            .map(|(digest, entries)| {
                let size = entries[0].size;
                debug_assert!(entries.iter().all(|e| e.size == size));
                let mut paths: Vec<_> = entries.into_iter().map(|e| e.path).collect();
                paths.sort();
                DuplicateSet::new(digest, size, paths)
            })
            .collect();

        sets.sort_by(|a, b| a.paths.first().cmp(&b.paths.first()));
        sets
    }
}

/// Drain worker results until every worker has dropped its sender.
///
/// All messages are consumed even after a failure so no worker is left
/// blocked on a send.
///
/// # Errors
///
/// Returns the first error reported by any worker.
pub fn collect_partials(
    results: &Receiver<Result<PartialDigests, HashError>>,
) -> Result<DigestAggregator, HashError> {
    let mut aggregator = DigestAggregator::new();
    let mut first_error = None;

    for outcome in results.iter() {
        match outcome {
            Ok(partial) => {
                log::trace!(
                    "Merging partial from worker {} ({} digests)",
                    partial.worker_id,
                    partial.digests.len()
                );
                aggregator.merge(partial);
            }
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    log::debug!("Additional worker failure: {}", e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(aggregator),
    }
}
