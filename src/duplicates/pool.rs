//! Bounded hashing worker pool.
//!
//! # Overview
//!
//! [`hash_candidates`] runs one producer thread and `W` worker threads
//! inside a [`std::thread::scope`]:
//!
//! ```text
//!  producer ──bounded(queue_capacity)──▶ worker 0..W ──bounded(W)──▶ caller (aggregator)
//! ```
//!
//! - The producer pushes every candidate into the path stream and drops its
//!   sender, which closes the stream once it drains.
//! - Each worker owns a private [`PartialDigests`]. Nothing is shared on the
//!   hot path; the map is handed off as a single message when the worker's
//!   receive loop ends.
//! - The calling thread merges partials until every worker has dropped its
//!   result sender. That disconnect is the completion barrier; no message
//!   count is assumed up front.
//!
//! Each path is received by exactly one worker. Workers hash one file at a
//! time and close it before recording the digest, so open file descriptors
//! are bounded by `W`.
//!
//! # Failures
//!
//! By default the first file that cannot be read fails the whole run: the
//! failing worker raises a pool-wide abort flag, the producer stops feeding,
//! the other workers stop at their next path, and the error is returned.
//! With `skip_errors` the failure is logged, recorded in the worker's
//! partial, and the file contributes to no digest group.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver};

use super::aggregate::{collect_partials, DigestAggregator};
use crate::progress::ProgressCallback;
use crate::scanner::{Digest, HashError, Hasher, PathEntry};

/// Default capacity of the bounded path stream.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Digest to files map, as accumulated by one worker or by the aggregator.
pub type DigestMap = HashMap<Digest, Vec<PathEntry>>;

/// Number of workers used when none is configured: one per available CPU.
#[must_use]
pub fn default_workers() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Configuration for the hashing worker pool.
#[derive(Clone)]
pub struct PoolConfig {
    /// Number of concurrent hashing workers.
    pub workers: usize,
    /// Capacity of the bounded path stream.
    pub queue_capacity: usize,
    /// Skip unreadable files instead of failing the run.
    pub skip_errors: bool,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
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

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            skip_errors: false,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl PoolConfig {
    /// Set the worker count (minimum 1).
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

    /// Skip unreadable files instead of aborting.
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
}

/// Everything one worker produced, emitted once when its loop ends.
#[derive(Debug, Default)]
pub struct PartialDigests {
    /// Index of the worker that built this map
    pub worker_id: usize,
    /// Files hashed by this worker, keyed by digest
    pub digests: DigestMap,
    /// Number of files successfully hashed
    pub hashed: usize,
    /// Files this worker could not read (only with `skip_errors`)
    pub skipped: Vec<HashError>,
}

impl PartialDigests {
    /// Create an empty partial for the given worker.
    #[must_use]
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            ..Default::default()
        }
    }

    /// Record a hashed file under its digest.
    pub fn record(&mut self, digest: Digest, entry: PathEntry) {
        self.hashed += 1;
        self.digests.entry(digest).or_default().push(entry);
    }

    /// Record a file that could not be hashed.
    pub fn skip(&mut self, error: HashError) {
        self.skipped.push(error);
    }
}

/// Shared, read-only view handed to each worker.
struct WorkerContext<'a> {
    id: usize,
    hasher: &'a Hasher,
    config: &'a PoolConfig,
    abort: &'a AtomicBool,
    processed: &'a AtomicUsize,
}

impl WorkerContext<'_> {
    fn should_stop(&self) -> bool {
        self.abort.load(Ordering::SeqCst) || self.config.is_shutdown_requested()
    }

    fn run(&self, paths: &Receiver<PathEntry>) -> Result<PartialDigests, HashError> {
        let mut partial = PartialDigests::new(self.id);

        for entry in paths.iter() {
            if self.should_stop() {
                log::debug!("Worker {}: stopping early", self.id);
                break;
            }

            match self.hasher.hash_file(&entry.path) {
                Ok(digest) => {
                    log::trace!("Worker {}: {} {}", self.id, digest, entry.path.display());
                    self.report_progress(&entry);
                    partial.record(digest, entry);
                }
                Err(HashError::Interrupted(path)) => {
                    return Err(HashError::Interrupted(path));
                }
                Err(e) if self.config.skip_errors => {
                    log::warn!("Skipping unreadable file: {}", e);
                    self.report_progress(&entry);
                    partial.skip(e);
                }
                Err(e) => {
                    self.abort.store(true, Ordering::SeqCst);
                    return Err(e);
                }
            }
        }

        log::debug!(
            "Worker {} finished: {} hashed, {} skipped, {} distinct digests",
            self.id,
            partial.hashed,
            partial.skipped.len(),
            partial.digests.len()
        );
        Ok(partial)
    }

    fn report_progress(&self, entry: &PathEntry) {
        let current = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_progress(current, entry.path.to_string_lossy().as_ref());
        }
    }
}

/// Hash every candidate with a pool of workers and merge their results.
///
/// Returns the aggregator holding every hashed file; call
/// [`DigestAggregator::into_duplicate_sets`] for the final groups.
///
/// # Errors
///
/// Returns the first [`HashError`] hit by any worker unless
/// `config.skip_errors` is set, and [`HashError::WorkerPanicked`] /
/// [`HashError::ProducerPanicked`] if a pool thread panicked.
///
/// # Example
///
/// ```no_run
/// use dupscan::duplicates::{hash_candidates, PoolConfig};
/// use dupscan::scanner::{Hasher, PathEntry};
///
/// let files = vec![PathEntry::new("a.txt", 1), PathEntry::new("b.txt", 1)];
/// let config = PoolConfig::default().with_workers(4);
/// let aggregator = hash_candidates(files, &Hasher::new(), &config).unwrap();
/// for set in aggregator.into_duplicate_sets() {
///     println!("{:?}", set.paths);
/// }
/// ```
pub fn hash_candidates<I>(
    candidates: I,
    hasher: &Hasher,
    config: &PoolConfig,
) -> Result<DigestAggregator, HashError>
where
    I: IntoIterator<Item = PathEntry>,
    I::IntoIter: Send,
{
    let workers = config.workers.max(1);
    let candidates = candidates.into_iter();

    let (path_tx, path_rx) = bounded::<PathEntry>(config.queue_capacity.max(1));
    let (result_tx, result_rx) = bounded::<Result<PartialDigests, HashError>>(workers);

    let abort = AtomicBool::new(false);
    let processed = AtomicUsize::new(0);
    let abort = &abort;
    let processed = &processed;

    log::debug!(
        "Starting hash pool: {} workers, queue capacity {}",
        workers,
        config.queue_capacity
    );

    thread::scope(|scope| {
        let worker_handles: Vec<_> = (0..workers)
            .map(|id| {
                let paths = path_rx.clone();
                let results = result_tx.clone();
                let ctx = WorkerContext {
                    id,
                    hasher,
                    config,
                    abort,
                    processed,
                };
                scope.spawn(move || {
                    let outcome = ctx.run(&paths);
                    // Release our end of the stream before reporting so the
                    // producer sees a disconnect if every worker is done.
                    drop(paths);
                    // The receiver lives until all senders are gone.
                    let _ = results.send(outcome);
                })
            })
            .collect();

        // Only workers hold these now; their drops drive both disconnects.
        drop(path_rx);
        drop(result_tx);

        let producer = scope.spawn(move || {
            let mut sent = 0usize;
            for entry in candidates {
                if abort.load(Ordering::SeqCst) || config.is_shutdown_requested() {
                    log::debug!("Producer: stopping after {} paths", sent);
                    break;
                }
                if path_tx.send(entry).is_err() {
                    // Every worker has exited.
                    break;
                }
                sent += 1;
            }
            sent
        });

        let aggregated = collect_partials(&result_rx);

        let mut panicked = None;
        for (id, handle) in worker_handles.into_iter().enumerate() {
            if handle.join().is_err() {
                log::error!("Hash worker {} panicked", id);
                panicked.get_or_insert(id);
            }
        }
        let sent = producer.join().map_err(|_| HashError::ProducerPanicked)?;

        if let Some(id) = panicked {
            return Err(HashError::WorkerPanicked(id));
        }

        let aggregated = aggregated?;
        log::debug!(
            "Hash pool done: {} paths enqueued, {} partials merged, {} hashed, {} skipped, {} distinct digests",
            sent,
            aggregated.partials_received(),
            aggregated.hashed_files(),
            aggregated.skipped().len(),
            aggregated.distinct_digests()
        );
        Ok(aggregated)
    })
}
