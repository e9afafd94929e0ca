//! dupscan - content-based duplicate file finder.
//!
//! Walks a directory tree, groups regular files by size, hashes every file
//! whose size is shared (BLAKE3, on a pool of worker threads) and writes one
//! report line per set of byte-identical files.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod signal;

use std::sync::Arc;

use anyhow::Context;

use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::report::ReportWriter;

/// Run a full scan as described by the parsed command line.
///
/// On success the report has been written and its path logged.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the scan fails or is
/// interrupted, or the report cannot be written. A
/// [`duplicates::FinderError::Interrupted`] can be found with
/// `downcast_ref` to distinguish Ctrl+C from failures.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_cli(&cli);
    config.validate().context("Invalid configuration")?;
    log::debug!("Effective configuration: {:?}", config);

    let mut finder_config = config
        .finder_config()
        .with_shutdown_flag(handler.get_flag());
    if !cli.quiet && !cli.no_progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let finder = DuplicateFinder::new(finder_config);
    let (sets, summary) = finder
        .find_duplicates(&cli.dir)
        .with_context(|| format!("Scan of {} failed", cli.dir.display()))?;

    log::info!(
        "{} duplicate sets, {} redundant files, {} reclaimable ({:.2?})",
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display(),
        summary.scan_duration
    );

    let writer = ReportWriter::new(&config.output_dir, config.format);
    let path = writer
        .write(&sets, &summary)
        .context("Failed to write report")?;
    log::info!("Report written to {}", path.display());

    if summary.is_partial() {
        log::warn!(
            "{} entries could not be read and were left out of the report",
            summary.skipped.len()
        );
        return Ok(ExitCode::PartialSuccess);
    }
    Ok(ExitCode::Success)
}
