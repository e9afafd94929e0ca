//! Report emitter for duplicate scan results.
//!
//! This module persists the final duplicate sets:
//! - Text: one line per set, paths separated by commas
//! - JSON for automation and scripting
//!
//! Reports are named `duplicates-<YYYYMMDDHHMMSS>.<ext>` and are always
//! created fresh. If that name is already taken, a numeric suffix is
//! appended, so a run never overwrites an earlier report.
//!
//! # Example
//!
//! ```no_run
//! use dupscan::duplicates::DuplicateFinder;
//! use dupscan::report::{ReportFormat, ReportWriter};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (sets, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! let writer = ReportWriter::new(Path::new("."), ReportFormat::Text);
//! let path = writer.write(&sets, &summary).unwrap();
//! println!("Report written to {}", path.display());
//! ```

pub mod json;
pub mod text;

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duplicates::{DuplicateSet, ScanSummary};

pub use json::write_json;
pub use text::write_text;

/// How many numeric suffixes to try before giving up on a file name.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Report file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One comma-separated line per duplicate set
    #[default]
    Text,
    /// Structured JSON document
    Json,
}

impl ReportFormat {
    /// File extension used for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
        }
    }
}

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report file could not be created.
    #[error("Cannot create report {path}: {source}")]
    Create {
        /// Report path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Every candidate file name was already taken.
    #[error("No free report file name in {0}")]
    NameExhausted(PathBuf),

    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error during JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes duplicate sets to a timestamped report file.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
    format: ReportFormat,
}

impl ReportWriter {
    /// Create a writer that places reports in `output_dir`.
    #[must_use]
    pub fn new(output_dir: &Path, format: ReportFormat) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            format,
        }
    }

    /// Report format this writer produces.
    #[must_use]
    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Write a report stamped with the current local time.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the output directory or file cannot be
    /// created or written.
    pub fn write(
        &self,
        sets: &[DuplicateSet],
        summary: &ScanSummary,
    ) -> Result<PathBuf, ReportError> {
        self.write_at(Local::now(), sets, summary)
    }

    /// Write a report stamped with the given time.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the output directory or file cannot be
    /// created or written.
    pub fn write_at(
        &self,
        timestamp: DateTime<Local>,
        sets: &[DuplicateSet],
        summary: &ScanSummary,
    ) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::Create {
            path: self.output_dir.clone(),
            source,
        })?;

        let stamp = timestamp.format("%Y%m%d%H%M%S").to_string();
        let (file, path) = self.create_unique(&stamp)?;

        fill_or_remove(file, &path, |writer| match self.format {
            ReportFormat::Text => write_text(writer, sets),
            ReportFormat::Json => write_json(writer, sets, summary),
        })?;

        log::debug!("Wrote {} duplicate sets to {}", sets.len(), path.display());
        Ok(path)
    }

    fn create_unique(&self, stamp: &str) -> Result<(File, PathBuf), ReportError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self
                .output_dir
                .join(report_file_name(stamp, attempt, self.format));

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((file, path)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    log::debug!("Report name taken: {}", path.display());
                }
                Err(source) => return Err(ReportError::Create { path, source }),
            }
        }
        Err(ReportError::NameExhausted(self.output_dir.clone()))
    }
}

/// Run `fill` against a freshly created report and flush it. If anything
/// fails the file is deleted, so a failed run never leaves a partial report.
fn fill_or_remove<F>(file: File, path: &Path, fill: F) -> Result<(), ReportError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), ReportError>,
{
    let mut writer = BufWriter::new(file);
    let result = fill(&mut writer).and_then(|()| Ok(writer.flush()?));
    drop(writer);

    if let Err(e) = result {
        if let Err(remove_err) = fs::remove_file(path) {
            log::warn!(
                "Could not remove partial report {}: {}",
                path.display(),
                remove_err
            );
        }
        return Err(e);
    }
    Ok(())
}

fn report_file_name(stamp: &str, attempt: usize, format: ReportFormat) -> String {
    if attempt == 0 {
        format!("duplicates-{}.{}", stamp, format.extension())
    } else {
        format!("duplicates-{}-{}.{}", stamp, attempt, format.extension())
    }
}
