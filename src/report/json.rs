//! JSON report for automation and scripting.
//!
//! # Schema
//!
//! ```json
//! {
//!   "generated_at": "2024-03-09T14:05:07Z",
//!   "summary": {
//!     "total_files": 4,
//!     "candidate_files": 3,
//!     "hashed_files": 3,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 1,
//!     "reclaimable_bytes": 1,
//!     "skipped_entries": 0
//!   },
//!   "groups": [
//!     { "digest": "…", "size": 1, "paths": ["./a.txt", "./b.txt"] }
//!   ]
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ReportError;
use crate::duplicates::{DuplicateSet, ScanSummary};
use crate::scanner::Digest;

#[derive(Debug, Serialize)]
struct JsonSummary {
    total_files: usize,
    candidate_files: usize,
    hashed_files: usize,
    duplicate_groups: usize,
    duplicate_files: usize,
    reclaimable_bytes: u64,
    skipped_entries: usize,
}

#[derive(Debug, Serialize)]
struct JsonGroup<'a> {
    digest: &'a Digest,
    size: u64,
    paths: Vec<String>,
}

impl<'a> From<&'a DuplicateSet> for JsonGroup<'a> {
    fn from(set: &'a DuplicateSet) -> Self {
        Self {
            digest: &set.digest,
            size: set.size,
            paths: set
                .paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    summary: JsonSummary,
    groups: Vec<JsonGroup<'a>>,
}

/// Write the sets and summary as a pretty-printed JSON document.
///
/// # Errors
///
/// Returns [`ReportError`] if serialization or writing fails. Paths that are
/// not valid UTF-8 are written lossily.
pub fn write_json<W: Write>(
    mut writer: W,
    sets: &[DuplicateSet],
    summary: &ScanSummary,
) -> Result<(), ReportError> {
    let report = JsonReport {
        generated_at: Utc::now(),
        summary: JsonSummary {
            total_files: summary.total_files,
            candidate_files: summary.candidate_files,
            hashed_files: summary.hashed_files,
            duplicate_groups: sets.len(),
            duplicate_files: sets.iter().map(|s| s.len() - 1).sum(),
            reclaimable_bytes: sets.iter().map(DuplicateSet::wasted_space).sum(),
            skipped_entries: summary.skipped.len(),
        },
        groups: sets.iter().map(JsonGroup::from).collect(),
    };

    serde_json::to_writer_pretty(&mut writer, &report)?;
    writeln!(writer)?;
    Ok(())
}
