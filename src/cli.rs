//! Command-line interface definitions for dupscan.
//!
//! This module defines all CLI arguments using the clap derive API.
//!
//! # Example
//!
//! ```bash
//! # Scan the current directory
//! dupscan
//!
//! # Scan a directory, ignoring files under 1 MiB, with 8 workers
//! dupscan --dir ~/Downloads --minsize 1MiB --workers 8
//!
//! # JSON report in a separate directory
//! dupscan --dir ~/Pictures --format json --output-dir ~/reports
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::report::ReportFormat;

/// Find byte-for-byte duplicate files by content.
///
/// Files are first grouped by size; only sizes shared by two or more files
/// are hashed (BLAKE3) on a pool of worker threads. Each set of identical
/// files becomes one line of a timestamped report.
#[derive(Debug, Parser)]
#[command(name = "dupscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    pub dir: PathBuf,

    /// Minimum file size to consider, inclusive (e.g., 0, 512, 1KB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, visible_alias = "min-size", value_name = "SIZE", value_parser = parse_size)]
    pub minsize: Option<u64>,

    /// Number of hashing workers (default: number of CPUs)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub workers: Option<u64>,

    /// Capacity of the bounded queue feeding the workers
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub queue_capacity: Option<u64>,

    /// Directory the report file is written to
    #[arg(short, long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Skip unreadable files and directories with a warning instead of aborting
    #[arg(long)]
    pub skip_errors: bool,

    /// Follow symbolic links during scan
    ///
    /// Warning: the same file may then be reached through several paths.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "PATH", env = "DUPSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Report errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Parse a human-readable size string into bytes.
///
/// # Examples
///
/// ```
/// use dupscan::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns a message if the number or suffix cannot be parsed.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    if num_str.is_empty() {
        return Err(format!("Invalid number in '{s}'"));
    }

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    // Integers stay exact; only fractional input goes through f64.
    if let Ok(whole) = num_str.parse::<u64>() {
        return whole
            .checked_mul(multiplier)
            .ok_or_else(|| format!("Size too large: '{s}'"));
    }

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    Ok((num * multiplier as f64) as u64)
}
