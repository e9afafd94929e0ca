//! Plain text report: one line per duplicate set.
//!
//! Paths are joined with commas, with no trailing comma. The line is
//! written as a CSV record, so a path that itself contains a comma, a quote
//! or a newline is quoted rather than splitting the line. On unix, paths
//! are written as their raw bytes so every line names files that exist.

use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

use super::ReportError;
use crate::duplicates::DuplicateSet;

/// Write each set as one comma-separated line.
///
/// # Errors
///
/// Returns [`ReportError`] if writing to `writer` fails.
pub fn write_text<W: Write>(writer: W, sets: &[DuplicateSet]) -> Result<(), ReportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    for set in sets {
        csv_writer.write_record(set.paths.iter().map(|p| path_field(p)))?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(unix)]
fn path_field(path: &Path) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_field(path: &Path) -> Cow<'_, [u8]> {
    match path.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}
