//! Result file writer
//!
//! Entries are written as one UTF-8 text file with a byte-order mark, so
//! spreadsheet tools pick the right encoding, and a bullet before each entry.

use chrono::{DateTime, TimeZone};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// UTF-8 byte-order mark
pub const BOM: &str = "\u{FEFF}";

/// Errors that can occur while persisting results
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Joins entries into the output text
///
/// Each entry is prefixed with `bullet` and entries are separated by a blank
/// line; there is no trailing separator.
///
/// ```
/// use thread_harvest::output::format_entries;
///
/// let entries = vec!["a".to_string(), "b".to_string()];
/// assert_eq!(format_entries(&entries, "• "), "• a\n\n• b");
/// ```
pub fn format_entries<S: AsRef<str>>(entries: &[S], bullet: &str) -> String {
    entries
        .iter()
        .map(|entry| format!("{}{}", bullet, entry.as_ref()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds the result file name: `<slug>_p1-<last_page>_<YYYYMMDD_HHMMSS>.txt`
pub fn output_file_name<Tz>(slug: &str, last_page: u32, timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}_p1-{}_{}.txt",
        slug,
        last_page,
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Creates the output directory, falling back to the working directory
///
/// Never fails: a directory that cannot be created is logged and `.` is used
/// instead.
pub fn prepare_output_dir(path: &Path) -> PathBuf {
    match fs::create_dir_all(path) {
        Ok(()) => path.to_path_buf(),
        Err(e) => {
            tracing::error!(
                "Output directory could not be created ({}): {} -> using '.'",
                path.display(),
                e
            );
            PathBuf::from(".")
        }
    }
}

/// Writes formatted entries to `path`, prefixed by a byte-order mark
pub fn write_entries<S: AsRef<str>>(path: &Path, entries: &[S], bullet: &str) -> OutputResult<()> {
    let content = format_entries(entries, bullet);

    let write = || -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(BOM.as_bytes())?;
        file.write_all(content.as_bytes())?;
        file.flush()
    };

    write().map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}
