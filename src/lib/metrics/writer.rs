//! Writing metrics files.

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::Serialize;
use std::path::Path;

use super::Metric;

/// Write metrics rows to a TSV file with a header line.
///
/// # Errors
/// Returns an error if the file cannot be created or written to
///
/// # Example
/// ```no_run
/// use amptrim_lib::metrics::{TrimMetrics, write_metrics};
///
/// let metrics = TrimMetrics { records_processed: 10, records_written: 9, ..Default::default() };
/// write_metrics("trim_metrics.txt", &[metrics]).unwrap();
/// ```
pub fn write_metrics<P: AsRef<Path>, T: Metric>(path: P, metrics: &[T]) -> Result<()> {
    write_rows(path, metrics, T::metric_name())
}

/// Write any serializable rows as TSV, naming them `description` in errors.
///
/// # Errors
/// Returns an error if the file cannot be created or written to
pub fn write_rows<P: AsRef<Path>, T: Serialize>(
    path: P,
    rows: &[T],
    description: &str,
) -> Result<()> {
    let path_ref = path.as_ref();
    DelimFile::default()
        .write_tsv(&path_ref, rows)
        .with_context(|| format!("Failed to write {} metrics: {}", description, path_ref.display()))
}
