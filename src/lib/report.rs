//! Per-alignment primer assignment reports.
//!
//! The trim pipeline hands one [`ReportRow`] per classified alignment to a
//! [`TrimReporter`]. Reporters can write a TSV file, log each row, or both.

use crate::amplicon::Amplicon;
use anyhow::{Context, Result};
use log::info;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Column names of the report, in order.
pub const REPORT_HEADER: [&str; 13] = [
    "QueryName",
    "ReferenceStart",
    "ReferenceEnd",
    "PrimerPair",
    "Primer1",
    "Primer1Start",
    "Primer2",
    "Primer2Start",
    "IsSecondary",
    "IsSupplementary",
    "Start",
    "End",
    "CorrectlyPaired",
];

fn title_case_bool<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "True" } else { "False" })
}

/// One alignment and the amplicon it was assigned to.
///
/// Coordinates are those of the alignment before trimming. `primer1_start`
/// and `primer2_start` are the distances from the alignment ends to the
/// amplicon ends; `start` and `end` are the amplicon ends including primers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportRow<'a> {
    pub query_name: Cow<'a, str>,
    pub reference_start: i64,
    pub reference_end: i64,
    pub primer_pair: String,
    pub primer1: &'a str,
    pub primer1_start: i64,
    pub primer2: &'a str,
    pub primer2_start: i64,
    #[serde(serialize_with = "title_case_bool")]
    pub is_secondary: bool,
    #[serde(serialize_with = "title_case_bool")]
    pub is_supplementary: bool,
    pub start: i64,
    pub end: i64,
    #[serde(serialize_with = "title_case_bool")]
    pub correctly_paired: bool,
}

impl<'a> ReportRow<'a> {
    /// Build a row for an alignment spanning `[reference_start, reference_end)`.
    #[must_use]
    pub fn new(
        query_name: &'a [u8],
        reference_start: i64,
        reference_end: i64,
        amplicon: &Amplicon<'a>,
        is_secondary: bool,
        is_supplementary: bool,
    ) -> Self {
        let span = amplicon.max_span();
        Self {
            query_name: String::from_utf8_lossy(query_name),
            reference_start,
            reference_end,
            primer_pair: amplicon.name(),
            primer1: amplicon.forward().id(),
            primer1_start: (span.start - reference_start).abs(),
            primer2: amplicon.reverse().id(),
            primer2_start: (span.end - reference_end).abs(),
            is_secondary,
            is_supplementary,
            start: span.start,
            end: span.end,
            correctly_paired: amplicon.is_properly_paired(),
        }
    }
}

/// Receives a row for every alignment that passes the filters.
pub trait TrimReporter {
    /// Record one alignment.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be written.
    fn report(&mut self, row: &ReportRow<'_>) -> Result<()>;

    /// Flush any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Discards every row.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl TrimReporter for NoopReporter {
    fn report(&mut self, _row: &ReportRow<'_>) -> Result<()> {
        Ok(())
    }
}

/// Logs each row as a tab-separated line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl TrimReporter for LogReporter {
    fn report(&mut self, row: &ReportRow<'_>) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(Vec::new());
        writer.serialize(row)?;
        let line = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to format report line: {}", e.error()))?;
        info!("{}", String::from_utf8_lossy(&line).trim_end());
        Ok(())
    }
}

/// Writes rows as TSV, starting with a header line.
pub struct TsvReporter<W: Write> {
    writer: csv::Writer<W>,
}

impl TsvReporter<BufWriter<File>> {
    /// Create (or truncate) a report file and write its header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the header written.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> TsvReporter<W> {
    /// Wrap a writer and write the header line.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn new(inner: W) -> Result<Self> {
        let mut writer =
            csv::WriterBuilder::new().delimiter(b'\t').has_headers(false).from_writer(inner);
        writer.write_record(REPORT_HEADER)?;
        Ok(Self { writer })
    }

    /// Flush and return the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| anyhow::anyhow!("Failed to flush report: {}", e.error()))
    }
}

impl<W: Write> TrimReporter for TsvReporter<W> {
    fn report(&mut self, row: &ReportRow<'_>) -> Result<()> {
        self.writer.serialize(row)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush report")
    }
}

impl<T: TrimReporter + ?Sized> TrimReporter for Box<T> {
    fn report(&mut self, row: &ReportRow<'_>) -> Result<()> {
        (**self).report(row)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Sends every row to each reporter in turn.
impl<T: TrimReporter> TrimReporter for Vec<T> {
    fn report(&mut self, row: &ReportRow<'_>) -> Result<()> {
        self.iter_mut().try_for_each(|r| r.report(row))
    }

    fn finish(&mut self) -> Result<()> {
        self.iter_mut().try_for_each(TrimReporter::finish)
    }
}
