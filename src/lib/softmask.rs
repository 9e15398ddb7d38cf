//! The streaming align-trim pipeline.
//!
//! Each alignment is read, filtered, assigned to its nearest amplicon,
//! tagged with the amplicon's pool, optionally dropped as an incorrect pair or
//! by abundance normalisation, soft-masked to the amplicon boundaries and
//! written. Records are processed strictly one at a time; the scheme is only
//! read.

use crate::amplicon::Span;
use crate::bam_io::RawRecordWriter;
use crate::errors::{AmptrimError, ErrorPolicy, TrimError};
use crate::metrics::TrimMetrics;
use crate::progress::ProgressTracker;
use crate::report::{NoopReporter, ReportRow, TrimReporter};
use crate::rewriter::softmask_record;
use crate::scheme::PrimerScheme;
use crate::trim::ClipEnd;
use ahash::AHashMap;
use amptrim_raw_bam::{
    RawBamReader, RawRecord, alignment_end, flags, mapq, pos, read_name, update_string_tag,
};
use anyhow::Result;
use log::{debug, warn};
use std::io::Read;

/// Read group tag written on every kept alignment.
pub const READ_GROUP_TAG: [u8; 2] = *b"RG";

/// How far into the amplicon alignments are soft-masked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrimerBoundary {
    /// Mask primer sites too: trim to the insert between the primers.
    #[default]
    MaskPrimers,
    /// Keep primer sites: trim to the outer primer ends.
    KeepPrimers,
}

impl PrimerBoundary {
    /// The span alignments are trimmed to.
    #[must_use]
    pub fn span(self, amplicon: &crate::amplicon::Amplicon<'_>) -> Span {
        match self {
            PrimerBoundary::MaskPrimers => amplicon.min_span(),
            PrimerBoundary::KeepPrimers => amplicon.max_span(),
        }
    }
}

/// Settings for a [`Softmasker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftmaskConfig {
    /// Alignments below this mapping quality are dropped.
    pub min_mapq: u8,
    /// Keep at most this many alignments per amplicon and strand; 0 keeps all.
    pub normalise: u64,
    pub boundary: PrimerBoundary,
    /// Drop alignments whose nearest primers are not a proper pair.
    pub remove_incorrect_pairs: bool,
    /// Tag kept alignments with their primer pool as the read group.
    pub add_read_groups: bool,
    /// Whether a record that cannot be classified or trimmed ends the run.
    pub error_policy: ErrorPolicy,
    /// Under [`ErrorPolicy::Lenient`], give up once more records than this have failed.
    pub max_trim_errors: Option<u64>,
}

impl Default for SoftmaskConfig {
    fn default() -> Self {
        Self {
            min_mapq: 15,
            normalise: 100,
            boundary: PrimerBoundary::default(),
            remove_incorrect_pairs: false,
            add_read_groups: true,
            error_policy: ErrorPolicy::default(),
            max_trim_errors: None,
        }
    }
}

impl SoftmaskConfig {
    /// Check that the settings are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`AmptrimError::InvalidParameter`] if a trim error limit is set
    /// while trim errors are already fatal.
    pub fn validate(&self) -> crate::errors::Result<()> {
        if self.error_policy == ErrorPolicy::Strict && self.max_trim_errors.is_some() {
            return Err(AmptrimError::InvalidParameter {
                parameter: "max-trim-errors".to_string(),
                reason: "cannot be combined with strict mode, where any trim error is fatal"
                    .to_string(),
            });
        }
        Ok(())
    }
}

/// What happened to a single alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Unmapped,
    Supplementary,
    LowMapq,
    IncorrectPair,
    Normalised,
    Failed,
    /// The record should be written; `trimmed` is set if either end was masked.
    Kept { trimmed: bool },
}

impl RecordOutcome {
    #[must_use]
    pub fn is_kept(self) -> bool {
        matches!(self, RecordOutcome::Kept { .. })
    }
}

/// Soft-masks alignments against a primer scheme.
pub struct Softmasker<'s, R: TrimReporter = NoopReporter> {
    scheme: &'s PrimerScheme,
    config: SoftmaskConfig,
    reporter: R,
    amplicon_counts: AHashMap<(String, bool), u64>,
    metrics: TrimMetrics,
}

impl<'s> Softmasker<'s, NoopReporter> {
    /// A softmasker that does not report per-alignment assignments.
    #[must_use]
    pub fn new(scheme: &'s PrimerScheme, config: SoftmaskConfig) -> Self {
        Self::with_reporter(scheme, config, NoopReporter)
    }
}

impl<'s, R: TrimReporter> Softmasker<'s, R> {
    #[must_use]
    pub fn with_reporter(scheme: &'s PrimerScheme, config: SoftmaskConfig, reporter: R) -> Self {
        Self { scheme, config, reporter, amplicon_counts: AHashMap::new(), metrics: TrimMetrics::default() }
    }

    #[must_use]
    pub fn metrics(&self) -> &TrimMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn config(&self) -> &SoftmaskConfig {
        &self.config
    }

    /// Alignments seen per amplicon name and strand (`true` for reverse),
    /// sorted by amplicon then strand.
    #[must_use]
    pub fn amplicon_counts(&self) -> Vec<(&str, bool, u64)> {
        let mut counts: Vec<_> = self
            .amplicon_counts
            .iter()
            .map(|((name, reverse), &count)| (name.as_str(), *reverse, count))
            .collect();
        counts.sort_unstable();
        counts
    }

    /// Consume the softmasker, returning its reporter and final counts.
    pub fn into_parts(self) -> (R, TrimMetrics) {
        (self.reporter, self.metrics)
    }

    /// Process one alignment in place.
    ///
    /// The record is only meaningful to write when the outcome is
    /// [`RecordOutcome::Kept`]; it may have been partly rewritten otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the reporter fails, if a record cannot be
    /// classified or trimmed under [`ErrorPolicy::Strict`], or if lenient
    /// failures exceed the configured limit.
    pub fn process(&mut self, record: &mut RawRecord) -> Result<RecordOutcome> {
        let scheme = self.scheme;
        self.metrics.records_processed += 1;

        let flag = flags(record);
        if flag & amptrim_raw_bam::flags::UNMAPPED != 0 {
            debug!("{} skipped as unmapped", query_name(record));
            self.metrics.unmapped += 1;
            return Ok(RecordOutcome::Unmapped);
        }
        if flag & amptrim_raw_bam::flags::SUPPLEMENTARY != 0 {
            debug!("{} skipped as supplementary", query_name(record));
            self.metrics.supplementary += 1;
            return Ok(RecordOutcome::Supplementary);
        }
        if mapq(record) < self.config.min_mapq {
            debug!("{} skipped as poor quality", query_name(record));
            self.metrics.low_mapq += 1;
            return Ok(RecordOutcome::LowMapq);
        }

        let start = i64::from(pos(record));
        let end = alignment_end(record);
        let amplicon = match scheme.find_primers(start, end) {
            Ok(amplicon) => amplicon,
            Err(e) => return self.fail(record, e.into()),
        };

        if self.config.add_read_groups {
            let pool = match scheme.pool_name(amplicon.pool_id()) {
                Ok(pool) => pool,
                Err(e) => return self.fail(record, e.into()),
            };
            update_string_tag(record.as_mut_vec(), &READ_GROUP_TAG, pool.as_bytes());
        }

        if self.config.remove_incorrect_pairs && !amplicon.is_properly_paired() {
            debug!("{} skipped as not correctly paired ({})", query_name(record), amplicon);
            self.metrics.incorrect_pairs += 1;
            return Ok(RecordOutcome::IncorrectPair);
        }

        let row = ReportRow::new(
            read_name(record),
            start,
            end,
            &amplicon,
            flag & amptrim_raw_bam::flags::SECONDARY != 0,
            flag & amptrim_raw_bam::flags::SUPPLEMENTARY != 0,
        );
        self.reporter.report(&row)?;

        let reverse = flag & amptrim_raw_bam::flags::REVERSE != 0;
        let seen = self.amplicon_counts.entry((amplicon.name(), reverse)).or_insert(0);
        let prior = *seen;
        *seen += 1;
        if self.config.normalise > 0 && prior >= self.config.normalise {
            debug!("{} dropped as abundance threshold reached", query_name(record));
            self.metrics.normalised_out += 1;
            return Ok(RecordOutcome::Normalised);
        }

        let span = self.config.boundary.span(&amplicon);
        let masked = match softmask_to_span(record, span) {
            Ok(masked) => masked,
            Err(e) => return self.fail(record, e.into()),
        };
        if masked > 0 {
            self.metrics.records_trimmed += 1;
            self.metrics.bases_masked += masked;
        }
        self.metrics.records_written += 1;
        Ok(RecordOutcome::Kept { trimmed: masked > 0 })
    }

    /// Process every record from `reader`, writing kept records to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or as for [`Softmasker::process`].
    pub fn run<In: Read, W: RawRecordWriter>(
        &mut self,
        reader: &mut RawBamReader<In>,
        writer: &mut W,
    ) -> Result<()> {
        let mut progress = ProgressTracker::new("Processed alignments").with_interval(1_000_000);
        let mut record = RawRecord::new();
        while reader.read_record(&mut record)? > 0 {
            if self.process(&mut record)?.is_kept() {
                writer.write_raw_record(&record)?;
            }
            progress.record(1);
        }
        self.reporter.finish()?;
        progress.finish();
        Ok(())
    }

    fn fail(&mut self, record: &RawRecord, error: AmptrimError) -> Result<RecordOutcome> {
        let name = query_name(record);
        match self.config.error_policy {
            ErrorPolicy::Strict => {
                Err(anyhow::Error::new(error).context(format!("failed to softmask alignment {name}")))
            }
            ErrorPolicy::Lenient => {
                warn!("{name} dropped - {error}");
                self.metrics.trim_failures += 1;
                match self.config.max_trim_errors {
                    Some(limit) if self.metrics.trim_failures > limit => {
                        Err(AmptrimError::TooManyTrimErrors { failed: self.metrics.trim_failures, limit }
                            .into())
                    }
                    _ => Ok(RecordOutcome::Failed),
                }
            }
        }
    }
}

/// Mask whichever ends of the alignment fall outside `span`, start first.
///
/// Returns the number of soft-clipped bases produced.
fn softmask_to_span(record: &mut RawRecord, span: Span) -> std::result::Result<u64, TrimError> {
    let mut masked = 0u64;
    if i64::from(pos(record)) < span.start {
        masked += softmask_record(record, span.start, ClipEnd::Start)?.soft_clip_len as u64;
    }
    if alignment_end(record) > span.end {
        masked += softmask_record(record, span.end, ClipEnd::End)?.soft_clip_len as u64;
    }
    Ok(masked)
}

fn query_name(record: &RawRecord) -> String {
    String::from_utf8_lossy(read_name(record)).into_owned()
}
