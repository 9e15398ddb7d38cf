//! Counters for the `align-trim` pipeline.

use log::info;
use serde::{Deserialize, Serialize};

use super::{Metric, ProcessingMetrics, format_count};

/// Per-run counts of what happened to each alignment.
///
/// Every record read is counted in `records_processed` and then in exactly one
/// of the drop counters or in `records_written`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimMetrics {
    /// Alignments read from the input
    pub records_processed: u64,
    /// Dropped because they were unmapped
    pub unmapped: u64,
    /// Dropped because they were supplementary
    pub supplementary: u64,
    /// Dropped for mapping quality below the threshold
    pub low_mapq: u64,
    /// Dropped because the nearest primers were not a proper pair
    pub incorrect_pairs: u64,
    /// Dropped because their amplicon and strand already reached the normalisation cap
    pub normalised_out: u64,
    /// Dropped because classification or trimming failed
    pub trim_failures: u64,
    /// Written alignments that had at least one end soft-masked
    pub records_trimmed: u64,
    /// Alignments written to the output
    pub records_written: u64,
    /// Query bases soft-masked across all alignments
    pub bases_masked: u64,
}

impl TrimMetrics {
    /// Alignments dropped by the unmapped, supplementary and MAPQ filters or
    /// for pairing with primers from different amplicons.
    #[must_use]
    pub fn records_filtered(&self) -> u64 {
        self.unmapped + self.supplementary + self.low_mapq + self.incorrect_pairs
    }

    /// Log a summary of the run.
    pub fn log_summary(&self) {
        info!("Processed {} alignments", format_count(self.records_processed));
        info!(
            "  Filtered: {} (unmapped {}, supplementary {}, low MAPQ {}, incorrect pairs {})",
            format_count(self.records_filtered()),
            format_count(self.unmapped),
            format_count(self.supplementary),
            format_count(self.low_mapq),
            format_count(self.incorrect_pairs)
        );
        info!("  Removed by normalisation: {}", format_count(self.normalised_out));
        if self.trim_failures > 0 {
            info!("  Failed to softmask: {}", format_count(self.trim_failures));
        }
        info!(
            "  Trimmed: {} ({} bases masked)",
            format_count(self.records_trimmed),
            format_count(self.bases_masked)
        );
        info!(
            "  Written: {} ({:.2}% of input)",
            format_count(self.records_written),
            self.efficiency()
        );
    }
}

impl Metric for TrimMetrics {
    fn metric_name() -> &'static str {
        "align-trim"
    }
}

impl ProcessingMetrics for TrimMetrics {
    fn total_input(&self) -> u64 {
        self.records_processed
    }

    fn total_output(&self) -> u64 {
        self.records_written
    }

    fn total_filtered(&self) -> u64 {
        self.records_filtered() + self.normalised_out + self.trim_failures
    }
}
