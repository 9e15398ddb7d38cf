//! Logging helpers for run summaries and timings.

use std::time::{Duration, Instant};

use crate::metrics::format_count;
use crate::scheme::{LoadSummary, SchemeStats};

/// Formats a fraction (0.0-1.0) as a percentage with `decimals` places.
///
/// ```
/// use amptrim_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration as e.g. "45s", "2m 15s" or "1h 30m".
///
/// ```
/// use amptrim_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let mins = secs / 60;
        let remaining_secs = secs % 60;
        if remaining_secs == 0 { format!("{mins}m") } else { format!("{mins}m {remaining_secs}s") }
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a throughput such as "1,000 alignments/s", falling back to a
/// per-minute rate below one per second.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration, unit: &str) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} {unit}/s", format_count(count));
    }

    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} {unit}/s", format_count(rate as u64))
    } else {
        let per_min = count as f64 / (secs / 60.0);
        format!("{per_min:.1} {unit}/min")
    }
}

/// Logs how a scheme file was loaded and the shape of the resulting scheme.
pub fn log_scheme_summary(summary: &LoadSummary, stats: &SchemeStats) {
    log::info!("Primer scheme summary:");
    log::info!("  Rows read: {}", format_count(summary.rows_read as u64));
    if summary.rows_skipped > 0 {
        log::warn!("  Rows skipped: {}", format_count(summary.rows_skipped as u64));
    }
    log::info!("  Pools: {}", stats.num_pools);
    log::info!(
        "  Primers: {} ({} alts merged)",
        format_count(stats.num_primers as u64),
        format_count(stats.num_alts as u64)
    );
    log::info!("  Primer length: {}-{}", stats.min_primer_len, stats.max_primer_len);
    log::info!("  Amplicons: {}", format_count(stats.num_amplicons as u64));
    log::info!(
        "  Amplicon span: mean {}, max {}",
        stats.mean_amplicon_span,
        stats.max_amplicon_span
    );
    log::info!("  Scheme bounds: {}-{}", stats.ref_start, stats.ref_end);
    log::info!(
        "  Overlapping positions: {} ({})",
        format_count(stats.num_overlaps as u64),
        format_percent(stats.overlap_percent() / 100.0, 2)
    );
}

/// Times a named operation and logs its completion with a rate.
///
/// ```no_run
/// use amptrim_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Softmasking alignments");
/// // ... do work ...
/// timer.log_completion(10_000, "alignments");
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Starts the timer and logs the start of the operation.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs the completion with item count and rate.
    pub fn log_completion(&self, count: u64, unit: &str) {
        let duration = self.elapsed();
        log::info!(
            "{} completed: {} {unit} in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration, unit)
        );
    }
}
