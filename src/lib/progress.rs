//! Interval progress logging for streaming passes over a BAM file.

use log::info;
use std::time::Instant;

use crate::logging::{format_duration, format_rate};
use crate::metrics::format_count;

/// Counts records and logs every time the count crosses a multiple of the interval.
///
/// ```
/// use amptrim_lib::progress::ProgressTracker;
///
/// let mut tracker = ProgressTracker::new("Processed alignments").with_interval(100);
/// for _ in 0..250 {
///     tracker.record(1); // logs at 100 and 200
/// }
/// tracker.finish(); // logs the final count of 250
/// ```
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: u64,
    started: Instant,
}

impl ProgressTracker {
    /// A tracker with the default interval of 10,000.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 10_000, message: message.into(), count: 0, started: Instant::now() }
    }

    /// Set the logging interval; zero disables interval logging.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval;
        self
    }

    /// Add `additional` to the count, logging once per interval boundary crossed.
    ///
    /// Returns the number of boundaries crossed.
    pub fn record(&mut self, additional: u64) -> u64 {
        let prev = self.count;
        self.count += additional;
        if self.interval == 0 {
            return 0;
        }
        let crossed = self.count / self.interval - prev / self.interval;
        for i in 1..=crossed {
            let milestone = (prev / self.interval + i) * self.interval;
            info!("{} {}", self.message, format_count(milestone));
        }
        crossed
    }

    /// Log the final count, elapsed time and rate.
    pub fn finish(&self) {
        let elapsed = self.started.elapsed();
        info!(
            "{} {} (complete) in {} ({})",
            self.message,
            format_count(self.count),
            format_duration(elapsed),
            format_rate(self.count, elapsed, "records")
        );
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}
