//! Common CLI options shared across commands.
//!
//! Shared argument structures are composed into command structs using
//! `#[command(flatten)]`.

use std::path::PathBuf;

use clap::Args;

use amptrim_lib::errors::ErrorPolicy;
use amptrim_lib::validation::{validate_file_exists, validate_input_exists, validate_positive};

/// Input/output options for commands that read a BAM and write a BAM.
#[derive(Debug, Clone, Args)]
pub struct BamIoOptions {
    /// Input BAM file, or `-` for stdin
    #[arg(short = 'i', long = "input", default_value = "-")]
    pub input: PathBuf,

    /// Output BAM file, or `-` for stdout
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,
}

impl BamIoOptions {
    /// Validates that the input file exists (skipped for stdin).
    ///
    /// # Errors
    ///
    /// Returns an error if the input file does not exist.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_input_exists(&self.input, "Input BAM")?;
        Ok(())
    }
}

/// The primer scheme and how strictly it is loaded.
#[derive(Debug, Clone, Args)]
pub struct SchemeOptions {
    /// Primer scheme in BED format (chrom, start, end, primer ID, pool)
    #[arg(short = 's', long = "scheme")]
    pub scheme: PathBuf,

    /// Treat malformed scheme rows and alignments that cannot be softmasked as
    /// fatal errors instead of skipping them with a warning
    #[arg(long = "strict", default_value_t = false)]
    pub strict: bool,
}

impl SchemeOptions {
    /// Validates that the scheme file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme file does not exist.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_file_exists(&self.scheme, "Primer scheme")?;
        Ok(())
    }

    #[must_use]
    pub fn error_policy(&self) -> ErrorPolicy {
        if self.strict { ErrorPolicy::Strict } else { ErrorPolicy::Lenient }
    }
}

/// BGZF threading options.
///
/// ```bash
/// amptrim align-trim --threads 4 ...
/// # Uses 4 threads each for BGZF decompression and compression
/// ```
#[derive(Debug, Clone, Args)]
pub struct ThreadingOptions {
    /// Number of BGZF worker threads for reading and for writing
    #[arg(long = "threads", default_value_t = 1)]
    pub threads: usize,
}

impl ThreadingOptions {
    #[must_use]
    pub fn new(threads: usize) -> Self {
        Self { threads }
    }

    /// Validates that at least one thread was requested.
    ///
    /// # Errors
    ///
    /// Returns an error if `threads` is zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_positive(self.threads, "threads")?;
        Ok(())
    }

    /// Returns a log message describing the threading configuration.
    #[must_use]
    pub fn log_message(&self) -> String {
        if self.threads > 1 {
            format!("Using {} BGZF threads", self.threads)
        } else {
            "Single-threaded BGZF".to_string()
        }
    }
}
