//! Soft-mask aligned amplicon reads to the boundaries of their amplicon.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::path::PathBuf;

use amptrim_lib::bam_io::{create_raw_bam_reader, create_raw_bam_writer};
use amptrim_lib::header::{add_pg_record, add_read_groups};
use amptrim_lib::logging::{OperationTimer, log_scheme_summary};
use amptrim_lib::metrics::write_metrics;
use amptrim_lib::report::{LogReporter, TrimReporter, TsvReporter};
use amptrim_lib::scheme::PrimerScheme;
use amptrim_lib::softmask::{PrimerBoundary, SoftmaskConfig, Softmasker};

use crate::commands::command::Command;
use crate::commands::common::{BamIoOptions, SchemeOptions, ThreadingOptions};

/// Soft-mask alignments to the amplicon they were sequenced from.
#[derive(Debug, Parser)]
#[command(
    name = "align-trim",
    about = "\x1b[38;5;30m[TRIMMING]\x1b[0m       \x1b[36mSoft-mask primer sites in amplicon alignments\x1b[0m",
    long_about = r#"
Soft-mask aligned reads from a tiled-amplicon run to the boundaries of their amplicon.

Each mapped, primary or secondary alignment is assigned to the nearest forward and
reverse primers of the scheme. Bases outside the amplicon insert (or, with --start,
outside the primer ends) are soft-clipped and the alignment start is moved to the
first remaining aligned base.

Alignments are dropped when they are unmapped, supplementary or below --min-mapq,
when their amplicon and strand already have --normalise alignments, and optionally
when their nearest primers are not a proper pair. Kept alignments are tagged with
their primer pool as the read group (RG), or "unmatched" for mismatched primers.

Example usage:
  amptrim align-trim -s nCoV-2019.scheme.bed -i aligned.bam -o trimmed.bam
  minimap2 -a ref.fa reads.fq | samtools view -b - | \
    amptrim align-trim -s scheme.bed --normalise 200 --report report.tsv > trimmed.bam
"#
)]
pub struct AlignTrim {
    #[command(flatten)]
    pub scheme: SchemeOptions,

    #[command(flatten)]
    pub io: BamIoOptions,

    /// Drop alignments with a mapping quality below this value
    #[arg(long = "min-mapq", default_value_t = 15)]
    pub min_mapq: u8,

    /// Keep at most this many alignments per amplicon and strand (0 keeps all)
    #[arg(long = "normalise", default_value_t = 100)]
    pub normalise: u64,

    /// Trim to the outer primer ends, leaving the primer sites aligned
    #[arg(long = "start", default_value_t = false)]
    pub start: bool,

    /// Drop alignments whose nearest primers are not from the same amplicon
    #[arg(long = "remove-incorrect-pairs", default_value_t = false)]
    pub remove_incorrect_pairs: bool,

    /// Do not add primer pool read groups to the header or the alignments
    #[arg(long = "no-read-groups", default_value_t = false)]
    pub no_read_groups: bool,

    /// Write a per-alignment amplicon assignment report to this file
    #[arg(long = "report")]
    pub report: Option<PathBuf>,

    /// Write summary metrics to this file
    #[arg(long = "metrics")]
    pub metrics: Option<PathBuf>,

    /// Log every amplicon assignment and the per-amplicon alignment counts
    #[arg(long = "verbose", default_value_t = false)]
    pub verbose: bool,

    /// In lenient mode, fail once more than this many alignments could not be softmasked
    #[arg(long = "max-trim-errors")]
    pub max_trim_errors: Option<u64>,

    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl AlignTrim {
    fn softmask_config(&self) -> SoftmaskConfig {
        SoftmaskConfig {
            min_mapq: self.min_mapq,
            normalise: self.normalise,
            boundary: if self.start {
                PrimerBoundary::KeepPrimers
            } else {
                PrimerBoundary::MaskPrimers
            },
            remove_incorrect_pairs: self.remove_incorrect_pairs,
            add_read_groups: !self.no_read_groups,
            error_policy: self.scheme.error_policy(),
            max_trim_errors: self.max_trim_errors,
        }
    }

    fn reporters(&self) -> Result<Vec<Box<dyn TrimReporter>>> {
        let mut reporters: Vec<Box<dyn TrimReporter>> = Vec::new();
        if let Some(path) = &self.report {
            reporters.push(Box::new(TsvReporter::from_path(path)?));
        }
        if self.verbose {
            reporters.push(Box::new(LogReporter));
        }
        Ok(reporters)
    }
}

impl Command for AlignTrim {
    fn execute(&self, command_line: &str) -> Result<()> {
        self.scheme.validate()?;
        self.io.validate()?;
        self.threading.validate()?;
        let config = self.softmask_config();
        config.validate()?;

        let timer = OperationTimer::new("Softmasking alignments");
        info!("Scheme: {}", self.scheme.scheme.display());
        info!("Input: {}", self.io.input.display());
        info!("Output: {}", self.io.output.display());
        info!(
            "Trimming to {}",
            match config.boundary {
                PrimerBoundary::MaskPrimers => "the amplicon insert (primers masked)",
                PrimerBoundary::KeepPrimers => "the primer ends (primers kept)",
            }
        );
        info!("{}", self.threading.log_message());

        let scheme = PrimerScheme::from_path(&self.scheme.scheme, config.error_policy)
            .with_context(|| {
                format!("Failed to load primer scheme: {}", self.scheme.scheme.display())
            })?;
        log_scheme_summary(&scheme.load_summary(), scheme.stats());

        let (mut reader, header) = create_raw_bam_reader(&self.io.input, self.threading.threads)?;
        if !header.reference_sequences().contains_key(scheme.reference_name().as_bytes()) {
            warn!(
                "Scheme reference '{}' is not among the input's reference sequences",
                scheme.reference_name()
            );
        }

        let (mut header, program_id) =
            add_pg_record(header, crate::version::VERSION.as_str(), command_line)?;
        if config.add_read_groups {
            header = add_read_groups(header, scheme.pools(), &program_id)?;
        }
        let mut writer = create_raw_bam_writer(&self.io.output, &header, self.threading.threads)?;

        let mut masker = Softmasker::with_reporter(&scheme, config, self.reporters()?);
        masker.run(&mut reader, &mut writer)?;
        writer
            .finish()
            .with_context(|| format!("Failed to finish output BAM: {}", self.io.output.display()))?;

        for (amplicon, reverse, count) in masker.amplicon_counts() {
            let strand = if reverse { '-' } else { '+' };
            if self.verbose {
                info!("{amplicon} ({strand}): {count}");
            } else {
                debug!("{amplicon} ({strand}): {count}");
            }
        }

        let (_, metrics) = masker.into_parts();
        metrics.log_summary();
        if let Some(path) = &self.metrics {
            write_metrics(path, std::slice::from_ref(&metrics))?;
        }

        timer.log_completion(metrics.records_processed, "alignments");
        Ok(())
    }
}
