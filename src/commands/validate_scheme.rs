//! Load and check a primer scheme, optionally exporting inserts and primer sequences.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use amptrim_lib::logging::log_scheme_summary;
use amptrim_lib::primer::Primer;
use amptrim_lib::reference::ReferenceReader;
use amptrim_lib::scheme::PrimerScheme;
use amptrim_lib::validation::{validate_file_exists, validate_required_with};

use crate::commands::command::Command;
use crate::commands::common::SchemeOptions;

/// Suffix added to FASTA names of primers that had alts merged into them.
const ALTS_MERGED_SUFFIX: &str = "_alts_merged";

/// Validate a primer scheme and report its statistics.
#[derive(Debug, Parser)]
#[command(
    name = "validate-scheme",
    about = "\x1b[38;5;30m[SCHEME]\x1b[0m         \x1b[36mValidate a primer scheme and export its amplicons\x1b[0m",
    long_about = r#"
Load a primer scheme, check that every primer pairs into an amplicon and that the
amplicons tile the reference without gaps, then log summary statistics.

Optionally writes the amplicon inserts (the region between each primer pair) as BED
and the primer sequences as FASTA. Primer sequences are taken from the reference,
which must then be given with --reference.

Example usage:
  amptrim validate-scheme -s nCoV-2019.scheme.bed
  amptrim validate-scheme -s scheme.bed --output-inserts inserts.bed \
    --output-primer-seqs primers.fa -r MN908947.3.fasta
"#
)]
pub struct ValidateScheme {
    #[command(flatten)]
    pub scheme: SchemeOptions,

    /// Write amplicon inserts (excluding primers) to this BED file
    #[arg(long = "output-inserts")]
    pub output_inserts: Option<PathBuf>,

    /// Write primer sequences to this FASTA file (requires --reference)
    #[arg(long = "output-primer-seqs")]
    pub output_primer_seqs: Option<PathBuf>,

    /// Reference FASTA the scheme was designed against
    #[arg(short = 'r', long = "reference")]
    pub reference: Option<PathBuf>,
}

impl Command for ValidateScheme {
    fn execute(&self, _command_line: &str) -> Result<()> {
        self.scheme.validate()?;
        validate_required_with(
            self.output_primer_seqs.as_ref(),
            "output-primer-seqs",
            self.reference.as_ref(),
            "reference",
        )?;
        if let Some(reference) = &self.reference {
            validate_file_exists(reference, "Reference FASTA")?;
        }

        let scheme = PrimerScheme::from_path(&self.scheme.scheme, self.scheme.error_policy())
            .with_context(|| {
                format!("Failed to load primer scheme: {}", self.scheme.scheme.display())
            })?;
        info!("Primer scheme: {}", self.scheme.scheme.display());
        info!("Reference sequence: {}", scheme.reference_name());
        log_scheme_summary(&scheme.load_summary(), scheme.stats());

        if let (Some(path), Some(reference)) = (&self.output_primer_seqs, &self.reference) {
            let reference = ReferenceReader::new(reference)?;
            if let Some(len) = reference.sequence_len(scheme.reference_name()) {
                info!("Reference {} has {} bases", scheme.reference_name(), len);
            }
            write_primer_seqs(&scheme, &reference, create(path)?)
                .with_context(|| format!("Failed to write primer sequences: {}", path.display()))?;
            info!("Wrote primer sequences to {}", path.display());
        }

        if let Some(path) = &self.output_inserts {
            write_inserts(&scheme, create(path)?)
                .with_context(|| format!("Failed to write inserts: {}", path.display()))?;
            info!("Wrote amplicon inserts to {}", path.display());
        }
        Ok(())
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// One BED line per expected amplicon: reference, insert start and end, a
/// 1-based counter, pool name and `+`.
fn write_inserts<W: Write>(scheme: &PrimerScheme, mut out: W) -> Result<()> {
    for (counter, amplicon) in scheme.expected_amplicons().enumerate() {
        let insert = amplicon.min_span();
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t+",
            scheme.reference_name(),
            insert.start,
            insert.end,
            counter + 1,
            scheme.pool_name(amplicon.pool_id())?
        )?;
    }
    out.flush()?;
    Ok(())
}

/// The forward then reverse primer of each expected amplicon as FASTA.
fn write_primer_seqs<W: Write>(
    scheme: &PrimerScheme,
    reference: &ReferenceReader,
    mut out: W,
) -> Result<()> {
    let mut write_primer = |primer: &Primer| -> Result<()> {
        let seq = reference.fetch_interval(scheme.reference_name(), primer.start(), primer.end())?;
        let suffix = if primer.num_alts() > 0 { ALTS_MERGED_SUFFIX } else { "" };
        writeln!(out, ">{}{suffix}", primer.id())?;
        out.write_all(&seq)?;
        writeln!(out)?;
        Ok(())
    };
    for amplicon in scheme.expected_amplicons() {
        write_primer(amplicon.forward())?;
        write_primer(amplicon.reverse())?;
    }
    out.flush()?;
    Ok(())
}
