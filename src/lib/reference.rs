//! Reference FASTA access for fetching primer sequences.
//!
//! Amplicon schemes target small genomes, so every contig is read into memory
//! once and fetches are slice copies.

use crate::errors::AmptrimError;
use anyhow::{Context, Result};
use log::debug;
use noodles::core::Position;
use noodles::fasta;
use std::collections::HashMap;
use std::path::Path;

/// All contigs of a FASTA file, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ReferenceReader {
    sequences: HashMap<String, Vec<u8>>,
}

impl ReferenceReader {
    /// Read every contig of a (possibly gzipped) FASTA file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be parsed.
    ///
    /// ```no_run
    /// use amptrim_lib::reference::ReferenceReader;
    ///
    /// let reader = ReferenceReader::new("MN908947.3.fasta")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AmptrimError::InvalidFileFormat {
                file_type: "Reference FASTA".to_string(),
                path: path.display().to_string(),
                reason: "File does not exist".to_string(),
            }
            .into());
        }

        let mut reader = fasta::io::reader::Builder
            .build_from_path(path)
            .with_context(|| format!("Failed to open reference FASTA: {}", path.display()))?;

        let mut sequences = HashMap::new();
        for result in reader.records() {
            let record = result
                .with_context(|| format!("Failed to read reference FASTA: {}", path.display()))?;
            let name = std::str::from_utf8(record.name())?.to_string();
            let sequence: &[u8] = record.sequence().as_ref();
            sequences.insert(name, sequence.to_vec());
        }

        debug!("Loaded {} contigs from {}", sequences.len(), path.display());
        Ok(Self { sequences })
    }

    #[must_use]
    pub fn contains(&self, chrom: &str) -> bool {
        self.sequences.contains_key(chrom)
    }

    /// Length of contig `chrom`, if present.
    #[must_use]
    pub fn sequence_len(&self, chrom: &str) -> Option<usize> {
        self.sequences.get(chrom).map(Vec::len)
    }

    /// Bases `start..=end` (1-based, inclusive) of `chrom`, case preserved.
    ///
    /// # Errors
    ///
    /// Returns an error if the contig is missing, the region is inverted, or
    /// it runs past the end of the contig.
    pub fn fetch(&self, chrom: &str, start: Position, end: Position) -> Result<Vec<u8>> {
        let sequence = self
            .sequences
            .get(chrom)
            .ok_or_else(|| AmptrimError::ReferenceNotFound { ref_name: chrom.to_string() })?;

        let start_idx = usize::from(start) - 1;
        let end_idx = usize::from(end);

        sequence.get(start_idx..end_idx).map(<[u8]>::to_vec).ok_or_else(|| {
            AmptrimError::InvalidParameter {
                parameter: "region".to_string(),
                reason: format!(
                    "Requested region {}:{}-{} exceeds sequence length {}",
                    chrom,
                    start,
                    end,
                    sequence.len()
                ),
            }
            .into()
        })
    }

    /// Bases of the 0-based, half-open interval `[start, end)` of `chrom`.
    ///
    /// # Errors
    ///
    /// As for [`ReferenceReader::fetch`], or if the interval is empty or negative.
    pub fn fetch_interval(&self, chrom: &str, start: i64, end: i64) -> Result<Vec<u8>> {
        let to_position = |pos: i64| {
            usize::try_from(pos)
                .ok()
                .and_then(Position::new)
                .with_context(|| format!("Invalid interval {chrom}:{start}-{end}"))
        };
        if end <= start {
            anyhow::bail!("Invalid interval {chrom}:{start}-{end}");
        }
        self.fetch(chrom, to_position(start + 1)?, to_position(end)?)
    }
}
