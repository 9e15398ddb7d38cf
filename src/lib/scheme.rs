//! The primer scheme interval model.
//!
//! A scheme is loaded once from a tab-delimited primer layout
//! (`reference, start, end, primer ID, pool`), validated, and then only
//! queried. Primers live in a single arena; everything else refers to them by
//! index:
//!
//! - forward and reverse maps from canonical primer ID to arena index,
//! - the sorted forward-start and reverse-end indexes used for nearest-primer
//!   lookup,
//! - the expected amplicons, sorted by forward primer end and numbered from 1.
//!
//! Two position masks are derived at load time: one marking where the inserts
//! of adjacent amplicons overlap, and one per pool marking primer sites.
//!
//! # Example
//!
//! ```
//! use amptrim_lib::errors::ErrorPolicy;
//! use amptrim_lib::scheme::PrimerScheme;
//!
//! let rows = "ref\t0\t20\ts_1_LEFT\t1\n\
//!             ref\t380\t400\ts_1_RIGHT\t1\n\
//!             ref\t350\t370\ts_2_LEFT\t2\n\
//!             ref\t700\t720\ts_2_RIGHT\t2\n";
//! let scheme = PrimerScheme::from_reader(rows.as_bytes(), ErrorPolicy::Lenient).unwrap();
//! assert_eq!(scheme.num_amplicons(), 2);
//! assert!(scheme.check_amplicon_overlap(360).unwrap());
//! ```

use crate::amplicon::Amplicon;
use crate::errors::{ErrorPolicy, RowError, SchemeError};
use crate::mask::PositionMask;
use crate::primer::{Direction, Primer};
use ahash::AHashMap;
use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Name of the pseudo-pool holding improperly paired primers (pool id 0).
pub const UNMATCHED_POOL: &str = "unmatched";

/// Minimum number of tab-separated columns in a scheme row.
const MIN_COLUMNS: usize = 5;

/// An expected amplicon as a pair of arena indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AmpliconSlots {
    forward: usize,
    reverse: usize,
}

/// Row accounting from loading a scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Data rows read (blank and `#` lines excluded).
    pub rows_read: usize,
    /// Rows rejected as malformed.
    pub rows_skipped: usize,
    /// Rows turned into primers, including alts.
    pub primers_loaded: usize,
    /// Rows merged into an existing canonical primer.
    pub alts_merged: usize,
}

impl LoadSummary {
    /// Rows that were not skipped.
    #[must_use]
    pub fn rows_consumed(&self) -> usize {
        self.rows_read - self.rows_skipped
    }
}

/// Summary statistics for a loaded scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemeStats {
    pub num_pools: usize,
    pub num_primers: usize,
    pub num_alts: usize,
    pub min_primer_len: i64,
    pub max_primer_len: i64,
    pub num_amplicons: usize,
    /// Mean amplicon length including primers, rounded down.
    pub mean_amplicon_span: i64,
    pub max_amplicon_span: i64,
    pub ref_start: i64,
    pub ref_end: i64,
    /// Reference positions covered by two adjacent amplicon inserts.
    pub num_overlaps: usize,
}

impl SchemeStats {
    /// Overlapping positions as a percentage of the scheme's reference span.
    #[must_use]
    pub fn overlap_percent(&self) -> f64 {
        let span = self.ref_end - self.ref_start;
        if span <= 0 { 0.0 } else { self.num_overlaps as f64 / span as f64 * 100.0 }
    }
}

/// A validated, read-only primer scheme.
#[derive(Debug, Clone)]
pub struct PrimerScheme {
    reference_name: String,
    primers: Vec<Primer>,
    pools: Vec<String>,
    forward_starts: Vec<(i64, usize)>,
    reverse_ends: Vec<(i64, usize)>,
    amplicons: Vec<AmpliconSlots>,
    amplicon_ids: AHashMap<(usize, usize), usize>,
    overlap_mask: PositionMask,
    primer_sites: Vec<PositionMask>,
    ref_start: i64,
    ref_end: i64,
    summary: LoadSummary,
    stats: SchemeStats,
}

impl PrimerScheme {
    /// Load a scheme from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty or missing, the file cannot be
    /// read, or the scheme fails validation (see [`PrimerScheme::from_reader`]).
    pub fn from_path<P: AsRef<Path>>(path: P, policy: ErrorPolicy) -> Result<Self, SchemeError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(SchemeError::MissingInput);
        }
        if !path.exists() {
            return Err(SchemeError::FileNotFound { path: path.display().to_string() });
        }
        debug!("Reading primer scheme: {}", path.display());
        Self::from_reader(BufReader::new(File::open(path)?), policy)
    }

    /// Load a scheme from tab-delimited rows.
    ///
    /// Blank lines and lines starting with `#` are ignored. A malformed row is
    /// skipped with a warning under [`ErrorPolicy::Lenient`] and aborts the
    /// load under [`ErrorPolicy::Strict`].
    ///
    /// # Errors
    ///
    /// Returns an error if rows name more than one reference, no primers are
    /// loaded, forward and reverse primer counts differ, a forward primer has
    /// no matching reverse primer, or consecutive amplicons leave a gap.
    pub fn from_reader<R: BufRead>(reader: R, policy: ErrorPolicy) -> Result<Self, SchemeError> {
        let mut builder = SchemeBuilder::new(policy);
        for (i, bytes) in reader.split(b'\n').enumerate() {
            let bytes = bytes?;
            let Ok(line) = std::str::from_utf8(&bytes) else {
                builder.summary.rows_read += 1;
                builder.reject(i + 1, RowError::InvalidEncoding)?;
                continue;
            };
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            builder.add_row(i + 1, line)?;
        }
        builder.build()
    }

    /// Name of the reference sequence all primers are placed on.
    #[must_use]
    pub fn reference_name(&self) -> &str {
        &self.reference_name
    }

    /// Leftmost forward primer start.
    #[must_use]
    pub fn ref_start(&self) -> i64 {
        self.ref_start
    }

    /// Rightmost reverse primer end.
    #[must_use]
    pub fn ref_end(&self) -> i64 {
        self.ref_end
    }

    /// Primers loaded, including merged alts.
    #[must_use]
    pub fn num_primers(&self) -> usize {
        self.summary.primers_loaded
    }

    #[must_use]
    pub fn num_alts(&self) -> usize {
        self.summary.alts_merged
    }

    #[must_use]
    pub fn num_amplicons(&self) -> usize {
        self.amplicons.len()
    }

    /// Number of positions where adjacent amplicon inserts overlap.
    #[must_use]
    pub fn num_overlaps(&self) -> usize {
        self.overlap_mask.count_ones()
    }

    #[must_use]
    pub fn load_summary(&self) -> LoadSummary {
        self.summary
    }

    #[must_use]
    pub fn stats(&self) -> &SchemeStats {
        &self.stats
    }

    /// Pool names from the scheme in first-seen order, without the unmatched pool.
    #[must_use]
    pub fn pools(&self) -> &[String] {
        &self.pools[1..]
    }

    /// Name of pool `pool_id`; 0 is the unmatched pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool ID is unknown.
    pub fn pool_name(&self, pool_id: usize) -> Result<&str, SchemeError> {
        self.pools.get(pool_id).map(String::as_str).ok_or(SchemeError::UnknownPoolId(pool_id))
    }

    /// ID of the pool called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if no pool has that name.
    pub fn pool_id(&self, name: &str) -> Result<usize, SchemeError> {
        self.pools
            .iter()
            .position(|p| p == name)
            .ok_or_else(|| SchemeError::UnknownPoolName(name.to_string()))
    }

    /// The scheme's amplicons, sorted by forward primer end and numbered from 1.
    pub fn expected_amplicons(&self) -> impl ExactSizeIterator<Item = Amplicon<'_>> {
        self.amplicons.iter().enumerate().map(|(i, slots)| {
            Amplicon::paired(i + 1, &self.primers[slots.forward], &self.primers[slots.reverse])
        })
    }

    /// Find the primers nearest to an alignment spanning `[seg_start, seg_end)`.
    ///
    /// The forward primer is the one whose start is closest to `seg_start` and
    /// the reverse primer the one whose end is closest to `seg_end`; ties go to
    /// the primer at or after the query position. Positions beyond either end
    /// of the scheme resolve to the outermost primer. The result is not
    /// necessarily a proper pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the nearest primers cannot form an amplicon (they
    /// face outward).
    pub fn find_primers(&self, seg_start: i64, seg_end: i64) -> Result<Amplicon<'_>, SchemeError> {
        let forward = nearest(&self.forward_starts, seg_start);
        let reverse = nearest(&self.reverse_ends, seg_end);
        let (Some(f), Some(r)) = (forward, reverse) else {
            return Err(SchemeError::PrimerNotFound {
                forward: forward.unwrap_or(usize::MAX),
                reverse: reverse.unwrap_or(usize::MAX),
            });
        };
        let (Some(fp), Some(rp)) = (self.primers.get(f), self.primers.get(r)) else {
            return Err(SchemeError::PrimerNotFound { forward: f, reverse: r });
        };
        let id = self.amplicon_ids.get(&(f, r)).copied().unwrap_or(0);
        Amplicon::new(id, fp, rp)
    }

    /// Whether `pos` lies where two adjacent amplicon inserts overlap.
    ///
    /// # Errors
    ///
    /// Returns an error if `pos` is outside `[ref_start, ref_end]`.
    pub fn check_amplicon_overlap(&self, pos: i64) -> Result<bool, SchemeError> {
        let index = self.bounded_index(pos)?;
        Ok(self.overlap_mask.get(index))
    }

    /// Whether `pos` is covered by a primer from pool `pool_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `pos` is outside `[ref_start, ref_end]` or the pool
    /// ID is unknown.
    pub fn check_primer_site(&self, pos: i64, pool_id: usize) -> Result<bool, SchemeError> {
        let index = self.bounded_index(pos)?;
        let mask = self.primer_sites.get(pool_id).ok_or(SchemeError::UnknownPoolId(pool_id))?;
        Ok(mask.get(index))
    }

    /// [`PrimerScheme::check_primer_site`] with the pool given by name.
    ///
    /// # Errors
    ///
    /// As for `check_primer_site`, or if the pool name is unknown.
    pub fn check_primer_site_in_pool(&self, pos: i64, pool: &str) -> Result<bool, SchemeError> {
        self.check_primer_site(pos, self.pool_id(pool)?)
    }

    fn bounded_index(&self, pos: i64) -> Result<usize, SchemeError> {
        if pos < self.ref_start || pos > self.ref_end {
            return Err(SchemeError::OutOfBounds {
                pos,
                start: self.ref_start,
                end: self.ref_end,
            });
        }
        Ok(to_index(pos))
    }
}

/// Index of the primer nearest `pos` in a position-sorted index.
///
/// Compares the first entry at or after `pos` with the one before it and keeps
/// the closer, preferring the later entry on a tie.
fn nearest(index: &[(i64, usize)], pos: i64) -> Option<usize> {
    let lower = index.partition_point(|&(p, _)| p < pos);
    let ceiling = index.get(lower);
    let floor = lower.checked_sub(1).and_then(|i| index.get(i));
    match (ceiling, floor) {
        (Some(&(c, ci)), Some(&(f, fi))) => {
            Some(if (c - pos).abs() <= (f - pos).abs() { ci } else { fi })
        }
        (Some(&(_, ci)), None) => Some(ci),
        (None, Some(&(_, fi))) => Some(fi),
        (None, None) => None,
    }
}

/// Primer coordinates are validated non-negative on load.
fn to_index(pos: i64) -> usize {
    usize::try_from(pos).unwrap_or(0)
}

/// Accumulates scheme rows and validates them into a [`PrimerScheme`].
struct SchemeBuilder {
    policy: ErrorPolicy,
    reference_name: Option<String>,
    primers: Vec<Primer>,
    forward: AHashMap<String, usize>,
    reverse: AHashMap<String, usize>,
    pools: Vec<String>,
    summary: LoadSummary,
}

impl SchemeBuilder {
    fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            reference_name: None,
            primers: Vec::new(),
            forward: AHashMap::new(),
            reverse: AHashMap::new(),
            pools: vec![UNMATCHED_POOL.to_string()],
            summary: LoadSummary::default(),
        }
    }

    fn add_row(&mut self, line_number: usize, line: &str) -> Result<(), SchemeError> {
        self.summary.rows_read += 1;

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() < MIN_COLUMNS {
            return self.reject(line_number, RowError::TooFewColumns { found: fields.len() });
        }

        match &self.reference_name {
            Some(expected) if expected != fields[0] => {
                return Err(SchemeError::MultipleReferences {
                    expected: expected.clone(),
                    found: fields[0].to_string(),
                });
            }
            Some(_) => {}
            None => self.reference_name = Some(fields[0].to_string()),
        }

        let pool_name = fields[4];
        let existing_pool = self.pools.iter().position(|p| p == pool_name);
        let pool_id = existing_pool.unwrap_or(self.pools.len());

        let primer = match parse_primer(&fields, pool_id) {
            Ok(primer) => primer,
            Err(e) => return self.reject(line_number, e),
        };

        let index = match primer.direction() {
            Direction::Forward => &mut self.forward,
            Direction::Reverse => &mut self.reverse,
        };
        if let Some(&canonical) = index.get(primer.id()) {
            if let Err(e) = self.primers[canonical].merge_alt(&primer) {
                return self.reject(line_number, e);
            }
            self.summary.alts_merged += 1;
        } else {
            index.insert(primer.id().to_string(), self.primers.len());
            self.primers.push(primer);
        }

        if existing_pool.is_none() {
            self.pools.push(pool_name.to_string());
        }
        self.summary.primers_loaded += 1;
        Ok(())
    }

    fn reject(&mut self, line: usize, source: RowError) -> Result<(), SchemeError> {
        match self.policy {
            ErrorPolicy::Strict => Err(SchemeError::InvalidRow { line, source }),
            ErrorPolicy::Lenient => {
                warn!("skipping row {line} in scheme - {source}");
                self.summary.rows_skipped += 1;
                Ok(())
            }
        }
    }

    fn build(self) -> Result<PrimerScheme, SchemeError> {
        let summary = self.summary;
        if summary.primers_loaded == 0 {
            return Err(SchemeError::Empty);
        }
        if summary.primers_loaded != summary.rows_consumed() {
            return Err(SchemeError::RowCountMismatch {
                loaded: summary.primers_loaded,
                consumed: summary.rows_consumed(),
            });
        }
        if self.forward.len() != self.reverse.len() {
            return Err(SchemeError::PrimerCountMismatch {
                forward: self.forward.len(),
                reverse: self.reverse.len(),
            });
        }

        let primers = self.primers;

        // Pair every forward primer with its reverse primer.
        let mut forward_ids: Vec<(&String, &usize)> = self.forward.iter().collect();
        forward_ids.sort();
        let mut amplicons = Vec::with_capacity(forward_ids.len());
        for (_, &f) in forward_ids {
            let mate_id = primers[f].mate_id();
            let r = *self
                .reverse
                .get(&mate_id)
                .ok_or_else(|| SchemeError::UnpairedPrimer { primer_id: primers[f].id().to_string() })?;
            Amplicon::new(0, &primers[f], &primers[r])?;
            amplicons.push(AmpliconSlots { forward: f, reverse: r });
        }
        amplicons.sort_by(|a, b| {
            let (fa, fb) = (&primers[a.forward], &primers[b.forward]);
            (fa.end(), fa.start(), fa.id()).cmp(&(fb.end(), fb.start(), fb.id()))
        });
        let amplicon_ids: AHashMap<(usize, usize), usize> =
            amplicons.iter().enumerate().map(|(i, a)| ((a.forward, a.reverse), i + 1)).collect();

        // Position indexes for nearest-primer lookup.
        let mut forward_starts: Vec<(i64, usize)> =
            self.forward.values().map(|&i| (primers[i].start(), i)).collect();
        let mut reverse_ends: Vec<(i64, usize)> =
            self.reverse.values().map(|&i| (primers[i].end(), i)).collect();
        forward_starts.sort_by(|a, b| (a.0, primers[a.1].id()).cmp(&(b.0, primers[b.1].id())));
        reverse_ends.sort_by(|a, b| (a.0, primers[a.1].id()).cmp(&(b.0, primers[b.1].id())));

        let ref_start = forward_starts.first().map_or(0, |&(p, _)| p);
        let ref_end = reverse_ends.last().map_or(0, |&(p, _)| p);
        let mask_len = to_index(ref_end) + 1;

        // Adjacent amplicon inserts must overlap; record where they do.
        let mut overlap_mask = PositionMask::new(mask_len);
        for pair in amplicons.windows(2) {
            let next_start = primers[pair[1].forward].start();
            let prev_end = primers[pair[0].reverse].end();
            if next_start >= prev_end {
                return Err(SchemeError::CoverageGap { start: next_start, end: prev_end });
            }
            overlap_mask.set_range(to_index(next_start), to_index(prev_end));
        }

        let mut primer_sites = vec![PositionMask::new(mask_len); self.pools.len()];
        for primer in &primers {
            primer_sites[primer.pool_id()].set_range(to_index(primer.start()), to_index(primer.end()));
        }

        let stats = SchemeStats {
            num_pools: self.pools.len() - 1,
            num_primers: summary.primers_loaded,
            num_alts: summary.alts_merged,
            min_primer_len: primers.iter().map(Primer::len).min().unwrap_or(0),
            max_primer_len: primers.iter().map(Primer::len).max().unwrap_or(0),
            num_amplicons: amplicons.len(),
            mean_amplicon_span: amplicons
                .iter()
                .map(|a| primers[a.reverse].end() - primers[a.forward].start())
                .sum::<i64>()
                / amplicons.len().max(1) as i64,
            max_amplicon_span: amplicons
                .iter()
                .map(|a| primers[a.reverse].end() - primers[a.forward].start())
                .max()
                .unwrap_or(0),
            ref_start,
            ref_end,
            num_overlaps: overlap_mask.count_ones(),
        };

        Ok(PrimerScheme {
            reference_name: self.reference_name.unwrap_or_default(),
            primers,
            pools: self.pools,
            forward_starts,
            reverse_ends,
            amplicons,
            amplicon_ids,
            overlap_mask,
            primer_sites,
            ref_start,
            ref_end,
            summary,
            stats,
        })
    }
}

fn parse_primer(fields: &[&str], pool_id: usize) -> Result<Primer, RowError> {
    let coordinate = |value: &str| match value.parse::<i64>() {
        // BAM positions are 32-bit signed
        Ok(pos) if (0..=i64::from(i32::MAX)).contains(&pos) => Ok(pos),
        _ => Err(RowError::InvalidCoordinate { value: value.to_string() }),
    };
    Primer::new(coordinate(fields[1])?, coordinate(fields[2])?, fields[3], pool_id)
}
