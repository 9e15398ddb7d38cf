//! Primers: a directed, pooled reference interval parsed from a scheme row.

use crate::errors::RowError;
use std::fmt;

/// Marker for forward primers in a primer ID.
pub const LEFT_PRIMER_TAG: &str = "_LEFT";
/// Marker for reverse primers in a primer ID.
pub const RIGHT_PRIMER_TAG: &str = "_RIGHT";
/// Marker introducing an alternate primer suffix.
pub const ALT_PRIMER_TAG: &str = "_alt";

/// Orientation of a primer relative to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// The direction marker used in primer IDs.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Direction::Forward => LEFT_PRIMER_TAG,
            Direction::Reverse => RIGHT_PRIMER_TAG,
        }
    }
}

/// Strip any alt suffix from a primer ID.
///
/// `nCoV-2019_14_LEFT_alt4` becomes `nCoV-2019_14_LEFT`.
#[must_use]
pub fn canonical_id(primer_id: &str) -> &str {
    primer_id.find(ALT_PRIMER_TAG).map_or(primer_id, |i| &primer_id[..i])
}

/// A primer site on the reference.
///
/// Coordinates are 0-based half-open. When alternate primers are merged into a
/// canonical primer its span grows to cover all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primer {
    start: i64,
    end: i64,
    id: String,
    base_id_len: usize,
    pool_id: usize,
    direction: Direction,
    num_alts: u32,
}

impl Primer {
    /// Build a primer from its coordinates, ID and pool.
    ///
    /// The ID is stored in canonical form (alt suffix removed). Direction is
    /// taken from the `_LEFT`/`_RIGHT` marker, which must occur exactly once.
    ///
    /// # Errors
    ///
    /// Returns a [`RowError`] when the ID is empty or lacks a unique direction
    /// marker, or when `start` is negative or not below `end`.
    pub fn new(start: i64, end: i64, primer_id: &str, pool_id: usize) -> Result<Self, RowError> {
        if primer_id.is_empty() {
            return Err(RowError::MissingId);
        }
        if start < 0 || start >= end {
            return Err(RowError::InvalidSpan { primer_id: primer_id.to_string() });
        }

        let id = canonical_id(primer_id);
        let (direction, base_id_len) = match (id.find(LEFT_PRIMER_TAG), id.find(RIGHT_PRIMER_TAG)) {
            (Some(left), None) => (Direction::Forward, left),
            (None, Some(right)) => (Direction::Reverse, right),
            (Some(_), Some(_)) => {
                return Err(RowError::AmbiguousDirection { primer_id: primer_id.to_string() });
            }
            (None, None) => {
                return Err(RowError::MissingDirection { primer_id: primer_id.to_string() });
            }
        };

        Ok(Self { start, end, id: id.to_string(), base_id_len, pool_id, direction, num_alts: 0 })
    }

    /// Widen this primer to the union of its span and `alt`'s span.
    ///
    /// # Errors
    ///
    /// Returns an error if `alt` has a different direction or pool.
    pub fn merge_alt(&mut self, alt: &Primer) -> Result<(), RowError> {
        if self.direction != alt.direction {
            return Err(RowError::AltDirectionMismatch { primer_id: alt.id.clone() });
        }
        if self.pool_id != alt.pool_id {
            return Err(RowError::AltPoolMismatch { primer_id: alt.id.clone() });
        }
        self.start = self.start.min(alt.start);
        self.end = self.end.max(alt.end);
        self.num_alts += 1;
        Ok(())
    }

    #[must_use]
    pub fn start(&self) -> i64 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Number of reference bases covered by the primer.
    #[must_use]
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    /// Always false; primers span at least one base.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }

    /// Canonical primer ID (alt suffix removed).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The primer ID with the direction marker and anything after it removed.
    #[must_use]
    pub fn base_id(&self) -> &str {
        &self.id[..self.base_id_len]
    }

    #[must_use]
    pub fn pool_id(&self) -> usize {
        self.pool_id
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn is_forward(&self) -> bool {
        self.direction == Direction::Forward
    }

    /// Number of alternate primers merged into this one.
    #[must_use]
    pub fn num_alts(&self) -> u32 {
        self.num_alts
    }

    /// ID of the primer this one must pair with.
    #[must_use]
    pub fn mate_id(&self) -> String {
        let mate = match self.direction {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        };
        format!("{}{}", self.base_id(), mate.tag())
    }
}

impl fmt::Display for Primer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.id, self.start, self.end)
    }
}
