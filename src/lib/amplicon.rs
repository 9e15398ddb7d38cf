//! Amplicons: a forward and reverse primer paired over a stretch of reference.

use crate::errors::SchemeError;
use crate::primer::Primer;
use std::fmt;

/// A 0-based half-open reference interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

impl Span {
    #[must_use]
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A pair of primers and the region they amplify.
///
/// Amplicons borrow their primers from the [`PrimerScheme`](crate::scheme::PrimerScheme)
/// that produced them. An amplicon returned by a nearest-primer lookup may pair
/// primers from different amplicons; check [`Amplicon::is_properly_paired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amplicon<'a> {
    id: usize,
    forward: &'a Primer,
    reverse: &'a Primer,
    properly_paired: bool,
}

impl<'a> Amplicon<'a> {
    /// Pair two primers, in either order.
    ///
    /// `id` is the 1-based position of the amplicon in the scheme's sorted
    /// amplicon list, or 0 for a pairing that is not one of the scheme's
    /// expected amplicons.
    ///
    /// # Errors
    ///
    /// Returns an error if both primers face the same way or the forward primer
    /// does not end before the reverse primer starts.
    pub fn new(id: usize, p1: &'a Primer, p2: &'a Primer) -> Result<Self, SchemeError> {
        if p1.direction() == p2.direction() {
            return Err(SchemeError::SameDirection {
                first: p1.id().to_string(),
                second: p2.id().to_string(),
            });
        }
        let (forward, reverse) = if p1.is_forward() { (p1, p2) } else { (p2, p1) };
        if forward.end() >= reverse.start() {
            return Err(SchemeError::OutwardFacing {
                forward: forward.id().to_string(),
                reverse: reverse.id().to_string(),
            });
        }

        Ok(Self::paired(id, forward, reverse))
    }

    /// Pair an already ordered and validated forward/reverse primer.
    pub(crate) fn paired(id: usize, forward: &'a Primer, reverse: &'a Primer) -> Self {
        let properly_paired =
            forward.base_id() == reverse.base_id() && forward.pool_id() == reverse.pool_id();
        Self { id, forward, reverse, properly_paired }
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn forward(&self) -> &'a Primer {
        self.forward
    }

    #[must_use]
    pub fn reverse(&self) -> &'a Primer {
        self.reverse
    }

    #[must_use]
    pub fn is_properly_paired(&self) -> bool {
        self.properly_paired
    }

    /// Pool of the amplicon, or 0 ("unmatched") when the primers are not a proper pair.
    #[must_use]
    pub fn pool_id(&self) -> usize {
        if self.properly_paired { self.forward.pool_id() } else { 0 }
    }

    /// Amplicon extent including the primers.
    #[must_use]
    pub fn max_span(&self) -> Span {
        Span::new(self.forward.start(), self.reverse.end())
    }

    /// Amplicon extent excluding the primers (the insert).
    #[must_use]
    pub fn min_span(&self) -> Span {
        Span::new(self.forward.end(), self.reverse.start())
    }

    /// `<forward id>_<reverse id>`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}_{}", self.forward.id(), self.reverse.id())
    }
}

impl fmt::Display for Amplicon<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.forward.id(), self.reverse.id())
    }
}
