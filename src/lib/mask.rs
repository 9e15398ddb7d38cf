//! A fixed-length bit vector over reference positions.

/// One bit per reference position in `[0, len)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMask {
    words: Vec<u64>,
    len: usize,
}

impl PositionMask {
    /// Create an all-clear mask covering positions `[0, len)`.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self { words: vec![0; len.div_ceil(64)], len }
    }

    /// Number of positions covered by the mask.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Set every position in `[start, end)`, clamped to the mask length.
    pub fn set_range(&mut self, start: usize, end: usize) {
        let end = end.min(self.len);
        for pos in start..end {
            self.words[pos / 64] |= 1u64 << (pos % 64);
        }
    }

    /// Whether `pos` is set. Positions past the end are never set.
    #[must_use]
    pub fn get(&self, pos: usize) -> bool {
        pos < self.len && self.words[pos / 64] & (1u64 << (pos % 64)) != 0
    }

    /// Number of set positions.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}
