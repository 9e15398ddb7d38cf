//! Packed CIGAR operations as stored in BAM records.
//!
//! Each operation is a little-endian `u32` holding `len << 4 | op`, where `op`
//! is one of `MIDNSHP=X` encoded as 0..=8.

use crate::fields::{MIN_BAM_HEADER_LEN, l_read_name, n_cigar_op, pos};

/// Numeric codes of the CIGAR operations.
pub mod op {
    pub const MATCH: u32 = 0;
    pub const INSERTION: u32 = 1;
    pub const DELETION: u32 = 2;
    pub const SKIP: u32 = 3;
    pub const SOFT_CLIP: u32 = 4;
    pub const HARD_CLIP: u32 = 5;
    pub const PAD: u32 = 6;
    pub const SEQUENCE_MATCH: u32 = 7;
    pub const SEQUENCE_MISMATCH: u32 = 8;
}

/// Pack an operation code and length into a BAM CIGAR word.
#[inline]
#[must_use]
pub fn pack_op(code: u32, len: u32) -> u32 {
    (len << 4) | code
}

/// Operation code of a packed CIGAR word.
#[inline]
#[must_use]
pub fn op_code(packed: u32) -> u32 {
    packed & 0xF
}

/// Length of a packed CIGAR word.
#[inline]
#[must_use]
pub fn op_len(packed: u32) -> u32 {
    packed >> 4
}

/// Whether an operation code consumes reference bases (M/D/N/=/X).
#[inline]
#[must_use]
pub fn consumes_reference(code: u32) -> bool {
    matches!(code, 0 | 2 | 3 | 7 | 8)
}

#[inline]
fn cigar_op_at(bam: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bam[offset], bam[offset + 1], bam[offset + 2], bam[offset + 3]])
}

/// Extract CIGAR operations from a BAM record.
///
/// Returns an empty vector when the record has no CIGAR or is truncated.
#[inline]
#[must_use]
pub fn get_cigar_ops(bam: &[u8]) -> Vec<u32> {
    let n_cigar_op = n_cigar_op(bam) as usize;
    if n_cigar_op == 0 {
        return Vec::new();
    }

    let cigar_start = MIN_BAM_HEADER_LEN + l_read_name(bam) as usize;
    let cigar_end = cigar_start + n_cigar_op * 4;
    if cigar_end > bam.len() {
        return Vec::new();
    }

    // The CIGAR offset (32 + l_read_name) is not guaranteed to be 4-byte
    // aligned, so decode bytewise.
    bam[cigar_start..cigar_end]
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Reference length of a record's alignment, read without allocating.
#[inline]
#[must_use]
pub fn reference_length_from_raw_bam(bam: &[u8]) -> i64 {
    let n_cigar_op = n_cigar_op(bam) as usize;
    let cigar_start = MIN_BAM_HEADER_LEN + l_read_name(bam) as usize;
    if n_cigar_op == 0 || cigar_start + n_cigar_op * 4 > bam.len() {
        return 0;
    }

    (0..n_cigar_op)
        .map(|i| cigar_op_at(bam, cigar_start + i * 4))
        .filter(|&op| consumes_reference(op_code(op)))
        .map(|op| i64::from(op_len(op)))
        .sum()
}

/// 0-based exclusive alignment end (`pos + reference length`).
///
/// Records without reference-consuming operations end one base after their
/// start, matching how samtools reports them.
#[inline]
#[must_use]
pub fn alignment_end(bam: &[u8]) -> i64 {
    let start = i64::from(pos(bam));
    let ref_len = reference_length_from_raw_bam(bam);
    if ref_len == 0 { start + 1 } else { start + ref_len }
}
