//! Conversion between packed BAM CIGAR words and noodles CIGAR operations.

use crate::errors::TrimError;
use amptrim_raw_bam::cigar::{op, op_code, op_len, pack_op};
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;
use std::fmt::Write;

/// Longest operation a packed CIGAR word can hold (28 bits).
const MAX_OP_LEN: usize = (1 << 28) - 1;

/// Decode a packed `len << 4 | op` word.
///
/// # Errors
///
/// Returns an error for an operation code outside `MIDNSHP=X`.
pub fn decode_op(raw: u32) -> Result<Op, TrimError> {
    let kind = match op_code(raw) {
        op::MATCH => Kind::Match,
        op::INSERTION => Kind::Insertion,
        op::DELETION => Kind::Deletion,
        op::SKIP => Kind::Skip,
        op::SOFT_CLIP => Kind::SoftClip,
        op::HARD_CLIP => Kind::HardClip,
        op::PAD => Kind::Pad,
        op::SEQUENCE_MATCH => Kind::SequenceMatch,
        op::SEQUENCE_MISMATCH => Kind::SequenceMismatch,
        code => return Err(TrimError::InvalidCigarOp(code)),
    };
    Ok(Op::new(kind, op_len(raw) as usize))
}

/// Pack an operation into a BAM CIGAR word.
///
/// # Errors
///
/// Returns an error if the length does not fit in 28 bits.
pub fn encode_op(cigar_op: Op) -> Result<u32, TrimError> {
    let code = match cigar_op.kind() {
        Kind::Match => op::MATCH,
        Kind::Insertion => op::INSERTION,
        Kind::Deletion => op::DELETION,
        Kind::Skip => op::SKIP,
        Kind::SoftClip => op::SOFT_CLIP,
        Kind::HardClip => op::HARD_CLIP,
        Kind::Pad => op::PAD,
        Kind::SequenceMatch => op::SEQUENCE_MATCH,
        Kind::SequenceMismatch => op::SEQUENCE_MISMATCH,
    };
    if cigar_op.len() > MAX_OP_LEN {
        return Err(TrimError::CigarOpTooLong(cigar_op.len()));
    }
    Ok(pack_op(code, cigar_op.len() as u32))
}

/// Decode every word of a packed CIGAR.
///
/// # Errors
///
/// Returns an error on the first invalid operation code.
pub fn decode_ops(raw: &[u32]) -> Result<Vec<Op>, TrimError> {
    raw.iter().map(|&r| decode_op(r)).collect()
}

/// Pack a list of operations.
///
/// # Errors
///
/// Returns an error on the first operation too long to pack.
pub fn encode_ops(ops: &[Op]) -> Result<Vec<u32>, TrimError> {
    ops.iter().map(|&o| encode_op(o)).collect()
}

/// Aligned (match-like) operations: `M`, `=` and `X`.
#[must_use]
pub fn is_alignment_match(kind: Kind) -> bool {
    matches!(kind, Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch)
}

/// Sum of query-consuming operation lengths.
#[must_use]
pub fn query_length(ops: &[Op]) -> usize {
    ops.iter().filter(|o| o.kind().consumes_read()).map(|o| o.len()).sum()
}

/// Sum of reference-consuming operation lengths.
#[must_use]
pub fn reference_length(ops: &[Op]) -> usize {
    ops.iter().filter(|o| o.kind().consumes_reference()).map(|o| o.len()).sum()
}

fn kind_char(kind: Kind) -> char {
    match kind {
        Kind::Match => 'M',
        Kind::Insertion => 'I',
        Kind::Deletion => 'D',
        Kind::Skip => 'N',
        Kind::SoftClip => 'S',
        Kind::HardClip => 'H',
        Kind::Pad => 'P',
        Kind::SequenceMatch => '=',
        Kind::SequenceMismatch => 'X',
    }
}

/// SAM text form of a CIGAR, e.g. `5S480M`. Empty CIGARs render as `*`.
#[must_use]
pub fn format_cigar(ops: &[Op]) -> String {
    if ops.is_empty() {
        return "*".to_string();
    }
    let mut out = String::with_capacity(ops.len() * 4);
    for o in ops {
        let _ = write!(out, "{}{}", o.len(), kind_char(o.kind()));
    }
    out
}

/// Parse SAM CIGAR text such as `5S480M`.
///
/// Used for tests and diagnostics; returns `None` on malformed input.
#[must_use]
pub fn parse_cigar(text: &str) -> Option<Vec<Op>> {
    if text == "*" {
        return Some(Vec::new());
    }
    let mut ops = Vec::new();
    let mut len = 0usize;
    let mut have_digits = false;
    for c in text.chars() {
        if let Some(d) = c.to_digit(10) {
            len = len.checked_mul(10)?.checked_add(d as usize)?;
            have_digits = true;
            continue;
        }
        let kind = match c {
            'M' => Kind::Match,
            'I' => Kind::Insertion,
            'D' => Kind::Deletion,
            'N' => Kind::Skip,
            'S' => Kind::SoftClip,
            'H' => Kind::HardClip,
            'P' => Kind::Pad,
            '=' => Kind::SequenceMatch,
            'X' => Kind::SequenceMismatch,
            _ => return None,
        };
        if !have_digits {
            return None;
        }
        ops.push(Op::new(kind, len));
        len = 0;
        have_digits = false;
    }
    if have_digits { None } else { Some(ops) }
}
