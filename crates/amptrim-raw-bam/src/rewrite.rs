//! In-place rewriting of the CIGAR, position and bin of a raw BAM record.
//!
//! The CIGAR sits between the read name and the sequence, so a change in the
//! number of operations moves every following byte. The buffer is resized with
//! a single splice; the `block_size` written on output is derived from the
//! buffer length, so only `n_cigar_op` needs updating in the header.

use crate::cigar::reference_length_from_raw_bam;
use crate::fields::{cigar_offset, n_cigar_op, pos, reg2bin, set_bin, set_n_cigar_op, set_pos};
use thiserror::Error;

/// Errors from rewriting a raw record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("CIGAR with {0} operations exceeds the BAM limit of 65535")]
    TooManyOperations(usize),

    #[error("record is truncated: CIGAR ends at byte {cigar_end} of {record_len}")]
    Truncated { cigar_end: usize, record_len: usize },

    #[error("position {0} is outside the range of a BAM record")]
    PositionOutOfRange(i64),
}

/// Replace the CIGAR of `record` with `new_ops`.
///
/// Grows or shrinks the buffer as needed and updates `n_cigar_op`. The record
/// is left untouched when an error is returned.
///
/// # Errors
///
/// Returns an error if `new_ops` has more than `u16::MAX` operations or the
/// record is too short to hold its current CIGAR.
pub fn replace_cigar(record: &mut Vec<u8>, new_ops: &[u32]) -> Result<(), RewriteError> {
    let new_count =
        u16::try_from(new_ops.len()).map_err(|_| RewriteError::TooManyOperations(new_ops.len()))?;
    let start = cigar_offset(record);
    let old_end = start + n_cigar_op(record) as usize * 4;
    if old_end > record.len() {
        return Err(RewriteError::Truncated { cigar_end: old_end, record_len: record.len() });
    }

    if new_ops.len() == n_cigar_op(record) as usize {
        for (chunk, op) in record[start..old_end].chunks_exact_mut(4).zip(new_ops) {
            chunk.copy_from_slice(&op.to_le_bytes());
        }
    } else {
        let bytes: Vec<u8> = new_ops.iter().flat_map(|op| op.to_le_bytes()).collect();
        record.splice(start..old_end, bytes);
    }

    set_n_cigar_op(record, new_count);
    Ok(())
}

/// Move the leftmost position of `record` by `delta` reference bases.
///
/// # Errors
///
/// Returns an error if the new position does not fit the BAM `pos` field.
pub fn shift_position(record: &mut [u8], delta: i64) -> Result<(), RewriteError> {
    let new_pos = i64::from(pos(record)) + delta;
    let new_pos = i32::try_from(new_pos).map_err(|_| RewriteError::PositionOutOfRange(new_pos))?;
    if new_pos < 0 {
        return Err(RewriteError::PositionOutOfRange(i64::from(new_pos)));
    }
    set_pos(record, new_pos);
    Ok(())
}

/// Recompute the BAM bin from the current position and CIGAR.
pub fn update_bin(record: &mut [u8]) {
    let start = i64::from(pos(record));
    let end = start + reference_length_from_raw_bam(record);
    set_bin(record, reg2bin(start, end));
}
