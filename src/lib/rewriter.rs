//! Applying a trim to a raw BAM record.
//!
//! The record keeps its read name, sequence, qualities and tags byte for byte;
//! only the CIGAR, leftmost position and bin change.

use crate::cigar::{decode_ops, encode_ops};
use crate::errors::TrimError;
use crate::trim::{ClipEnd, Trimmed, trim};
use amptrim_raw_bam::{RawRecord, get_cigar_ops, pos, replace_cigar, shift_position, update_bin};

/// Write a [`Trimmed`] result into `record`.
///
/// The CIGAR is replaced (resizing the record if the operation count
/// changed), the position is shifted for a start-side trim, and the bin is
/// recomputed. On error the record is left as it was.
///
/// # Errors
///
/// Returns an error if the new CIGAR cannot be packed or stored, or the shifted
/// position does not fit the record.
pub fn apply_trim(record: &mut RawRecord, trimmed: &Trimmed, end: ClipEnd) -> Result<(), TrimError> {
    let packed = encode_ops(&trimmed.ops)?;

    let shift = if end == ClipEnd::Start { trimmed.position_delta } else { 0 };
    if shift != 0 {
        shift_position(record.as_mut_vec(), shift)?;
    }
    if let Err(e) = replace_cigar(record.as_mut_vec(), &packed) {
        if shift != 0 {
            shift_position(record.as_mut_vec(), -shift)?;
        }
        return Err(e.into());
    }
    update_bin(record.as_mut_vec());
    Ok(())
}

/// Soft-mask `end` of the alignment in `record` up to `boundary`.
///
/// Returns the trim that was applied; a record already inside the boundary is
/// not touched.
///
/// # Errors
///
/// Returns any [`TrimError`] from trimming or rewriting; the record is left
/// unchanged.
pub fn softmask_record(
    record: &mut RawRecord,
    boundary: i64,
    end: ClipEnd,
) -> Result<Trimmed, TrimError> {
    let ops = decode_ops(&get_cigar_ops(record))?;
    let trimmed = trim(&ops, i64::from(pos(record)), boundary, end)?;
    if !trimmed.is_unchanged() {
        apply_trim(record, &trimmed, end)?;
    }
    Ok(trimmed)
}
