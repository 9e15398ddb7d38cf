//! Soft-masking one end of an alignment up to a reference boundary.
//!
//! [`trim`] is a pure function over CIGAR operations. It reclassifies query
//! bases at the trimmed end as soft clips until the alignment starts (or ends)
//! at the boundary, and reports how far the alignment start moved. Applying
//! the result to a record is left to [`crate::rewriter`].
//!
//! Operations are processed from the trimmed end inward. For a start-side trim
//! the list is reversed first so both sides share the same walk.

use crate::cigar::{is_alignment_match, query_length, reference_length};
use crate::errors::TrimError;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;

/// Which end of the alignment to soft-mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipEnd {
    /// Mask from the leftmost aligned base up to the boundary.
    Start,
    /// Mask from the boundary to the rightmost aligned base.
    End,
}

/// The outcome of trimming one end of an alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trimmed {
    /// Reference bases the alignment start moved right. Always 0 for [`ClipEnd::End`].
    pub position_delta: i64,
    /// The new CIGAR.
    pub ops: Vec<Op>,
    /// Query bases newly soft-clipped (including any existing soft clip that
    /// was merged into the new one).
    pub soft_clip_len: usize,
}

impl Trimmed {
    fn unchanged(ops: &[Op]) -> Self {
        Self { position_delta: 0, ops: ops.to_vec(), soft_clip_len: 0 }
    }

    /// True when the alignment already lay within the boundary.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.soft_clip_len == 0
    }
}

/// Soft-mask `end` of an alignment so that it starts (or ends) at `boundary`.
///
/// `alignment_start` is the 0-based leftmost reference position of `ops`. An
/// alignment already inside the boundary is returned unchanged.
///
/// The walk stops on the first aligned operation (`M`, `=`, `X`) that reaches
/// the boundary; the part of that operation past the boundary is kept.
/// Deletions and skips left dangling at the new start are folded into the
/// position shift (start side) or dropped (end side), and an insertion left
/// adjacent to the new soft clip is absorbed into it. Hard clips stay
/// outermost.
///
/// # Errors
///
/// - [`TrimError::ReadInsideMask`] if no aligned base would remain.
/// - [`TrimError::IndelAtBoundary`] if an indel sits on the boundary so that no
///   query base can be masked.
/// - [`TrimError::QueryLengthChanged`] or [`TrimError::EmptyEdgeOperation`] if
///   the result fails validation.
pub fn trim(
    ops: &[Op],
    alignment_start: i64,
    boundary: i64,
    end: ClipEnd,
) -> Result<Trimmed, TrimError> {
    let reference_len = reference_length(ops) as i64;
    let need = match end {
        ClipEnd::Start => boundary - alignment_start,
        ClipEnd::End => alignment_start + reference_len - boundary,
    };
    if need <= 0 {
        return Ok(Trimmed::unchanged(ops));
    }

    // Trimmed end last, so operations can be popped.
    let mut working: Vec<Op> = ops.to_vec();
    if end == ClipEnd::Start {
        working.reverse();
    }

    let mut hard_clips = Vec::new();
    while let Some(&last) = working.last() {
        if last.kind() != Kind::HardClip {
            break;
        }
        hard_clips.push(last);
        working.pop();
    }

    let mut eaten = 0usize;
    let mut walked = 0i64;
    loop {
        let Some(next) = working.pop() else {
            return Err(TrimError::ReadInsideMask { boundary });
        };
        let kind = next.kind();
        if kind.consumes_read() {
            eaten += next.len();
        }
        if kind.consumes_reference() {
            walked += next.len() as i64;
        }
        if is_alignment_match(kind) && walked >= need {
            let extra = ((walked - need) as usize).min(next.len());
            if extra > 0 {
                working.push(Op::new(kind, extra));
                eaten -= extra;
                walked -= extra as i64;
            }
            break;
        }
    }

    if eaten == 0 {
        return Err(TrimError::IndelAtBoundary { boundary });
    }

    let mut position_delta = walked;
    while let Some(&last) = working.last() {
        match last.kind() {
            Kind::Deletion | Kind::Skip => position_delta += last.len() as i64,
            Kind::Insertion => eaten += last.len(),
            _ => break,
        }
        working.pop();
    }

    working.push(Op::new(Kind::SoftClip, eaten));
    working.extend(hard_clips.into_iter().rev());

    if end == ClipEnd::Start {
        working.reverse();
    } else {
        position_delta = 0;
    }

    validate(ops, &working, boundary)?;
    Ok(Trimmed { position_delta, ops: working, soft_clip_len: eaten })
}

fn validate(before: &[Op], after: &[Op], boundary: i64) -> Result<(), TrimError> {
    let (old_len, new_len) = (query_length(before), query_length(after));
    if old_len != new_len {
        return Err(TrimError::QueryLengthChanged { before: old_len, after: new_len });
    }
    if after.first().is_some_and(|o| o.len() == 0) {
        return Err(TrimError::EmptyEdgeOperation { edge: "leading" });
    }
    if after.last().is_some_and(|o| o.len() == 0) {
        return Err(TrimError::EmptyEdgeOperation { edge: "trailing" });
    }
    if !after.iter().any(|o| is_alignment_match(o.kind())) {
        return Err(TrimError::ReadInsideMask { boundary });
    }
    Ok(())
}
