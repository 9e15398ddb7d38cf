//! CLI command implementations for amptrim.
//!
//! - [`align_trim`] - Soft-mask aligned reads to their amplicon boundaries
//! - [`validate_scheme`] - Load and check a primer scheme, optionally exporting
//!   amplicon inserts and primer sequences

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod align_trim;
pub mod command;
pub mod common;
pub mod validate_scheme;
