#![deny(unsafe_code)]

pub mod cigar;
pub mod fields;
pub mod record;
pub mod rewrite;
pub mod tags;

#[cfg(any(test, feature = "test-utils"))]
pub mod testutil;

// Flat re-exports so callers can use amptrim_raw_bam::flags() etc.
pub use cigar::*;
pub use fields::*;
pub use record::*;
pub use rewrite::*;
pub use tags::*;

#[cfg(any(test, feature = "test-utils"))]
pub use testutil::*;
