//! Helper utilities for integration tests.

pub mod assertions;
pub mod bam_generator;
pub mod scheme_writer;

pub use assertions::*;
pub use bam_generator::*;
pub use scheme_writer::*;
