//! Command-level integration tests for amptrim.
//!
//! Each test drives the compiled binary against BAM and scheme files written
//! into a temporary directory.

mod helpers;
mod test_align_trim_command;
mod test_validate_scheme_command;
