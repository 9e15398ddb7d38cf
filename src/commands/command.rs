//! Command trait definition for CLI commands.
//!
//! Every amptrim subcommand implements [`Command`]; `enum_dispatch` routes the
//! parsed subcommand enum to the right implementation.

use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// Trait implemented by all amptrim CLI commands.
///
/// The `command_line` parameter contains the full command invocation for @PG records.
#[enum_dispatch]
pub trait Command {
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self, command_line: &str) -> Result<()>;
}
