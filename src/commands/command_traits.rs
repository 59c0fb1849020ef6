//! Command pattern interfaces
//!
//! Each CLI subcommand is parsed into a `Command` object by a
//! `CommandFactory` and then executed.

use crate::errors::DustResult;

/// Represents an executable command in the application
pub trait Command {
    /// Execute the command
    fn execute(&self) -> DustResult<()>;

    /// Subcommand name, for log messages
    fn name(&self) -> &'static str;
}

/// Factory for creating commands from CLI arguments
pub trait CommandFactory {
    /// Create the command selected by `args`
    ///
    /// # Arguments
    /// * `args` - Top-level CLI argument matches from clap
    ///
    /// # Returns
    /// A command that implements the Command trait, or an error
    fn create_command(&self, args: &clap::ArgMatches) -> DustResult<Box<dyn Command>>;
}
