//! CLI command implementations
//!
//! This module contains implementations of the subcommands
//! supported by the CLI application using the Command pattern.

pub mod cli;
pub mod command_traits;
pub mod overrides;
pub mod crop_command;
pub mod detect_command;
pub mod run_command;
pub mod batch_command;

pub use cli::build_cli;
pub use command_traits::{Command, CommandFactory};
pub use crop_command::CropCommand;
pub use detect_command::DetectCommand;
pub use run_command::RunCommand;
pub use batch_command::BatchCommand;

use clap::ArgMatches;
use log::debug;

use crate::config::PipelineConfig;
use crate::errors::{DustError, DustResult};

/// Factory for creating command instances based on CLI arguments
///
/// Holds the configuration loaded from `--config` (or the defaults);
/// each command layers its own flags on top.
pub struct DustkitCommandFactory {
    config: PipelineConfig,
}

impl DustkitCommandFactory {
    pub fn new(config: PipelineConfig) -> Self {
        DustkitCommandFactory { config }
    }
}

impl CommandFactory for DustkitCommandFactory {
    fn create_command(&self, args: &ArgMatches) -> DustResult<Box<dyn Command>> {
        let config = self.config.clone();
        let command: Box<dyn Command> = match args.subcommand() {
            Some(("crop", sub)) => Box::new(CropCommand::new(sub, config)?),
            Some(("detect", sub)) => Box::new(DetectCommand::new(sub, config)?),
            Some(("run", sub)) => Box::new(RunCommand::new(sub, config)?),
            Some(("batch", sub)) => Box::new(BatchCommand::new(sub, config)?),
            Some((other, _)) => return Err(DustError::Input(format!("Unknown command '{}'", other))),
            None => return Err(DustError::Input("No command given".to_string())),
        };
        debug!("Created {} command", command.name());
        Ok(command)
    }
}
