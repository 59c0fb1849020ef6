//! Detect command

use clap::ArgMatches;
use log::info;
use std::path::PathBuf;

use crate::api::DustKit;
use crate::commands::command_traits::Command;
use crate::commands::overrides::{self, optional_path, path_arg};
use crate::config::PipelineConfig;
use crate::errors::DustResult;

/// Detects dust over a whole raster
pub struct DetectCommand {
    input: PathBuf,
    output: Option<PathBuf>,
    kit: DustKit,
}

impl DetectCommand {
    pub fn new(args: &ArgMatches, mut config: PipelineConfig) -> DustResult<Self> {
        overrides::apply_overrides(&mut config, args)?;
        let input = path_arg(args, "input")?;
        info!("Detect dust in {}", input.display());

        Ok(DetectCommand {
            input,
            output: optional_path(args, "output"),
            kit: DustKit::new(config)?,
        })
    }
}

impl Command for DetectCommand {
    fn execute(&self) -> DustResult<()> {
        let report = self.kit.detect(&self.input, self.output.as_deref())?;
        println!("{} features ({} dust pixels): {}",
                 report.features, report.dust_pixels, report.geojson.display());
        if let Some(preview) = report.preview {
            println!("preview: {}", preview.display());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "detect"
    }
}
