//! Crop-then-detect command

use clap::ArgMatches;
use std::path::PathBuf;

use crate::api::DustKit;
use crate::commands::command_traits::Command;
use crate::commands::overrides::{self, path_arg};
use crate::config::PipelineConfig;
use crate::coordinate::{BoundingBox, CoordinateSystem};
use crate::errors::DustResult;

pub struct RunCommand {
    input: PathBuf,
    bbox: BoundingBox,
    crs: CoordinateSystem,
    kit: DustKit,
}

impl RunCommand {
    pub fn new(args: &ArgMatches, mut config: PipelineConfig) -> DustResult<Self> {
        overrides::apply_overrides(&mut config, args)?;
        let (bbox, crs) = overrides::require_bbox(&config)?;

        Ok(RunCommand {
            input: path_arg(args, "input")?,
            bbox,
            crs,
            kit: DustKit::new(config)?,
        })
    }
}

impl Command for RunCommand {
    fn execute(&self) -> DustResult<()> {
        let report = self.kit.run(&self.input, &self.bbox, &self.crs)?;
        println!("cropped: {}", report.cropped.display());
        println!("{} features: {}", report.detection.features, report.detection.geojson.display());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "run"
    }
}
