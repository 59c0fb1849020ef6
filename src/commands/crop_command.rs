//! Crop command

use clap::ArgMatches;
use log::info;
use std::path::PathBuf;

use crate::api::DustKit;
use crate::commands::command_traits::Command;
use crate::commands::overrides::{self, optional_path, path_arg};
use crate::config::PipelineConfig;
use crate::coordinate::{BoundingBox, CoordinateSystem};
use crate::errors::DustResult;

/// Writes a cropped GeoTIFF
pub struct CropCommand {
    input: PathBuf,
    output: Option<PathBuf>,
    bbox: BoundingBox,
    crs: CoordinateSystem,
    kit: DustKit,
}

impl CropCommand {
    pub fn new(args: &ArgMatches, mut config: PipelineConfig) -> DustResult<Self> {
        overrides::apply_overrides(&mut config, args)?;
        let (bbox, crs) = overrides::require_bbox(&config)?;
        let input = path_arg(args, "input")?;
        info!("Crop {} to {:?} in {}", input.display(), bbox, crs);

        Ok(CropCommand {
            input,
            output: optional_path(args, "output"),
            bbox,
            crs,
            kit: DustKit::new(config)?,
        })
    }
}

impl Command for CropCommand {
    fn execute(&self) -> DustResult<()> {
        let written = self.kit.crop(&self.input, &self.bbox, &self.crs, self.output.as_deref())?;
        println!("{}", written.display());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "crop"
    }
}
