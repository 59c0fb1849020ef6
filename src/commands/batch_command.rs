//! Batch command over a data folder

use clap::ArgMatches;
use log::{info, warn};
use std::path::PathBuf;

use crate::api::DustKit;
use crate::commands::command_traits::Command;
use crate::commands::overrides::{self, path_arg};
use crate::config::PipelineConfig;
use crate::errors::{DustError, DustResult};

/// Runs the configured pipeline over every GeoTIFF in a folder
///
/// The folder defaults to `$DUSTKIT_DATA_DIR`. Individual failures are
/// reported and skipped, but a run where no file succeeds is an error.
pub struct BatchCommand {
    folder: PathBuf,
    show_progress: bool,
    kit: DustKit,
}

impl BatchCommand {
    pub fn new(args: &ArgMatches, mut config: PipelineConfig) -> DustResult<Self> {
        overrides::apply_overrides(&mut config, args)?;
        let folder = path_arg(args, "folder")?;
        if config.crop_bbox().is_none() {
            info!("No crop box configured, detecting over whole rasters");
        }

        Ok(BatchCommand {
            folder,
            show_progress: !args.get_flag("no-progress"),
            kit: DustKit::new(config)?,
        })
    }
}

impl Command for BatchCommand {
    fn execute(&self) -> DustResult<()> {
        let report = self.kit.batch(&self.folder, self.show_progress)?;
        for (file, e) in &report.failed {
            warn!("skipped {}: {}", file.display(), e);
        }
        println!("{} of {} files processed successfully", report.success_count(), report.total());
        if report.success_count() == 0 {
            return Err(DustError::Input(format!(
                "No files were successfully processed in {}", self.folder.display()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "batch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cli::build_cli;
    use crate::coordinate::{CoordinateSystem, GeoTransform};
    use crate::raster::{GeoTiffWriter, Raster};
    use std::fs;
    use tempfile::tempdir;

    fn batch_over(folder: &std::path::Path) -> BatchCommand {
        let folder = folder.to_string_lossy().into_owned();
        let matches = build_cli()
            .try_get_matches_from(["dustkit", "batch", folder.as_str(), "--no-progress"])
            .unwrap();
        BatchCommand::new(matches.subcommand().unwrap().1, PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_all_failures_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.tif"), b"not a tiff").unwrap();
        assert!(matches!(batch_over(dir.path()).execute(), Err(DustError::Input(_))));

        let empty = tempdir().unwrap();
        assert!(batch_over(empty.path()).execute().is_err());
    }

    #[test]
    fn test_one_success_is_enough() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.tif"), b"not a tiff").unwrap();
        let raster = Raster::from_rgb8(2, 2, vec![200, 20, 200].repeat(4),
                                       GeoTransform::north_up(0.0, 60.0, 30.0, 30.0),
                                       CoordinateSystem::WebMercator).unwrap();
        GeoTiffWriter::default().write(&raster, &dir.path().join("scene.tif")).unwrap();

        assert!(batch_over(dir.path()).execute().is_ok());
        assert!(dir.path().join("scene_dust.geojson").exists());
    }
}
