//! Folding subcommand flags into the pipeline configuration

use clap::ArgMatches;
use log::debug;
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::coordinate::{BoundingBox, CoordinateSystem};
use crate::crop::OverlapPolicy;
use crate::dust::{ClassifierRule, Connectivity};
use crate::errors::{DustError, DustResult};

// Subcommands define different argument sets; an unknown id reads as unset.
fn string_arg<'a>(args: &'a ArgMatches, id: &str) -> Option<&'a String> {
    args.try_get_one::<String>(id).ok().flatten()
}

fn flag(args: &ArgMatches, id: &str) -> bool {
    matches!(args.try_get_one::<bool>(id), Ok(Some(true)))
}

/// Required positional path
pub fn path_arg(args: &ArgMatches, id: &str) -> DustResult<PathBuf> {
    string_arg(args, id)
        .map(PathBuf::from)
        .ok_or_else(|| DustError::Input(format!("Missing required argument <{}>", id)))
}

/// Optional path flag
pub fn optional_path(args: &ArgMatches, id: &str) -> Option<PathBuf> {
    string_arg(args, id).map(PathBuf::from)
}

/// Apply every flag present in `args` on top of `config`
pub fn apply_overrides(config: &mut PipelineConfig, args: &ArgMatches) -> DustResult<()> {
    if let Some(bbox) = string_arg(args, "bbox") {
        let bbox = BoundingBox::from_string(bbox).map_err(DustError::Input)?;
        config.crop.bbox = Some([bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y]);
    }
    if let Some(crs) = string_arg(args, "crs") {
        config.crop.crs = crs.clone();
    }
    if let Some(policy) = string_arg(args, "policy") {
        config.crop.policy = policy.parse::<OverlapPolicy>()?;
    }
    if let Some(compression) = string_arg(args, "compression") {
        config.crop.compression = compression.clone();
    }

    if let Some(rule) = string_arg(args, "rule") {
        config.classifier = ClassifierRule::from_name(rule)?;
    }
    if flag(args, "cleanup") {
        config.cleanup.enabled = true;
    }
    if flag(args, "no-cleanup") {
        config.cleanup.enabled = false;
    }
    if let Ok(Some(size)) = args.try_get_one::<u32>("kernel-size") {
        config.cleanup.kernel_size = *size;
    }
    if let Some(connectivity) = string_arg(args, "connectivity") {
        config.vectorize.connectivity = connectivity.parse::<Connectivity>().map_err(DustError::Input)?;
    }
    if flag(args, "preview") {
        config.output.preview = true;
    }
    if let Some(dir) = optional_path(args, "output-dir") {
        config.output.directory = Some(dir);
    }

    config.validate()?;
    debug!("Effective configuration: {:?}", config);
    Ok(())
}

/// The crop box and its CRS, from the flags or the configuration
pub fn require_bbox(config: &PipelineConfig) -> DustResult<(BoundingBox, CoordinateSystem)> {
    let bbox = config.crop_bbox().ok_or_else(|| {
        DustError::Input("No bounding box: pass --bbox or set crop.bbox in the configuration".to_string())
    })?;
    Ok((bbox, config.crop_crs()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cli::build_cli;

    fn sub_matches(argv: &[&str]) -> ArgMatches {
        let matches = build_cli().try_get_matches_from(argv).unwrap();
        matches.subcommand().unwrap().1.clone()
    }

    #[test]
    fn test_flags_override_config() {
        let args = sub_matches(&[
            "dustkit", "run", "scene.tif",
            "--bbox", "3540000,1560000,6330000,4090000",
            "--crs", "EPSG:3857",
            "--policy", "strict",
            "--rule", "rgb",
            "--cleanup",
            "--kernel-size", "3",
            "--connectivity", "8",
        ]);
        let mut config = PipelineConfig::default();
        apply_overrides(&mut config, &args).unwrap();

        assert_eq!(config.crop.bbox, Some([3540000.0, 1560000.0, 6330000.0, 4090000.0]));
        assert_eq!(config.crop.policy, OverlapPolicy::Strict);
        assert_eq!(config.classifier, ClassifierRule::from_name("rgb").unwrap());
        assert!(config.cleanup.enabled);
        assert_eq!(config.cleanup.kernel_size, 3);
        assert_eq!(config.vectorize.connectivity, Connectivity::Eight);

        let (bbox, crs) = require_bbox(&config).unwrap();
        assert_eq!(bbox.max_y, 4090000.0);
        assert_eq!(crs, CoordinateSystem::WebMercator);
    }

    #[test]
    fn test_no_cleanup_wins_over_config() {
        let args = sub_matches(&["dustkit", "detect", "scene.tif", "--no-cleanup"]);
        let mut config = PipelineConfig::default();
        config.cleanup.enabled = true;
        apply_overrides(&mut config, &args).unwrap();
        assert!(!config.cleanup.enabled);
        assert_eq!(path_arg(&args, "input").unwrap(), PathBuf::from("scene.tif"));
        assert!(optional_path(&args, "output").is_none());
    }

    #[test]
    fn test_bad_values() {
        let mut config = PipelineConfig::default();
        let args = sub_matches(&["dustkit", "crop", "scene.tif", "--bbox", "5,0,1,1"]);
        assert!(matches!(apply_overrides(&mut config, &args), Err(DustError::Input(_))));

        let args = sub_matches(&["dustkit", "detect", "scene.tif", "--kernel-size", "4"]);
        assert!(matches!(apply_overrides(&mut config, &args), Err(DustError::Config(_))));

        assert!(matches!(require_bbox(&PipelineConfig::default()), Err(DustError::Input(_))));
    }
}
