//! Library entry point tying the pipeline stages together

use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::coordinate::{BoundingBox, CoordinateSystem};
use crate::crop::RegionCropper;
use crate::dust::DustExtractor;
use crate::errors::{DustError, DustResult};
use crate::raster::{GeoTiffWriter, Raster, RasterDataset};
use crate::utils::path_utils;
use crate::utils::preview;
use crate::utils::progress::ProgressTracker;
use crate::vector;

/// Artifacts of one detection
#[derive(Debug, Clone)]
pub struct DetectReport {
    pub geojson: PathBuf,
    pub preview: Option<PathBuf>,
    pub features: usize,
    pub dust_pixels: usize,
}

/// Artifacts of a crop followed by a detection
#[derive(Debug, Clone)]
pub struct RunReport {
    pub cropped: PathBuf,
    pub detection: DetectReport,
}

/// Per-file results of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<(PathBuf, DetectReport)>,
    pub failed: Vec<(PathBuf, DustError)>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Main interface to the dustkit library
pub struct DustKit {
    config: PipelineConfig,
    cropper: RegionCropper,
    extractor: DustExtractor,
    writer: GeoTiffWriter,
}

impl DustKit {
    /// Build the pipeline described by `config`
    pub fn new(config: PipelineConfig) -> DustResult<Self> {
        config.validate()?;
        let writer = config.writer()?;
        Ok(DustKit {
            cropper: config.cropper(),
            extractor: DustExtractor::new(config.extract_options()),
            writer,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn extractor(&self) -> &DustExtractor {
        &self.extractor
    }

    /// Crop `input` to `bbox` and write the GeoTIFF
    ///
    /// Returns the path written.
    pub fn crop(&self, input: &Path, bbox: &BoundingBox, bbox_crs: &CoordinateSystem, output: Option<&Path>) -> DustResult<PathBuf> {
        let target = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.output.cropped_path(input));
        ensure_parent(&target)?;

        let (cropped, written) = self.cropper.crop_to_file(input, bbox, bbox_crs, Some(&target), &self.writer)?;
        info!("Wrote {}x{} crop to {}", cropped.width, cropped.height, written.display());
        Ok(written)
    }

    /// Detect dust in the whole of `input` and write GeoJSON
    pub fn detect(&self, input: &Path, output: Option<&Path>) -> DustResult<DetectReport> {
        let raster = RasterDataset::open(input)?.read_all()?;
        self.detect_raster(&raster, input, output)
    }

    /// Detect dust in a raster already in memory
    ///
    /// `named_after` only decides the default output names.
    pub fn detect_raster(&self, raster: &Raster, named_after: &Path, output: Option<&Path>) -> DustResult<DetectReport> {
        let extraction = self.extractor.run(raster)?;

        let geojson = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.output.geojson_path(named_after));
        ensure_parent(&geojson)?;

        // A GeoJSON is only ever left on disk together with its preview
        let preview = if self.config.output.preview {
            let path = self.config.output.preview_path(named_after);
            ensure_parent(&path)?;
            preview::write_preview(raster, &extraction.mask, &path)?;
            Some(path)
        } else {
            None
        };

        if let Err(e) = vector::write_geojson(&extraction.features, &geojson) {
            if let Some(path) = &preview {
                if let Err(cleanup) = fs::remove_file(path) {
                    warn!("Cannot remove {}: {}", path.display(), cleanup);
                }
            }
            return Err(e);
        }

        Ok(DetectReport {
            geojson,
            preview,
            features: extraction.features.len(),
            dust_pixels: extraction.mask.count(),
        })
    }

    /// Crop then detect, the GeoJSON named after the cropped raster
    pub fn run(&self, input: &Path, bbox: &BoundingBox, bbox_crs: &CoordinateSystem) -> DustResult<RunReport> {
        let cropped_path = self.config.output.cropped_path(input);
        ensure_parent(&cropped_path)?;
        let (cropped, cropped_path) =
            self.cropper.crop_to_file(input, bbox, bbox_crs, Some(&cropped_path), &self.writer)?;
        info!("Cropped {} to {}", input.display(), cropped_path.display());

        let detection = self.detect_raster(&cropped, &cropped_path, None)?;
        Ok(RunReport { cropped: cropped_path, detection })
    }

    /// Run one file through the configured pipeline
    ///
    /// With a configured bbox this is `run`, otherwise `detect`.
    pub fn process(&self, input: &Path) -> DustResult<DetectReport> {
        match self.config.crop_bbox() {
            Some(bbox) => {
                let crs = self.config.crop_crs()?;
                Ok(self.run(input, &bbox, &crs)?.detection)
            }
            None => self.detect(input, None),
        }
    }

    /// Process every GeoTIFF in `dir`, in name order
    ///
    /// A failing file is logged and skipped; only an unreadable directory
    /// fails the batch.
    pub fn batch(&self, dir: &Path, show_progress: bool) -> DustResult<BatchReport> {
        let files = path_utils::find_tiffs(dir, &self.config.output.cropped_suffix)
            .map_err(|e| DustError::Input(format!("Cannot list {}: {}", dir.display(), e)))?;
        if files.is_empty() {
            warn!("No GeoTIFFs found in {}", dir.display());
        }
        info!("Batch over {} files in {}", files.len(), dir.display());

        let total = files.len() as u64;
        let progress = if show_progress {
            ProgressTracker::new(total, "Detecting dust")
        } else {
            ProgressTracker::hidden(total)
        };

        let mut report = BatchReport::default();
        for file in files {
            progress.set_message(&file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
            match self.process(&file) {
                Ok(detection) => report.succeeded.push((file, detection)),
                Err(e) => {
                    error!("{} failed at the {} stage: {}", file.display(), e.kind(), e);
                    report.failed.push((file, e));
                }
            }
            progress.increment(1);
        }

        progress.finish(&format!("{} of {} succeeded", report.success_count(), report.total()));
        info!("{} of {} files processed", report.success_count(), report.total());
        Ok(report)
    }
}

fn ensure_parent(path: &Path) -> DustResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => fs::create_dir_all(parent)
            .map_err(|e| DustError::Serialization(format!("Cannot create {}: {}", parent.display(), e))),
        _ => Ok(()),
    }
}
