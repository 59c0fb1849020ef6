//! Pipeline configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no
//! file at all) gives the stock pipeline: canonical HSV rule, no cleanup,
//! 4-connectivity, uncompressed crops.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::coordinate::{BoundingBox, CoordinateSystem, CoordinateSystemFactory};
use crate::crop::{OverlapPolicy, RegionCropper};
use crate::dust::{ClassifierRule, Connectivity, ExtractOptions};
use crate::errors::{DustError, DustResult};
use crate::raster::GeoTiffWriter;
use crate::utils::path_utils;

/// Crop stage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// `[min_x, min_y, max_x, max_y]` in `crs`; no crop when absent
    pub bbox: Option<[f64; 4]>,
    pub crs: String,
    pub policy: OverlapPolicy,
    /// `none`, `deflate` or `zstd`
    pub compression: String,
    pub level: Option<i32>,
}

impl Default for CropConfig {
    fn default() -> Self {
        CropConfig {
            bbox: None,
            crs: "EPSG:3857".to_string(),
            policy: OverlapPolicy::Clamp,
            compression: "none".to_string(),
            level: None,
        }
    }
}

/// Morphological cleanup settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub enabled: bool,
    pub kernel_size: u32,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        CleanupConfig { enabled: false, kernel_size: 5 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizeConfig {
    pub connectivity: Connectivity,
}

/// Where artifacts are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write next to the input when absent
    pub directory: Option<PathBuf>,
    pub cropped_suffix: String,
    pub geojson_suffix: String,
    pub preview: bool,
    pub preview_suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: None,
            cropped_suffix: path_utils::CROPPED_SUFFIX.to_string(),
            geojson_suffix: path_utils::GEOJSON_SUFFIX.to_string(),
            preview: false,
            preview_suffix: path_utils::PREVIEW_SUFFIX.to_string(),
        }
    }
}

impl OutputConfig {
    fn locate(&self, input: &Path, suffix: &str) -> PathBuf {
        let named = path_utils::with_suffix(input, suffix);
        match (&self.directory, named.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => named,
        }
    }

    pub fn cropped_path(&self, input: &Path) -> PathBuf {
        self.locate(input, &self.cropped_suffix)
    }

    pub fn geojson_path(&self, input: &Path) -> PathBuf {
        self.locate(input, &self.geojson_suffix)
    }

    pub fn preview_path(&self, input: &Path) -> PathBuf {
        self.locate(input, &self.preview_suffix)
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub crop: CropConfig,
    pub classifier: ClassifierRule,
    pub cleanup: CleanupConfig,
    pub vectorize: VectorizeConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Read and validate a TOML file
    pub fn from_file(path: &Path) -> DustResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| DustError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&text)
            .map_err(|e| DustError::Config(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> DustResult<Self> {
        let config: PipelineConfig = toml::from_str(text).map_err(|e| DustError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> DustResult<String> {
        toml::to_string_pretty(self).map_err(|e| DustError::Serialization(e.to_string()))
    }

    /// Check the values serde cannot
    pub fn validate(&self) -> DustResult<()> {
        if self.cleanup.kernel_size == 0 || self.cleanup.kernel_size % 2 == 0 {
            return Err(DustError::Config(format!(
                "cleanup.kernel_size must be odd, got {}", self.cleanup.kernel_size
            )));
        }
        self.crop_crs().map_err(|e| DustError::Config(e.to_string()))?;
        if let Some(bbox) = self.crop_bbox() {
            bbox.validate().map_err(|e| DustError::Config(format!("crop.bbox: {}", e)))?;
        }
        self.writer()?;
        Ok(())
    }

    pub fn crop_bbox(&self) -> Option<BoundingBox> {
        self.crop.bbox.map(|[min_x, min_y, max_x, max_y]| BoundingBox::new(min_x, min_y, max_x, max_y))
    }

    pub fn crop_crs(&self) -> DustResult<CoordinateSystem> {
        CoordinateSystemFactory::from_string(&self.crop.crs)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            rule: self.classifier,
            cleanup: self.cleanup.enabled,
            kernel_size: self.cleanup.kernel_size,
            connectivity: self.vectorize.connectivity,
        }
    }

    pub fn cropper(&self) -> RegionCropper {
        RegionCropper::new(self.crop.policy)
    }

    pub fn writer(&self) -> DustResult<GeoTiffWriter> {
        GeoTiffWriter::with_compression(&self.crop.compression, self.crop.level)
    }
}
