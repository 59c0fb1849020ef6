pub mod errors;
pub mod io;
pub mod tiff;
pub mod compression;
pub mod coordinate;
pub mod raster;
pub mod crop;
pub mod dust;
pub mod vector;
pub mod config;
pub mod utils;
pub mod commands;
pub mod api;

pub use crate::api::{BatchReport, DetectReport, DustKit, RunReport};
pub use crate::config::PipelineConfig;
pub use crate::errors::{DustError, DustResult};

pub use coordinate::{BoundingBox, CoordinateSystem, CoordinateSystemFactory, GeoTransform, Point};
pub use crop::{OverlapPolicy, RegionCropper};
pub use dust::{ClassifierRule, Connectivity, DustExtractor, ExtractOptions, HsvRange, Mask, PixelClassifier, RgbThreshold};
pub use raster::{GeoTiffWriter, Raster, RasterDataset, Region};
pub use vector::{Feature, FeatureCollection};
