//! Region cropping of GeoTIFFs

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::coordinate::{BoundingBox, CoordinateSystem, CoordinateTransformer};
use crate::errors::{DustError, DustResult};
use crate::io::seekable::RasterSource;
use crate::raster::{GeoTiffWriter, Raster, RasterDataset, Region};
use crate::utils::path_utils;

use super::window::{window_for, OverlapPolicy};

/// Crops rasters to a bounding box given in any supported CRS
pub struct RegionCropper {
    policy: OverlapPolicy,
    transformer: CoordinateTransformer,
}

impl Default for RegionCropper {
    fn default() -> Self {
        Self::new(OverlapPolicy::default())
    }
}

impl RegionCropper {
    pub fn new(policy: OverlapPolicy) -> Self {
        RegionCropper { policy, transformer: CoordinateTransformer::new() }
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// Crop the GeoTIFF at `raster_path` to `bbox`, expressed in `bbox_crs`
    ///
    /// Only the strips or tiles that intersect the window are decoded.
    pub fn crop(&self, raster_path: &Path, bbox: &BoundingBox, bbox_crs: &CoordinateSystem) -> DustResult<Raster> {
        self.crop_source(RasterSource::from_path(raster_path), bbox, bbox_crs)
    }

    pub fn crop_source(&self, source: RasterSource, bbox: &BoundingBox, bbox_crs: &CoordinateSystem) -> DustResult<Raster> {
        bbox.validate().map_err(DustError::Input)?;
        let dataset = RasterDataset::from_source(source)?;

        let window = self.window(bbox, bbox_crs, &dataset.crs(), dataset.transform(), dataset.width(), dataset.height())?;
        info!("Cropping {} to pixel window x={} y={} {}x{}",
              dataset.source().label(), window.x, window.y, window.width, window.height);
        dataset.read_window(&window)
    }

    /// Crop a raster already in memory
    pub fn crop_raster(&self, raster: &Raster, bbox: &BoundingBox, bbox_crs: &CoordinateSystem) -> DustResult<Raster> {
        bbox.validate().map_err(DustError::Input)?;
        let window = self.window(bbox, bbox_crs, &raster.crs, &raster.transform, raster.width, raster.height)?;
        raster.window(&window)
    }

    /// Crop and write the result as GeoTIFF
    ///
    /// `output` defaults to `<stem>_cropped.tif` next to the input. Nothing
    /// is written when the crop fails.
    pub fn crop_to_file(
        &self,
        raster_path: &Path,
        bbox: &BoundingBox,
        bbox_crs: &CoordinateSystem,
        output: Option<&Path>,
        writer: &GeoTiffWriter,
    ) -> DustResult<(Raster, PathBuf)> {
        let cropped = self.crop(raster_path, bbox, bbox_crs)?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path_utils::cropped_path(raster_path));
        writer.write(&cropped, &output)?;
        Ok((cropped, output))
    }

    fn window(
        &self,
        bbox: &BoundingBox,
        bbox_crs: &CoordinateSystem,
        raster_crs: &CoordinateSystem,
        transform: &crate::coordinate::GeoTransform,
        width: u32,
        height: u32,
    ) -> DustResult<Region> {
        let native = self.transformer.transform_bbox(bbox, bbox_crs, raster_crs);
        debug!("Bounding box {:?} in {} is {:?} in {}", bbox, bbox_crs, native, raster_crs);
        if native.validate().is_err() {
            return Err(DustError::Input(format!(
                "Bounding box {:?} cannot be expressed in {}", bbox, raster_crs
            )));
        }
        window_for(&native, transform, width, height, self.policy)
    }
}
