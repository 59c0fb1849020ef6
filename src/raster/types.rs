//! In-memory georeferenced raster

use crate::coordinate::{BoundingBox, CoordinateSystem, GeoTransform};
use crate::errors::{DustError, DustResult};
use crate::tiff::constants::photometric;

use super::region::Region;

/// A decoded pixel grid with its georeferencing
///
/// Samples are band-interleaved by pixel. 16-bit samples are stored
/// little-endian regardless of the byte order of the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub bands: u16,
    /// 8 or 16
    pub bits_per_sample: u16,
    pub data: Vec<u8>,
    /// Maps pixel corners to map coordinates in `crs`
    pub transform: GeoTransform,
    pub crs: CoordinateSystem,
    /// GDAL_NODATA value as written in the source file
    pub nodata: Option<String>,
    /// PhotometricInterpretation of the source
    pub photometric: u16,
    /// ExtraSamples of the source, one per band beyond the colour channels
    pub extra_samples: Vec<u16>,
}

impl Raster {
    /// Assemble a raster, checking that `data` matches the declared shape
    pub fn new(
        width: u32,
        height: u32,
        bands: u16,
        bits_per_sample: u16,
        data: Vec<u8>,
        transform: GeoTransform,
        crs: CoordinateSystem,
    ) -> DustResult<Self> {
        if bands == 0 {
            return Err(DustError::Input("Raster has no bands".to_string()));
        }
        if bits_per_sample != 8 && bits_per_sample != 16 {
            return Err(DustError::Input(format!("Unsupported sample width: {} bits", bits_per_sample)));
        }

        let expected = width as usize * height as usize * bands as usize * (bits_per_sample / 8) as usize;
        if data.len() != expected {
            return Err(DustError::Input(format!(
                "Pixel buffer holds {} bytes, a {}x{}x{} raster of {}-bit samples needs {}",
                data.len(), width, height, bands, bits_per_sample, expected
            )));
        }

        Ok(Raster {
            width,
            height,
            bands,
            bits_per_sample,
            data,
            transform,
            crs,
            nodata: None,
            photometric: if bands >= 3 { photometric::RGB } else { photometric::BLACK_IS_ZERO },
            extra_samples: Vec::new(),
        })
    }

    /// Interleaved 8-bit RGB raster, the common test and preview case
    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>, transform: GeoTransform, crs: CoordinateSystem) -> DustResult<Self> {
        Raster::new(width, height, 3, 8, data, transform, crs)
    }

    pub fn with_nodata(mut self, nodata: Option<String>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample / 8) as usize
    }

    /// Bytes between the starts of horizontally adjacent pixels
    pub fn pixel_stride(&self) -> usize {
        self.bands as usize * self.bytes_per_sample()
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.pixel_stride()
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// One sample widened to u16, `None` outside the grid
    pub fn sample(&self, col: u32, row: u32, band: u16) -> Option<u16> {
        if col >= self.width || row >= self.height || band >= self.bands {
            return None;
        }
        let offset = row as usize * self.row_bytes() + col as usize * self.pixel_stride()
            + band as usize * self.bytes_per_sample();

        match self.bits_per_sample {
            8 => Some(self.data[offset] as u16),
            _ => Some(u16::from_le_bytes([self.data[offset], self.data[offset + 1]])),
        }
    }

    /// Bands 1 to 3 of an 8-bit pixel, indexed in row-major order
    pub fn rgb_at(&self, index: usize) -> Option<[u8; 3]> {
        if self.bits_per_sample != 8 || self.bands < 3 || index >= self.pixel_count() {
            return None;
        }
        let offset = index * self.pixel_stride();
        Some([self.data[offset], self.data[offset + 1], self.data[offset + 2]])
    }

    /// Extent of the grid in `crs`
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }

    pub fn full_region(&self) -> Region {
        Region::full(self.width, self.height)
    }

    /// Copy out a window; its transform is re-anchored at the window origin
    pub fn window(&self, region: &Region) -> DustResult<Raster> {
        let region = self.full_region().intersect(region).ok_or_else(|| {
            DustError::Range(format!("Window {:?} lies outside the {}x{} raster", region, self.width, self.height))
        })?;

        let stride = self.pixel_stride();
        let mut data = Vec::with_capacity(region.pixel_count() as usize * stride);
        for row in region.y..region.end_y() {
            let start = row as usize * self.row_bytes() + region.x as usize * stride;
            data.extend_from_slice(&self.data[start..start + region.width as usize * stride]);
        }

        Ok(Raster {
            width: region.width,
            height: region.height,
            bands: self.bands,
            bits_per_sample: self.bits_per_sample,
            data,
            transform: self.transform.window_transform(region.x, region.y),
            crs: self.crs,
            nodata: self.nodata.clone(),
            photometric: self.photometric,
            extra_samples: self.extra_samples.clone(),
        })
    }
}
