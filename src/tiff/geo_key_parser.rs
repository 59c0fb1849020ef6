//! GeoTIFF georeferencing: GeoKeys and the model transform tags
//!
//! Reads the GeoKey directory to find the EPSG code of the raster and the
//! tiepoint/scale or transformation tags to build its affine transform.
//! The writer side regenerates a minimal directory from a known EPSG code.

use log::debug;

use crate::coordinate::{CoordinateSystem, GeoTransform};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{geo_keys, model_type, raster_type, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

/// One key of the GeoKey directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyEntry {
    pub key_id: u16,
    /// 0 when the value is stored in `value_offset` itself
    pub tiff_tag_location: u16,
    pub count: u16,
    pub value_offset: u16,
}

impl GeoKeyEntry {
    pub fn new(key_id: u16, tiff_tag_location: u16, count: u16, value_offset: u16) -> Self {
        GeoKeyEntry { key_id, tiff_tag_location, count, value_offset }
    }

    /// Inline SHORT value, if the key stores one
    pub fn short_value(&self) -> Option<u16> {
        (self.tiff_tag_location == 0).then_some(self.value_offset)
    }
}

/// Georeferencing facts of one image
#[derive(Debug, Clone, Default)]
pub struct GeoInfo {
    /// EPSG code from ProjectedCSType or GeographicType
    pub epsg_code: Option<u32>,
    /// GTModelTypeGeoKey
    pub model_type: Option<u16>,
    /// True when GTRasterTypeGeoKey says PixelIsPoint
    pub pixel_is_point: bool,
    /// Pixel-corner anchored affine transform
    pub transform: Option<GeoTransform>,
}

/// Parser for GeoTIFF geographic metadata
pub struct GeoKeyParser;

impl GeoKeyParser {
    /// Parse the GeoKey directory of an IFD; empty when the tag is absent
    pub fn parse_geo_key_directory(
        tiff_reader: &TiffReader,
        reader: &mut dyn SeekableReader,
        ifd: &IFD,
    ) -> TiffResult<Vec<GeoKeyEntry>> {
        if !ifd.has_tag(tags::GEO_KEY_DIRECTORY_TAG) {
            return Ok(Vec::new());
        }

        let values = tiff_reader.read_tag_values(reader, ifd, tags::GEO_KEY_DIRECTORY_TAG)?;
        if values.len() < 4 {
            return Err(TiffError::Corrupt("GeoKey directory header is truncated".to_string()));
        }

        let num_keys = values[3] as usize;
        debug!("GeoKey directory: version={}, revision={}.{}, keys={}",
               values[0], values[1], values[2], num_keys);

        if values.len() < 4 + num_keys * 4 {
            return Err(TiffError::Corrupt(format!(
                "GeoKey directory declares {} keys but holds {} values",
                num_keys, values.len()
            )));
        }

        let geo_keys = values[4..4 + num_keys * 4]
            .chunks_exact(4)
            .map(|key| GeoKeyEntry::new(key[0] as u16, key[1] as u16, key[2] as u16, key[3] as u16))
            .inspect(|key| debug!("GeoKey: id={}, location={}, count={}, value={}",
                                  key.key_id, key.tiff_tag_location, key.count, key.value_offset))
            .collect();

        Ok(geo_keys)
    }

    /// Affine transform from ModelTransformation or tiepoint plus scale
    pub fn read_geotransform(
        tiff_reader: &TiffReader,
        reader: &mut dyn SeekableReader,
        ifd: &IFD,
    ) -> TiffResult<Option<GeoTransform>> {
        if ifd.has_tag(tags::MODEL_TRANSFORMATION_TAG) {
            let matrix = tiff_reader.read_tag_doubles(reader, ifd, tags::MODEL_TRANSFORMATION_TAG)?;
            return Ok(GeoTransform::from_model_transformation(&matrix));
        }

        if ifd.has_tag(tags::MODEL_TIEPOINT_TAG) && ifd.has_tag(tags::MODEL_PIXEL_SCALE_TAG) {
            let tiepoint = tiff_reader.read_tag_doubles(reader, ifd, tags::MODEL_TIEPOINT_TAG)?;
            let scale = tiff_reader.read_tag_doubles(reader, ifd, tags::MODEL_PIXEL_SCALE_TAG)?;
            return Ok(GeoTransform::from_tiepoint_and_scale(&tiepoint, &scale));
        }

        Ok(None)
    }

    /// Extract the EPSG code and transform of an image
    pub fn extract_geo_info(
        tiff_reader: &TiffReader,
        reader: &mut dyn SeekableReader,
        ifd: &IFD,
    ) -> TiffResult<GeoInfo> {
        let mut geo_info = GeoInfo::default();
        let mut projected = None;
        let mut geographic = None;

        for key in Self::parse_geo_key_directory(tiff_reader, reader, ifd)? {
            match (key.key_id, key.short_value()) {
                (geo_keys::GT_MODEL_TYPE, Some(value)) => geo_info.model_type = Some(value),
                (geo_keys::GT_RASTER_TYPE, Some(value)) => {
                    geo_info.pixel_is_point = value == raster_type::PIXEL_IS_POINT;
                }
                (geo_keys::PROJECTED_CS_TYPE, Some(value)) if value != geo_keys::USER_DEFINED => {
                    projected = Some(value as u32);
                }
                (geo_keys::GEOGRAPHIC_TYPE, Some(value)) if value != geo_keys::USER_DEFINED => {
                    geographic = Some(value as u32);
                }
                _ => {}
            }
        }

        geo_info.epsg_code = match geo_info.model_type {
            Some(model_type::GEOGRAPHIC) => geographic.or(projected),
            _ => projected.or(geographic),
        };

        geo_info.transform = Self::read_geotransform(tiff_reader, reader, ifd)?
            .map(|transform| if geo_info.pixel_is_point { transform.shifted_to_pixel_corner() } else { transform });

        debug!("GeoInfo: epsg={:?}, model={:?}, pixel_is_point={}, transform={:?}",
               geo_info.epsg_code, geo_info.model_type, geo_info.pixel_is_point, geo_info.transform);
        Ok(geo_info)
    }

    /// GeoKeyDirectoryTag values describing `crs` with PixelIsArea rasters
    pub fn build_geo_key_directory(crs: &CoordinateSystem) -> Vec<u16> {
        let (model, cs_key) = if crs.is_geographic() {
            (model_type::GEOGRAPHIC, geo_keys::GEOGRAPHIC_TYPE)
        } else {
            (model_type::PROJECTED, geo_keys::PROJECTED_CS_TYPE)
        };

        vec![
            1, 1, 0, 3,
            geo_keys::GT_MODEL_TYPE, 0, 1, model,
            geo_keys::GT_RASTER_TYPE, 0, 1, raster_type::PIXEL_IS_AREA,
            cs_key, 0, 1, crs.epsg_code() as u16,
        ]
    }
}
