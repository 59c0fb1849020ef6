//! GeoTIFF output for rasters
//!
//! Writes a little-endian, strip-organized, chunky GeoTIFF with the
//! raster's transform, a regenerated GeoKey directory and its nodata tag.

use log::{debug, info};
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use crate::compression::{predictor as predictor_codec, CompressionFactory, CompressionHandler};
use crate::errors::{DustError, DustResult};
use crate::tiff::constants::{compression, extra_samples, photometric, planar_config, predictor, sample_format, tags};
use crate::tiff::errors::TiffResult;
use crate::tiff::{GeoKeyParser, TiffBuilder};

use super::types::Raster;

/// Target decoded size of one strip
const STRIP_TARGET_BYTES: usize = 64 * 1024;
/// Above this payload size the output switches to BigTIFF
const BIG_TIFF_THRESHOLD: u64 = 3_900_000_000;

/// Encoder settings for GeoTIFF output
pub struct GeoTiffWriter {
    handler: Box<dyn CompressionHandler>,
}

impl Default for GeoTiffWriter {
    fn default() -> Self {
        GeoTiffWriter { handler: Box::new(crate::compression::UncompressedHandler) }
    }
}

impl GeoTiffWriter {
    /// Writer for a named codec (`none`, `lzw`, `deflate`, `zstd`)
    pub fn with_compression(name: &str, level: Option<i32>) -> DustResult<Self> {
        let handler = CompressionFactory::handler_by_name(name, level)
            .map_err(|e| DustError::Config(e.to_string()))?;
        Ok(GeoTiffWriter { handler })
    }

    pub fn compression_name(&self) -> &'static str {
        self.handler.name()
    }

    /// Write `raster` to `path`
    pub fn write(&self, raster: &Raster, path: &Path) -> DustResult<()> {
        let label = path.display().to_string();
        let builder = self.build(raster).map_err(|e| DustError::writing(&label, e))?;
        builder.write(path).map_err(|e| DustError::writing(&label, e))?;
        info!("Wrote {}x{} GeoTIFF to {} ({})", raster.width, raster.height, label, self.handler.name());
        Ok(())
    }

    /// Encode `raster` as GeoTIFF bytes
    pub fn encode(&self, raster: &Raster) -> DustResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(raster, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    pub fn write_to<W: Write + Seek>(&self, raster: &Raster, writer: &mut W) -> DustResult<()> {
        self.build(raster)
            .and_then(|builder| builder.write_to(writer))
            .map_err(|e| DustError::writing("<stream>", e))
    }

    fn build(&self, raster: &Raster) -> TiffResult<TiffBuilder> {
        let is_big_tiff = raster.data.len() as u64 > BIG_TIFF_THRESHOLD;
        let mut builder = TiffBuilder::new(is_big_tiff);
        let ifd = builder.add_ifd();
        let bands = raster.bands as usize;

        builder.add_long(ifd, tags::IMAGE_WIDTH, raster.width);
        builder.add_long(ifd, tags::IMAGE_LENGTH, raster.height);
        builder.add_shorts(ifd, tags::BITS_PER_SAMPLE, &vec![raster.bits_per_sample; bands]);
        builder.add_short(ifd, tags::COMPRESSION, self.handler.code());
        let (interpretation, extra) = sample_layout(raster);
        builder.add_short(ifd, tags::PHOTOMETRIC_INTERPRETATION, interpretation);
        builder.add_short(ifd, tags::SAMPLES_PER_PIXEL, raster.bands);
        builder.add_short(ifd, tags::PLANAR_CONFIGURATION, planar_config::CHUNKY);
        builder.add_shorts(ifd, tags::SAMPLE_FORMAT, &vec![sample_format::UNSIGNED; bands]);
        if !extra.is_empty() {
            builder.add_shorts(ifd, tags::EXTRA_SAMPLES, &extra);
        }
        builder.add_ascii(ifd, tags::SOFTWARE, concat!("dustkit ", env!("CARGO_PKG_VERSION")));

        match raster.transform.to_tiepoint_and_scale() {
            Some((tiepoint, scale)) => {
                builder.add_doubles(ifd, tags::MODEL_TIEPOINT_TAG, &tiepoint);
                builder.add_doubles(ifd, tags::MODEL_PIXEL_SCALE_TAG, &scale);
            }
            None => builder.add_doubles(ifd, tags::MODEL_TRANSFORMATION_TAG, &raster.transform.to_model_transformation()),
        }
        builder.add_shorts(ifd, tags::GEO_KEY_DIRECTORY_TAG, &GeoKeyParser::build_geo_key_directory(&raster.crs));
        if let Some(nodata) = &raster.nodata {
            builder.add_ascii(ifd, tags::GDAL_NODATA, nodata);
        }

        let row_bytes = raster.row_bytes().max(1);
        let rows_per_strip = (STRIP_TARGET_BYTES / row_bytes).clamp(1, raster.height.max(1) as usize);
        builder.add_long(ifd, tags::ROWS_PER_STRIP, rows_per_strip as u32);

        let use_predictor = self.handler.code() != compression::NONE;
        if use_predictor {
            builder.add_short(ifd, tags::PREDICTOR, predictor::HORIZONTAL_DIFFERENCING);
        }

        let mut strips = Vec::with_capacity(raster.data.len() / (rows_per_strip * row_bytes) + 1);
        for chunk in raster.data.chunks(rows_per_strip * row_bytes) {
            let mut strip = chunk.to_vec();
            if use_predictor {
                predictor_codec::encode_horizontal(&mut strip, raster.width as usize, bands, raster.bytes_per_sample())?;
            }
            strips.push(self.handler.compress(&strip)?);
        }
        debug!("Encoded {} strips of {} rows", strips.len(), rows_per_strip);
        builder.set_strips(ifd, strips);

        Ok(builder)
    }
}

/// PhotometricInterpretation and ExtraSamples to write for `raster`
///
/// The source interpretation is kept when the band count allows it; palette
/// and other colour models fall back to RGB or BlackIsZero since no colour
/// map is written. Bands past the colour channels keep their source
/// ExtraSamples value, or are marked unspecified.
fn sample_layout(raster: &Raster) -> (u16, Vec<u16>) {
    let bands = raster.bands as usize;
    let interpretation = match raster.photometric {
        photometric::RGB if bands >= 3 => photometric::RGB,
        photometric::WHITE_IS_ZERO | photometric::BLACK_IS_ZERO => raster.photometric,
        _ if bands >= 3 => photometric::RGB,
        _ => photometric::BLACK_IS_ZERO,
    };
    let colour_channels = if interpretation == photometric::RGB { 3 } else { 1 };
    let extra = (0..bands.saturating_sub(colour_channels))
        .map(|i| raster.extra_samples.get(i).copied().unwrap_or(extra_samples::UNSPECIFIED))
        .collect();
    (interpretation, extra)
}
