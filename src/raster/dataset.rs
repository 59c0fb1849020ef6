//! Windowed GeoTIFF reading
//!
//! `RasterDataset` parses the header, georeferencing and block layout once,
//! then decodes only the blocks a requested window touches.

use log::{debug, info};

use crate::compression::{predictor as predictor_codec, CompressionFactory};
use crate::coordinate::{BoundingBox, CoordinateSystem, CoordinateSystemFactory, GeoTransform};
use crate::errors::{DustError, DustResult};
use crate::io::byte_order::ByteOrder;
use crate::io::seekable::{RasterSource, SeekableReader};
use crate::tiff::constants::{predictor, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;
use crate::tiff::GeoKeyParser;

use super::layout::{BlockLayout, BlockRef};
use super::types::Raster;
use super::region::Region;

/// An opened GeoTIFF whose pixels have not been decoded yet
pub struct RasterDataset {
    source: RasterSource,
    tiff_reader: TiffReader,
    byte_order: ByteOrder,
    layout: BlockLayout,
    transform: GeoTransform,
    crs: CoordinateSystem,
    nodata: Option<String>,
    extra_samples: Vec<u16>,
}

impl RasterDataset {
    /// Open a GeoTIFF file
    pub fn open(path: &std::path::Path) -> DustResult<Self> {
        Self::from_source(RasterSource::from_path(path))
    }

    /// Open any raster source
    ///
    /// Fails with `DustError::Input` when the bytes are not a readable
    /// GeoTIFF, carry no georeferencing or use an unsupported CRS.
    pub fn from_source(source: RasterSource) -> DustResult<Self> {
        let label = source.label();
        let mut reader = source
            .open()
            .map_err(|e| DustError::Input(format!("Cannot open {}: {}", label, e)))?;

        let mut tiff_reader = TiffReader::new();
        let tiff = tiff_reader.read(&mut reader).map_err(|e| DustError::reading(&label, e))?;
        let ifd: IFD = tiff.image_ifd().cloned().ok_or_else(|| DustError::reading(&label, TiffError::NoImage))?;

        let layout = BlockLayout::from_ifd(&tiff_reader, &mut reader, &ifd)
            .map_err(|e| DustError::reading(&label, e))?;
        if layout.samples_per_pixel == 0 {
            return Err(DustError::Input(format!("{} has zero bands", label)));
        }

        let geo_info = GeoKeyParser::extract_geo_info(&tiff_reader, &mut reader, &ifd)
            .map_err(|e| DustError::reading(&label, e))?;
        let transform = geo_info
            .transform
            .ok_or_else(|| DustError::Input(format!("{} has no affine georeferencing", label)))?;
        let epsg = geo_info
            .epsg_code
            .ok_or_else(|| DustError::Input(format!("{} declares no EPSG coordinate system", label)))?;
        let crs = CoordinateSystemFactory::from_epsg(epsg)?;

        let nodata = if ifd.has_tag(tags::GDAL_NODATA) {
            Some(tiff_reader.read_tag_ascii(&mut reader, &ifd, tags::GDAL_NODATA)
                .map_err(|e| DustError::reading(&label, e))?)
        } else {
            None
        };

        let extra_samples = if ifd.has_tag(tags::EXTRA_SAMPLES) {
            tiff_reader.read_tag_values(&mut reader, &ifd, tags::EXTRA_SAMPLES)
                .map_err(|e| DustError::reading(&label, e))?
                .into_iter()
                .map(|value| value as u16)
                .collect()
        } else {
            Vec::new()
        };

        info!("Opened {}: {}x{}, {} bands, {}-bit, {}",
              label, layout.width, layout.height, layout.samples_per_pixel, layout.bits_per_sample, crs);
        drop(reader);

        Ok(RasterDataset {
            source,
            byte_order: tiff.byte_order,
            tiff_reader,
            layout,
            transform,
            crs,
            nodata,
            extra_samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.layout.width
    }

    pub fn height(&self) -> u32 {
        self.layout.height
    }

    pub fn bands(&self) -> u16 {
        self.layout.samples_per_pixel
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.layout.bits_per_sample
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> CoordinateSystem {
        self.crs
    }

    pub fn nodata(&self) -> Option<&str> {
        self.nodata.as_deref()
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    pub fn source(&self) -> &RasterSource {
        &self.source
    }

    pub fn full_region(&self) -> Region {
        Region::full(self.layout.width, self.layout.height)
    }

    /// Extent of the image in its own CRS
    pub fn bounds(&self) -> BoundingBox {
        self.transform.bounds(self.layout.width, self.layout.height)
    }

    /// Decode every pixel
    pub fn read_all(&self) -> DustResult<Raster> {
        self.read_window(&self.full_region())
    }

    /// Decode the pixels of `window`
    ///
    /// The window must lie inside the image. The returned raster keeps the
    /// CRS and nodata of the dataset and its transform is anchored at the
    /// window origin.
    pub fn read_window(&self, window: &Region) -> DustResult<Raster> {
        let label = self.source.label();
        if window.is_empty() || self.full_region().intersect(window) != Some(*window) {
            return Err(DustError::Range(format!(
                "Window {:?} is not inside the {}x{} image {}",
                window, self.layout.width, self.layout.height, label
            )));
        }

        let mut reader = self
            .source
            .open()
            .map_err(|e| DustError::Input(format!("Cannot open {}: {}", label, e)))?;
        let data = self
            .decode_window(&mut reader, window)
            .map_err(|e| DustError::reading(&label, e))?;

        let mut raster = Raster::new(
            window.width,
            window.height,
            self.layout.samples_per_pixel,
            self.layout.bits_per_sample,
            data,
            self.transform.window_transform(window.x, window.y),
            self.crs,
        )?
        .with_nodata(self.nodata.clone());
        raster.photometric = self.layout.photometric;
        raster.extra_samples = self.extra_samples.clone();
        Ok(raster)
    }

    fn decode_window(&self, reader: &mut dyn SeekableReader, window: &Region) -> TiffResult<Vec<u8>> {
        let layout = &self.layout;
        let handler = CompressionFactory::create_handler(layout.compression)?;
        let bytes_per_sample = layout.bytes_per_sample();
        let pixel_stride = layout.samples_per_pixel as usize * bytes_per_sample;
        let mut data = vec![0u8; window.pixel_count() as usize * pixel_stride];

        let blocks = layout.blocks_for(window);
        debug!("Window {:?} touches {} of {} blocks ({})",
               window, blocks.len(), layout.blocks_per_plane() * layout.planes(), handler.name());

        for block in blocks {
            let raw = self.tiff_reader.read_block(
                reader,
                layout.offsets[block.index],
                layout.byte_counts[block.index],
            )?;
            let mut decoded = handler.decompress(&raw)?;

            let block_row = (block.area.y / layout.block_height) as usize;
            let rows = layout.block_rows(block_row) as usize;
            let needed = rows * layout.block_row_bytes();
            if decoded.len() < needed {
                return Err(TiffError::Corrupt(format!(
                    "Block {} decoded to {} bytes, {} expected", block.index, decoded.len(), needed
                )));
            }
            decoded.truncate(needed);

            if bytes_per_sample == 2 {
                self.byte_order.create_handler().u16_samples_to_le(&mut decoded);
            }
            if layout.predictor == predictor::HORIZONTAL_DIFFERENCING {
                predictor_codec::decode_horizontal(
                    &mut decoded,
                    layout.block_width as usize,
                    layout.block_samples(),
                    bytes_per_sample,
                )?;
            }

            self.copy_block(&decoded, &block, window, &mut data);
        }

        Ok(data)
    }

    /// Copy the part of a decoded block that falls inside the window
    fn copy_block(&self, decoded: &[u8], block: &BlockRef, window: &Region, data: &mut [u8]) {
        let layout = &self.layout;
        let Some(overlap) = block.area.intersect(window) else {
            return;
        };

        let bytes_per_sample = layout.bytes_per_sample();
        let pixel_stride = layout.samples_per_pixel as usize * bytes_per_sample;
        let block_pixel_bytes = layout.block_samples() * bytes_per_sample;
        let window_row_bytes = window.width as usize * pixel_stride;

        for row in overlap.y..overlap.end_y() {
            let src_row = (row - block.area.y) as usize * layout.block_row_bytes();
            let dst_row = (row - window.y) as usize * window_row_bytes;
            let src_col = (overlap.x - block.area.x) as usize;
            let dst_col = (overlap.x - window.x) as usize;

            match block.plane {
                None => {
                    let src = src_row + src_col * block_pixel_bytes;
                    let dst = dst_row + dst_col * pixel_stride;
                    let len = overlap.width as usize * pixel_stride;
                    data[dst..dst + len].copy_from_slice(&decoded[src..src + len]);
                }
                Some(plane) => {
                    for i in 0..overlap.width as usize {
                        let src = src_row + (src_col + i) * bytes_per_sample;
                        let dst = dst_row + (dst_col + i) * pixel_stride + plane as usize * bytes_per_sample;
                        data[dst..dst + bytes_per_sample].copy_from_slice(&decoded[src..src + bytes_per_sample]);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::{CompressionHandler, DeflateHandler};
    use crate::raster::GeoTiffWriter;
    use crate::tiff::constants::{compression, planar_config};
    use crate::tiff::TiffBuilder;
    use std::io::Cursor;

    fn value(band: u32, col: u32, row: u32) -> u8 {
        (band * 100 + row * 10 + col) as u8
    }

    /// 5x3 planar RGB, 4x2 tiles, deflate with predictor
    fn planar_tiled_geotiff() -> Vec<u8> {
        let (width, height, tile_w, tile_h) = (5u32, 3u32, 4u32, 2u32);
        let mut builder = TiffBuilder::new(false);
        let ifd = builder.add_ifd();
        builder.add_long(ifd, tags::IMAGE_WIDTH, width);
        builder.add_long(ifd, tags::IMAGE_LENGTH, height);
        builder.add_shorts(ifd, tags::BITS_PER_SAMPLE, &[8, 8, 8]);
        builder.add_short(ifd, tags::COMPRESSION, compression::DEFLATE);
        builder.add_short(ifd, tags::PHOTOMETRIC_INTERPRETATION, 2);
        builder.add_short(ifd, tags::SAMPLES_PER_PIXEL, 3);
        builder.add_short(ifd, tags::PLANAR_CONFIGURATION, planar_config::PLANAR);
        builder.add_short(ifd, tags::PREDICTOR, predictor::HORIZONTAL_DIFFERENCING);
        builder.add_short(ifd, tags::TILE_WIDTH, tile_w as u16);
        builder.add_short(ifd, tags::TILE_LENGTH, tile_h as u16);
        builder.add_doubles(ifd, tags::MODEL_PIXEL_SCALE_TAG, &[10.0, 10.0, 0.0]);
        builder.add_doubles(ifd, tags::MODEL_TIEPOINT_TAG, &[0.0, 0.0, 0.0, 500_000.0, 2_700_000.0, 0.0]);
        builder.add_shorts(ifd, tags::GEO_KEY_DIRECTORY_TAG,
                           &GeoKeyParser::build_geo_key_directory(&CoordinateSystem::UTM { zone: 38, north: true }));
        builder.add_ascii(ifd, tags::GDAL_NODATA, "0");

        let codec = DeflateHandler::new();
        let mut tiles = Vec::new();
        for band in 0..3 {
            for tile_row in 0..2 {
                for tile_col in 0..2 {
                    let mut tile = vec![0u8; (tile_w * tile_h) as usize];
                    for r in 0..tile_h {
                        for c in 0..tile_w {
                            let (col, row) = (tile_col * tile_w + c, tile_row * tile_h + r);
                            if col < width && row < height {
                                tile[(r * tile_w + c) as usize] = value(band, col, row);
                            }
                        }
                    }
                    predictor_codec::encode_horizontal(&mut tile, tile_w as usize, 1, 1).unwrap();
                    tiles.push(codec.compress(&tile).unwrap());
                }
            }
        }
        builder.set_tiles(ifd, tiles);

        let mut cursor = Cursor::new(Vec::new());
        builder.write_to(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_planar_tiled_window() {
        let dataset = RasterDataset::from_source(RasterSource::Bytes(planar_tiled_geotiff())).unwrap();
        assert_eq!((dataset.width(), dataset.height(), dataset.bands()), (5, 3, 3));
        assert_eq!(dataset.crs(), CoordinateSystem::UTM { zone: 38, north: true });
        assert_eq!(dataset.nodata(), Some("0"));

        let window = dataset.read_window(&Region::new(3, 1, 2, 2)).unwrap();
        for row in 0..2 {
            for col in 0..2 {
                for band in 0..3u16 {
                    assert_eq!(window.sample(col, row, band),
                               Some(value(band as u32, col + 3, row + 1) as u16));
                }
            }
        }
        assert_eq!(window.transform.coefficients[0], 500_030.0);
        assert_eq!(window.transform.coefficients[3], 2_699_990.0);
        assert_eq!(window.nodata.as_deref(), Some("0"));
    }

    #[test]
    fn test_writer_round_trip_sixteen_bit_zstd() {
        let data: Vec<u8> = (0..7 * 4 * 2u32)
            .flat_map(|i| ((i * 977) as u16).to_le_bytes())
            .collect();
        let raster = Raster::new(7, 4, 2, 16, data, GeoTransform::north_up(-20.0, 30.0, 0.25, 0.25),
                                 CoordinateSystem::WGS84).unwrap()
            .with_nodata(Some("65535".to_string()));

        let bytes = GeoTiffWriter::with_compression("zstd", None).unwrap().encode(&raster).unwrap();
        let dataset = RasterDataset::from_source(RasterSource::Bytes(bytes)).unwrap();
        let read = dataset.read_all().unwrap();

        assert_eq!(read.data, raster.data);
        assert_eq!(read.transform, raster.transform);
        assert_eq!(read.crs, CoordinateSystem::WGS84);
        assert_eq!(read.nodata.as_deref(), Some("65535"));
    }

    #[test]
    fn test_photometric_and_extra_samples_survive_rewrite() {
        use crate::tiff::constants::{extra_samples, photometric};

        let transform = GeoTransform::north_up(500_000.0, 2_700_000.0, 10.0, 10.0);
        let utm = CoordinateSystem::UTM { zone: 38, north: true };

        let mut rgba = Raster::new(3, 2, 4, 8, (0..24).collect(), transform, utm).unwrap();
        rgba.extra_samples = vec![extra_samples::UNASSOCIATED_ALPHA];
        let bytes = GeoTiffWriter::default().encode(&rgba).unwrap();
        let dataset = RasterDataset::from_source(RasterSource::Bytes(bytes)).unwrap();
        let window = dataset.read_window(&Region::new(1, 0, 2, 2)).unwrap();
        assert_eq!(window.photometric, photometric::RGB);
        assert_eq!(window.extra_samples, vec![extra_samples::UNASSOCIATED_ALPHA]);

        // Three grey bands stay greyscale with two extra samples
        let mut bands = Raster::new(3, 2, 3, 8, vec![7; 18], transform, utm).unwrap();
        bands.photometric = photometric::BLACK_IS_ZERO;
        let bytes = GeoTiffWriter::with_compression("lzw", None).unwrap().encode(&bands).unwrap();
        let read = RasterDataset::from_source(RasterSource::Bytes(bytes)).unwrap().read_all().unwrap();
        assert_eq!(read.photometric, photometric::BLACK_IS_ZERO);
        assert_eq!(read.extra_samples, vec![extra_samples::UNSPECIFIED; 2]);
        assert_eq!(read.data, bands.data);
    }

    #[test]
    fn test_window_outside_image_is_range_error() {
        let dataset = RasterDataset::from_source(RasterSource::Bytes(planar_tiled_geotiff())).unwrap();
        assert!(matches!(dataset.read_window(&Region::new(4, 0, 2, 1)), Err(DustError::Range(_))));
    }

    #[test]
    fn test_garbage_is_input_error() {
        let result = RasterDataset::from_source(RasterSource::Bytes(b"not a tiff".to_vec()));
        assert!(matches!(result, Err(DustError::Input(_))));
    }
}
