//! Block layout of one image directory
//!
//! Strips are treated as tiles spanning the full image width, so the
//! window reader has a single code path for both organizations.

use log::debug;

use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{planar_config, predictor, sample_format, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

use super::region::Region;

/// Where each block of an image lives and how it is encoded
#[derive(Debug, Clone)]
pub struct BlockLayout {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u16,
    pub bits_per_sample: u16,
    pub planar: bool,
    pub compression: u64,
    pub predictor: u16,
    pub photometric: u16,
    pub tiled: bool,
    pub block_width: u32,
    pub block_height: u32,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
}

/// One block that overlaps a requested window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef {
    /// Index into the offset and byte-count arrays
    pub index: usize,
    /// Band stored in the block, `None` for chunky blocks holding every band
    pub plane: Option<u16>,
    /// Pixel area the block covers, clipped to the image
    pub area: Region,
}

impl BlockLayout {
    /// Read and validate the layout tags of `ifd`
    pub fn from_ifd(tiff_reader: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> TiffResult<Self> {
        let (width, height) = ifd.get_dimensions().ok_or(TiffError::MissingDimensions)?;
        let (width, height) = (width as u32, height as u32);
        let samples_per_pixel = ifd.get_samples_per_pixel() as u16;

        let bits = if ifd.has_tag(tags::BITS_PER_SAMPLE) {
            tiff_reader.read_tag_values(reader, ifd, tags::BITS_PER_SAMPLE)?
        } else {
            vec![1]
        };
        let bits_per_sample = bits[0] as u16;
        if bits.iter().any(|b| *b != bits[0]) || !(bits_per_sample == 8 || bits_per_sample == 16) {
            return Err(TiffError::UnsupportedLayout(format!("BitsPerSample {:?}", bits)));
        }

        if ifd.has_tag(tags::SAMPLE_FORMAT) {
            let formats = tiff_reader.read_tag_values(reader, ifd, tags::SAMPLE_FORMAT)?;
            if formats.iter().any(|f| *f != sample_format::UNSIGNED as u64) {
                return Err(TiffError::UnsupportedLayout(format!("SampleFormat {:?}", formats)));
            }
        }

        let predictor = ifd.get_tag_value(tags::PREDICTOR).unwrap_or(predictor::NONE as u64) as u16;
        if predictor != predictor::NONE && predictor != predictor::HORIZONTAL_DIFFERENCING {
            return Err(TiffError::UnsupportedLayout(format!("Predictor {}", predictor)));
        }

        let planar = ifd.get_tag_value(tags::PLANAR_CONFIGURATION)
            .unwrap_or(planar_config::CHUNKY as u64) == planar_config::PLANAR as u64;

        let tiled = ifd.is_tiled();
        let (block_width, block_height, offsets_tag, counts_tag) = if tiled {
            let tile_width = ifd.get_tag_value(tags::TILE_WIDTH).unwrap_or(0) as u32;
            let tile_height = ifd.get_tag_value(tags::TILE_LENGTH).unwrap_or(0) as u32;
            (tile_width, tile_height, tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
        } else {
            let rows = ifd.get_tag_value(tags::ROWS_PER_STRIP).unwrap_or(height as u64).min(height as u64);
            (width, rows as u32, tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
        };
        if block_width == 0 || block_height == 0 {
            return Err(TiffError::Corrupt(format!("Block size {}x{}", block_width, block_height)));
        }

        let offsets = tiff_reader.read_tag_values(reader, ifd, offsets_tag)?;
        let byte_counts = tiff_reader.read_tag_values(reader, ifd, counts_tag)?;

        let layout = BlockLayout {
            width,
            height,
            samples_per_pixel,
            bits_per_sample,
            planar,
            compression: ifd.get_tag_value(tags::COMPRESSION).unwrap_or(1),
            predictor,
            photometric: ifd.get_tag_value(tags::PHOTOMETRIC_INTERPRETATION).unwrap_or(1) as u16,
            tiled,
            block_width,
            block_height,
            offsets,
            byte_counts,
        };

        let expected = layout.blocks_per_plane() * layout.planes();
        if layout.offsets.len() < expected || layout.byte_counts.len() < expected {
            return Err(TiffError::Corrupt(format!(
                "{} blocks expected, {} offsets and {} byte counts present",
                expected, layout.offsets.len(), layout.byte_counts.len()
            )));
        }

        debug!("Layout: {}x{}, {} bands of {} bits, {} {}x{}, compression {}, predictor {}{}",
               width, height, samples_per_pixel, bits_per_sample,
               if tiled { "tiles" } else { "strips" }, block_width, block_height,
               layout.compression, predictor, if planar { ", planar" } else { "" });
        Ok(layout)
    }

    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample / 8) as usize
    }

    pub fn blocks_across(&self) -> usize {
        self.width.div_ceil(self.block_width) as usize
    }

    pub fn blocks_down(&self) -> usize {
        self.height.div_ceil(self.block_height) as usize
    }

    pub fn blocks_per_plane(&self) -> usize {
        self.blocks_across() * self.blocks_down()
    }

    pub fn planes(&self) -> usize {
        if self.planar { self.samples_per_pixel as usize } else { 1 }
    }

    /// Samples per pixel inside one block
    pub fn block_samples(&self) -> usize {
        if self.planar { 1 } else { self.samples_per_pixel as usize }
    }

    /// Decoded size of one full block row in bytes
    pub fn block_row_bytes(&self) -> usize {
        self.block_width as usize * self.block_samples() * self.bytes_per_sample()
    }

    /// Rows a block actually holds; the last strip may be short, tiles never are
    pub fn block_rows(&self, block_row: usize) -> u32 {
        if self.tiled {
            self.block_height
        } else {
            let start = block_row as u32 * self.block_height;
            self.block_height.min(self.height - start)
        }
    }

    /// Every block that intersects `window`, in file index order
    pub fn blocks_for(&self, window: &Region) -> Vec<BlockRef> {
        if window.is_empty() {
            return Vec::new();
        }

        let first_col = (window.x / self.block_width) as usize;
        let last_col = ((window.end_x() - 1) / self.block_width) as usize;
        let first_row = (window.y / self.block_height) as usize;
        let last_row = ((window.end_y() - 1) / self.block_height) as usize;

        let mut blocks = Vec::new();
        for plane in 0..self.planes() {
            for block_row in first_row..=last_row.min(self.blocks_down() - 1) {
                for block_col in first_col..=last_col.min(self.blocks_across() - 1) {
                    let x = block_col as u32 * self.block_width;
                    let y = block_row as u32 * self.block_height;
                    let area = Region::new(
                        x,
                        y,
                        self.block_width.min(self.width - x),
                        self.block_height.min(self.height - y),
                    );
                    blocks.push(BlockRef {
                        index: plane * self.blocks_per_plane() + block_row * self.blocks_across() + block_col,
                        plane: self.planar.then_some(plane as u16),
                        area,
                    });
                }
            }
        }
        blocks
    }
}
