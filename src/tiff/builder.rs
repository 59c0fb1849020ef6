//! TIFF builder
//!
//! Collects IFD entries, out-of-line tag data and strips, then hands them
//! to `TiffWriter`. Values that fit the entry's value field are packed
//! inline; anything larger goes to the external data area.

use log::info;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use crate::tiff::constants::{field_types, tags};
use crate::tiff::errors::TiffResult;
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::writer::{self, ExternalData, StripData, TiffWriter};

/// Builder for little-endian TIFF files
pub struct TiffBuilder {
    is_big_tiff: bool,
    ifds: Vec<IFD>,
    external_data: ExternalData,
    strips: StripData,
}

impl TiffBuilder {
    /// Create a new builder
    pub fn new(is_big_tiff: bool) -> Self {
        TiffBuilder {
            is_big_tiff,
            ifds: Vec::new(),
            external_data: ExternalData::new(),
            strips: StripData::new(),
        }
    }

    /// Append an empty IFD and return its index
    pub fn add_ifd(&mut self) -> usize {
        let index = self.ifds.len();
        self.ifds.push(IFD::new(index, 0));
        index
    }

    /// Access an IFD that has been added
    pub fn ifd(&self, ifd_index: usize) -> Option<&IFD> {
        self.ifds.get(ifd_index)
    }

    /// Add a tag from its little-endian value bytes
    pub fn add_value_bytes(&mut self, ifd_index: usize, tag: u16, field_type: u16, count: u64, bytes: Vec<u8>) {
        let inline_size = if self.is_big_tiff { 8 } else { 4 };

        let value_offset = if bytes.len() <= inline_size {
            let mut packed = [0u8; 8];
            packed[..bytes.len()].copy_from_slice(&bytes);
            u64::from_le_bytes(packed)
        } else {
            self.external_data.insert((ifd_index, tag), bytes);
            0
        };

        if let Some(ifd) = self.ifds.get_mut(ifd_index) {
            ifd.add_entry(IFDEntry::new(tag, field_type, count, value_offset));
        }
    }

    pub fn add_short(&mut self, ifd_index: usize, tag: u16, value: u16) {
        self.add_shorts(ifd_index, tag, &[value]);
    }

    pub fn add_shorts(&mut self, ifd_index: usize, tag: u16, values: &[u16]) {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.add_value_bytes(ifd_index, tag, field_types::SHORT, values.len() as u64, bytes);
    }

    pub fn add_long(&mut self, ifd_index: usize, tag: u16, value: u32) {
        self.add_value_bytes(ifd_index, tag, field_types::LONG, 1, value.to_le_bytes().to_vec());
    }

    pub fn add_doubles(&mut self, ifd_index: usize, tag: u16, values: &[f64]) {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.add_value_bytes(ifd_index, tag, field_types::DOUBLE, values.len() as u64, bytes);
    }

    /// Add a NUL-terminated ASCII tag
    pub fn add_ascii(&mut self, ifd_index: usize, tag: u16, value: &str) {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        let count = bytes.len() as u64;
        self.add_value_bytes(ifd_index, tag, field_types::ASCII, count, bytes);
    }

    /// Attach encoded strips, setting StripOffsets and StripByteCounts
    pub fn set_strips(&mut self, ifd_index: usize, strips: Vec<Vec<u8>>) {
        self.set_blocks(ifd_index, tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS, strips);
    }

    /// Attach encoded tiles, setting TileOffsets and TileByteCounts
    pub fn set_tiles(&mut self, ifd_index: usize, tiles: Vec<Vec<u8>>) {
        self.set_blocks(ifd_index, tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS, tiles);
    }

    fn set_blocks(&mut self, ifd_index: usize, offsets_tag: u16, counts_tag: u16, blocks: Vec<Vec<u8>>) {
        let count = blocks.len() as u64;
        let offset_type = writer::offset_field_type(self.is_big_tiff);
        let offset_size = field_types::size_of(offset_type);

        // Offsets are patched by the writer; reserve their space now
        self.add_value_bytes(ifd_index, offsets_tag, offset_type, count, vec![0u8; offset_size * blocks.len()]);

        let byte_counts: Vec<u8> = if self.is_big_tiff {
            blocks.iter().flat_map(|b| (b.len() as u64).to_le_bytes()).collect()
        } else {
            blocks.iter().flat_map(|b| (b.len() as u32).to_le_bytes()).collect()
        };
        self.add_value_bytes(ifd_index, counts_tag, offset_type, count, byte_counts);

        self.strips.insert(ifd_index, (offsets_tag, blocks));
    }

    /// Write the TIFF to any seekable sink
    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> TiffResult<()> {
        TiffWriter::write(writer, self.is_big_tiff, &self.ifds, &self.external_data, &self.strips)
    }

    /// Write the TIFF to a file
    pub fn write(&self, output_path: &Path) -> TiffResult<()> {
        info!("Writing TIFF to {}", output_path.display());
        let file = File::create(output_path)?;
        let mut writer = BufWriter::with_capacity(1024 * 1024, file);
        self.write_to(&mut writer)
    }
}
