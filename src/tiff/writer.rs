//! TIFF file layout and serialization
//!
//! Lays out a little-endian TIFF as header, IFDs, out-of-line tag data and
//! finally strip or tile data, each block aligned to a 4-byte boundary.
//! Block offsets are only known once the layout is done, so they are patched
//! into the StripOffsets values here.

use crate::tiff::constants::{field_types, header};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFD, IFDEntry};
use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::io::{Seek, SeekFrom, Write};

/// Out-of-line tag data keyed by (IFD index, tag)
pub type ExternalData = BTreeMap<(usize, u16), Vec<u8>>;
/// Strip or tile payloads keyed by IFD index, with the tag that holds their offsets
pub type StripData = BTreeMap<usize, (u16, Vec<Vec<u8>>)>;

/// Writes assembled IFDs and data blocks to a stream
pub struct TiffWriter;

impl TiffWriter {
    /// Write a complete TIFF
    pub fn write<W: Write + Seek>(
        writer: &mut W,
        is_big_tiff: bool,
        ifds: &[IFD],
        external_data: &ExternalData,
        strips: &StripData,
    ) -> TiffResult<()> {
        let sorted_ifds: Vec<IFD> = ifds
            .iter()
            .map(|ifd| {
                let mut sorted = ifd.clone();
                sorted.entries = unique_sorted_entries(&ifd.entries);
                sorted
            })
            .collect();

        let header_size = if is_big_tiff { 16 } else { 8 };
        let mut current_offset = header_size;

        let mut ifd_offsets = Vec::with_capacity(sorted_ifds.len());
        for ifd in &sorted_ifds {
            ifd_offsets.push(current_offset);
            current_offset += Self::calculate_ifd_size(ifd, is_big_tiff);
        }

        let mut tag_data_offsets = BTreeMap::new();
        for (key, data) in external_data {
            tag_data_offsets.insert(*key, current_offset);
            current_offset = align_to_4_bytes(current_offset + data.len() as u64);
        }

        let mut strip_offsets: BTreeMap<usize, Vec<u64>> = BTreeMap::new();
        for (ifd_index, (_, ifd_strips)) in strips {
            let offsets = strip_offsets.entry(*ifd_index).or_default();
            for strip in ifd_strips {
                offsets.push(current_offset);
                current_offset = align_to_4_bytes(current_offset + strip.len() as u64);
            }
        }

        if !is_big_tiff && current_offset > u32::MAX as u64 {
            return Err(TiffError::GenericError(format!(
                "{} bytes do not fit a classic TIFF; BigTIFF is required",
                current_offset
            )));
        }
        debug!("TIFF layout: {} IFDs, {} tag blocks, {} total bytes",
               sorted_ifds.len(), external_data.len(), current_offset);

        // Patch block offsets into their tag values
        let mut external_data = external_data.clone();
        let mut sorted_ifds = sorted_ifds;
        for (ifd_index, offsets) in &strip_offsets {
            let offsets_tag = strips[ifd_index].0;
            let key = (*ifd_index, offsets_tag);
            if let Some(bytes) = external_data.get_mut(&key) {
                *bytes = encode_offsets(offsets, is_big_tiff);
            } else if let Some(ifd) = sorted_ifds.get_mut(*ifd_index) {
                if let Some(entry) = ifd.entries.iter_mut().find(|e| e.tag == offsets_tag) {
                    entry.value_offset = offsets.first().copied().unwrap_or(0);
                }
            }
        }

        Self::write_header(writer, is_big_tiff, ifd_offsets.first().copied().unwrap_or(0))?;

        for (i, ifd) in sorted_ifds.iter().enumerate() {
            let next_ifd_offset = ifd_offsets.get(i + 1).copied().unwrap_or(0);
            writer.seek(SeekFrom::Start(ifd_offsets[i]))?;
            Self::write_ifd(writer, ifd, next_ifd_offset, &tag_data_offsets, i, is_big_tiff)?;
        }

        for (key, data) in &external_data {
            if let Some(offset) = tag_data_offsets.get(key) {
                writer.seek(SeekFrom::Start(*offset))?;
                writer.write_all(data)?;
                write_padding(writer, data.len())?;
            }
        }

        for (ifd_index, (_, ifd_strips)) in strips {
            let offsets = &strip_offsets[ifd_index];
            for (strip, offset) in ifd_strips.iter().zip(offsets) {
                writer.seek(SeekFrom::Start(*offset))?;
                writer.write_all(strip)?;
                write_padding(writer, strip.len())?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    /// Header with the byte order mark, version and first IFD offset
    fn write_header(writer: &mut impl Write, is_big_tiff: bool, first_ifd_offset: u64) -> TiffResult<()> {
        writer.write_all(&header::LITTLE_ENDIAN_MARKER)?;

        if is_big_tiff {
            writer.write_all(&header::BIG_TIFF_VERSION.to_le_bytes())?;
            writer.write_all(&header::BIGTIFF_OFFSET_SIZE.to_le_bytes())?;
            writer.write_all(&[0u8, 0])?;
            writer.write_all(&first_ifd_offset.to_le_bytes())?;
        } else {
            writer.write_all(&header::TIFF_VERSION.to_le_bytes())?;
            writer.write_all(&(first_ifd_offset as u32).to_le_bytes())?;
        }

        Ok(())
    }

    /// Byte size of an IFD: count, entries, next-IFD offset
    fn calculate_ifd_size(ifd: &IFD, is_big_tiff: bool) -> u64 {
        let entries_count = ifd.entries.len() as u64;
        if is_big_tiff {
            8 + (20 * entries_count) + 8
        } else {
            2 + (12 * entries_count) + 4
        }
    }

    fn write_ifd(
        writer: &mut (impl Write + Seek),
        ifd: &IFD,
        next_offset: u64,
        tag_offsets: &BTreeMap<(usize, u16), u64>,
        ifd_index: usize,
        is_big_tiff: bool,
    ) -> TiffResult<()> {
        if is_big_tiff {
            writer.write_all(&(ifd.entries.len() as u64).to_le_bytes())?;
        } else {
            writer.write_all(&(ifd.entries.len() as u16).to_le_bytes())?;
        }

        for entry in &ifd.entries {
            let value_offset = tag_offsets
                .get(&(ifd_index, entry.tag))
                .copied()
                .unwrap_or(entry.value_offset);

            writer.write_all(&entry.tag.to_le_bytes())?;
            writer.write_all(&entry.field_type.to_le_bytes())?;

            if is_big_tiff {
                writer.write_all(&entry.count.to_le_bytes())?;
                writer.write_all(&value_offset.to_le_bytes())?;
            } else {
                writer.write_all(&(entry.count as u32).to_le_bytes())?;
                writer.write_all(&(value_offset as u32).to_le_bytes())?;
            }
        }

        if is_big_tiff {
            writer.write_all(&next_offset.to_le_bytes())?;
        } else {
            writer.write_all(&(next_offset as u32).to_le_bytes())?;
        }

        Ok(())
    }
}

/// Offset field type used for strip offsets
pub fn offset_field_type(is_big_tiff: bool) -> u16 {
    if is_big_tiff { field_types::LONG8 } else { field_types::LONG }
}

fn encode_offsets(offsets: &[u64], is_big_tiff: bool) -> Vec<u8> {
    if is_big_tiff {
        offsets.iter().flat_map(|o| o.to_le_bytes()).collect()
    } else {
        offsets.iter().flat_map(|o| (*o as u32).to_le_bytes()).collect()
    }
}

/// Next 4-byte aligned position
pub fn align_to_4_bytes(offset: u64) -> u64 {
    (offset + 3) & !3
}

fn write_padding(writer: &mut impl Write, data_len: usize) -> TiffResult<()> {
    let padding = (4 - (data_len % 4)) % 4;
    if padding > 0 {
        writer.write_all(&[0u8; 3][..padding])?;
    }
    Ok(())
}

/// Entries sorted by tag, last occurrence of a tag wins
fn unique_sorted_entries(entries: &[IFDEntry]) -> Vec<IFDEntry> {
    let mut seen_tags = HashSet::new();
    let mut unique: Vec<IFDEntry> = entries
        .iter()
        .rev()
        .filter(|entry| seen_tags.insert(entry.tag))
        .cloned()
        .collect();
    unique.sort_by_key(|entry| entry.tag);
    unique
}
