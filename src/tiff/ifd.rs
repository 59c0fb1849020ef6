//! Image File Directory (IFD) structures and methods
//!
//! An IFD is the list of tag entries describing one image in a TIFF file.
//! Entries keep the raw bytes of their value field so small values stored
//! inline can be decoded in the file's own byte order later on.

use std::collections::HashMap;
use log::trace;

use crate::tiff::constants::{field_types, tags};

/// Represents an Image File Directory (IFD) in a TIFF file
#[derive(Debug, Clone)]
pub struct IFD {
    /// Entries in this IFD
    pub entries: Vec<IFDEntry>,
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in the file
    pub offset: u64,
    /// Index into `entries` by tag
    tag_map: HashMap<u16, usize>,
}

/// Represents an entry in an Image File Directory (IFD)
#[derive(Debug, Clone)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Offset to the values, or the single value itself when it fits inline
    pub value_offset: u64,
    /// The value field exactly as stored (4 bytes in TIFF, 8 in BigTIFF)
    pub raw_value: Vec<u8>,
}

impl IFDEntry {
    /// Creates a new IFD entry with no raw value bytes
    pub fn new(tag: u16, field_type: u16, count: u64, value_offset: u64) -> Self {
        Self {
            tag,
            field_type,
            count,
            value_offset,
            raw_value: Vec::new(),
        }
    }

    /// Creates an entry as decoded from a file
    pub fn with_raw_value(tag: u16, field_type: u16, count: u64, value_offset: u64, raw_value: Vec<u8>) -> Self {
        Self {
            tag,
            field_type,
            count,
            value_offset,
            raw_value,
        }
    }

    /// Size in bytes of all values of this entry
    pub fn data_size(&self) -> u64 {
        field_types::size_of(self.field_type) as u64 * self.count
    }

    /// Whether the values live in the entry's value field
    pub fn is_value_inline(&self, is_big_tiff: bool) -> bool {
        let inline_size = if is_big_tiff { 8 } else { 4 };
        self.data_size() <= inline_size
    }
}

impl IFD {
    /// Creates an empty IFD
    pub fn new(number: usize, offset: u64) -> Self {
        Self {
            entries: Vec::new(),
            number,
            offset,
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry, replacing any earlier entry with the same tag
    pub fn add_entry(&mut self, entry: IFDEntry) {
        trace!("IFD #{}: tag {} type {} count {} value/offset {}",
               self.number, entry.tag, entry.field_type, entry.count, entry.value_offset);

        match self.tag_map.get(&entry.tag) {
            Some(&index) => self.entries[index] = entry,
            None => {
                self.tag_map.insert(entry.tag, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Gets a tag value (value_offset) directly
    pub fn get_tag_value(&self, tag: u16) -> Option<u64> {
        self.get_entry(tag).map(|entry| entry.value_offset)
    }

    /// Checks if this IFD has a specific tag
    pub fn has_tag(&self, tag: u16) -> bool {
        self.tag_map.contains_key(&tag)
    }

    /// Gets an IFD entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag).map(|&index| &self.entries[index])
    }

    /// Width and height of the image, if both tags are present
    pub fn get_dimensions(&self) -> Option<(u64, u64)> {
        let width = self.get_tag_value(tags::IMAGE_WIDTH)?;
        let height = self.get_tag_value(tags::IMAGE_LENGTH)?;
        Some((width, height))
    }

    /// Number of samples per pixel (1 when the tag is absent)
    pub fn get_samples_per_pixel(&self) -> u64 {
        self.get_tag_value(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Whether the image data is organized in tiles rather than strips
    pub fn is_tiled(&self) -> bool {
        self.has_tag(tags::TILE_OFFSETS)
    }

    /// Gets the number of entries in this IFD
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_entry_replaces_same_tag() {
        let mut ifd = IFD::new(0, 8);
        ifd.add_entry(IFDEntry::new(tags::IMAGE_WIDTH, field_types::LONG, 1, 10));
        ifd.add_entry(IFDEntry::new(tags::IMAGE_WIDTH, field_types::LONG, 1, 20));

        assert_eq!(ifd.entry_count(), 1);
        assert_eq!(ifd.get_tag_value(tags::IMAGE_WIDTH), Some(20));
    }

    #[test]
    fn test_inline_detection() {
        let short_pair = IFDEntry::new(tags::BITS_PER_SAMPLE, field_types::SHORT, 2, 0);
        let short_triple = IFDEntry::new(tags::BITS_PER_SAMPLE, field_types::SHORT, 3, 0);
        let double = IFDEntry::new(tags::MODEL_PIXEL_SCALE_TAG, field_types::DOUBLE, 1, 0);

        assert!(short_pair.is_value_inline(false));
        assert!(!short_triple.is_value_inline(false));
        assert!(!double.is_value_inline(false));
        assert!(double.is_value_inline(true));
    }
}
