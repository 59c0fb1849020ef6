//! Core TIFF data structures

use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::{new_subfile_type, tags};
use crate::tiff::ifd::IFD;

/// A parsed TIFF file: its directories plus the header facts needed to
/// decode them
#[derive(Debug)]
pub struct TIFF {
    /// Image File Directories in file order
    pub ifds: Vec<IFD>,
    /// Whether this is a BigTIFF format
    pub is_big_tiff: bool,
    /// Byte order declared in the header
    pub byte_order: ByteOrder,
}

impl TIFF {
    /// Creates a new empty TIFF structure
    pub fn new(is_big_tiff: bool, byte_order: ByteOrder) -> Self {
        TIFF {
            ifds: Vec::new(),
            is_big_tiff,
            byte_order,
        }
    }

    /// Returns the main (first) IFD if available
    pub fn main_ifd(&self) -> Option<&IFD> {
        self.ifds.first()
    }

    /// The full-resolution image directory
    ///
    /// Overviews and transparency masks are skipped; GDAL may store them
    /// ahead of the main image in cloud-optimized layouts.
    pub fn image_ifd(&self) -> Option<&IFD> {
        let skip = new_subfile_type::REDUCED_RESOLUTION | new_subfile_type::TRANSPARENCY_MASK;
        self.ifds
            .iter()
            .find(|ifd| ifd.get_tag_value(tags::NEW_SUBFILE_TYPE).unwrap_or(0) & skip == 0)
            .or_else(|| self.main_ifd())
    }
}
