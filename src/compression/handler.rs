//! Compression handler trait definition

use crate::tiff::errors::TiffResult;

/// Strategy trait for the codec of one Compression tag value
pub trait CompressionHandler: Send + Sync {
    /// Decode one strip or tile
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    /// Encode one strip or tile
    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    fn name(&self) -> &'static str;

    /// Compression tag value written for blocks this handler encodes
    fn code(&self) -> u16;
}
