//! Error types for the GeoTIFF codec layer

use std::io;
use thiserror::Error;

/// Failures raised while decoding or encoding TIFF structures
#[derive(Debug, Error)]
pub enum TiffError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    /// Invalid byte order marker
    #[error("Invalid byte order marker: {0:#06x}")]
    InvalidByteOrder(u16),
    /// Invalid BigTIFF header
    #[error("Invalid BigTIFF header")]
    InvalidBigTIFFHeader,
    /// Unsupported TIFF version
    #[error("Unsupported TIFF version: {0}")]
    UnsupportedVersion(u16),
    /// The file has no image directory
    #[error("TIFF contains no image directory")]
    NoImage,
    /// Tag not found
    #[error("Tag not found: {0}")]
    TagNotFound(u16),
    /// Unsupported field type
    #[error("Unsupported field type {field_type} for tag {tag}")]
    UnsupportedFieldType { tag: u16, field_type: u16 },
    /// Unsupported compression method
    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(u64),
    /// Pixel layout this codec does not decode (bit depth, sample format, predictor)
    #[error("Unsupported pixel layout: {0}")]
    UnsupportedLayout(String),
    /// Image dimensions not found
    #[error("Image dimensions not found")]
    MissingDimensions,
    /// Offsets or counts that point outside the file or disagree with each other
    #[error("Corrupt TIFF data: {0}")]
    Corrupt(String),
    /// Generic error with message
    #[error("TIFF error: {0}")]
    GenericError(String),
}

/// Result type for TIFF operations
pub type TiffResult<T> = Result<T, TiffError>;

impl From<String> for TiffError {
    fn from(msg: String) -> Self {
        TiffError::GenericError(msg)
    }
}
