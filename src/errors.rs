//! Pipeline error taxonomy
//!
//! Each stage reports one of these so a caller (or the batch driver) can
//! tell which step failed and decide whether to skip, retry or abort.

use thiserror::Error;

use crate::tiff::errors::TiffError;

/// Failures of the crop and dust-extraction pipeline
#[derive(Debug, Error)]
pub enum DustError {
    /// Unreadable or malformed raster, too few bands, bad parameters
    #[error("input error: {0}")]
    Input(String),

    /// The requested crop window does not intersect the raster
    #[error("range error: {0}")]
    Range(String),

    /// The pixels cannot be interpreted as an RGB triple
    #[error("classification error: {0}")]
    Classification(String),

    /// An output artifact could not be encoded or written
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The configuration file is missing, unreadable or invalid
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for pipeline operations
pub type DustResult<T> = Result<T, DustError>;

impl DustError {
    /// Wrap a codec failure raised while reading an input raster
    pub fn reading(source: &str, err: TiffError) -> Self {
        DustError::Input(format!("{}: {}", source, err))
    }

    /// Wrap a codec failure raised while writing an output raster
    pub fn writing(target: &str, err: TiffError) -> Self {
        DustError::Serialization(format!("{}: {}", target, err))
    }

    /// Short stage name, used in batch reports
    pub fn kind(&self) -> &'static str {
        match self {
            DustError::Input(_) => "input",
            DustError::Range(_) => "range",
            DustError::Classification(_) => "classification",
            DustError::Serialization(_) => "serialization",
            DustError::Config(_) => "config",
        }
    }
}
