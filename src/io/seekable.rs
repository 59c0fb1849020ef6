//! Raster byte sources
//!
//! The reader works over anything that can both read and seek, so a
//! GeoTIFF on disk and one already held in memory go through the same code.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}

/// Where the bytes of a raster come from
#[derive(Debug, Clone)]
pub enum RasterSource {
    /// A GeoTIFF file on disk
    File(PathBuf),
    /// A complete GeoTIFF held in memory
    Bytes(Vec<u8>),
}

impl RasterSource {
    /// Source for a file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        RasterSource::File(path.as_ref().to_path_buf())
    }

    /// Human-readable label used in log lines and error messages
    pub fn label(&self) -> String {
        match self {
            RasterSource::File(path) => path.display().to_string(),
            RasterSource::Bytes(bytes) => format!("<memory: {} bytes>", bytes.len()),
        }
    }

    /// The file path, when the source is one
    pub fn path(&self) -> Option<&Path> {
        match self {
            RasterSource::File(path) => Some(path),
            RasterSource::Bytes(_) => None,
        }
    }

    /// Opens a fresh reader positioned at the start of the data
    pub fn open(&self) -> std::io::Result<Box<dyn SeekableReader + '_>> {
        match self {
            RasterSource::File(path) => {
                let file = File::open(path)?;
                Ok(Box::new(BufReader::with_capacity(1024 * 1024, file)))
            }
            RasterSource::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes.as_slice()))),
        }
    }
}
