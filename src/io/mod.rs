//! I/O plumbing shared by the TIFF reader and the raster loader

pub mod seekable;
pub mod byte_order;

pub use seekable::{RasterSource, SeekableReader};
