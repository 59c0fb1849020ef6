//! GeoTIFF codec
//!
//! Reading of TIFF/BigTIFF structure and georeferencing, and a
//! little-endian writer for the rasters this crate produces.

pub mod errors;
pub mod ifd;
pub mod types;
pub mod reader;
pub mod builder;
pub mod writer;
pub mod constants;
pub mod geo_key_parser;
pub(crate) mod validation;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use errors::{TiffError, TiffResult};
pub use ifd::{IFD, IFDEntry};
pub use reader::TiffReader;
pub use types::TIFF;
pub use builder::TiffBuilder;
pub use geo_key_parser::{GeoInfo, GeoKeyEntry, GeoKeyParser};
