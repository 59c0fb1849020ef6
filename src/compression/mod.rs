//! Block codecs for GeoTIFF strips and tiles
//!
//! Each supported Compression tag value maps to a `CompressionHandler`.
//! The horizontal differencing predictor is applied on top of the codec.

mod handler;
mod uncompressed;
mod deflate;
mod lzw;
mod factory;
mod zstd;
pub mod predictor;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::DeflateHandler;
pub use lzw::LzwHandler;
pub use factory::CompressionFactory;
pub use zstd::ZstdHandler;
