//! Georeferenced rasters: windowed GeoTIFF decoding and GeoTIFF output

mod region;
mod types;
mod layout;
mod dataset;
mod writer;

pub use region::Region;
pub use types::Raster;
pub use layout::{BlockLayout, BlockRef};
pub use dataset::RasterDataset;
pub use writer::GeoTiffWriter;
