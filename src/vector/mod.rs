//! GeoJSON output

mod geojson;
mod io;

pub use geojson::{orient_rfc7946, signed_area2, DustProperties, Feature, FeatureCollection, Geometry, Ring};
pub use io::{read_geojson, reproject_to_wgs84, write_geojson};
