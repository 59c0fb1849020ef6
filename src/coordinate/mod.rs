//! Coordinate handling for geospatial data
//!
//! Reference systems, the pixel-to-map affine transform and the
//! transforms between supported systems.

mod bbox;
mod point;
mod transform;
mod crs;
mod geotransform;

pub use self::bbox::BoundingBox;
pub use self::point::Point;
pub use self::transform::CoordinateTransformer;
pub use self::crs::{CoordinateSystem, CoordinateSystemFactory};
pub use self::geotransform::GeoTransform;
