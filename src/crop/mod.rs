//! Region cropping: bounding box to pixel window to cropped raster

mod window;
mod cropper;

pub use window::{pixel_bounds, window_for, OverlapPolicy};
pub use cropper::RegionCropper;
