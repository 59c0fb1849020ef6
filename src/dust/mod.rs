//! Dust detection on RGB rasters

mod classifier;
mod mask;
pub mod morphology;
mod vectorize;
mod extractor;

pub use classifier::{rgb_to_hsv, ClassifierRule, HsvRange, PixelClassifier, RgbThreshold};
pub use mask::Mask;
pub use vectorize::{label_regions, ring_area, trace_polygons, Connectivity, PixelPolygon, Vertex};
pub use extractor::{to_map_features, DustExtractor, ExtractOptions, Extraction};
