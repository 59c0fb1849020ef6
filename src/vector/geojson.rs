//! GeoJSON types for dust polygons
//!
//! Only what the pipeline emits: a FeatureCollection of Polygon features
//! whose properties carry the mask value.

use serde::{Deserialize, Serialize};

/// A linear ring, closed (first position repeated last)
pub type Ring = Vec<[f64; 2]>;

/// A GeoJSON FeatureCollection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Always "FeatureCollection"
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features.extend(features);
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Every position of every ring, for bounds checks
    pub fn positions(&self) -> impl Iterator<Item = &[f64; 2]> {
        self.features
            .iter()
            .flat_map(|feature| feature.geometry.rings().iter())
            .flat_map(|ring| ring.iter())
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// A GeoJSON Feature
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Always "Feature"
    #[serde(rename = "type")]
    pub type_: String,

    pub geometry: Geometry,

    pub properties: DustProperties,
}

impl Feature {
    /// A dust polygon: exterior ring followed by hole rings
    pub fn polygon(rings: Vec<Ring>) -> Self {
        Self {
            type_: "Feature".to_string(),
            geometry: Geometry::polygon(rings),
            properties: DustProperties::default(),
        }
    }
}

/// Feature properties
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DustProperties {
    /// Mask value of the region; dust is 1
    pub value: u8,
}

impl Default for DustProperties {
    fn default() -> Self {
        DustProperties { value: 1 }
    }
}

/// GeoJSON geometry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    /// First ring is the exterior, the rest are holes
    Polygon { coordinates: Vec<Ring> },
}

impl Geometry {
    pub fn polygon(coordinates: Vec<Ring>) -> Self {
        Geometry::Polygon { coordinates }
    }

    pub fn rings(&self) -> &[Ring] {
        match self {
            Geometry::Polygon { coordinates } => coordinates,
        }
    }

    pub fn rings_mut(&mut self) -> &mut Vec<Ring> {
        match self {
            Geometry::Polygon { coordinates } => coordinates,
        }
    }
}

/// Twice the signed area of a ring; positive when counter-clockwise in
/// a y-up plane
pub fn signed_area2(ring: &[[f64; 2]]) -> f64 {
    ring.windows(2)
        .map(|pair| pair[0][0] * pair[1][1] - pair[1][0] * pair[0][1])
        .sum()
}

/// Orient rings per RFC 7946: exterior counter-clockwise, holes clockwise
pub fn orient_rfc7946(rings: &mut [Ring]) {
    for (i, ring) in rings.iter_mut().enumerate() {
        let ccw = signed_area2(ring) > 0.0;
        let want_ccw = i == 0;
        if ccw != want_ccw {
            ring.reverse();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(ccw: bool) -> Ring {
        let mut ring = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]];
        if !ccw {
            ring.reverse();
        }
        ring
    }

    #[test]
    fn test_serialized_shape() {
        let collection = FeatureCollection::new().with_features(vec![Feature::polygon(vec![square(true)])]);
        let json = serde_json::to_value(&collection).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["type"], "Feature");
        assert_eq!(json["features"][0]["geometry"]["type"], "Polygon");
        assert_eq!(json["features"][0]["properties"]["value"], 1);
        assert_eq!(json["features"][0]["geometry"]["coordinates"][0][1][0], 1.0);
    }

    #[test]
    fn test_orientation() {
        let mut rings = vec![square(false), square(true)];
        orient_rfc7946(&mut rings);
        assert!(signed_area2(&rings[0]) > 0.0);
        assert!(signed_area2(&rings[1]) < 0.0);
    }

    #[test]
    fn test_parse_back() {
        let text = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
            "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]},
            "properties":{"value":1}}]}"#;
        let collection: FeatureCollection = serde_json::from_str(text).unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.positions().count(), 4);
    }
}
