//! Reprojection and persistence of feature collections

use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::coordinate::{CoordinateSystem, CoordinateTransformer, Point};
use crate::errors::{DustError, DustResult};

use super::geojson::{orient_rfc7946, FeatureCollection};

/// Reproject every position from `from` to WGS 84 and re-orient the rings
pub fn reproject_to_wgs84(collection: &mut FeatureCollection, from: &CoordinateSystem) {
    let transformer = CoordinateTransformer::new();
    for feature in &mut collection.features {
        let rings = feature.geometry.rings_mut();
        if *from != CoordinateSystem::WGS84 {
            for position in rings.iter_mut().flat_map(|ring| ring.iter_mut()) {
                let point = transformer.to_wgs84(&Point::new(position[0], position[1]), from);
                *position = point.to_position();
            }
        }
        orient_rfc7946(rings);
    }
}

/// Serialize a collection as pretty-printed GeoJSON
pub fn write_geojson(collection: &FeatureCollection, path: &Path) -> DustResult<()> {
    let file = File::create(path)
        .map_err(|e| DustError::Serialization(format!("Cannot create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, collection)
        .map_err(|e| DustError::Serialization(format!("Cannot write {}: {}", path.display(), e)))?;
    writer
        .flush()
        .map_err(|e| DustError::Serialization(format!("Cannot write {}: {}", path.display(), e)))?;
    info!("Wrote {} features to {}", collection.len(), path.display());
    Ok(())
}

/// Read a GeoJSON FeatureCollection written by `write_geojson`
pub fn read_geojson(path: &Path) -> DustResult<FeatureCollection> {
    let file = File::open(path)
        .map_err(|e| DustError::Input(format!("Cannot open {}: {}", path.display(), e)))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| DustError::Input(format!("Invalid GeoJSON in {}: {}", path.display(), e)))
}
