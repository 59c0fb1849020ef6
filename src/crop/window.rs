//! Map-space boxes to pixel windows

use serde::{Deserialize, Serialize};

use crate::coordinate::{BoundingBox, GeoTransform, Point};
use crate::errors::{DustError, DustResult};
use crate::raster::Region;

/// Distance from an integer below which a pixel edge counts as that integer
const EDGE_SNAP: f64 = 1e-6;

/// What to do when the requested box only partly covers the raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Clip the window to the raster
    #[default]
    Clamp,
    /// Fail unless the window lies completely inside the raster
    Strict,
}

impl std::str::FromStr for OverlapPolicy {
    type Err = DustError;

    fn from_str(s: &str) -> DustResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "clamp" => Ok(OverlapPolicy::Clamp),
            "strict" => Ok(OverlapPolicy::Strict),
            other => Err(DustError::Input(format!("Unknown overlap policy '{}'", other))),
        }
    }
}

/// Unclipped pixel window covering `bbox`, which is in the raster's CRS
///
/// Edges are rounded outward: floor of the start, ceil of the end.
/// Returns `(col_start, row_start, col_end, row_end)`, possibly negative
/// or past the image.
pub fn pixel_bounds(bbox: &BoundingBox, transform: &GeoTransform) -> DustResult<(i64, i64, i64, i64)> {
    let inverse = transform
        .invert()
        .ok_or_else(|| DustError::Input("Raster transform is not invertible".to_string()))?;

    let pixels: Vec<Point> = bbox.corners().iter().map(|c| inverse.apply(c.x, c.y)).collect();
    let envelope = BoundingBox::envelope(&pixels);

    Ok((
        snap(envelope.min_x).floor() as i64,
        snap(envelope.min_y).floor() as i64,
        snap(envelope.max_x).ceil() as i64,
        snap(envelope.max_y).ceil() as i64,
    ))
}

fn snap(value: f64) -> f64 {
    if (value - value.round()).abs() < EDGE_SNAP { value.round() } else { value }
}

/// The pixel window of `bbox` on a `width` x `height` raster under `policy`
pub fn window_for(
    bbox: &BoundingBox,
    transform: &GeoTransform,
    width: u32,
    height: u32,
    policy: OverlapPolicy,
) -> DustResult<Region> {
    let (col_start, row_start, col_end, row_end) = pixel_bounds(bbox, transform)?;

    let clipped_col_start = col_start.max(0);
    let clipped_row_start = row_start.max(0);
    let clipped_col_end = col_end.min(width as i64);
    let clipped_row_end = row_end.min(height as i64);

    if clipped_col_end <= clipped_col_start || clipped_row_end <= clipped_row_start {
        return Err(DustError::Range(format!(
            "Pixel window cols {}..{} rows {}..{} does not intersect the {}x{} raster",
            col_start, col_end, row_start, row_end, width, height
        )));
    }

    let clipped = (clipped_col_start, clipped_row_start, clipped_col_end, clipped_row_end);
    if policy == OverlapPolicy::Strict && clipped != (col_start, row_start, col_end, row_end) {
        return Err(DustError::Range(format!(
            "Pixel window cols {}..{} rows {}..{} extends past the {}x{} raster",
            col_start, col_end, row_start, row_end, width, height
        )));
    }

    Ok(Region::new(
        clipped_col_start as u32,
        clipped_row_start as u32,
        (clipped_col_end - clipped_col_start) as u32,
        (clipped_row_end - clipped_row_start) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> GeoTransform {
        GeoTransform::north_up(1000.0, 2000.0, 10.0, 10.0)
    }

    #[test]
    fn test_outward_rounding() {
        let bbox = BoundingBox::new(1015.0, 1955.0, 1041.0, 1990.0);
        let region = window_for(&bbox, &transform(), 100, 100, OverlapPolicy::Clamp).unwrap();
        assert_eq!(region, Region::new(1, 1, 4, 4));
    }

    #[test]
    fn test_exact_edges_do_not_grow() {
        let bbox = BoundingBox::new(1010.0, 1960.0, 1040.0, 1990.0);
        let region = window_for(&bbox, &transform(), 100, 100, OverlapPolicy::Strict).unwrap();
        assert_eq!(region, Region::new(1, 1, 3, 3));
    }

    #[test]
    fn test_partial_overlap_policies() {
        let bbox = BoundingBox::new(950.0, 1960.0, 1020.0, 2050.0);
        let clamped = window_for(&bbox, &transform(), 10, 10, OverlapPolicy::Clamp).unwrap();
        assert_eq!(clamped, Region::new(0, 0, 2, 4));

        let strict = window_for(&bbox, &transform(), 10, 10, OverlapPolicy::Strict);
        assert!(matches!(strict, Err(DustError::Range(_))));
    }

    #[test]
    fn test_disjoint_is_range_error() {
        let bbox = BoundingBox::new(5000.0, 5000.0, 6000.0, 6000.0);
        let result = window_for(&bbox, &transform(), 10, 10, OverlapPolicy::Clamp);
        assert!(matches!(result, Err(DustError::Range(_))));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Strict".parse::<OverlapPolicy>().unwrap(), OverlapPolicy::Strict);
        assert!("loose".parse::<OverlapPolicy>().is_err());
    }
}
