//! Bounding box structure for defining regions

use super::point::Point;

/// An axis-aligned box in some coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum X coordinate
    pub min_x: f64,
    /// Minimum Y coordinate
    pub min_y: f64,
    /// Maximum X coordinate
    pub max_x: f64,
    /// Maximum Y coordinate
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox { min_x, min_y, max_x, max_y }
    }

    /// Parse a bounding box from a string (format: "minx,miny,maxx,maxy")
    pub fn from_string(bbox_str: &str) -> Result<Self, String> {
        let parts: Vec<&str> = bbox_str.split(',').collect();
        if parts.len() != 4 {
            return Err("Bounding box must have 4 comma-separated values".to_string());
        }

        let mut values = [0.0f64; 4];
        for (value, (part, name)) in values.iter_mut().zip(parts.iter().zip(["min_x", "min_y", "max_x", "max_y"])) {
            *value = part.trim().parse::<f64>()
                .map_err(|_| format!("Invalid {} value: '{}'", name, part.trim()))?;
        }

        let bbox = BoundingBox::new(values[0], values[1], values[2], values[3]);
        bbox.validate()?;
        Ok(bbox)
    }

    /// Smallest box containing every point
    pub fn envelope(points: &[Point]) -> Self {
        points.iter().fold(
            BoundingBox::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |acc, p| BoundingBox::new(acc.min_x.min(p.x), acc.min_y.min(p.y), acc.max_x.max(p.x), acc.max_y.max(p.y)),
        )
    }

    /// Finite bounds with min strictly below max on both axes
    pub fn validate(&self) -> Result<(), String> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y].iter().all(|v| v.is_finite());
        if !finite {
            return Err(format!("Bounding box has non-finite bounds: {:?}", self));
        }
        if self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(format!(
                "Bounding box min must be below max on both axes: ({}, {}, {}, {})",
                self.min_x, self.min_y, self.max_x, self.max_y
            ));
        }
        Ok(())
    }

    /// The four corners, counter-clockwise from (min_x, min_y)
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}
