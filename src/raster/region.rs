//! Pixel windows
//!
//! A `Region` is a rectangle in pixel coordinates with (0,0) at the
//! top-left corner of the image.

/// Rectangular pixel window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Column of the top-left pixel
    pub x: u32,
    /// Row of the top-left pixel
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Region { x, y, width, height }
    }

    /// The whole of a `width` x `height` image
    pub fn full(width: u32, height: u32) -> Self {
        Region::new(0, 0, width, height)
    }

    /// Column just right of the region
    pub fn end_x(&self) -> u32 {
        self.x + self.width
    }

    /// Row just below the region
    pub fn end_y(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Overlap with another region, `None` when they are disjoint
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let end_x = self.end_x().min(other.end_x());
        let end_y = self.end_y().min(other.end_y());

        (end_x > x && end_y > y).then(|| Region::new(x, y, end_x - x, end_y - y))
    }
}
