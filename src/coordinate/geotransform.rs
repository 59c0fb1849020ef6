//! Affine pixel-to-map transform
//!
//! Coefficients follow GDAL ordering:
//! `x = c0 + col*c1 + row*c2`, `y = c3 + col*c4 + row*c5`.

use super::bbox::BoundingBox;
use super::point::Point;

/// Six-coefficient affine mapping from pixel (column, row) to map (x, y)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub coefficients: [f64; 6],
}

impl GeoTransform {
    /// A north-up transform; `pixel_height` is the (positive) row step
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform {
            coefficients: [origin_x, pixel_width, 0.0, origin_y, 0.0, -pixel_height],
        }
    }

    pub fn from_coefficients(coefficients: [f64; 6]) -> Self {
        GeoTransform { coefficients }
    }

    /// Builds the transform from ModelTiepointTag and ModelPixelScaleTag values
    ///
    /// Only the first tiepoint is used. Returns `None` when either tag is
    /// too short or the scale is degenerate.
    pub fn from_tiepoint_and_scale(tiepoint: &[f64], scale: &[f64]) -> Option<Self> {
        if tiepoint.len() < 6 || scale.len() < 2 || scale[0] == 0.0 || scale[1] == 0.0 {
            return None;
        }

        let (i, j) = (tiepoint[0], tiepoint[1]);
        let (x, y) = (tiepoint[3], tiepoint[4]);
        let (sx, sy) = (scale[0], scale[1]);

        Some(GeoTransform::north_up(x - i * sx, y + j * sy, sx, sy))
    }

    /// Builds the transform from the 4x4 ModelTransformationTag matrix
    pub fn from_model_transformation(matrix: &[f64]) -> Option<Self> {
        if matrix.len() < 16 {
            return None;
        }

        let transform = GeoTransform {
            coefficients: [matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5]],
        };
        transform.invert().map(|_| transform)
    }

    /// The ModelTransformationTag matrix for this transform
    pub fn to_model_transformation(&self) -> [f64; 16] {
        let [c0, c1, c2, c3, c4, c5] = self.coefficients;
        [
            c1, c2, 0.0, c0,
            c4, c5, 0.0, c3,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]
    }

    /// Tiepoint and pixel scale for north-up transforms, `None` when rotated
    pub fn to_tiepoint_and_scale(&self) -> Option<([f64; 6], [f64; 3])> {
        if !self.is_north_up() {
            return None;
        }
        let [c0, c1, _, c3, _, c5] = self.coefficients;
        Some(([0.0, 0.0, 0.0, c0, c3, 0.0], [c1, -c5, 0.0]))
    }

    /// No rotation or shear terms
    pub fn is_north_up(&self) -> bool {
        self.coefficients[2] == 0.0 && self.coefficients[4] == 0.0
    }

    /// Map coordinates of a pixel-grid position
    pub fn apply(&self, col: f64, row: f64) -> Point {
        let [c0, c1, c2, c3, c4, c5] = self.coefficients;
        Point::new(c0 + col * c1 + row * c2, c3 + col * c4 + row * c5)
    }

    /// The inverse mapping (map to pixel), `None` for a singular transform
    pub fn invert(&self) -> Option<GeoTransform> {
        let [c0, c1, c2, c3, c4, c5] = self.coefficients;
        let det = c1 * c5 - c2 * c4;
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let i1 = c5 / det;
        let i2 = -c2 / det;
        let i4 = -c4 / det;
        let i5 = c1 / det;
        Some(GeoTransform {
            coefficients: [-(i1 * c0 + i2 * c3), i1, i2, -(i4 * c0 + i5 * c3), i4, i5],
        })
    }

    /// Transform of a window whose top-left pixel is (`col_off`, `row_off`)
    pub fn window_transform(&self, col_off: u32, row_off: u32) -> GeoTransform {
        let origin = self.apply(col_off as f64, row_off as f64);
        let mut coefficients = self.coefficients;
        coefficients[0] = origin.x;
        coefficients[3] = origin.y;
        GeoTransform { coefficients }
    }

    /// Shift by half a pixel, converting a PixelIsPoint anchor to PixelIsArea
    pub fn shifted_to_pixel_corner(&self) -> GeoTransform {
        self.window_transform_f(-0.5, -0.5)
    }

    fn window_transform_f(&self, col_off: f64, row_off: f64) -> GeoTransform {
        let origin = self.apply(col_off, row_off);
        let mut coefficients = self.coefficients;
        coefficients[0] = origin.x;
        coefficients[3] = origin.y;
        GeoTransform { coefficients }
    }

    /// Envelope of a `width` x `height` grid in map coordinates
    pub fn bounds(&self, width: u32, height: u32) -> BoundingBox {
        let (w, h) = (width as f64, height as f64);
        BoundingBox::envelope(&[
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ])
    }
}
