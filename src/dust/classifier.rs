//! Per-pixel dust classification
//!
//! Two rule families are available: an inclusive box in 8-bit HSV space
//! and a set of per-channel RGB thresholds.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::errors::{DustError, DustResult};

/// Decides whether one RGB pixel is dust
pub trait PixelClassifier {
    fn is_dust(&self, r: u8, g: u8, b: u8) -> bool;

    fn describe(&self) -> String;
}

const HSV_SHIFT: u32 = 12;
const HSV_ROUND: i32 = 1 << (HSV_SHIFT - 1);

lazy_static! {
    // Rounded reciprocals: 255 * 2^12 / v for saturation, 30 * 2^12 / diff for hue
    static ref SATURATION_DIVISORS: [i32; 256] = reciprocal_table(255 << HSV_SHIFT, 1.0);
    static ref HUE_DIVISORS: [i32; 256] = reciprocal_table(180 << HSV_SHIFT, 6.0);
}

fn reciprocal_table(numerator: i32, scale: f64) -> [i32; 256] {
    let mut table = [0i32; 256];
    for (i, entry) in table.iter_mut().enumerate().skip(1) {
        *entry = (numerator as f64 / (scale * i as f64)).round_ties_even() as i32;
    }
    table
}

/// RGB to HSV on the 8-bit scale used by OpenCV
///
/// H is in `[0, 180)`, S and V in `[0, 255]`. The arithmetic is the
/// fixed-point path of OpenCV's `RGB2HSV` for 8-bit images, so results
/// agree with it bit for bit, including at range boundaries. When two
/// channels tie for the maximum, red wins over green and green over blue.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let s = (diff * SATURATION_DIVISORS[v as usize] + HSV_ROUND) >> HSV_SHIFT;

    let numerator = if v == r {
        g - b
    } else if v == g {
        b - r + 2 * diff
    } else {
        r - g + 4 * diff
    };
    // Arithmetic shift floors negative hues before the wrap
    let mut h = (numerator * HUE_DIVISORS[diff as usize] + HSV_ROUND) >> HSV_SHIFT;
    if h < 0 {
        h += 180;
    }

    [h as u8, s as u8, v as u8]
}

/// Inclusive bounds in 8-bit HSV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    /// Pink to violet hues at any brightness above a low floor
    pub const CANONICAL: HsvRange = HsvRange { lower: [140, 40, 40], upper: [170, 255, 255] };
    /// Same hues with a raised saturation and value floor
    pub const BRIGHT: HsvRange = HsvRange { lower: [140, 50, 100], upper: [170, 255, 255] };

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

impl Default for HsvRange {
    fn default() -> Self {
        HsvRange::CANONICAL
    }
}

impl PixelClassifier for HsvRange {
    fn is_dust(&self, r: u8, g: u8, b: u8) -> bool {
        self.contains(rgb_to_hsv(r, g, b))
    }

    fn describe(&self) -> String {
        format!("HSV {:?}..={:?}", self.lower, self.upper)
    }
}

/// `R > red_above && G < green_below && B > blue_above`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RgbThreshold {
    pub red_above: u8,
    pub green_below: u8,
    pub blue_above: u8,
}

impl Default for RgbThreshold {
    fn default() -> Self {
        RgbThreshold { red_above: 170, green_below: 113, blue_above: 127 }
    }
}

impl PixelClassifier for RgbThreshold {
    fn is_dust(&self, r: u8, g: u8, b: u8) -> bool {
        r > self.red_above && g < self.green_below && b > self.blue_above
    }

    fn describe(&self) -> String {
        format!("RGB R>{} G<{} B>{}", self.red_above, self.green_below, self.blue_above)
    }
}

/// The configured classification rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "lowercase")]
pub enum ClassifierRule {
    Hsv(HsvRange),
    Rgb(RgbThreshold),
}

impl Default for ClassifierRule {
    fn default() -> Self {
        ClassifierRule::Hsv(HsvRange::CANONICAL)
    }
}

impl ClassifierRule {
    /// Names accepted by `from_name`
    pub const NAMES: [&'static str; 3] = ["canonical", "bright", "rgb"];

    /// A preset by name
    pub fn from_name(name: &str) -> DustResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "canonical" | "hsv" => Ok(ClassifierRule::Hsv(HsvRange::CANONICAL)),
            "bright" => Ok(ClassifierRule::Hsv(HsvRange::BRIGHT)),
            "rgb" => Ok(ClassifierRule::Rgb(RgbThreshold::default())),
            other => Err(DustError::Input(format!(
                "Unknown classifier rule '{}', expected one of {:?}", other, Self::NAMES
            ))),
        }
    }
}

impl PixelClassifier for ClassifierRule {
    fn is_dust(&self, r: u8, g: u8, b: u8) -> bool {
        match self {
            ClassifierRule::Hsv(range) => range.is_dust(r, g, b),
            ClassifierRule::Rgb(threshold) => threshold.is_dust(r, g, b),
        }
    }

    fn describe(&self) -> String {
        match self {
            ClassifierRule::Hsv(range) => range.describe(),
            ClassifierRule::Rgb(threshold) => threshold.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_matches_opencv_scale() {
        assert_eq!(rgb_to_hsv(255, 0, 0), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 255, 0), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 0, 255), [120, 255, 255]);
        assert_eq!(rgb_to_hsv(200, 20, 200), [150, 229, 200]);
        assert_eq!(rgb_to_hsv(0, 0, 0), [0, 0, 0]);
        assert_eq!(rgb_to_hsv(90, 90, 90), [0, 0, 90]);
    }

    #[test]
    fn test_hsv_boundary_colours() {
        // One hue step below the canonical floor; float rounding lands on 140
        assert_eq!(rgb_to_hsv(41, 0, 63), [139, 255, 63]);
        assert_eq!(rgb_to_hsv(42, 1, 64), [139, 251, 64]);
        assert_eq!(rgb_to_hsv(43, 2, 65), [139, 247, 65]);
        for (r, g, b) in [(41, 0, 63), (42, 1, 64), (43, 2, 65)] {
            assert!(!HsvRange::CANONICAL.is_dust(r, g, b));
        }
        assert_eq!(rgb_to_hsv(80, 10, 80), [150, 223, 80]);
    }

    fn round_half_even(numerator: i64, denominator: i64) -> i32 {
        let (q, r) = (numerator / denominator, numerator % denominator);
        let q = match (2 * r).cmp(&denominator) {
            std::cmp::Ordering::Less => q,
            std::cmp::Ordering::Greater => q + 1,
            std::cmp::Ordering::Equal => q + (q & 1),
        };
        q as i32
    }

    // Integer-only restatement of the 8-bit OpenCV conversion
    fn reference_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
        let (r, g, b) = (r as i32, g as i32, b as i32);
        let v = r.max(g).max(b);
        let diff = v - r.min(g).min(b);
        let sdiv = if v == 0 { 0 } else { round_half_even(255 << 12, v as i64) };
        let hdiv = if diff == 0 { 0 } else { round_half_even(180 << 12, 6 * diff as i64) };
        let numerator = match v {
            _ if v == r => g - b,
            _ if v == g => b - r + 2 * diff,
            _ => r - g + 4 * diff,
        };
        let s = (diff * sdiv + 2048) >> 12;
        let h = ((numerator * hdiv + 2048) >> 12).rem_euclid(180);
        [h as u8, s as u8, v as u8]
    }

    #[test]
    fn test_hsv_agrees_with_integer_reference() {
        for r in (0..=255u8).step_by(3) {
            for g in (0..=255u8).step_by(5) {
                for b in 0..=255u8 {
                    let hsv = rgb_to_hsv(r, g, b);
                    assert_eq!(hsv, reference_hsv(r, g, b), "rgb ({}, {}, {})", r, g, b);
                    assert!(hsv[0] < 180);
                }
            }
        }
    }

    #[test]
    fn test_presets() {
        assert!(HsvRange::CANONICAL.is_dust(200, 20, 200));
        assert!(!HsvRange::CANONICAL.is_dust(20, 200, 20));
        // Dark magenta passes the canonical floor but not the bright one
        assert!(HsvRange::CANONICAL.is_dust(80, 10, 80));
        assert!(!HsvRange::BRIGHT.is_dust(80, 10, 80));
    }

    #[test]
    fn test_rgb_thresholds_are_strict() {
        let rule = RgbThreshold::default();
        assert!(rule.is_dust(171, 112, 128));
        assert!(!rule.is_dust(170, 112, 128));
        assert!(!rule.is_dust(171, 113, 128));
        assert!(!rule.is_dust(171, 112, 127));
    }

    #[test]
    fn test_rule_from_name_and_toml() {
        assert_eq!(ClassifierRule::from_name("BRIGHT").unwrap(), ClassifierRule::Hsv(HsvRange::BRIGHT));
        assert!(matches!(ClassifierRule::from_name("ndvi"), Err(DustError::Input(_))));

        let rule: ClassifierRule = toml::from_str("rule = \"rgb\"\nred_above = 150").unwrap();
        assert_eq!(rule, ClassifierRule::Rgb(RgbThreshold { red_above: 150, green_below: 113, blue_above: 127 }));

        let rule: ClassifierRule = toml::from_str("rule = \"hsv\"\nlower = [1, 2, 3]\nupper = [4, 5, 6]").unwrap();
        assert_eq!(rule, ClassifierRule::Hsv(HsvRange { lower: [1, 2, 3], upper: [4, 5, 6] }));
    }
}
