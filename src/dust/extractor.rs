//! Dust extraction: classify, clean, vectorize, reproject

use log::{debug, info};
use std::path::Path;

use crate::errors::{DustError, DustResult};
use crate::raster::Raster;
use crate::tiff::constants::photometric;
use crate::vector::{self, Feature, FeatureCollection, Ring};

use super::classifier::{ClassifierRule, PixelClassifier};
use super::mask::Mask;
use super::morphology;
use super::vectorize::{trace_polygons, Connectivity, PixelPolygon, Vertex};

/// Settings of one extraction run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    pub rule: ClassifierRule,
    /// Run open-then-close on the mask
    pub cleanup: bool,
    /// Side of the square structuring element
    pub kernel_size: u32,
    pub connectivity: Connectivity,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            rule: ClassifierRule::default(),
            cleanup: false,
            kernel_size: 5,
            connectivity: Connectivity::Four,
        }
    }
}

/// Everything an extraction produces
#[derive(Debug, Clone)]
pub struct Extraction {
    pub mask: Mask,
    /// Polygons in pixel-corner coordinates
    pub polygons: Vec<PixelPolygon>,
    /// Features in EPSG:4326
    pub features: FeatureCollection,
}

/// Turns RGB rasters into dust polygons
#[derive(Debug, Clone, Default)]
pub struct DustExtractor {
    options: ExtractOptions,
}

impl DustExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        DustExtractor { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Dust polygons of `raster` in EPSG:4326
    pub fn extract(&self, raster: &Raster) -> DustResult<FeatureCollection> {
        Ok(self.run(raster)?.features)
    }

    /// Full extraction keeping the intermediate mask and pixel polygons
    pub fn run(&self, raster: &Raster) -> DustResult<Extraction> {
        let mask = self.classify(raster)?;
        let mask = self.cleanup(mask);
        let polygons = trace_polygons(&mask, self.options.connectivity);
        let mut features = to_map_features(&polygons, raster);
        vector::reproject_to_wgs84(&mut features, &raster.crs);

        info!("{} of {} pixels classified as dust, {} polygons",
              mask.count(), raster.pixel_count(), features.len());
        Ok(Extraction { mask, polygons, features })
    }

    /// Extract and write `<output>` as GeoJSON
    pub fn extract_to_file(&self, raster: &Raster, output: &Path) -> DustResult<FeatureCollection> {
        let features = self.extract(raster)?;
        vector::write_geojson(&features, output)?;
        Ok(features)
    }

    /// Binary dust mask of bands 1 to 3
    pub fn classify(&self, raster: &Raster) -> DustResult<Mask> {
        if raster.bands < 3 {
            return Err(DustError::Input(format!(
                "Dust classification needs 3 bands, raster has {}", raster.bands
            )));
        }
        if raster.bits_per_sample != 8 {
            return Err(DustError::Classification(format!(
                "Samples are {}-bit, classification expects 8-bit RGB", raster.bits_per_sample
            )));
        }
        if raster.photometric != photometric::RGB && raster.photometric != photometric::BLACK_IS_ZERO {
            return Err(DustError::Classification(format!(
                "Photometric interpretation {} is not an RGB triple", raster.photometric
            )));
        }

        debug!("Classifying with {}", self.options.rule.describe());
        let rule = self.options.rule;
        let mut mask = Mask::new(raster.width, raster.height);
        for (index, pixel) in raster.data.chunks_exact(raster.pixel_stride()).enumerate() {
            if rule.is_dust(pixel[0], pixel[1], pixel[2]) {
                mask.data[index] = 1;
            }
        }
        Ok(mask)
    }

    /// Open then close, when enabled
    pub fn cleanup(&self, mask: Mask) -> Mask {
        if !self.options.cleanup {
            return mask;
        }
        let before = mask.count();
        let cleaned = morphology::clean(&mask, self.options.kernel_size);
        debug!("Morphological cleanup ({}x{}): {} -> {} pixels",
               self.options.kernel_size, self.options.kernel_size, before, cleaned.count());
        cleaned
    }
}

/// Map pixel polygons through the raster transform, still in its CRS
pub fn to_map_features(polygons: &[PixelPolygon], raster: &Raster) -> FeatureCollection {
    let to_ring = |ring: &[Vertex]| -> Ring {
        ring.iter()
            .map(|(col, row)| raster.transform.apply(*col as f64, *row as f64).to_position())
            .collect()
    };

    let features = polygons
        .iter()
        .filter(|polygon| polygon.exterior.len() >= 4)
        .map(|polygon| {
            let mut rings = vec![to_ring(&polygon.exterior)];
            rings.extend(polygon.holes.iter().map(|hole| to_ring(hole)));
            Feature::polygon(rings)
        })
        .collect();

    FeatureCollection::new().with_features(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{CoordinateSystem, GeoTransform};
    use crate::dust::HsvRange;

    fn raster_with(width: u32, height: u32, dust: impl Fn(u32, u32) -> bool) -> Raster {
        let mut data = Vec::new();
        for row in 0..height {
            for col in 0..width {
                let pixel: [u8; 3] = if dust(col, row) { [200, 20, 200] } else { [30, 120, 40] };
                data.extend_from_slice(&pixel);
            }
        }
        Raster::from_rgb8(width, height, data, GeoTransform::north_up(10.0, 20.0, 0.5, 0.5),
                          CoordinateSystem::WGS84).unwrap()
    }

    #[test]
    fn test_two_by_two_block() {
        let raster = raster_with(4, 4, |c, r| (1..3).contains(&c) && (1..3).contains(&r));
        let features = DustExtractor::default().extract(&raster).unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features.features[0].properties.value, 1);
        let exterior = &features.features[0].geometry.rings()[0];
        assert_eq!(exterior.len(), 5);
        assert!(vector::signed_area2(exterior) > 0.0);
        for position in exterior {
            assert!(position[0] == 10.5 || position[0] == 11.5);
            assert!(position[1] == 19.5 || position[1] == 18.5);
        }
    }

    #[test]
    fn test_nothing_matches() {
        let raster = raster_with(5, 5, |_, _| false);
        let extraction = DustExtractor::default().run(&raster).unwrap();
        assert!(extraction.features.is_empty());
        assert!(extraction.mask.is_empty());
    }

    #[test]
    fn test_everything_matches() {
        let raster = raster_with(6, 3, |_, _| true);
        let extraction = DustExtractor::default().run(&raster).unwrap();
        assert_eq!(extraction.polygons.len(), 1);
        assert_eq!(extraction.polygons[0].area(), 18.0);
    }

    #[test]
    fn test_cleanup_drops_isolated_pixel() {
        let raster = raster_with(12, 12, |c, r| (c < 7 && r < 7) || (c == 11 && r == 11));
        let options = ExtractOptions { cleanup: true, ..ExtractOptions::default() };
        let extraction = DustExtractor::new(options).run(&raster).unwrap();
        assert_eq!(extraction.polygons.len(), 1);
        assert_eq!(extraction.polygons[0].pixel_count, 49);
    }

    #[test]
    fn test_band_and_depth_errors() {
        let gray = Raster::new(2, 2, 1, 8, vec![0; 4], GeoTransform::north_up(0.0, 0.0, 1.0, 1.0),
                               CoordinateSystem::WGS84).unwrap();
        assert!(matches!(DustExtractor::default().extract(&gray), Err(DustError::Input(_))));

        let deep = Raster::new(1, 1, 3, 16, vec![0; 6], GeoTransform::north_up(0.0, 0.0, 1.0, 1.0),
                               CoordinateSystem::WGS84).unwrap();
        assert!(matches!(DustExtractor::default().extract(&deep), Err(DustError::Classification(_))));

        let mut palette = raster_with(1, 1, |_, _| true);
        palette.photometric = photometric::PALETTE;
        assert!(matches!(DustExtractor::default().extract(&palette), Err(DustError::Classification(_))));
    }

    #[test]
    fn test_extract_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("scene_dust.geojson");
        let raster = raster_with(3, 3, |c, _| c == 0);

        let written = DustExtractor::default().extract_to_file(&raster, &output).unwrap();
        assert_eq!(vector::read_geojson(&output).unwrap(), written);
        assert_eq!(written.len(), 1);
    }

    #[test]
    fn test_rule_choice_changes_result() {
        // Dark magenta: canonical yes, bright no
        let mut raster = raster_with(2, 2, |_, _| false);
        raster.data[..3].copy_from_slice(&[80, 10, 80]);

        let canonical = DustExtractor::default().extract(&raster).unwrap();
        let bright = DustExtractor::new(ExtractOptions {
            rule: ClassifierRule::Hsv(HsvRange::BRIGHT),
            ..ExtractOptions::default()
        }).extract(&raster).unwrap();
        assert_eq!((canonical.len(), bright.len()), (1, 0));
    }
}
