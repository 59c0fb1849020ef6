//! End-to-end tests over GeoTIFFs written with the crate's own writer

use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;
use tempfile::tempdir;

use dustkit::coordinate::CoordinateTransformer;
use dustkit::dust::{morphology, to_map_features, Mask};
use dustkit::vector::{read_geojson, signed_area2};
use dustkit::{
    BoundingBox, CoordinateSystem, DustError, DustExtractor, DustKit, ExtractOptions, GeoTiffWriter,
    GeoTransform, OverlapPolicy, PipelineConfig, Point, Raster, RasterDataset, RegionCropper,
};

const DUST: [u8; 3] = [200, 20, 200];
const GROUND: [u8; 3] = [190, 160, 120];

/// 30 m Web Mercator pixels with the top-left corner at (3540000, 1590000)
fn scene_transform() -> GeoTransform {
    GeoTransform::north_up(3_540_000.0, 1_590_000.0, 30.0, 30.0)
}

fn paint(width: u32, height: u32, is_dust: impl Fn(u32, u32) -> bool) -> Raster {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for row in 0..height {
        for col in 0..width {
            let pixel: [u8; 3] = if is_dust(col, row) { DUST } else { GROUND };
            data.extend_from_slice(&pixel);
        }
    }
    Raster::from_rgb8(width, height, data, scene_transform(), CoordinateSystem::WebMercator).unwrap()
}

fn write_scene(dir: &Path, name: &str, raster: &Raster) -> PathBuf {
    let path = dir.join(name);
    GeoTiffWriter::default().write(raster, &path).unwrap();
    path
}

#[test]
fn test_no_dust_gives_empty_collection() {
    let dir = tempdir().unwrap();
    let input = write_scene(dir.path(), "clear.tif", &paint(8, 6, |_, _| false));

    let kit = DustKit::new(PipelineConfig::default()).unwrap();
    let report = kit.detect(&input, None).unwrap();

    assert_eq!(report.features, 0);
    assert_eq!(report.dust_pixels, 0);
    assert_eq!(report.geojson, dir.path().join("clear_dust.geojson"));
    let written = read_geojson(&report.geojson).unwrap();
    assert!(written.is_empty());
    assert_eq!(written.type_, "FeatureCollection");
}

#[test]
fn test_all_dust_gives_one_feature_covering_the_raster() {
    let raster = paint(7, 5, |_, _| true);
    let extraction = DustExtractor::default().run(&raster).unwrap();

    assert_eq!(extraction.polygons.len(), 1);
    assert_abs_diff_eq!(extraction.polygons[0].area(), 35.0);
    assert!(extraction.polygons[0].holes.is_empty());
    assert_eq!(extraction.features.len(), 1);
}

#[test]
fn test_block_of_dust_on_small_raster() {
    let raster = paint(4, 4, |col, row| (1..3).contains(&col) && (1..3).contains(&row));
    let extraction = DustExtractor::default().run(&raster).unwrap();

    assert_eq!(extraction.polygons.len(), 1);
    let polygon = &extraction.polygons[0];
    assert_eq!(polygon.pixel_count, 4);
    let mut corners: Vec<_> = polygon.exterior[..polygon.exterior.len() - 1].to_vec();
    corners.sort();
    assert_eq!(corners, vec![(1, 1), (1, 3), (3, 1), (3, 3)]);

    let feature = &extraction.features.features[0];
    assert_eq!(feature.properties.value, 1);
    let exterior = &feature.geometry.rings()[0];
    assert_eq!(exterior.first(), exterior.last());
    assert!(signed_area2(exterior) > 0.0, "exterior must be counter-clockwise");

    let json = serde_json::to_value(&extraction.features).unwrap();
    assert_eq!(json["features"][0]["properties"]["value"], 1);
    assert_eq!(json["features"][0]["geometry"]["type"], "Polygon");
}

#[test]
fn test_hole_is_clockwise_after_reprojection() {
    let raster = paint(5, 5, |col, row| !(col == 2 && row == 2));
    let features = DustExtractor::default().extract(&raster).unwrap();

    let rings = features.features[0].geometry.rings();
    assert_eq!(rings.len(), 2);
    assert!(signed_area2(&rings[0]) > 0.0);
    assert!(signed_area2(&rings[1]) < 0.0);
}

#[test]
fn test_crop_then_extract_stays_inside_crop() {
    let dir = tempdir().unwrap();
    let source = paint(40, 30, |col, row| (22..26).contains(&row) && col >= 12);
    let input = write_scene(dir.path(), "scene.tif", &source);

    let bbox = BoundingBox::new(3_540_300.0, 1_589_100.0, 3_540_600.0, 1_589_400.0);
    let cropped = RegionCropper::default().crop(&input, &bbox, &CoordinateSystem::WebMercator).unwrap();

    assert_eq!((cropped.width, cropped.height), (10, 10));
    assert_eq!(cropped.transform.coefficients, [3_540_300.0, 30.0, 0.0, 1_589_400.0, 0.0, -30.0]);
    assert_eq!(cropped.crs, CoordinateSystem::WebMercator);
    assert_eq!(cropped.sample(0, 0, 0), source.sample(10, 20, 0));
    assert_eq!(cropped.sample(5, 3, 1), source.sample(15, 23, 1));

    let extraction = DustExtractor::default().run(&cropped).unwrap();
    assert_eq!(extraction.polygons.len(), 1);

    let bounds = cropped.bounds();
    let unprojected = to_map_features(&extraction.polygons, &cropped);
    for [x, y] in unprojected.positions() {
        assert!(*x >= bounds.min_x - 1e-6 && *x <= bounds.max_x + 1e-6, "x {} outside crop", x);
        assert!(*y >= bounds.min_y - 1e-6 && *y <= bounds.max_y + 1e-6, "y {} outside crop", y);
    }
}

#[test]
fn test_reprojection_round_trip_within_half_a_pixel() {
    let raster = paint(12, 9, |col, row| (2..7).contains(&col) && (3..8).contains(&row) && (col, row) != (4, 5));
    let extraction = DustExtractor::default().run(&raster).unwrap();
    let original = to_map_features(&extraction.polygons, &raster);

    let transformer = CoordinateTransformer::new();
    let half_pixel = 15.0;
    for [lon, lat] in extraction.features.positions() {
        let back = transformer.from_wgs84(&Point::new(*lon, *lat), &CoordinateSystem::WebMercator);
        let nearest = original
            .positions()
            .map(|[x, y]| back.distance(&Point::new(*x, *y)))
            .fold(f64::INFINITY, f64::min);
        assert!(nearest < half_pixel, "({}, {}) came back {} m away", lon, lat, nearest);
    }
}

#[test]
fn test_open_then_close_is_idempotent() {
    let mask = Mask::from_fn(24, 18, |col, row| {
        (col * 7 + row * 13) % 5 < 2 || ((4..15).contains(&col) && (3..12).contains(&row))
    });
    for size in [3, 5] {
        let once = morphology::clean(&mask, size);
        let twice = morphology::clean(&once, size);
        assert_eq!(once, twice, "kernel {}", size);
    }
}

#[test]
fn test_bbox_outside_is_range_error_and_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = write_scene(dir.path(), "scene.tif", &paint(10, 10, |_, _| true));
    let kit = DustKit::new(PipelineConfig::default()).unwrap();

    let far_away = BoundingBox::new(0.0, 0.0, 1000.0, 1000.0);
    let result = kit.crop(&input, &far_away, &CoordinateSystem::WebMercator, None);
    assert!(matches!(result, Err(DustError::Range(_))), "{:?}", result);
    assert!(!dir.path().join("scene_cropped.tif").exists());

    let result = kit.run(&input, &far_away, &CoordinateSystem::WebMercator);
    assert!(matches!(result, Err(DustError::Range(_))));
    assert!(!dir.path().join("scene_cropped.tif").exists());
    assert!(!dir.path().join("scene_cropped_dust.geojson").exists());
}

#[test]
fn test_partial_overlap_follows_policy() {
    let dir = tempdir().unwrap();
    let input = write_scene(dir.path(), "scene.tif", &paint(40, 30, |_, _| false));
    let straddling = BoundingBox::new(3_540_900.0, 1_589_700.0, 3_541_500.0, 1_590_300.0);

    let clamped = RegionCropper::new(OverlapPolicy::Clamp)
        .crop(&input, &straddling, &CoordinateSystem::WebMercator)
        .unwrap();
    assert_eq!((clamped.width, clamped.height), (10, 10));
    assert_eq!(clamped.transform.coefficients[0], 3_540_900.0);
    assert_eq!(clamped.transform.coefficients[3], 1_590_000.0);

    let strict = RegionCropper::new(OverlapPolicy::Strict)
        .crop(&input, &straddling, &CoordinateSystem::WebMercator);
    assert!(matches!(strict, Err(DustError::Range(_))));
}

#[test]
fn test_crop_with_geographic_bbox() {
    let dir = tempdir().unwrap();
    let input = write_scene(dir.path(), "scene.tif", &paint(40, 30, |_, _| false));

    let transformer = CoordinateTransformer::new();
    let sw = transformer.web_mercator_to_wgs84(3_540_300.0, 1_589_100.0);
    let ne = transformer.web_mercator_to_wgs84(3_540_600.0, 1_589_400.0);
    let bbox = BoundingBox::new(sw.x, sw.y, ne.x, ne.y);

    let cropped = RegionCropper::default().crop(&input, &bbox, &CoordinateSystem::WGS84).unwrap();
    assert_eq!((cropped.width, cropped.height), (10, 10));
    assert_abs_diff_eq!(cropped.transform.coefficients[0], 3_540_300.0, epsilon = 1e-6);
}

#[test]
fn test_crop_to_file_round_trip_with_compression() {
    let dir = tempdir().unwrap();
    let source = paint(40, 30, |col, row| (col + row) % 3 == 0).with_nodata(Some("0".to_string()));
    let input = write_scene(dir.path(), "scene.tif", &source);

    let mut config = PipelineConfig::default();
    config.crop.compression = "deflate".to_string();
    let kit = DustKit::new(config).unwrap();

    let bbox = BoundingBox::new(3_540_300.0, 1_589_100.0, 3_540_600.0, 1_589_400.0);
    let written = kit.crop(&input, &bbox, &CoordinateSystem::WebMercator, None).unwrap();
    assert_eq!(written, dir.path().join("scene_cropped.tif"));

    let dataset = RasterDataset::open(&written).unwrap();
    assert_eq!((dataset.width(), dataset.height(), dataset.bands()), (10, 10, 3));
    assert_eq!(dataset.crs(), CoordinateSystem::WebMercator);
    assert_eq!(dataset.nodata(), Some("0"));
    let reread = dataset.read_all().unwrap();
    let expected = source.window(&dustkit::Region::new(10, 20, 10, 10)).unwrap();
    assert_eq!(reread.data, expected.data);
}

#[test]
fn test_lzw_source_crops_and_detects() {
    let dir = tempdir().unwrap();
    let source = paint(40, 30, |col, row| col >= 10 && col < 20 && row >= 20);
    let input = dir.path().join("cog.tif");
    GeoTiffWriter::with_compression("lzw", None).unwrap().write(&source, &input).unwrap();

    let kit = DustKit::new(PipelineConfig::default()).unwrap();
    let bbox = BoundingBox::new(3_540_300.0, 1_589_100.0, 3_540_600.0, 1_589_400.0);
    let written = kit.crop(&input, &bbox, &CoordinateSystem::WebMercator, None).unwrap();

    let reread = RasterDataset::open(&written).unwrap().read_all().unwrap();
    let expected = source.window(&dustkit::Region::new(10, 20, 10, 10)).unwrap();
    assert_eq!(reread.data, expected.data);

    let report = kit.detect(&input, None).unwrap();
    assert_eq!(report.features, 1);
    assert_eq!(report.dust_pixels, 100);
}

#[test]
fn test_run_names_outputs_after_crop() {
    let dir = tempdir().unwrap();
    let input = write_scene(dir.path(), "scene.tif", &paint(40, 30, |col, row| col < 20 && row >= 20));

    let mut config = PipelineConfig::default();
    config.output.preview = true;
    let kit = DustKit::new(config).unwrap();

    let bbox = BoundingBox::new(3_540_300.0, 1_589_100.0, 3_540_600.0, 1_589_400.0);
    let report = kit.run(&input, &bbox, &CoordinateSystem::WebMercator).unwrap();

    assert_eq!(report.cropped, dir.path().join("scene_cropped.tif"));
    assert_eq!(report.detection.geojson, dir.path().join("scene_cropped_dust.geojson"));
    assert_eq!(report.detection.features, 1);
    assert_eq!(report.detection.dust_pixels, 100);

    let preview = report.detection.preview.unwrap();
    assert_eq!(preview, dir.path().join("scene_cropped_preview.png"));
    let image = image::open(&preview).unwrap();
    assert_eq!((image.width(), image.height()), (20, 10));

    let features = read_geojson(&report.detection.geojson).unwrap();
    for [lon, lat] in features.positions() {
        assert!((31.0..33.0).contains(lon) && (14.0..15.0).contains(lat), "({}, {})", lon, lat);
    }
}

#[test]
fn test_batch_skips_failures_and_counts_successes() {
    let dir = tempdir().unwrap();
    write_scene(dir.path(), "a.tif", &paint(6, 6, |col, _| col < 3));
    write_scene(dir.path(), "b.TIFF", &paint(6, 6, |_, _| false));
    fs::write(dir.path().join("c.tif"), b"not a tiff").unwrap();
    fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let kit = DustKit::new(PipelineConfig::default()).unwrap();
    let report = kit.batch(dir.path(), false).unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.success_count(), 2);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failed[0].0, dir.path().join("c.tif"));
    assert_eq!(report.failed[0].1.kind(), "input");

    assert_eq!(read_geojson(&dir.path().join("a_dust.geojson")).unwrap().len(), 1);
    assert!(read_geojson(&dir.path().join("b_dust.geojson")).unwrap().is_empty());
}

#[test]
fn test_batch_with_configured_bbox_crops_first() {
    let dir = tempdir().unwrap();
    write_scene(dir.path(), "scene.tif", &paint(40, 30, |_, row| row >= 25));
    let out = dir.path().join("out");

    let mut config = PipelineConfig::default();
    config.crop.bbox = Some([3_540_300.0, 1_589_100.0, 3_540_600.0, 1_589_400.0]);
    config.output.directory = Some(out.clone());
    let kit = DustKit::new(config).unwrap();

    let report = kit.batch(dir.path(), false).unwrap();
    assert_eq!(report.success_count(), 1);
    assert!(out.join("scene_cropped.tif").exists());
    assert_eq!(read_geojson(&out.join("scene_cropped_dust.geojson")).unwrap().len(), 1);
}

#[test]
fn test_rerun_batch_skips_crops_with_custom_suffix() {
    let dir = tempdir().unwrap();
    write_scene(dir.path(), "scene.tif", &paint(40, 30, |_, row| row >= 25));

    let mut config = PipelineConfig::default();
    config.crop.bbox = Some([3_540_300.0, 1_589_100.0, 3_540_600.0, 1_589_400.0]);
    config.output.cropped_suffix = "_clip.tif".to_string();
    let kit = DustKit::new(config).unwrap();

    assert_eq!(kit.batch(dir.path(), false).unwrap().total(), 1);
    assert!(dir.path().join("scene_clip.tif").exists());

    let second = kit.batch(dir.path(), false).unwrap();
    assert_eq!(second.total(), 1);
    assert_eq!(second.succeeded[0].0, dir.path().join("scene.tif"));
}

#[test]
fn test_failed_preview_leaves_no_geojson() {
    let dir = tempdir().unwrap();
    let input = write_scene(dir.path(), "scene.tif", &paint(6, 4, |col, _| col < 3));
    // A directory occupies the preview name
    fs::create_dir(dir.path().join("scene_preview.png")).unwrap();

    let mut config = PipelineConfig::default();
    config.output.preview = true;
    let kit = DustKit::new(config).unwrap();

    assert!(matches!(kit.detect(&input, None), Err(DustError::Serialization(_))));
    assert!(!dir.path().join("scene_dust.geojson").exists());
}

#[test]
fn test_unclassifiable_rasters() {
    let transform = scene_transform();
    let grey = Raster::new(2, 2, 1, 8, vec![0; 4], transform, CoordinateSystem::WebMercator).unwrap();
    assert!(matches!(DustExtractor::default().extract(&grey), Err(DustError::Input(_))));

    let deep = Raster::new(2, 2, 3, 16, vec![0; 24], transform, CoordinateSystem::WebMercator).unwrap();
    assert!(matches!(DustExtractor::default().extract(&deep), Err(DustError::Classification(_))));
}

#[test]
fn test_cleanup_removes_speckle() {
    let raster = paint(20, 20, |col, row| {
        ((5..15).contains(&col) && (5..15).contains(&row)) || (col, row) == (1, 1)
    });

    let raw = DustExtractor::default().run(&raster).unwrap();
    assert_eq!(raw.polygons.len(), 2);

    let options = ExtractOptions { cleanup: true, ..ExtractOptions::default() };
    let cleaned = DustExtractor::new(options).run(&raster).unwrap();
    assert_eq!(cleaned.polygons.len(), 1);
    assert_eq!(cleaned.mask.count(), 100);
}
