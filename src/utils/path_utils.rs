//! Output naming and input discovery

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref TIFF_EXTENSION: Regex = Regex::new(r"(?i)\.tiff?$").unwrap();
}

/// Suffix of cropped rasters
pub const CROPPED_SUFFIX: &str = "_cropped.tif";
/// Suffix of dust feature collections
pub const GEOJSON_SUFFIX: &str = "_dust.geojson";
/// Suffix of side-by-side preview images
pub const PREVIEW_SUFFIX: &str = "_preview.png";

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "raster".to_string())
}

/// `path` with its extension replaced by `suffix`, in the same directory
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    path.with_file_name(format!("{}{}", stem(path), suffix))
}

/// `<stem>_cropped.tif` next to `path`
pub fn cropped_path(path: &Path) -> PathBuf {
    with_suffix(path, CROPPED_SUFFIX)
}

/// `<stem>_dust.geojson` next to `path`
pub fn geojson_path(path: &Path) -> PathBuf {
    with_suffix(path, GEOJSON_SUFFIX)
}

/// `<stem>_preview.png` next to `path`
pub fn preview_path(path: &Path) -> PathBuf {
    with_suffix(path, PREVIEW_SUFFIX)
}

/// Whether the file name ends in `.tif` or `.tiff`, any case
pub fn is_tiff(path: &Path) -> bool {
    path.file_name()
        .map(|name| TIFF_EXTENSION.is_match(&name.to_string_lossy()))
        .unwrap_or(false)
}

/// GeoTIFFs directly inside `dir`, sorted by path
///
/// Names ending in `skip_suffix` (the configured crop suffix, any case) are
/// crops this crate wrote itself, skipped so a second batch run does not
/// crop its own output. An empty suffix skips nothing.
pub fn find_tiffs(dir: &Path, skip_suffix: &str) -> io::Result<Vec<PathBuf>> {
    let skip_suffix = skip_suffix.to_lowercase();
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !is_tiff(&path) {
            continue;
        }
        let name = path.file_name().map(|n| n.to_string_lossy().to_lowercase()).unwrap_or_default();
        if !skip_suffix.is_empty() && name.ends_with(&skip_suffix) {
            debug!("Skipping derived raster {}", path.display());
            continue;
        }
        found.push(path);
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_output_names() {
        let input = Path::new("/data/scenes/ksa_2023.tif");
        assert_eq!(cropped_path(input), PathBuf::from("/data/scenes/ksa_2023_cropped.tif"));
        assert_eq!(geojson_path(input), PathBuf::from("/data/scenes/ksa_2023_dust.geojson"));
        assert_eq!(preview_path(Path::new("scene.TIFF")), PathBuf::from("scene_preview.png"));
    }

    #[test]
    fn test_is_tiff() {
        assert!(is_tiff(Path::new("a.tif")));
        assert!(is_tiff(Path::new("b.TIFF")));
        assert!(!is_tiff(Path::new("c.tif.aux.xml")));
        assert!(!is_tiff(Path::new("d.png")));
    }

    #[test]
    fn test_find_tiffs_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        for name in ["b.tif", "a.TIFF", "notes.txt", "a_cropped.tif"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.tif")).unwrap();

        let names = |found: Vec<PathBuf>| -> Vec<String> {
            found.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect()
        };
        assert_eq!(names(find_tiffs(dir.path(), CROPPED_SUFFIX).unwrap()), vec!["a.TIFF", "b.tif"]);
    }

    #[test]
    fn test_find_tiffs_honours_configured_suffix() {
        let dir = tempdir().unwrap();
        for name in ["scene.tif", "scene_clip.TIF", "other_cropped.tif"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let found = find_tiffs(dir.path(), "_clip.tif").unwrap();
        assert_eq!(found, vec![dir.path().join("other_cropped.tif"), dir.path().join("scene.tif")]);
        assert_eq!(find_tiffs(dir.path(), "").unwrap().len(), 3);
    }
}
