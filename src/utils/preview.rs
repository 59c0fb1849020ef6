//! Side-by-side preview of a raster and its dust mask

use image::{Rgb, RgbImage};
use log::debug;
use std::path::Path;

use crate::dust::Mask;
use crate::errors::{DustError, DustResult};
use crate::raster::Raster;

const MASK_ON: Rgb<u8> = Rgb([255, 255, 255]);
const MASK_OFF: Rgb<u8> = Rgb([0, 0, 0]);

/// Raster on the left, mask on the right, same height
pub fn render(raster: &Raster, mask: &Mask) -> DustResult<RgbImage> {
    if mask.width != raster.width || mask.height != raster.height {
        return Err(DustError::Input(format!(
            "Mask is {}x{} but raster is {}x{}",
            mask.width, mask.height, raster.width, raster.height
        )));
    }

    let width = raster.width;
    let mut image = RgbImage::new(width * 2, raster.height);
    let shift = raster.bits_per_sample - 8;
    // Single-band rasters show as grey
    let bands: [u16; 3] = if raster.bands >= 3 { [0, 1, 2] } else { [0, 0, 0] };

    for row in 0..raster.height {
        for col in 0..width {
            let mut pixel = [0u8; 3];
            for (channel, band) in pixel.iter_mut().zip(bands) {
                *channel = (raster.sample(col, row, band).unwrap_or(0) >> shift) as u8;
            }
            image.put_pixel(col, row, Rgb(pixel));
            let marked = if mask.get(col, row) { MASK_ON } else { MASK_OFF };
            image.put_pixel(width + col, row, marked);
        }
    }
    Ok(image)
}

/// Render and save as PNG
pub fn write_preview(raster: &Raster, mask: &Mask, path: &Path) -> DustResult<()> {
    let image = render(raster, mask)?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| DustError::Serialization(format!("{}: {}", path.display(), e)))?;
    debug!("Wrote preview {}", path.display());
    Ok(())
}
