//! Binary morphology with a square structuring element
//!
//! Pixels outside the image are ignored: erosion takes the minimum and
//! dilation the maximum over the part of the window inside the image.
//! Both are separable for a square element, so each runs as a row pass
//! followed by a column pass.

use super::mask::Mask;

fn sweep(mask: &Mask, radius: usize, horizontal: bool, keep_max: bool) -> Mask {
    let (width, height) = (mask.width as usize, mask.height as usize);
    let mut out = Mask::new(mask.width, mask.height);

    for row in 0..height {
        for col in 0..width {
            let (pos, len) = if horizontal { (col, width) } else { (row, height) };
            let start = pos.saturating_sub(radius);
            let end = (pos + radius).min(len - 1);

            let mut values = (start..=end).map(|i| {
                let (c, r) = if horizontal { (i, row) } else { (col, i) };
                mask.data[r * width + c] != 0
            });
            let value = if keep_max { values.any(|v| v) } else { values.all(|v| v) };
            out.data[row * width + col] = value as u8;
        }
    }
    out
}

fn radius(size: u32) -> usize {
    (size / 2) as usize
}

/// Erosion with a `size` x `size` square
pub fn erode(mask: &Mask, size: u32) -> Mask {
    if size <= 1 || mask.data.is_empty() {
        return mask.clone();
    }
    sweep(&sweep(mask, radius(size), true, false), radius(size), false, false)
}

/// Dilation with a `size` x `size` square
pub fn dilate(mask: &Mask, size: u32) -> Mask {
    if size <= 1 || mask.data.is_empty() {
        return mask.clone();
    }
    sweep(&sweep(mask, radius(size), true, true), radius(size), false, true)
}

/// Erosion then dilation; removes specks smaller than the element
pub fn open(mask: &Mask, size: u32) -> Mask {
    dilate(&erode(mask, size), size)
}

/// Dilation then erosion; fills gaps smaller than the element
pub fn close(mask: &Mask, size: u32) -> Mask {
    erode(&dilate(mask, size), size)
}

/// Open then close
pub fn clean(mask: &Mask, size: u32) -> Mask {
    close(&open(mask, size), size)
}
