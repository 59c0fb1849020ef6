//! Horizontal differencing predictor (Predictor = 2)
//!
//! Operates row by row on decoded block bytes. 16-bit samples must already
//! be in little-endian order.

use crate::tiff::errors::{TiffError, TiffResult};

/// Undo differencing in place
pub fn decode_horizontal(data: &mut [u8], row_width: usize, samples_per_pixel: usize, bytes_per_sample: usize) -> TiffResult<()> {
    let row_bytes = row_width * samples_per_pixel * bytes_per_sample;
    if row_bytes == 0 {
        return Ok(());
    }

    match bytes_per_sample {
        1 => {
            for row in data.chunks_mut(row_bytes) {
                for i in samples_per_pixel..row.len() {
                    row[i] = row[i].wrapping_add(row[i - samples_per_pixel]);
                }
            }
        }
        2 => {
            for row in data.chunks_mut(row_bytes) {
                let stride = samples_per_pixel * 2;
                let mut i = stride;
                while i + 1 < row.len() {
                    let previous = u16::from_le_bytes([row[i - stride], row[i - stride + 1]]);
                    let current = u16::from_le_bytes([row[i], row[i + 1]]);
                    row[i..i + 2].copy_from_slice(&current.wrapping_add(previous).to_le_bytes());
                    i += 2;
                }
            }
        }
        other => {
            return Err(TiffError::UnsupportedLayout(format!("Predictor on {}-byte samples", other)));
        }
    }
    Ok(())
}

/// Apply differencing in place, the inverse of `decode_horizontal`
pub fn encode_horizontal(data: &mut [u8], row_width: usize, samples_per_pixel: usize, bytes_per_sample: usize) -> TiffResult<()> {
    let row_bytes = row_width * samples_per_pixel * bytes_per_sample;
    if row_bytes == 0 {
        return Ok(());
    }

    match bytes_per_sample {
        1 => {
            for row in data.chunks_mut(row_bytes) {
                for i in (samples_per_pixel..row.len()).rev() {
                    row[i] = row[i].wrapping_sub(row[i - samples_per_pixel]);
                }
            }
        }
        2 => {
            let stride = samples_per_pixel * 2;
            for row in data.chunks_mut(row_bytes) {
                let mut i = (row.len() / 2) * 2;
                while i >= stride + 2 {
                    i -= 2;
                    let previous = u16::from_le_bytes([row[i - stride], row[i - stride + 1]]);
                    let current = u16::from_le_bytes([row[i], row[i + 1]]);
                    row[i..i + 2].copy_from_slice(&current.wrapping_sub(previous).to_le_bytes());
                }
            }
        }
        other => {
            return Err(TiffError::UnsupportedLayout(format!("Predictor on {}-byte samples", other)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_eight_bit_rgb_row() {
        // Two rows of two RGB pixels
        let mut data = vec![10, 20, 30, 5, 250, 1, 0, 0, 0, 1, 1, 1];
        decode_horizontal(&mut data, 2, 3, 1).unwrap();
        assert_eq!(data, vec![10, 20, 30, 15, 14, 31, 0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_sixteen_bit_encode_then_decode() {
        let original: Vec<u8> = [1000u16, 20, 65535, 3, 7, 9]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut data = original.clone();
        encode_horizontal(&mut data, 3, 1, 2).unwrap();
        assert_ne!(data, original);
        assert_eq!(&data[..2], &original[..2]);
        decode_horizontal(&mut data, 3, 1, 2).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn test_rejects_wide_samples() {
        let mut data = vec![0u8; 8];
        assert!(decode_horizontal(&mut data, 1, 1, 4).is_err());
    }
}
