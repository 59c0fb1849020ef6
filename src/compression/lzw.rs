//! TIFF flavoured LZW (Compression 5), GDAL's default for COGs
//!
//! Codes are packed most significant bit first and the code width grows one
//! entry early, as TIFF 6.0 section 13 prescribes.

use log::debug;
use weezl::decode::Decoder;
use weezl::encode::Encoder;
use weezl::BitOrder;

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

const MIN_CODE_SIZE: u8 = 8;

pub struct LzwHandler;

impl CompressionHandler for LzwHandler {
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let decompressed = Decoder::with_tiff_size_switch(BitOrder::Msb, MIN_CODE_SIZE)
            .decode(data)
            .map_err(|e| TiffError::Corrupt(format!("LZW stream: {}", e)))?;
        debug!("LZW: {} -> {} bytes", data.len(), decompressed.len());
        Ok(decompressed)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        Encoder::with_tiff_size_switch(BitOrder::Msb, MIN_CODE_SIZE)
            .encode(data)
            .map_err(|e| TiffError::GenericError(format!("LZW encoder: {}", e)))
    }

    fn name(&self) -> &'static str {
        "lzw"
    }

    fn code(&self) -> u16 {
        compression::LZW
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repetitive_rows_shrink() {
        let data: Vec<u8> = (0..8192u32).map(|i| [41, 0, 63, 200][(i % 4) as usize]).collect();
        let packed = LzwHandler.compress(&data).unwrap();
        assert!(packed.len() < data.len() / 4);
        assert_eq!(LzwHandler.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_empty_strip() {
        let packed = LzwHandler.compress(&[]).unwrap();
        assert!(LzwHandler.decompress(&packed).unwrap().is_empty());
    }

    #[test]
    fn test_code_beyond_table_is_corrupt() {
        // Clear, literal 255, then code 511 before the table has grown past 258
        let result = LzwHandler.decompress(&[0x80, 0x3F, 0xFF, 0xFF]);
        assert!(matches!(result, Err(TiffError::Corrupt(_))));
    }
}
