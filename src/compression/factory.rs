//! Factory for creating compression handlers

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::deflate::DeflateHandler;
use super::lzw::LzwHandler;
use super::zstd::ZstdHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Handler that decodes blocks written with the given Compression tag value
    pub fn create_handler(code: u64) -> TiffResult<Box<dyn CompressionHandler>> {
        match u16::try_from(code).unwrap_or(0) {
            compression::NONE => Ok(Box::new(UncompressedHandler)),
            compression::LZW => Ok(Box::new(LzwHandler)),
            compression::DEFLATE | compression::ADOBE_DEFLATE => Ok(Box::new(DeflateHandler::new())),
            compression::ZSTD => Ok(Box::new(ZstdHandler::new())),
            _ => Err(TiffError::UnsupportedCompression(code)),
        }
    }

    /// Handler for an output codec name, with an optional encoder level
    pub fn handler_by_name(name: &str, level: Option<i32>) -> TiffResult<Box<dyn CompressionHandler>> {
        match name.to_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Box::new(UncompressedHandler)),
            "lzw" => Ok(Box::new(LzwHandler)),
            "deflate" | "zip" => Ok(Box::new(match level {
                Some(level) => DeflateHandler::with_level(level.max(0) as u32),
                None => DeflateHandler::new(),
            })),
            "zstd" => Ok(Box::new(match level {
                Some(level) => ZstdHandler::with_level(level),
                None => ZstdHandler::new(),
            })),
            _ => Err(TiffError::GenericError(format!("Unknown compression type: {}", name))),
        }
    }

    /// Names accepted by `handler_by_name`
    pub fn available_names() -> &'static [&'static str] {
        &["none", "lzw", "deflate", "zstd"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_resolve() {
        assert_eq!(CompressionFactory::create_handler(1).unwrap().code(), compression::NONE);
        assert_eq!(CompressionFactory::create_handler(32946).unwrap().code(), compression::DEFLATE);
        assert_eq!(CompressionFactory::create_handler(14).unwrap().name(), "zstd");
        assert_eq!(CompressionFactory::create_handler(5).unwrap().name(), "lzw");
        assert!(matches!(CompressionFactory::create_handler(7),
                         Err(TiffError::UnsupportedCompression(7))));
    }

    #[test]
    fn test_every_named_codec_round_trips() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i * 31 % 251) as u8).collect();
        for name in CompressionFactory::available_names() {
            let handler = CompressionFactory::handler_by_name(name, None).unwrap();
            let decoder = CompressionFactory::create_handler(handler.code() as u64).unwrap();
            assert_eq!(decoder.decompress(&handler.compress(&data).unwrap()).unwrap(), data);
        }
        assert!(CompressionFactory::handler_by_name("jpeg", None).is_err());
    }
}
