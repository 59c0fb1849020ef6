//! Coordinate Reference System handling
//!
//! Only systems with a closed-form transform to WGS 84 are supported:
//! geographic WGS 84, spherical Web Mercator and the WGS 84 UTM zones.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::errors::{DustError, DustResult};

lazy_static! {
    static ref EPSG_PATTERN: Regex =
        Regex::new(r"(?i)^\s*(?:EPSG\s*:\s*|urn:ogc:def:crs:EPSG:[0-9.]*:)?(\d+)\s*$").unwrap();
    static ref CRS84_PATTERN: Regex =
        Regex::new(r"(?i)^\s*(?:OGC:|urn:ogc:def:crs:OGC:1\.3:)?CRS:?84\s*$").unwrap();
}

/// A supported coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// WGS 84 longitude/latitude (EPSG:4326)
    WGS84,
    /// Spherical Web Mercator (EPSG:3857)
    WebMercator,
    /// WGS 84 UTM zone (EPSG:326xx north, 327xx south)
    UTM { zone: u8, north: bool },
}

impl CoordinateSystem {
    /// Get the EPSG code for this coordinate system
    pub fn epsg_code(&self) -> u32 {
        match self {
            CoordinateSystem::WGS84 => 4326,
            CoordinateSystem::WebMercator => 3857,
            CoordinateSystem::UTM { zone, north: true } => 32600 + *zone as u32,
            CoordinateSystem::UTM { zone, north: false } => 32700 + *zone as u32,
        }
    }

    /// Whether coordinates are angular (degrees) rather than projected metres
    pub fn is_geographic(&self) -> bool {
        matches!(self, CoordinateSystem::WGS84)
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg_code())
    }
}

/// Factory for creating coordinate systems
pub struct CoordinateSystemFactory;

impl CoordinateSystemFactory {
    /// Create a coordinate system from an EPSG code
    pub fn from_epsg(epsg: u32) -> DustResult<CoordinateSystem> {
        match epsg {
            4326 => Ok(CoordinateSystem::WGS84),
            3857 | 900913 | 3785 | 102100 | 102113 => Ok(CoordinateSystem::WebMercator),
            32601..=32660 => Ok(CoordinateSystem::UTM { zone: (epsg - 32600) as u8, north: true }),
            32701..=32760 => Ok(CoordinateSystem::UTM { zone: (epsg - 32700) as u8, north: false }),
            _ => Err(DustError::Input(format!("Unsupported coordinate reference system: EPSG:{}", epsg))),
        }
    }

    /// Parse a coordinate system from a string
    ///
    /// Accepts `EPSG:4326`, a bare code, an OGC URN and `CRS:84`.
    pub fn from_string(crs_str: &str) -> DustResult<CoordinateSystem> {
        if CRS84_PATTERN.is_match(crs_str) || crs_str.trim().eq_ignore_ascii_case("WGS84") {
            return Ok(CoordinateSystem::WGS84);
        }

        let code = EPSG_PATTERN
            .captures(crs_str)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .ok_or_else(|| DustError::Input(format!("Unrecognized CRS identifier: '{}'", crs_str)))?;

        Self::from_epsg(code)
    }
}
