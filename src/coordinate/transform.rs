//! Coordinate transformation functionality
//!
//! Every supported system converts to and from WGS 84 in closed form, so
//! any pair is handled by pivoting through longitude/latitude.

use super::bbox::BoundingBox;
use super::crs::CoordinateSystem;
use super::point::Point;
use std::f64::consts::PI;

/// WGS 84 semi-major axis in metres
const WGS84_A: f64 = 6378137.0;
/// WGS 84 flattening
const WGS84_F: f64 = 1.0 / 298.257223563;
/// UTM scale factor on the central meridian
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;
/// Latitude limit of the square Web Mercator world
const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_6;

/// Transformer for converting between coordinate systems
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateTransformer;

impl CoordinateTransformer {
    /// Earth radius in metres used by Web Mercator
    const EARTH_RADIUS: f64 = WGS84_A;

    pub fn new() -> Self {
        CoordinateTransformer
    }

    /// Convert from WGS84 (EPSG:4326) to Web Mercator (EPSG:3857)
    pub fn wgs84_to_web_mercator(&self, lon: f64, lat: f64) -> Point {
        let lat = lat.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);

        let x = lon * Self::EARTH_RADIUS * PI / 180.0;
        let y = f64::ln(f64::tan((90.0 + lat) * PI / 360.0)) * Self::EARTH_RADIUS;

        Point::new(x, y)
    }

    /// Convert from Web Mercator (EPSG:3857) to WGS84 (EPSG:4326)
    pub fn web_mercator_to_wgs84(&self, x: f64, y: f64) -> Point {
        let lon = x * 180.0 / (Self::EARTH_RADIUS * PI);
        let lat = 180.0 / PI * (2.0 * f64::atan(f64::exp(y / Self::EARTH_RADIUS)) - PI / 2.0);

        Point::new(lon, lat)
    }

    /// Convert WGS 84 longitude/latitude to UTM easting/northing
    ///
    /// Krüger series to third order in n, sub-millimetre within a zone.
    pub fn wgs84_to_utm(&self, lon: f64, lat: f64, zone: u8, north: bool) -> Point {
        let tm = TransverseMercator::wgs84();
        let phi = lat.to_radians();
        let dlambda = (lon - central_meridian(zone)).to_radians();

        let e = tm.eccentricity;
        let t = (phi.sin().atanh() - e * (e * phi.sin()).atanh()).sinh();
        let xi_p = t.atan2(dlambda.cos());
        let eta_p = (dlambda.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, alpha) in tm.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        let false_northing = if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };
        Point::new(
            UTM_FALSE_EASTING + UTM_K0 * tm.rectifying_radius * eta,
            false_northing + UTM_K0 * tm.rectifying_radius * xi,
        )
    }

    /// Convert UTM easting/northing to WGS 84 longitude/latitude
    pub fn utm_to_wgs84(&self, easting: f64, northing: f64, zone: u8, north: bool) -> Point {
        let tm = TransverseMercator::wgs84();
        let false_northing = if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };
        let xi = (northing - false_northing) / (UTM_K0 * tm.rectifying_radius);
        let eta = (easting - UTM_FALSE_EASTING) / (UTM_K0 * tm.rectifying_radius);

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, beta) in tm.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let mut phi = chi;
        for (j, delta) in tm.delta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            phi += delta * (k * chi).sin();
        }
        let dlambda = eta_p.sinh().atan2(xi_p.cos());

        Point::new(central_meridian(zone) + dlambda.to_degrees(), phi.to_degrees())
    }

    /// Any supported system to WGS 84
    pub fn to_wgs84(&self, point: &Point, crs: &CoordinateSystem) -> Point {
        match crs {
            CoordinateSystem::WGS84 => *point,
            CoordinateSystem::WebMercator => self.web_mercator_to_wgs84(point.x, point.y),
            CoordinateSystem::UTM { zone, north } => self.utm_to_wgs84(point.x, point.y, *zone, *north),
        }
    }

    /// WGS 84 to any supported system
    pub fn from_wgs84(&self, point: &Point, crs: &CoordinateSystem) -> Point {
        match crs {
            CoordinateSystem::WGS84 => *point,
            CoordinateSystem::WebMercator => self.wgs84_to_web_mercator(point.x, point.y),
            CoordinateSystem::UTM { zone, north } => self.wgs84_to_utm(point.x, point.y, *zone, *north),
        }
    }

    /// Transform a point between coordinate systems
    pub fn transform_point(&self, point: &Point, from_crs: &CoordinateSystem, to_crs: &CoordinateSystem) -> Point {
        if from_crs == to_crs {
            return *point;
        }
        self.from_wgs84(&self.to_wgs84(point, from_crs), to_crs)
    }

    /// Transform a bounding box between coordinate systems
    ///
    /// The result is the envelope of the four transformed corners.
    pub fn transform_bbox(&self, bbox: &BoundingBox, from_crs: &CoordinateSystem, to_crs: &CoordinateSystem) -> BoundingBox {
        if from_crs == to_crs {
            return *bbox;
        }

        let corners: Vec<Point> = bbox
            .corners()
            .iter()
            .map(|corner| self.transform_point(corner, from_crs, to_crs))
            .collect();
        BoundingBox::envelope(&corners)
    }
}

/// Longitude of a UTM zone's central meridian in degrees
fn central_meridian(zone: u8) -> f64 {
    zone as f64 * 6.0 - 183.0
}

/// Series coefficients of the transverse Mercator projection on an ellipsoid
struct TransverseMercator {
    eccentricity: f64,
    rectifying_radius: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

impl TransverseMercator {
    fn wgs84() -> Self {
        let n = WGS84_F / (2.0 - WGS84_F);
        let (n2, n3) = (n * n, n * n * n);

        TransverseMercator {
            eccentricity: 2.0 * n.sqrt() / (1.0 + n),
            rectifying_radius: WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
        }
    }
}
