use nalgebra::Vector3;

use crate::error::{FinderError, FinderResult};

// WGS84 semi-major axis with the semi-minor axis rounded to whole meters.
pub const SEMI_MAJOR_AXIS_M: f64 = 6378137.0;
pub const SEMI_MINOR_AXIS_M: f64 = 6356752.0;

/// Geodetic position of a ground observer on the reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude: f64,  // degrees
    pub longitude: f64, // degrees
    pub altitude: f64,  // meters
}

impl Observer {
    pub fn new(lat: f64, lon: f64, alt: f64) -> Self {
        Self {
            latitude: lat,
            longitude: lon,
            altitude: alt,
        }
    }

    /// Rejects coordinates the numeric routines are not defined for.
    ///
    /// Called at the request boundary; `to_ecef` and the frame builder assume
    /// a validated position and never check again.
    pub fn validate(&self) -> FinderResult<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(FinderError::invalid(
                "latitude",
                format!("{} is outside [-90, 90]", self.latitude),
            ));
        }
        if !self.longitude.is_finite() || !(-180.0..360.0).contains(&self.longitude) {
            return Err(FinderError::invalid(
                "longitude",
                format!("{} is outside [-180, 360)", self.longitude),
            ));
        }
        if !self.altitude.is_finite() {
            return Err(FinderError::invalid("altitude", "must be a finite number"));
        }
        Ok(())
    }

    // Convert observer location to ECEF coordinates
    pub fn to_ecef(&self) -> Vector3<f64> {
        geodetic_to_ecef(self.latitude, self.longitude, self.altitude)
    }

    /// Local vertical (ellipsoid normal) at the observer.
    pub fn up(&self) -> Vector3<f64> {
        ellipsoid_normal(self.latitude, self.longitude)
    }
}

/// Closed-form geodetic to Earth-fixed conversion, meters.
pub fn geodetic_to_ecef(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Vector3<f64> {
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();

    let ratio_sq = (SEMI_MINOR_AXIS_M / SEMI_MAJOR_AXIS_M).powi(2);
    let e2 = 1.0 - ratio_sq;

    let n = SEMI_MAJOR_AXIS_M / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    let x = (n + alt_m) * cos_lat * cos_lon;
    let y = (n + alt_m) * cos_lat * sin_lon;
    let z = (ratio_sq * n + alt_m) * sin_lat;

    Vector3::new(x, y, z)
}

/// Unit normal of the ellipsoid at a geodetic latitude/longitude.
///
/// This is the local "up", which is not the normalized Earth-fixed position:
/// the two only coincide on the equator and at the poles.
pub fn ellipsoid_normal(lat_deg: f64, lon_deg: f64) -> Vector3<f64> {
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();

    Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_equator_prime_meridian() {
        let ecef = geodetic_to_ecef(0.0, 0.0, 0.0);
        assert_abs_diff_eq!(ecef.x, SEMI_MAJOR_AXIS_M, epsilon = 1e-6);
        assert_abs_diff_eq!(ecef.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ecef.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_north_pole_uses_semi_minor_axis() {
        let ecef = geodetic_to_ecef(90.0, 0.0, 0.0);
        assert_abs_diff_eq!(ecef.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ecef.z, SEMI_MINOR_AXIS_M, epsilon = 1e-3);
    }

    #[test]
    fn test_altitude_moves_along_normal() {
        let ground = geodetic_to_ecef(40.0, -105.0, 0.0);
        let raised = geodetic_to_ecef(40.0, -105.0, 1000.0);
        let offset = raised - ground;

        assert_abs_diff_eq!(offset.norm(), 1000.0, epsilon = 1e-6);
        let normal = ellipsoid_normal(40.0, -105.0);
        assert_abs_diff_eq!(offset.normalize().dot(&normal), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normal_differs_from_geocentric_direction() {
        let position = geodetic_to_ecef(45.0, 10.0, 0.0).normalize();
        let normal = ellipsoid_normal(45.0, 10.0);

        assert_abs_diff_eq!(normal.norm(), 1.0, epsilon = 1e-12);
        // ~0.19 degrees of separation at mid-latitudes
        let separation = position.dot(&normal).clamp(-1.0, 1.0).acos().to_degrees();
        assert!(separation > 0.1 && separation < 0.3, "separation {separation}");

        let eq_position = geodetic_to_ecef(0.0, 10.0, 0.0).normalize();
        assert_abs_diff_eq!(eq_position, ellipsoid_normal(0.0, 10.0), epsilon = 1e-12);
    }

    #[test]
    fn test_longitude_wraps() {
        let a = geodetic_to_ecef(12.0, -90.0, 0.0);
        let b = geodetic_to_ecef(12.0, 270.0, 0.0);
        assert_abs_diff_eq!(a, b, epsilon = 1e-6);
    }

    #[test]
    fn test_validate() {
        assert!(Observer::new(40.0, -105.0, 0.0).validate().is_ok());
        assert!(Observer::new(90.0, 359.9, 0.0).validate().is_ok());
        assert!(Observer::new(90.5, 0.0, 0.0).validate().is_err());
        assert!(Observer::new(0.0, 360.0, 0.0).validate().is_err());
        assert!(Observer::new(0.0, -180.5, 0.0).validate().is_err());
        assert!(Observer::new(f64::NAN, 0.0, 0.0).validate().is_err());
        assert!(Observer::new(0.0, 0.0, f64::INFINITY).validate().is_err());
    }
}
