//! Local horizon frame (East/North/Up) at an observer and the look-angle
//! conversions that use it.
//!
//! `up` is the ellipsoid normal. `north` is the Earth's polar axis with its
//! `up` component removed, and `east = north × up`. That seed is parallel to
//! `up` at the geographic poles, so within [`POLE_SEED_TOLERANCE`] of them
//! the frame is seeded with the meridian tangent instead, which is the limit
//! of the polar-axis construction as the latitude approaches ±90°.

use nalgebra::Vector3;

use crate::observer::ellipsoid_normal;

/// Largest |seed · up| still treated as a usable polar-axis seed.
pub const POLE_SEED_TOLERANCE: f64 = 1.0 - 1e-12;

/// How the `north` axis of a [`LocalFrame`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSeed {
    /// Gram-Schmidt of the Earth's polar axis against `up`.
    PolarAxis,
    /// Analytic meridian tangent, used at the geographic poles.
    MeridianTangent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    pub east: Vector3<f64>,
    pub north: Vector3<f64>,
    pub up: Vector3<f64>,
    pub seed: FrameSeed,
}

/// Azimuth/elevation of a direction in a local frame, degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    pub azimuth: f64,   // [0, 360), clockwise from north
    pub elevation: f64, // [-90, 90]
    pub cos_zenith: f64,
}

impl LookAngles {
    pub fn is_above_horizon(&self) -> bool {
        self.cos_zenith > 0.0
    }
}

impl LocalFrame {
    pub fn build(lat_deg: f64, lon_deg: f64) -> Self {
        let up = ellipsoid_normal(lat_deg, lon_deg);
        let polar_axis = Vector3::z();

        let along_up = polar_axis.dot(&up);
        let (north, seed) = if along_up.abs() < POLE_SEED_TOLERANCE {
            ((polar_axis - along_up * up).normalize(), FrameSeed::PolarAxis)
        } else {
            (meridian_tangent(lat_deg, lon_deg), FrameSeed::MeridianTangent)
        };
        let east = north.cross(&up);

        Self {
            east,
            north,
            up,
            seed,
        }
    }

    /// Look angles of a unit direction expressed in the Earth-fixed frame.
    ///
    /// At the zenith (and nadir) the horizontal components vanish and the
    /// azimuth is whatever `atan2` makes of the rounding residue.
    pub fn look_angles(&self, direction: &Vector3<f64>) -> LookAngles {
        let cos_zenith = self.up.dot(direction);
        let elevation = 90.0 - acos_deg(cos_zenith);

        let toward_east = direction.dot(&self.east);
        let toward_north = direction.dot(&self.north);
        let azimuth = wrap_degrees(toward_east.atan2(toward_north).to_degrees());

        LookAngles {
            azimuth,
            elevation,
            cos_zenith,
        }
    }

    /// Unit Earth-fixed direction for an azimuth/elevation in degrees.
    pub fn direction(&self, azimuth_deg: f64, elevation_deg: f64) -> Vector3<f64> {
        let (sin_az, cos_az) = azimuth_deg.to_radians().sin_cos();
        let (sin_el, cos_el) = elevation_deg.to_radians().sin_cos();

        cos_el * sin_az * self.east + cos_el * cos_az * self.north + sin_el * self.up
    }
}

fn meridian_tangent(lat_deg: f64, lon_deg: f64) -> Vector3<f64> {
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();

    Vector3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat)
}

/// `acos` in degrees, with the argument clamped so that dot products of unit
/// vectors that overshoot ±1 by rounding still yield an angle.
pub fn acos_deg(cosine: f64) -> f64 {
    cosine.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Wraps an angle into [0, 360).
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
