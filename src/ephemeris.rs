//! Low-precision geocentric ephemerides for the Sun, Moon and outer planets,
//! Earth rotation, and the Earth-shadow test used to flag sunlit satellites.
//!
//! Accuracy is a few hundredths of a degree for the Sun and a few tenths for
//! the Moon. Planets come from Keplerian mean elements (valid 1800 to 2050)
//! and land within about a tenth of a degree, which is well inside the
//! tolerance of a pointing identification.

use chrono::{DateTime, NaiveDate, Utc};
use nalgebra::Vector3;

use crate::observer::SEMI_MAJOR_AXIS_M;

pub const ASTRONOMICAL_UNIT_M: f64 = 149_597_870_700.0;
const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;
const GENERAL_PRECESSION_DEG_PER_CENTURY: f64 = 1.396971;

/// Days since J2000.0 (2000-01-01 12:00 UTC).
pub fn days_since_j2000(time: DateTime<Utc>) -> f64 {
    let j2000 = NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    time.signed_duration_since(j2000).num_milliseconds() as f64 / 86_400_000.0
}

fn julian_centuries(time: DateTime<Utc>) -> f64 {
    days_since_j2000(time) / DAYS_PER_JULIAN_CENTURY
}

/// Greenwich mean sidereal time, radians in [0, 2π).
pub fn gmst(time: DateTime<Utc>) -> f64 {
    let gmst_hours = 18.697374558 + 24.06570982441908 * days_since_j2000(time);
    (gmst_hours.rem_euclid(24.0) * 15.0).to_radians()
}

/// Rotates an inertial (equator-of-date) vector into the Earth-fixed frame.
pub fn eci_to_ecef(eci: &Vector3<f64>, gmst: f64) -> Vector3<f64> {
    let (sin_gmst, cos_gmst) = gmst.sin_cos();

    Vector3::new(
        eci.x * cos_gmst + eci.y * sin_gmst,
        -eci.x * sin_gmst + eci.y * cos_gmst,
        eci.z,
    )
}

fn mean_obliquity(t: f64) -> f64 {
    (23.439291 - 0.0130042 * t).to_radians()
}

fn ecliptic_to_equatorial(lon: f64, lat: f64, distance: f64, obliquity: f64) -> Vector3<f64> {
    let (sin_lon, cos_lon) = lon.sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_eps, cos_eps) = obliquity.sin_cos();

    distance
        * Vector3::new(
            cos_lat * cos_lon,
            cos_eps * cos_lat * sin_lon - sin_eps * sin_lat,
            sin_eps * cos_lat * sin_lon + cos_eps * sin_lat,
        )
}

/// Geocentric inertial position of the Sun, meters.
pub fn sun_position_eci(time: DateTime<Utc>) -> Vector3<f64> {
    let t = julian_centuries(time);

    let l0 = 280.46646 + 36000.76983 * t + 0.0003032 * t * t;
    let m = (357.52911 + 35999.05029 * t - 0.0001537 * t * t).to_radians();

    let c = (1.914602 - 0.004817 * t - 0.000014 * t * t) * m.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * m).sin()
        + 0.000289 * (3.0 * m).sin();

    let omega = (125.04 - 1934.136 * t).to_radians();
    let apparent_lon = (l0 + c - 0.00569 - 0.00478 * omega.sin()).to_radians();

    let distance_au = 1.00014 - 0.01671 * m.cos() - 0.00014 * (2.0 * m).cos();

    ecliptic_to_equatorial(
        apparent_lon,
        0.0,
        distance_au * ASTRONOMICAL_UNIT_M,
        mean_obliquity(t),
    )
}

/// Geocentric inertial position of the Moon, meters.
pub fn moon_position_eci(time: DateTime<Utc>) -> Vector3<f64> {
    let t = julian_centuries(time);
    let sin_deg = |deg: f64| deg.to_radians().sin();
    let cos_deg = |deg: f64| deg.to_radians().cos();

    let lon = 218.32 + 481267.881 * t + 6.29 * sin_deg(135.0 + 477198.87 * t)
        - 1.27 * sin_deg(259.3 - 413335.36 * t)
        + 0.66 * sin_deg(235.7 + 890534.22 * t)
        + 0.21 * sin_deg(269.9 + 954397.74 * t)
        - 0.19 * sin_deg(357.5 + 35999.05 * t)
        - 0.11 * sin_deg(186.5 + 966404.03 * t);

    let lat = 5.13 * sin_deg(93.3 + 483202.02 * t) + 0.28 * sin_deg(228.2 + 960400.89 * t)
        - 0.28 * sin_deg(318.3 + 6003.15 * t)
        - 0.17 * sin_deg(217.6 - 407332.21 * t);

    let parallax = 0.9508
        + 0.0518 * cos_deg(135.0 + 477198.87 * t)
        + 0.0095 * cos_deg(259.3 - 413335.36 * t)
        + 0.0078 * cos_deg(235.7 + 890534.22 * t)
        + 0.0028 * cos_deg(269.9 + 954397.74 * t);

    let distance = SEMI_MAJOR_AXIS_M / parallax.to_radians().sin();

    ecliptic_to_equatorial(lon.to_radians(), lat.to_radians(), distance, mean_obliquity(t))
}

/// Planets carried alongside the Sun and Moon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Planet {
    Mars,
    Jupiter,
    Saturn,
}

impl Planet {
    pub const ALL: [Planet; 3] = [Planet::Mars, Planet::Jupiter, Planet::Saturn];

    pub fn name(self) -> &'static str {
        match self {
            Planet::Mars => "Mars",
            Planet::Jupiter => "Jupiter",
            Planet::Saturn => "Saturn",
        }
    }

    fn elements(self) -> &'static MeanElements {
        match self {
            Planet::Mars => &MARS,
            Planet::Jupiter => &JUPITER,
            Planet::Saturn => &SATURN,
        }
    }
}

/// Heliocentric mean elements referred to the J2000 ecliptic and equinox.
/// Each pair is the J2000 value and its rate per Julian century.
struct MeanElements {
    semi_major_axis_au: (f64, f64),
    eccentricity: (f64, f64),
    inclination_deg: (f64, f64),
    mean_longitude_deg: (f64, f64),
    perihelion_longitude_deg: (f64, f64),
    node_longitude_deg: (f64, f64),
}

const EARTH_MOON_BARYCENTER: MeanElements = MeanElements {
    semi_major_axis_au: (1.00000261, 0.00000562),
    eccentricity: (0.01671123, -0.00004392),
    inclination_deg: (-0.00001531, -0.01294668),
    mean_longitude_deg: (100.46457166, 35999.37244981),
    perihelion_longitude_deg: (102.93768193, 0.32327364),
    node_longitude_deg: (0.0, 0.0),
};

const MARS: MeanElements = MeanElements {
    semi_major_axis_au: (1.52371034, 0.00001847),
    eccentricity: (0.09339410, 0.00007882),
    inclination_deg: (1.84969142, -0.00813131),
    mean_longitude_deg: (-4.55343205, 19140.30268499),
    perihelion_longitude_deg: (-23.94362959, 0.44441088),
    node_longitude_deg: (49.55953891, -0.29257343),
};

const JUPITER: MeanElements = MeanElements {
    semi_major_axis_au: (5.20288700, -0.00011607),
    eccentricity: (0.04838624, -0.00013253),
    inclination_deg: (1.30439695, -0.00183714),
    mean_longitude_deg: (34.39644051, 3034.74612775),
    perihelion_longitude_deg: (14.72847983, 0.21252668),
    node_longitude_deg: (100.47390909, 0.20469106),
};

const SATURN: MeanElements = MeanElements {
    semi_major_axis_au: (9.53667594, -0.00125060),
    eccentricity: (0.05386179, -0.00050991),
    inclination_deg: (2.48599187, 0.00193609),
    mean_longitude_deg: (49.95424423, 1222.49362201),
    perihelion_longitude_deg: (92.59887831, -0.41897216),
    node_longitude_deg: (113.66242448, -0.28867794),
};

fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let mut eccentric_anomaly = mean_anomaly + eccentricity * mean_anomaly.sin();
    for _ in 0..10 {
        let step = (eccentric_anomaly - eccentricity * eccentric_anomaly.sin() - mean_anomaly)
            / (1.0 - eccentricity * eccentric_anomaly.cos());
        eccentric_anomaly -= step;
        if step.abs() < 1e-12 {
            break;
        }
    }
    eccentric_anomaly
}

/// Heliocentric position on the J2000 ecliptic, AU.
fn heliocentric_ecliptic(elements: &MeanElements, t: f64) -> Vector3<f64> {
    let at = |(value, rate): (f64, f64)| value + rate * t;

    let a = at(elements.semi_major_axis_au);
    let e = at(elements.eccentricity);
    let inclination = at(elements.inclination_deg).to_radians();
    let perihelion = at(elements.perihelion_longitude_deg);
    let node = at(elements.node_longitude_deg);

    let mean_anomaly = (at(elements.mean_longitude_deg) - perihelion)
        .rem_euclid(360.0)
        .to_radians();
    let eccentric_anomaly = solve_kepler(mean_anomaly, e);

    // position in the orbital plane, x toward perihelion
    let x_orbit = a * (eccentric_anomaly.cos() - e);
    let y_orbit = a * (1.0 - e * e).sqrt() * eccentric_anomaly.sin();

    let (sin_w, cos_w) = (perihelion - node).to_radians().sin_cos();
    let (sin_node, cos_node) = node.to_radians().sin_cos();
    let (sin_i, cos_i) = inclination.sin_cos();

    Vector3::new(
        (cos_w * cos_node - sin_w * sin_node * cos_i) * x_orbit
            + (-sin_w * cos_node - cos_w * sin_node * cos_i) * y_orbit,
        (cos_w * sin_node + sin_w * cos_node * cos_i) * x_orbit
            + (-sin_w * sin_node + cos_w * cos_node * cos_i) * y_orbit,
        sin_w * sin_i * x_orbit + cos_w * sin_i * y_orbit,
    )
}

/// Precesses a J2000 ecliptic vector (AU) to the equator of date, meters.
fn j2000_ecliptic_to_equatorial(ecliptic_au: &Vector3<f64>, t: f64) -> Vector3<f64> {
    let distance = ecliptic_au.norm();
    let lon = ecliptic_au.y.atan2(ecliptic_au.x)
        + (GENERAL_PRECESSION_DEG_PER_CENTURY * t).to_radians();
    let lat = (ecliptic_au.z / distance).asin();

    ecliptic_to_equatorial(lon, lat, distance * ASTRONOMICAL_UNIT_M, mean_obliquity(t))
}

/// Geocentric inertial position of a planet, meters.
pub fn planet_position_eci(planet: Planet, time: DateTime<Utc>) -> Vector3<f64> {
    let t = julian_centuries(time);
    let geocentric = heliocentric_ecliptic(planet.elements(), t)
        - heliocentric_ecliptic(&EARTH_MOON_BARYCENTER, t);

    j2000_ecliptic_to_equatorial(&geocentric, t)
}

/// Unit vector from the Earth's center toward the Sun, Earth-fixed frame.
pub fn sun_direction_ecef(time: DateTime<Utc>) -> Vector3<f64> {
    eci_to_ecef(&sun_position_eci(time), gmst(time)).normalize()
}

/// Cylindrical shadow model: a point is eclipsed when it is on the night side
/// and within one equatorial radius of the Earth-Sun line.
pub fn in_earth_shadow(position: &Vector3<f64>, sun_direction: &Vector3<f64>) -> bool {
    let along_sun = position.dot(sun_direction);
    if along_sun >= 0.0 {
        return false;
    }
    let off_axis = position - along_sun * sun_direction;
    off_axis.norm() < SEMI_MAJOR_AXIS_M
}
