//! Providers resolve an object group to Earth-fixed positions at one instant.
//!
//! The engine never reaches for them itself; the application layer builds
//! one per group and hands it to [`crate::service::SkyFinder`].

use chrono::{DateTime, Duration, Utc};
use nalgebra::Vector3;
use rayon::prelude::*;
use sgp4::{Constants, MinutesSinceEpoch};

use crate::catalog::{Catalog, CatalogEntry};
use crate::ephemeris::{
    eci_to_ecef, gmst, in_earth_shadow, moon_position_eci, planet_position_eci, sun_direction_ecef,
    sun_position_eci, Planet,
};
use crate::error::{FinderError, FinderResult};
use crate::objects::{ObjectClass, TrackedObject};

const STALE_ELEMENTS_DAYS: i64 = 30;

pub trait PropagationProvider {
    fn object_class(&self) -> ObjectClass;

    /// Positions (and, where known, illumination) of every object at `at`.
    fn locate(&self, at: DateTime<Utc>) -> FinderResult<Vec<TrackedObject>>;
}

pub trait SunProvider {
    /// Unit vector toward the Sun in the Earth-fixed frame.
    fn sun_direction(&self, at: DateTime<Utc>) -> FinderResult<Vector3<f64>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LowPrecisionSun;

impl SunProvider for LowPrecisionSun {
    fn sun_direction(&self, at: DateTime<Utc>) -> FinderResult<Vector3<f64>> {
        Ok(sun_direction_ecef(at))
    }
}

/// SGP4 propagation of a TLE catalog, with an Earth-shadow flag per satellite.
pub struct Sgp4Provider {
    catalog: Catalog,
}

impl Sgp4Provider {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl PropagationProvider for Sgp4Provider {
    fn object_class(&self) -> ObjectClass {
        ObjectClass::Satellite
    }

    fn locate(&self, at: DateTime<Utc>) -> FinderResult<Vec<TrackedObject>> {
        if self.catalog.is_empty() {
            return Err(FinderError::ProviderUnavailable(
                "object group has no element sets".to_string(),
            ));
        }

        let gmst = gmst(at);
        let sun_direction = sun_direction_ecef(at);

        let objects: Vec<TrackedObject> = self
            .catalog
            .entries
            .par_iter()
            .filter_map(|entry| match position_ecef(entry, at, gmst) {
                Ok(position) => Some(
                    TrackedObject::new(entry.name.clone(), position)
                        .with_identifier(entry.norad_id.clone())
                        .with_illumination(!in_earth_shadow(&position, &sun_direction)),
                ),
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            })
            .collect();

        let stale = self
            .catalog
            .entries
            .iter()
            .filter(|entry| {
                (at.naive_utc() - entry.elements.datetime).abs()
                    > Duration::days(STALE_ELEMENTS_DAYS)
            })
            .count();
        if stale > 0 {
            tracing::warn!(
                stale,
                "element sets are more than {} days from the requested time; positions may be inaccurate",
                STALE_ELEMENTS_DAYS
            );
        }

        if objects.is_empty() {
            return Err(FinderError::ProviderUnavailable(format!(
                "none of {} element sets could be propagated",
                self.catalog.len()
            )));
        }
        Ok(objects)
    }
}

fn position_ecef(entry: &CatalogEntry, at: DateTime<Utc>, gmst: f64) -> FinderResult<Vector3<f64>> {
    let propagation_error = |reason: String| FinderError::Propagation {
        name: entry.name.clone(),
        reason,
    };

    let constants =
        Constants::from_elements(&entry.elements).map_err(|e| propagation_error(e.to_string()))?;
    let minutes_since_epoch =
        (at.naive_utc() - entry.elements.datetime).num_milliseconds() as f64 / 60000.0;

    let prediction = constants
        .propagate(MinutesSinceEpoch(minutes_since_epoch))
        .map_err(|e| propagation_error(e.to_string()))?;

    // TEME, km
    let position_eci = Vector3::new(
        prediction.position[0],
        prediction.position[1],
        prediction.position[2],
    ) * 1000.0;

    Ok(eci_to_ecef(&position_eci, gmst))
}

/// Solar-system bodies with analytic ephemerides. Illumination is not
/// reported for bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodiesProvider;

impl PropagationProvider for BodiesProvider {
    fn object_class(&self) -> ObjectClass {
        ObjectClass::SolarSystemBody
    }

    fn locate(&self, at: DateTime<Utc>) -> FinderResult<Vec<TrackedObject>> {
        let gmst = gmst(at);
        let mut bodies = vec![
            TrackedObject::new("Sun", eci_to_ecef(&sun_position_eci(at), gmst)),
            TrackedObject::new("Moon", eci_to_ecef(&moon_position_eci(at), gmst)),
        ];
        bodies.extend(Planet::ALL.iter().map(|&planet| {
            TrackedObject::new(
                planet.name(),
                eci_to_ecef(&planet_position_eci(planet, at), gmst),
            )
        }));
        Ok(bodies)
    }
}
