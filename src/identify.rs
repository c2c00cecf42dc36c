use rayon::prelude::*;
use serde::Serialize;

use crate::error::{FinderError, FinderResult};
use crate::frame::{acos_deg, LocalFrame};
use crate::objects::TrackedObject;
use crate::observer::Observer;
use crate::precision::AnglePrecision;

pub const DEFAULT_THRESHOLD_DEG: f64 = 20.0;

/// A direction the observer pointed at, with the acceptance cone half-angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointingQuery {
    pub azimuth: f64,   // degrees, clockwise from north
    pub elevation: f64, // degrees
    pub threshold: f64, // degrees
}

impl PointingQuery {
    pub fn new(azimuth: f64, elevation: f64, threshold: f64) -> Self {
        Self {
            azimuth,
            elevation,
            threshold,
        }
    }

    /// Negative elevations are valid input; they simply never match.
    pub fn validate(&self) -> FinderResult<()> {
        if !self.azimuth.is_finite() {
            return Err(FinderError::invalid("azimuth", "must be a finite number"));
        }
        if !self.elevation.is_finite() || !(-90.0..=90.0).contains(&self.elevation) {
            return Err(FinderError::invalid(
                "elevation",
                format!("{} is outside [-90, 90]", self.elevation),
            ));
        }
        if !self.threshold.is_finite() || !(0.0..=180.0).contains(&self.threshold) {
            return Err(FinderError::invalid(
                "threshold",
                format!("{} is outside [0, 180]", self.threshold),
            ));
        }
        Ok(())
    }
}

/// Candidate object for a pointing direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentificationRecord {
    pub name: String,
    #[serde(rename = "norad_id")]
    pub identifier: Option<String>,
    /// Angle between the pointing direction and the object, degrees.
    #[serde(rename = "err")]
    pub angular_error: f64,
    #[serde(rename = "az")]
    pub azimuth: f64,
    #[serde(rename = "el")]
    pub elevation: f64,
}

impl IdentificationRecord {
    pub fn with_precision(self, precision: AnglePrecision) -> Self {
        Self {
            angular_error: precision.apply(self.angular_error),
            azimuth: precision.apply_azimuth(self.azimuth),
            elevation: precision.apply(self.elevation),
            ..self
        }
    }
}

/// Returns every object that could be what the observer is pointing at.
///
/// A candidate must be above the horizon, explicitly illuminated, and strictly
/// inside the threshold cone around the pointing direction. All candidates are
/// returned in input order; picking between them is left to the caller.
pub fn identify(
    observer: &Observer,
    query: &PointingQuery,
    objects: &[TrackedObject],
) -> Vec<IdentificationRecord> {
    if query.elevation < 0.0 {
        tracing::debug!(
            elevation = query.elevation,
            "pointing below the horizon, nothing to identify"
        );
        return Vec::new();
    }

    let observer_ecef = observer.to_ecef();
    let frame = LocalFrame::build(observer.latitude, observer.longitude);
    let pointing = frame.direction(query.azimuth, query.elevation);
    let cos_threshold = query.threshold.to_radians().cos();

    objects
        .par_iter()
        .filter_map(|object| {
            let line_of_sight = object.direction_from(&observer_ecef)?;
            let cos_error = line_of_sight.dot(&pointing);

            let sunlit = object.illuminated == Some(true);
            if !(cos_error > cos_threshold && sunlit) {
                return None;
            }

            let look = frame.look_angles(&line_of_sight);
            if !look.is_above_horizon() {
                return None;
            }

            tracing::debug!(name = %object.name, cos_error, "candidate within threshold");
            Some(IdentificationRecord {
                name: object.name.clone(),
                identifier: object.identifier.clone(),
                angular_error: acos_deg(cos_error),
                azimuth: look.azimuth,
                elevation: look.elevation,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn observer() -> Observer {
        Observer::new(40.0, -105.0, 0.0)
    }

    fn sat_at(name: &str, azimuth: f64, elevation: f64, sunlit: Option<bool>) -> TrackedObject {
        let observer = observer();
        let frame = LocalFrame::build(observer.latitude, observer.longitude);
        let position = observer.to_ecef() + frame.direction(azimuth, elevation) * 800_000.0;
        let object = TrackedObject::new(name, position).with_identifier(name.to_lowercase());
        match sunlit {
            Some(lit) => object.with_illumination(lit),
            None => object,
        }
    }

    #[test]
    fn test_matches_object_near_pointing_direction() {
        let objects = vec![
            sat_at("NEAR", 100.0, 45.0, Some(true)),
            sat_at("FAR", 280.0, 45.0, Some(true)),
        ];
        let query = PointingQuery::new(105.0, 42.0, DEFAULT_THRESHOLD_DEG);

        let matches = identify(&observer(), &query, &objects);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "NEAR");
        assert_eq!(matches[0].identifier.as_deref(), Some("near"));
        assert_abs_diff_eq!(matches[0].azimuth, 100.0, epsilon = 1e-6);
        assert_abs_diff_eq!(matches[0].elevation, 45.0, epsilon = 1e-6);
        assert!(matches[0].angular_error > 0.0 && matches[0].angular_error < 6.0);
    }

    #[test]
    fn test_returns_every_candidate_in_input_order() {
        let objects = vec![
            sat_at("B", 12.0, 60.0, Some(true)),
            sat_at("A", 8.0, 58.0, Some(true)),
            sat_at("C", 10.0, 61.0, Some(true)),
        ];
        let query = PointingQuery::new(10.0, 60.0, 10.0);

        let names: Vec<String> = identify(&observer(), &query, &objects)
            .into_iter()
            .map(|record| record.name)
            .collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_requires_explicit_illumination() {
        let objects = vec![
            sat_at("DARK", 50.0, 30.0, Some(false)),
            sat_at("UNKNOWN", 50.0, 30.0, None),
            sat_at("LIT", 50.0, 30.0, Some(true)),
        ];
        let query = PointingQuery::new(50.0, 30.0, 5.0);

        let matches = identify(&observer(), &query, &objects);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "LIT");
    }

    #[test]
    fn test_pointing_below_horizon_matches_nothing() {
        let objects = vec![
            sat_at("LOW", 200.0, -5.0, Some(true)),
            sat_at("HIGH", 200.0, 10.0, Some(true)),
        ];
        let query = PointingQuery::new(200.0, -0.5, 90.0);
        assert!(identify(&observer(), &query, &objects).is_empty());
    }

    #[test]
    fn test_below_horizon_object_never_matches() {
        let objects = vec![sat_at("SET", 90.0, -3.0, Some(true))];
        let query = PointingQuery::new(90.0, 1.0, 10.0);
        assert!(identify(&observer(), &query, &objects).is_empty());
    }

    #[test]
    fn test_zero_threshold_matches_nothing() {
        let objects = vec![
            sat_at("EXACT", 33.0, 44.0, Some(true)),
            sat_at("PERTURBED", 33.0001, 44.0, Some(true)),
        ];
        let query = PointingQuery::new(33.0, 44.0, 0.0);
        assert!(identify(&observer(), &query, &objects).is_empty());
    }

    #[test]
    fn test_threshold_is_strict_cone() {
        let objects = vec![sat_at("EDGE", 0.0, 50.0, Some(true))];
        assert!(identify(&observer(), &PointingQuery::new(0.0, 40.0, 9.9), &objects).is_empty());
        assert_eq!(
            identify(&observer(), &PointingQuery::new(0.0, 40.0, 10.1), &objects).len(),
            1
        );
    }

    #[test]
    fn test_colocated_object_is_skipped() {
        let here = TrackedObject::new("HERE", observer().to_ecef()).with_illumination(true);
        let query = PointingQuery::new(0.0, 90.0, 180.0);
        assert!(identify(&observer(), &query, &[here]).is_empty());
    }

    #[test]
    fn test_query_validation() {
        assert!(PointingQuery::new(10.0, -5.0, 20.0).validate().is_ok());
        assert!(PointingQuery::new(f64::NAN, 5.0, 20.0).validate().is_err());
        assert!(PointingQuery::new(10.0, 95.0, 20.0).validate().is_err());
        assert!(PointingQuery::new(10.0, 5.0, -1.0).validate().is_err());
    }

    #[test]
    fn test_record_serializes_wire_field_names() {
        let record = IdentificationRecord {
            name: "ISS (ZARYA)".to_string(),
            identifier: Some("25544".to_string()),
            angular_error: 3.7,
            azimuth: 359.8,
            elevation: 41.2,
        }
        .with_precision(AnglePrecision::Truncate);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["err"], 3.0);
        assert_eq!(json["az"], 359.0);
        assert_eq!(json["el"], 41.0);
        assert_eq!(json["norad_id"], "25544");
        assert_eq!(json["name"], "ISS (ZARYA)");
        assert!(json.get("angular_error").is_none());
    }
}
