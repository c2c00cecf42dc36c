use nalgebra::Vector3;
use rayon::prelude::*;
use serde::Serialize;

use crate::frame::{acos_deg, LocalFrame};
use crate::objects::TrackedObject;
use crate::observer::Observer;
use crate::precision::AnglePrecision;

/// Where a tracked object appears in the observer's sky.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibilityRecord {
    pub name: String,
    #[serde(rename = "norad_id")]
    pub identifier: Option<String>,
    #[serde(rename = "sunlit")]
    pub illuminated: Option<bool>,
    /// Angle between the line of sight and the sun direction: 180 is
    /// front-lit (good contrast), 0 is backlit.
    #[serde(rename = "sunphase")]
    pub sun_phase: Option<f64>,
    #[serde(rename = "az")]
    pub azimuth: f64,
    #[serde(rename = "el")]
    pub elevation: f64,
}

impl VisibilityRecord {
    pub fn with_precision(self, precision: AnglePrecision) -> Self {
        Self {
            azimuth: precision.apply_azimuth(self.azimuth),
            elevation: precision.apply(self.elevation),
            sun_phase: self.sun_phase.map(|phase| precision.apply(phase)),
            ..self
        }
    }
}

/// Classifies every object against the observer's horizon.
///
/// Objects above the horizon are always returned; objects on or below it only
/// when `show_below_horizon` is set. An object co-located with the observer
/// has no line of sight and is skipped. Output keeps the input order.
pub fn classify(
    observer: &Observer,
    objects: &[TrackedObject],
    sun_direction: Option<&Vector3<f64>>,
    show_below_horizon: bool,
) -> Vec<VisibilityRecord> {
    let observer_ecef = observer.to_ecef();
    let frame = LocalFrame::build(observer.latitude, observer.longitude);

    objects
        .par_iter()
        .filter_map(|object| {
            let Some(line_of_sight) = object.direction_from(&observer_ecef) else {
                tracing::debug!(name = %object.name, "object at observer position, skipped");
                return None;
            };

            let look = frame.look_angles(&line_of_sight);
            let included = look.is_above_horizon() || show_below_horizon;
            tracing::debug!(
                name = %object.name,
                cos_zenith = look.cos_zenith,
                azimuth = look.azimuth,
                elevation = look.elevation,
                included,
                "classified"
            );
            if !included {
                return None;
            }

            Some(VisibilityRecord {
                name: object.name.clone(),
                identifier: object.identifier.clone(),
                illuminated: object.illuminated,
                sun_phase: sun_direction.map(|sun| acos_deg(line_of_sight.dot(sun))),
                azimuth: look.azimuth,
                elevation: look.elevation,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::geodetic_to_ecef;
    use approx::assert_abs_diff_eq;

    fn object_along(observer: &Observer, name: &str, direction: Vector3<f64>) -> TrackedObject {
        TrackedObject::new(name, observer.to_ecef() + direction * 1.0e6)
    }

    #[test]
    fn test_object_overhead_is_at_zenith() {
        let observer = Observer::new(40.0, -105.0, 0.0);
        let overhead = TrackedObject::new("OVERHEAD", geodetic_to_ecef(40.0, -105.0, 500_000.0));

        for show_all in [false, true] {
            let records = classify(&observer, std::slice::from_ref(&overhead), None, show_all);
            assert_eq!(records.len(), 1);
            assert_abs_diff_eq!(records[0].elevation, 90.0, epsilon = 1e-5);
            assert!((0.0..360.0).contains(&records[0].azimuth));
        }
    }

    #[test]
    fn test_object_below_observer() {
        let observer = Observer::new(0.0, 0.0, 0.0);
        let below = object_along(&observer, "BELOW", -observer.up());

        let hidden = classify(&observer, std::slice::from_ref(&below), None, false);
        assert!(hidden.is_empty());

        let shown = classify(&observer, std::slice::from_ref(&below), None, true);
        assert_eq!(shown.len(), 1);
        assert_abs_diff_eq!(shown[0].elevation, -90.0, epsilon = 1e-5);
    }

    #[test]
    fn test_object_on_horizon_plane() {
        let observer = Observer::new(0.0, 0.0, 0.0);
        let frame = LocalFrame::build(0.0, 0.0);
        // east is exactly +y here, so the line of sight has no up component
        let horizon = object_along(&observer, "HORIZON", frame.east);

        assert!(classify(&observer, std::slice::from_ref(&horizon), None, false).is_empty());

        let shown = classify(&observer, std::slice::from_ref(&horizon), None, true);
        assert_eq!(shown.len(), 1);
        assert_abs_diff_eq!(shown[0].elevation, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(shown[0].azimuth, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sun_phase_bounds() {
        let observer = Observer::new(51.5, -0.1, 0.0);
        let frame = LocalFrame::build(51.5, -0.1);
        let line_of_sight = frame.direction(120.0, 35.0);
        let object = object_along(&observer, "SAT", line_of_sight);

        let aligned = classify(&observer, std::slice::from_ref(&object), Some(&line_of_sight), false);
        assert_abs_diff_eq!(aligned[0].sun_phase.unwrap(), 0.0, epsilon = 1e-4);

        let opposite = -line_of_sight;
        let front_lit = classify(&observer, std::slice::from_ref(&object), Some(&opposite), false);
        assert_abs_diff_eq!(front_lit[0].sun_phase.unwrap(), 180.0, epsilon = 1e-4);
    }

    #[test]
    fn test_unknown_sun_phase_and_illumination_stay_absent() {
        let observer = Observer::new(10.0, 20.0, 0.0);
        let body = object_along(&observer, "Moon", observer.up());

        let records = classify(&observer, &[body], None, false);
        assert_eq!(records[0].sun_phase, None);
        assert_eq!(records[0].illuminated, None);

        let json = serde_json::to_value(&records[0]).unwrap();
        assert!(json["sunphase"].is_null());
        assert!(json["sunlit"].is_null());
        assert!(json["norad_id"].is_null());
    }

    #[test]
    fn test_passes_illumination_and_keeps_input_order() {
        let observer = Observer::new(-33.9, 18.4, 0.0);
        let frame = LocalFrame::build(-33.9, 18.4);
        let objects: Vec<TrackedObject> = (0..20)
            .map(|i| {
                let elevation = if i % 3 == 0 { -10.0 } else { 30.0 };
                object_along(&observer, &format!("SAT {i}"), frame.direction(i as f64 * 17.0, elevation))
                    .with_identifier(format!("{}", 40000 + i))
                    .with_illumination(i % 2 == 0)
            })
            .collect();

        let records = classify(&observer, &objects, None, false);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        let expected: Vec<String> = (0..20).filter(|i| i % 3 != 0).map(|i| format!("SAT {i}")).collect();
        assert_eq!(names, expected);

        for record in &records {
            let index: usize = record.name[4..].parse().unwrap();
            assert_eq!(record.illuminated, Some(index % 2 == 0));
            assert_eq!(record.identifier, Some(format!("{}", 40000 + index)));
            assert_abs_diff_eq!(record.azimuth, index as f64 * 17.0 % 360.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_colocated_object_is_skipped() {
        let observer = Observer::new(40.0, -105.0, 1600.0);
        let here = TrackedObject::new("HERE", observer.to_ecef());
        assert!(classify(&observer, &[here], None, true).is_empty());
    }

    #[test]
    fn test_precision_applied_to_record() {
        let record = VisibilityRecord {
            name: "SAT".to_string(),
            identifier: None,
            illuminated: Some(true),
            sun_phase: Some(123.9),
            azimuth: 359.7,
            elevation: -0.4,
        };
        let truncated = record.clone().with_precision(AnglePrecision::Truncate);
        assert_eq!(
            (truncated.azimuth, truncated.elevation, truncated.sun_phase),
            (359.0, 0.0, Some(123.0))
        );
        let json = serde_json::to_string(&truncated).unwrap();
        assert!(json.contains("\"el\":0.0"), "{json}");
        assert!(!json.contains("-0.0"), "{json}");

        let rounded = record.with_precision(AnglePrecision::Round);
        assert_eq!((rounded.azimuth, rounded.elevation, rounded.sun_phase), (0.0, 0.0, Some(124.0)));
        assert!(rounded.elevation.is_sign_positive());
    }
}
