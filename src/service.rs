use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{FinderError, FinderResult};
use crate::frame::LocalFrame;
use crate::identify::{identify, IdentificationRecord, PointingQuery};
use crate::objects::ObjectClass;
use crate::observer::Observer;
use crate::precision::AnglePrecision;
use crate::provider::{PropagationProvider, SunProvider};
use crate::visibility::{classify, VisibilityRecord};

/// Wire format of request timestamps, always UTC.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_time_utc(text: &str) -> FinderResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text.trim(), TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| FinderError::InvalidTimestamp(text.to_string()))
}

#[derive(Debug, Clone)]
pub struct VisibleRequest {
    pub observer: Observer,
    pub time: DateTime<Utc>,
    pub show_all: bool,
    pub debug: bool,
}

#[derive(Debug, Clone)]
pub struct IdentifyRequest {
    pub observer: Observer,
    pub time: DateTime<Utc>,
    pub query: PointingQuery,
}

/// Answers visibility and identification requests for one object group.
///
/// Providers are called once per request. Their failures come back as
/// errors, while "nothing visible" and "nothing matched" are empty lists.
pub struct SkyFinder<'a> {
    propagation: &'a dyn PropagationProvider,
    sun: &'a dyn SunProvider,
    precision: AnglePrecision,
}

impl<'a> SkyFinder<'a> {
    pub fn new(
        propagation: &'a dyn PropagationProvider,
        sun: &'a dyn SunProvider,
        precision: AnglePrecision,
    ) -> Self {
        Self {
            propagation,
            sun,
            precision,
        }
    }

    pub fn visible(&self, request: &VisibleRequest) -> FinderResult<Vec<VisibilityRecord>> {
        request.observer.validate()?;
        tracing::info!(
            lat = request.observer.latitude,
            lon = request.observer.longitude,
            time = %request.time.format(TIME_FORMAT),
            show_all = request.show_all,
            "get visible"
        );

        let objects = self.propagation.locate(request.time)?;
        // sun-phase only means something for sunlit satellites
        let sun_direction = match self.propagation.object_class() {
            ObjectClass::Satellite => Some(self.sun.sun_direction(request.time)?),
            ObjectClass::SolarSystemBody => None,
        };

        if request.debug {
            let frame = LocalFrame::build(request.observer.latitude, request.observer.longitude);
            let observer_ecef = request.observer.to_ecef();
            let observer_up = request.observer.up();
            tracing::info!(
                observer_ecef = ?observer_ecef.as_slice(),
                observer_up = ?observer_up.as_slice(),
                frame_seed = ?frame.seed,
                sun_direction = ?sun_direction.map(|sun| [sun.x, sun.y, sun.z]),
                objects = objects.len(),
                "visibility diagnostics"
            );
        }

        let records: Vec<VisibilityRecord> = classify(
            &request.observer,
            &objects,
            sun_direction.as_ref(),
            request.show_all,
        )
        .into_iter()
        .map(|record| record.with_precision(self.precision))
        .collect();

        tracing::info!(found = records.len(), of = objects.len(), "visible objects");
        Ok(records)
    }

    pub fn identify(&self, request: &IdentifyRequest) -> FinderResult<Vec<IdentificationRecord>> {
        request.observer.validate()?;
        request.query.validate()?;
        tracing::info!(
            lat = request.observer.latitude,
            lon = request.observer.longitude,
            time = %request.time.format(TIME_FORMAT),
            az = request.query.azimuth,
            el = request.query.elevation,
            threshold = request.query.threshold,
            "identify object"
        );

        let objects = self.propagation.locate(request.time)?;
        let records: Vec<IdentificationRecord> = identify(&request.observer, &request.query, &objects)
            .into_iter()
            .map(|record| record.with_precision(self.precision))
            .collect();

        if records.is_empty() {
            tracing::info!("no nearby results found");
        } else {
            tracing::info!(found = records.len(), "identification candidates");
        }
        Ok(records)
    }
}
