use serde::Deserialize;

/// How angles are reduced when they leave the engine.
///
/// Computation always runs at full `f64` precision; the policy only applies
/// to the records handed back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnglePrecision {
    /// Keep sub-degree precision.
    Full,
    /// Whole degrees, truncated toward zero.
    #[default]
    Truncate,
    /// Whole degrees, rounded to nearest.
    Round,
}

impl AnglePrecision {
    pub fn apply(self, degrees: f64) -> f64 {
        match self {
            AnglePrecision::Full => degrees,
            // adding zero turns -0.0 into 0.0
            AnglePrecision::Truncate => degrees.trunc() + 0.0,
            AnglePrecision::Round => degrees.round() + 0.0,
        }
    }

    /// Same as [`apply`](Self::apply), keeping the result inside [0, 360).
    pub fn apply_azimuth(self, degrees: f64) -> f64 {
        let reduced = self.apply(degrees);
        if reduced >= 360.0 {
            reduced - 360.0
        } else {
            reduced
        }
    }
}
