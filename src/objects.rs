use nalgebra::Vector3;

/// Kind of objects a group holds; decides whether sun-phase is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    Satellite,
    SolarSystemBody,
}

/// One tracked object, resolved to an Earth-fixed position at the request time.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub name: String,
    pub identifier: Option<String>, // e.g. NORAD catalog number
    pub position: Vector3<f64>,     // ECEF, meters
    pub illuminated: Option<bool>,  // None when the provider cannot tell
}

impl TrackedObject {
    pub fn new(name: impl Into<String>, position: Vector3<f64>) -> Self {
        Self {
            name: name.into(),
            identifier: None,
            position,
            illuminated: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_illumination(mut self, illuminated: bool) -> Self {
        self.illuminated = Some(illuminated);
        self
    }

    /// Unit line of sight from `origin`, or `None` when the object sits
    /// exactly on it and no direction exists.
    pub fn direction_from(&self, origin: &Vector3<f64>) -> Option<Vector3<f64>> {
        (self.position - origin).try_normalize(0.0)
    }
}
