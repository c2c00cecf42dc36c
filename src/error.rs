use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Invalid timestamp '{0}', expected YYYY-MM-DD HH:MM:SS")]
    InvalidTimestamp(String),

    #[error("Unknown object group: {0}")]
    UnknownGroup(String),

    #[error("Object data unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Propagation failed for {name}: {reason}")]
    Propagation { name: String, reason: String },

    #[error("No valid element sets found: {0}")]
    ElementSet(String),

    #[error("Unable to perform file operation: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] Box<ureq::Error>),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl FinderError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        FinderError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type FinderResult<T> = Result<T, FinderError>;
