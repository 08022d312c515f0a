use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provider failed to read or a value did not deserialize.
    #[error("failed to load sndb configuration: {0}")]
    Figment(#[from] figment::Error),

    /// Loaded, but rejected by validation.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
