use thiserror::Error;

/// Top-level error type for PlantGuard.
///
/// Subsystem crates define their own error types; this enum carries the
/// failures that cross crate boundaries at startup and in the API layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlantGuardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for PlantGuardError {
    fn from(err: toml::de::Error) -> Self {
        PlantGuardError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PlantGuardError {
    fn from(err: toml::ser::Error) -> Self {
        PlantGuardError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PlantGuardError {
    fn from(err: serde_json::Error) -> Self {
        PlantGuardError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for PlantGuard operations.
pub type Result<T> = std::result::Result<T, PlantGuardError>;
