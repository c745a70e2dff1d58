//! Error types for the oshfit_core library.

use std::io;
use uuid::Uuid;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for oshfit_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Achievement state persistence error
    #[error("State error: {0}")]
    State(String),

    /// A raw session that cannot be turned into a canonical one
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    /// Per-session evaluation was asked for a session the history does not contain
    #[error("Session {0} is not part of the supplied history")]
    SessionNotInHistory(Uuid),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
