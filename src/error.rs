//! Error types for tutorlane
//!
//! Startup and input failures. Per-request failures inside the pipeline are
//! folded into degraded answers instead of surfacing here.

use thiserror::Error;

use crate::oracle::OracleError;
use crate::router::RoutingError;
use crate::tools::RegistryError;

/// Crate-level errors
#[derive(Debug, Error)]
pub enum TutorError {
    /// Query text was blank
    #[error("Empty query")]
    EmptyQuery,

    /// Name does not match any specialist
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    /// Invalid or incomplete configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Tool registry failed validation at startup
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Oracle client failure outside a request
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Routing failed and the caller asked for the decision itself
    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for tutorlane operations
pub type Result<T> = std::result::Result<T, TutorError>;
