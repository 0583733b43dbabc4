// Error handling for the distributed KV store.
//
// A single closed enum covers every error kind the coordination logic
// encoding (status codes -1/-2/0/1) is produced separately by the callers
// that need it (see `types::PutOutcome`/`types::GetOutcome`) rather than
// folded into this type, so the distinction between "quorum not reached"
// and "replica reported inactive" survives past the RPC boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::result;
use thiserror::Error;

pub type Result<T> = result::Result<T, StorageNodeError>;

#[derive(Debug, Error, Clone)]
pub enum StorageNodeError {
    /// Not found (get result).
    #[error("not found: {0}")]
    NotFound(String),

    /// Quorum failure: insufficient replicas responded.
    #[error("quorum failure: {0}")]
    QuorumFailure(String),

    /// The addressed node has toggled itself inactive.
    #[error("node is inactive")]
    Inactive,

    /// Client-side validation failure.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The router has no ring yet (init not called, or destroy called).
    #[error("router is not initialized")]
    RouterUninitialized,

    /// A remote node could not be reached or returned a transport error.
    #[error("network error: {0}")]
    Network(String),

    /// A node that should be part of the preference list was not found in it.
    #[error("node not present in preference list")]
    NotInPreferenceList,

    /// Local I/O (config, backup file) failure.
    #[error("io error: {0}")]
    Io(String),

    /// (De)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration failure at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for StorageNodeError {
    fn into_response(self) -> Response {
        let status = match &self {
            StorageNodeError::NotFound(_) => StatusCode::NOT_FOUND,
            StorageNodeError::QuorumFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            StorageNodeError::Inactive => StatusCode::SERVICE_UNAVAILABLE,
            StorageNodeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            StorageNodeError::RouterUninitialized => StatusCode::PRECONDITION_FAILED,
            StorageNodeError::Network(_) => StatusCode::BAD_GATEWAY,
            StorageNodeError::NotInPreferenceList => StatusCode::BAD_REQUEST,
            StorageNodeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StorageNodeError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StorageNodeError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StorageNodeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for StorageNodeError {
    fn from(err: reqwest::Error) -> Self {
        StorageNodeError::Network(err.to_string())
    }
}

impl From<std::io::Error> for StorageNodeError {
    fn from(err: std::io::Error) -> Self {
        StorageNodeError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageNodeError {
    fn from(err: serde_json::Error) -> Self {
        StorageNodeError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for StorageNodeError {
    fn from(err: serde_yaml::Error) -> Self {
        StorageNodeError::Configuration(err.to_string())
    }
}

impl From<config::ConfigError> for StorageNodeError {
    fn from(err: config::ConfigError) -> Self {
        StorageNodeError::Configuration(err.to_string())
    }
}
