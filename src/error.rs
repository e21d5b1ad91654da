//! Error types for the conversion queue service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for queue operations
pub type Result<T> = std::result::Result<T, Error>;

/// Conversion queue errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Job not found
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    /// Operation not allowed in the job's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A conversion run is already active
    #[error("A conversion run is already in progress")]
    AlreadyRunning,

    /// Start requested with an empty backlog
    #[error("No pending jobs to process")]
    NothingToDo,

    /// Queue-wide operation rejected while a run is active
    #[error("Queue is busy: {0}")]
    Busy(String),

    /// Conversion toolchain could not be resolved
    #[error("Conversion environment unavailable: {0}")]
    Environment(String),

    /// Conversion process failed to launch or exited abnormally
    #[error("Conversion process failed: {0}")]
    Process(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create an environment error
    pub fn environment(message: impl Into<String>) -> Self {
        Self::Environment(message.into())
    }

    /// Create a process error
    pub fn process(message: impl Into<String>) -> Self {
        Self::Process(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            Error::JobNotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Job not found: {}", id),
            ),
            Error::InvalidState(msg) => (StatusCode::CONFLICT, "invalid_state", msg.clone()),
            Error::AlreadyRunning => (
                StatusCode::CONFLICT,
                "already_running",
                "A conversion run is already in progress".to_string(),
            ),
            Error::NothingToDo => (
                StatusCode::CONFLICT,
                "nothing_to_do",
                "No pending jobs to process".to_string(),
            ),
            Error::Busy(msg) => (StatusCode::CONFLICT, "busy", msg.clone()),
            Error::Environment(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "environment_error", msg.clone())
            }
            Error::Process(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "process_error", msg.clone())
            }
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
