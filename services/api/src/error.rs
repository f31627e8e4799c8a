//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how each
//! variant is rendered as an HTTP response.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use tutoring_core::{EngineError, PortError};

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error raised by the availability and booking engine.
    #[error("Engine Error: {0}")]
    Engine(#[from] EngineError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error from running the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// An upstream service (Google, payment gateway) failed or answered unexpectedly.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

const INTERNAL: &str = "Internal server error";

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Upstream(msg) => {
                error!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Upstream service failed".to_string())
            }

            ApiError::Port(PortError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Port(PortError::Conflict(msg)) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Port(PortError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            ApiError::Port(PortError::Unexpected(msg)) => {
                error!("Port error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
            }

            ApiError::Engine(err) => match err {
                EngineError::InvalidInput(_)
                | EngineError::NoSlotsGenerated
                | EngineError::AmountOutOfRange(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                EngineError::ConstraintViolation(_) | EngineError::SlotAlreadyBooked(_) => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                EngineError::SlotNotFound(_) | EngineError::ExpertNotFound(_) => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                EngineError::Persistence(msg) => {
                    error!("Persistence failure: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
                }
            },

            ApiError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    // 23505 = PostgreSQL Unique Violation
                    if db_err.code().as_deref() == Some("23505") {
                        return (
                            StatusCode::CONFLICT,
                            "Resource already exists (duplicate entry)".to_string(),
                        );
                    }
                }
                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
            }

            ApiError::Config(_)
            | ApiError::Migration(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => {
                error!("Internal error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
