//! Error types for TexForge API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use texforge_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not authorized for this project")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Compilation failed at line {line}: {message}")]
    CompileFailed { line: u32, message: String },

    #[error("Compilation timed out")]
    CompileTimeout,

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            ApiError::Unauthorized => (
                StatusCode::FORBIDDEN,
                json!({ "error": "Not authorized for this project" }),
            ),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("Not found: {}", what) }),
            ),
            ApiError::CompileFailed { line, message } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Failed", "line": line, "message": message }),
            ),
            ApiError::CompileTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                json!({ "error": "Timeout", "message": "Compilation took too long" }),
            ),
            ApiError::Engine(e) => engine_error_body(e),
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Database error" }),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Map engine failures onto the wire contract: unsafe paths and bad names are
/// client errors, missing entries are 404, everything I/O-shaped is a 500
/// "System Error".
fn engine_error_body(e: &EngineError) -> (StatusCode, serde_json::Value) {
    match e {
        EngineError::InvalidKey(_) | EngineError::PathViolation(_) | EngineError::InvalidName(_) => {
            (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() }))
        }
        EngineError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            json!({ "error": format!("Not found: {}", what) }),
        ),
        EngineError::LogNotFound(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "System Error", "message": "Log not found" }),
        ),
        EngineError::Io(io) => {
            tracing::error!("Workspace IO error: {}", io);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "System Error", "message": "Workspace IO failure" }),
            )
        }
    }
}
