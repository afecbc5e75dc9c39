//! Error types for the TexForge engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by workspace, ingest, and compile operations.
///
/// Every variant maps to exactly one externally visible outcome; the API
/// layer translates these into HTTP statuses and recovers nothing itself.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid workspace key: {0:?}")]
    InvalidKey(String),

    #[error("path escapes workspace root: {0:?}")]
    PathViolation(String),

    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("compiler log not found at {}", .0.display())]
    LogNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
