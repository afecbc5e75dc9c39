//! Data models for TexForge API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Project row
#[derive(Debug, Clone, FromRow)]
pub struct DbProject {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// Request to provision an account
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
}

/// Account response for API
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Request to create a project
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

/// Project response for API
#[derive(Debug, Clone, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbProject> for ProjectResponse {
    fn from(p: DbProject) -> Self {
        Self {
            id: p.id,
            name: p.name,
            created_at: p.created_at,
        }
    }
}

/// Relative-path payload for folder creation and entry deletion
#[derive(Debug, Clone, Deserialize)]
pub struct PathRequest {
    pub path: String,
}

/// Compilation request carrying the full document source
#[derive(Debug, Clone, Deserialize)]
pub struct CompileRequest {
    pub code: String,
}

/// Simple message response
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Upload response listing stored relative paths
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub files: Vec<String>,
}
