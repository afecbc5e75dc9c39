//! HTTP handlers for TexForge API

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use texforge_engine::{ingest, CompileOutcome, Entry};

use crate::auth::{account_id, authorize_project};
use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Provision an account. Identity verification and credentials live in the
/// fronting auth service; this only records the owner row projects hang off.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(ApiError::InvalidRequest("Missing name or email".into()));
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let result = sqlx::query("INSERT INTO accounts (id, name, email, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(&req.name)
        .bind(&req.email)
        .bind(now.to_rfc3339())
        .execute(&state.db)
        .await;

    if let Err(e) = result {
        if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
            return Err(ApiError::InvalidRequest("Email already registered".into()));
        }
        return Err(e.into());
    }

    tracing::info!("Created account: {}", id);

    Ok(Json(AccountResponse {
        id,
        name: req.name,
        email: req.email,
        created_at: now,
    }))
}

/// Create a project owned by the caller. The workspace directory is ensured
/// eagerly so the first listing succeeds without a compile or upload.
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let account = account_id(&headers)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::InvalidRequest("Missing project name".into()));
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query("INSERT INTO projects (id, name, owner_id, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(&req.name)
        .bind(&account)
        .bind(now.to_rfc3339())
        .execute(&state.db)
        .await?;

    state.store.ensure(&id)?;
    tracing::info!("Created project {} for account {}", id, account);

    Ok(Json(ProjectResponse {
        id,
        name: req.name,
        created_at: now,
    }))
}

/// List the caller's projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let account = account_id(&headers)?;

    let projects: Vec<DbProject> = sqlx::query_as(
        "SELECT id, name, owner_id, created_at FROM projects WHERE owner_id = ? ORDER BY created_at",
    )
    .bind(&account)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

/// Delete a project and its entire workspace subtree
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let account = account_id(&headers)?;
    authorize_project(&state.db, &account, &key).await?;

    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(&key)
        .execute(&state.db)
        .await?;
    state.store.remove(&key)?;

    tracing::info!("Deleted project {}", key);
    Ok(Json(MessageResponse { message: "Deleted" }))
}

/// List workspace entries, folders before files
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Entry>>, ApiError> {
    let account = account_id(&headers)?;
    authorize_project(&state.db, &account, &key).await?;

    Ok(Json(state.store.list(&key)?))
}

/// Create a folder (and missing ancestors) inside the workspace
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(req): Json<PathRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let account = account_id(&headers)?;
    authorize_project(&state.db, &account, &key).await?;

    if req.path.trim().is_empty() {
        return Err(ApiError::InvalidRequest("Missing folder path".into()));
    }

    state.store.create_folder(&key, &req.path)?;
    Ok(Json(MessageResponse { message: "Created" }))
}

/// Delete a file or folder (recursively) inside the workspace
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(req): Json<PathRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let account = account_id(&headers)?;
    authorize_project(&state.db, &account, &key).await?;

    state.store.delete(&key, &req.path)?;
    Ok(Json(MessageResponse { message: "Deleted" }))
}

/// Upload one or more assets, optionally into a target folder.
///
/// Multipart fields: `folder` (optional text, default workspace root) and any
/// number of `file` parts.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let account = account_id(&headers)?;
    authorize_project(&state.db, &account, &key).await?;

    let mut folder = String::new();
    let mut uploads: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid multipart body: {e}")))?
    {
        let part = field.name().map(str::to_string);
        match part.as_deref() {
            Some("folder") => {
                folder = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid folder field: {e}")))?;
            }
            Some("file") => {
                let name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::InvalidRequest("File part without a name".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid file field: {e}")))?;
                uploads.push((name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    if uploads.is_empty() {
        return Err(ApiError::InvalidRequest("Missing file".into()));
    }

    let mut files = Vec::with_capacity(uploads.len());
    for (name, bytes) in &uploads {
        files.push(ingest::store_asset(&state.store, &key, &folder, name, bytes)?);
    }

    tracing::info!("Uploaded {} file(s) to project {}", files.len(), key);
    Ok(Json(UploadResponse {
        message: "Uploaded",
        files,
    }))
}

/// Compile the document source and return the PDF, or a structured error
pub async fn compile(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CompileRequest>,
) -> Result<(StatusCode, [(String, String); 2], Vec<u8>), ApiError> {
    let account = account_id(&headers)?;
    authorize_project(&state.db, &account, &key).await?;

    match state.compiler.compile(&key, &req.code).await? {
        CompileOutcome::Success { artifact } => {
            let pdf = tokio::fs::read(&artifact)
                .await
                .map_err(texforge_engine::EngineError::from)?;
            Ok((
                StatusCode::OK,
                [
                    ("Content-Type".to_string(), "application/pdf".to_string()),
                    (
                        "Content-Disposition".to_string(),
                        "inline; filename=\"document.pdf\"".to_string(),
                    ),
                ],
                pdf,
            ))
        }
        CompileOutcome::Failure { line, message } => {
            Err(ApiError::CompileFailed { line, message })
        }
        CompileOutcome::Timeout => Err(ApiError::CompileTimeout),
    }
}
