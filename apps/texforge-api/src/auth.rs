//! Project ownership gate
//!
//! Authorization is an explicit per-request context, not an ambient session:
//! the caller identifies itself with the `X-Account-Id` header and every
//! workspace-scoped handler confirms that account owns the project backing
//! the workspace key before any storage side effect.

use axum::http::HeaderMap;
use sqlx::SqlitePool;

use crate::error::ApiError;

pub const ACCOUNT_HEADER: &str = "x-account-id";

/// Extract the caller's account id from the request headers.
pub fn account_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(ACCOUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::InvalidRequest("Missing X-Account-Id header".into()))
}

/// Confirm `account` owns the project `key`. Missing project is 404,
/// ownership mismatch is 403; neither touches the workspace.
pub async fn authorize_project(
    db: &SqlitePool,
    account: &str,
    key: &str,
) -> Result<(), ApiError> {
    let owner: Option<(String,)> = sqlx::query_as("SELECT owner_id FROM projects WHERE id = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match owner {
        None => Err(ApiError::NotFound(format!("project {key}"))),
        Some((owner_id,)) if owner_id == account => Ok(()),
        Some(_) => Err(ApiError::Unauthorized),
    }
}
