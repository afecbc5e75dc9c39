//! TexForge API Server - Backend for browser-based LaTeX editing
//!
//! Provides REST endpoints for:
//! - Account and project provisioning
//! - Workspace file management (list, folders, delete, upload)
//! - LaTeX compilation with structured error reporting

use anyhow::Result;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod auth;
mod error;
mod handlers;
mod models;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("texforge_api=info".parse()?)
                .add_directive("texforge_engine=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    // Initialize application state
    info!("Initializing TexForge API...");
    let state = AppState::new().await?;
    let state = Arc::new(state);

    // CORS configuration for the browser editor
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Account provisioning
        .route("/api/accounts", post(handlers::create_account))
        // Project lifecycle
        .route(
            "/api/projects",
            post(handlers::create_project).get(handlers::list_projects),
        )
        .route("/api/projects/:key", delete(handlers::delete_project))
        // Workspace file manager
        .route(
            "/api/projects/:key/files",
            get(handlers::list_files).delete(handlers::delete_entry),
        )
        .route("/api/projects/:key/folders", post(handlers::create_folder))
        .route("/api/projects/:key/upload", post(handlers::upload))
        // Compilation
        .route("/api/projects/:key/compile", post(handlers::compile))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Parse bind address
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3002);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting TexForge API on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
