//! Application state for TexForge API

use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::time::Duration;
use texforge_engine::{CompileConfig, Compiler, WorkspaceStore};

pub struct AppState {
    pub db: SqlitePool,
    pub store: WorkspaceStore,
    pub compiler: Compiler,
}

impl AppState {
    pub async fn new() -> Result<Self> {
        let data_dir = std::env::var("TEXFORGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("texforge-api")
            });
        std::fs::create_dir_all(&data_dir)?;

        // Workspaces live next to the database, one subdirectory per project.
        let store = WorkspaceStore::new(data_dir.join("workspaces"))?;

        let timeout_secs: u64 = std::env::var("TEXFORGE_COMPILE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(45);
        let compiler = Compiler::new(
            store.clone(),
            CompileConfig {
                timeout: Duration::from_secs(timeout_secs),
                ..CompileConfig::default()
            },
        );

        let db_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| format!("sqlite:{}/texforge.db?mode=rwc", data_dir.display()));

        tracing::info!("Connecting to database: {}", db_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        // Run migrations
        Self::run_migrations(&pool).await?;

        Ok(Self {
            db: pool,
            store,
            compiler,
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                owner_id TEXT NOT NULL REFERENCES accounts(id),
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(pool)
        .await?;

        // Index for fast ownership lookups
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_id)
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }
}

/// Get platform-specific data directory
mod dirs {
    use std::path::PathBuf;

    pub fn data_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(target_os = "windows")]
        {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }
}
