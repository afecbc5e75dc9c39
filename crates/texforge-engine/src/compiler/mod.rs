//! LaTeX compilation with timeout and outcome classification

pub mod log;

pub use log::{parse_log, LogDiagnosis};

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::workspace::WorkspaceStore;

/// Default wall-clock budget for one compiler run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

/// External compiler invocation settings. Everything is injectable so tests
/// can point at a stub program with a short timeout.
#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// Compiler executable, resolved via `PATH` if relative.
    pub program: PathBuf,
    /// Hard wall-clock timeout for the child process.
    pub timeout: Duration,
    /// Fixed document source name at the workspace root.
    pub source_name: String,
    /// Expected artifact name at the workspace root.
    pub artifact_name: String,
    /// Compiler log name at the workspace root.
    pub log_name: String,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("latexmk"),
            timeout: DEFAULT_TIMEOUT,
            source_name: "document.tex".to_string(),
            artifact_name: "document.pdf".to_string(),
            log_name: "document.log".to_string(),
        }
    }
}

/// Outcome of one compile invocation. System-level failures (workspace I/O,
/// missing log) surface as [`EngineError`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Compiler exited zero and the artifact exists.
    Success { artifact: PathBuf },
    /// Compiler failed; diagnosis extracted from its log.
    Failure { line: u32, message: String },
    /// The child exceeded the timeout and was killed.
    Timeout,
}

/// Invokes the external LaTeX toolchain inside a workspace.
///
/// Compiles on the same workspace are serialized through a per-key async
/// mutex; two requests for one workspace cannot race on the source file or
/// the artifact. Distinct workspaces compile concurrently.
pub struct Compiler {
    store: WorkspaceStore,
    config: CompileConfig,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Compiler {
    pub fn new(store: WorkspaceStore, config: CompileConfig) -> Self {
        Self {
            store,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Write `source` into the workspace and run the compiler over it,
    /// blocking until completion or timeout. Always a fresh overwrite of the
    /// source file; no caching across invocations.
    pub async fn compile(&self, key: &str, source: &str) -> Result<CompileOutcome> {
        let lock = self.workspace_lock(key).await;
        let _guard = lock.lock().await;

        let root = self.store.ensure(key)?;
        tokio::fs::write(root.join(&self.config.source_name), source).await?;

        // cwd must be the workspace root so relative asset references in the
        // document resolve against uploaded files.
        let mut cmd = Command::new(&self.config.program);
        cmd.arg("-pdf")
            .arg("-interaction=nonstopmode")
            .arg("-file-line-error")
            .arg(format!("-outdir={}", root.display()))
            .arg(&self.config.source_name)
            .current_dir(&root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        // The compiler is a driver that forks its own children (latexmk runs
        // pdflatex); give it a fresh process group so a timeout can take the
        // whole tree down, not just the leader.
        #[cfg(unix)]
        cmd.process_group(0);
        let mut child = cmd.spawn()?;

        let status = match tokio::time::timeout(self.config.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                // Kill the whole group and reap the leader so no compiler
                // process outlives the request.
                #[cfg(unix)]
                if let Some(pid) = child.id() {
                    unsafe {
                        libc::kill(-(pid as i32), libc::SIGKILL);
                    }
                }
                child.start_kill().ok();
                child.wait().await.ok();
                warn!(key, timeout_secs = self.config.timeout.as_secs(), "compile timed out");
                return Ok(CompileOutcome::Timeout);
            }
        };

        let artifact = root.join(&self.config.artifact_name);
        if status.success() && artifact.is_file() {
            info!(key, artifact = %artifact.display(), "compile succeeded");
            return Ok(CompileOutcome::Success { artifact });
        }

        let log_path = root.join(&self.config.log_name);
        let log_bytes = match tokio::fs::read(&log_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(EngineError::LogNotFound(log_path))
            }
            Err(e) => return Err(e.into()),
        };

        // Compiler logs are not guaranteed UTF-8.
        let diag = parse_log(&String::from_utf8_lossy(&log_bytes));
        info!(key, line = diag.line, message = %diag.message, "compile failed");
        Ok(CompileOutcome::Failure {
            line: diag.line,
            message: diag.message,
        })
    }

    async fn workspace_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        // Drop locks nobody holds so the map does not grow with every key
        // ever compiled.
        locks.retain(|k, lock| k == key || Arc::strong_count(lock) > 1);
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    async fn lock_count(&self) -> usize {
        self.locks.lock().await.len()
    }
}
