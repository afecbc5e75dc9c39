//! LaTeX workspace and compilation engine
//!
//! This crate provides the core of the TexForge service:
//! - Sandboxed per-project workspace directories with safe CRUD
//! - Asset uploads with filename sanitization
//! - `latexmk` invocation under a wall-clock timeout
//! - Structured diagnostics parsed from the compiler log
//!
//! The HTTP surface lives in `texforge-api`; nothing in here knows about
//! requests, sessions, or authorization.

pub mod compiler;
pub mod error;
pub mod ingest;
pub mod workspace;

pub use compiler::{CompileConfig, CompileOutcome, Compiler, LogDiagnosis};
pub use error::{EngineError, Result};
pub use workspace::{Entry, EntryKind, WorkspaceStore};
