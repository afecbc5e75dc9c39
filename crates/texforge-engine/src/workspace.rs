//! Sandboxed per-project workspace directories
//!
//! Every workspace is one subdirectory of a single base directory, named by
//! an opaque key. All entry-mutating operations resolve their relative path
//! through [`WorkspaceStore::resolve`] first; that is the sandbox invariant —
//! no operation may touch storage outside the workspace root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{EngineError, Result};

/// Compiler auxiliary outputs, hidden from user-facing listings even though
/// they physically exist in the workspace.
pub const GENERATED_SUFFIXES: [&str; 6] = [
    ".aux",
    ".log",
    ".out",
    ".fls",
    ".fdb_latexmk",
    ".synctex.gz",
];

const MAX_KEY_LEN: usize = 64;

/// Kind of a workspace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Folder,
    File,
}

/// A file or folder inside a workspace, addressed relative to its root with
/// forward-slash separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Maps workspace keys to sandboxed directory trees on persistent storage.
///
/// The base directory is injected at construction so tests can isolate each
/// store in a temporary directory.
#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    base_dir: PathBuf,
}

impl WorkspaceStore {
    /// Create a store rooted at `base_dir`, creating the directory if absent.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Absolute root path for `key`. Does not create anything.
    pub fn root_of(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.base_dir.join(key))
    }

    /// Return the root path for `key`, creating the directory if absent.
    /// Idempotent.
    pub fn ensure(&self, key: &str) -> Result<PathBuf> {
        let root = self.root_of(key)?;
        fs::create_dir_all(&root)?;
        Ok(root)
    }

    /// Normalize `rel` and resolve it against the workspace root, rejecting
    /// absolute paths and any parent-traversal segment.
    pub fn resolve(&self, key: &str, rel: &str) -> Result<PathBuf> {
        let root = self.root_of(key)?;

        if rel.starts_with('/') || Path::new(rel).is_absolute() {
            return Err(EngineError::PathViolation(rel.to_string()));
        }

        let mut resolved = root;
        for part in rel.split('/') {
            match part {
                "" | "." => continue,
                ".." => return Err(EngineError::PathViolation(rel.to_string())),
                part if part.contains('\\') => {
                    return Err(EngineError::PathViolation(rel.to_string()))
                }
                part => resolved.push(part),
            }
        }
        Ok(resolved)
    }

    /// Recursively list the workspace, folders sorted before files, each kind
    /// ordered lexicographically by relative path. Generated compiler
    /// artifacts are filtered out. A missing workspace lists as empty.
    pub fn list(&self, key: &str) -> Result<Vec<Entry>> {
        let root = self.root_of(key)?;
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut folders = Vec::new();
        let mut files = Vec::new();

        for dirent in WalkDir::new(&root).min_depth(1) {
            let dirent = dirent.map_err(io::Error::from)?;
            let rel = relative_path(dirent.path(), &root);

            if dirent.file_type().is_dir() {
                folders.push(Entry {
                    path: rel,
                    kind: EntryKind::Folder,
                });
            } else if dirent.file_type().is_file() && !is_generated(&dirent.file_name().to_string_lossy()) {
                files.push(Entry {
                    path: rel,
                    kind: EntryKind::File,
                });
            }
        }

        folders.sort_by(|a, b| a.path.cmp(&b.path));
        files.sort_by(|a, b| a.path.cmp(&b.path));
        folders.extend(files);
        Ok(folders)
    }

    /// Create the folder (and missing ancestors). Idempotent.
    pub fn create_folder(&self, key: &str, rel: &str) -> Result<()> {
        self.ensure(key)?;
        let path = self.resolve(key, rel)?;
        fs::create_dir_all(&path)?;
        debug!(key, rel, "created folder");
        Ok(())
    }

    /// Remove the file, or the folder and its contents. A missing path is
    /// reported as `NotFound`; the workspace root itself cannot be deleted
    /// through this operation.
    pub fn delete(&self, key: &str, rel: &str) -> Result<()> {
        let path = self.resolve(key, rel)?;
        let root = self.root_of(key)?;
        if path == root {
            return Err(EngineError::PathViolation(rel.to_string()));
        }

        let meta = fs::symlink_metadata(&path)
            .map_err(|_| EngineError::NotFound(rel.to_string()))?;
        if meta.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        debug!(key, rel, "deleted entry");
        Ok(())
    }

    /// Remove the entire workspace subtree. Idempotent.
    pub fn remove(&self, key: &str) -> Result<()> {
        let root = self.root_of(key)?;
        if root.is_dir() {
            fs::remove_dir_all(&root)?;
        }
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<()> {
    let ok = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(EngineError::InvalidKey(key.to_string()))
    }
}

fn is_generated(name: &str) -> bool {
    GENERATED_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Relative path with forward-slash separators, regardless of platform.
fn relative_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
