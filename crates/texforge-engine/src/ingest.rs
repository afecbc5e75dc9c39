//! Uploaded asset handling
//!
//! Filenames are reduced to a safe character set by stripping (not
//! replacing) everything outside `[A-Za-z0-9_.-]`, matching the upload
//! contract the web UI was built against. Stripping means two distinct raw
//! names can sanitize to the same string; whenever sanitization changed the
//! name, the stored name carries a short suffix derived from the raw name,
//! so the same raw name always overwrites its own file and two raw names
//! that strip to the same string land on distinct paths. An unchanged name
//! overwrites in place.

use std::fs;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::workspace::WorkspaceStore;

/// Strip every character outside the safe set. Rejects names that sanitize
/// to nothing usable (empty or dots only).
pub fn sanitize_file_name(raw: &str) -> Result<String> {
    let name: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        return Err(EngineError::InvalidName(raw.to_string()));
    }
    Ok(name)
}

/// Write an uploaded asset into `target_folder` (empty string = workspace
/// root, created if missing). Returns the stored path relative to the
/// workspace root.
pub fn store_asset(
    store: &WorkspaceStore,
    key: &str,
    target_folder: &str,
    raw_name: &str,
    bytes: &[u8],
) -> Result<String> {
    store.ensure(key)?;
    let folder = store.resolve(key, target_folder)?;
    fs::create_dir_all(&folder)?;

    let name = sanitize_file_name(raw_name)?;
    let stored = if name == raw_name {
        name
    } else {
        // Sanitization erased what distinguished this raw name from others,
        // so the stored name is tagged with a digest of the raw name: the
        // mapping is stable across re-uploads, and distinct raw names that
        // strip to the same string cannot clobber each other.
        tag_with_raw_name(&name, raw_name)
    };

    fs::write(folder.join(&stored), bytes)?;
    debug!(key, raw_name, stored, "stored asset");

    let prefix = target_folder.trim_matches('/');
    if prefix.is_empty() {
        Ok(stored)
    } else {
        Ok(format!("{prefix}/{stored}"))
    }
}

/// Insert a raw-name digest before the extension:
/// `plot.png` -> `plot-3f2a9c01.png`.
fn tag_with_raw_name(name: &str, raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    let tag = hex::encode(&digest[..4]);
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}-{}{}", &name[..dot], tag, &name[dot..]),
        _ => format!("{name}-{tag}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store() -> (TempDir, WorkspaceStore) {
        let dir = TempDir::new().unwrap();
        let store = WorkspaceStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_sanitize_strips_unsafe_characters() {
        assert_eq!(sanitize_file_name("my plot (1).png").unwrap(), "myplot1.png");
        assert_eq!(sanitize_file_name("refs.bib").unwrap(), "refs.bib");
        assert_eq!(sanitize_file_name("../../evil.tex").unwrap(), "....evil.tex");
    }

    #[test]
    fn test_sanitize_rejects_degenerate_names() {
        assert!(matches!(
            sanitize_file_name("////"),
            Err(EngineError::InvalidName(_))
        ));
        assert!(matches!(
            sanitize_file_name("../.."),
            Err(EngineError::InvalidName(_))
        ));
        assert!(matches!(
            sanitize_file_name(""),
            Err(EngineError::InvalidName(_))
        ));
    }

    #[test]
    fn test_traversal_name_lands_inside_target_folder() {
        let (_dir, store) = store();
        store.create_folder("w", "figs").unwrap();

        let rel = store_asset(&store, "w", "figs", "../../evil.tex", b"x").unwrap();
        assert!(rel.starts_with("figs/....evil-"));
        assert!(rel.ends_with(".tex"));

        let abs = store.resolve("w", &rel).unwrap();
        assert!(abs.starts_with(store.root_of("w").unwrap().join("figs")));
        assert!(abs.is_file());
    }

    #[test]
    fn test_store_in_root_and_overwrite() {
        let (_dir, store) = store();
        let rel = store_asset(&store, "w", "", "logo.png", b"one").unwrap();
        assert_eq!(rel, "logo.png");

        // Same raw name overwrites in place.
        let rel = store_asset(&store, "w", "", "logo.png", b"two").unwrap();
        assert_eq!(rel, "logo.png");
        let abs = store.resolve("w", &rel).unwrap();
        assert_eq!(fs::read(abs).unwrap(), b"two");
    }

    #[test]
    fn test_sanitization_collision_disambiguated() {
        let (_dir, store) = store();
        store_asset(&store, "w", "", "plot.png", b"first").unwrap();

        // "plot .png" sanitizes to "plot.png"; the tag keeps both files.
        let rel = store_asset(&store, "w", "", "plot .png", b"second").unwrap();
        assert_ne!(rel, "plot.png");
        assert!(rel.starts_with("plot-") && rel.ends_with(".png"));

        let original = store.resolve("w", "plot.png").unwrap();
        assert_eq!(fs::read(original).unwrap(), b"first");
    }

    #[test]
    fn test_same_raw_name_reupload_overwrites() {
        let (_dir, store) = store();

        // The sanitized-and-tagged path is stable for one raw name, so a
        // re-upload replaces its own file instead of accumulating copies.
        let first = store_asset(&store, "w", "", "my plot.png", b"one").unwrap();
        let second = store_asset(&store, "w", "", "my plot.png", b"two").unwrap();
        assert_eq!(first, second);

        let abs = store.resolve("w", &second).unwrap();
        assert_eq!(fs::read(abs).unwrap(), b"two");
        assert_eq!(store.list("w").unwrap().len(), 1);
    }

    #[test]
    fn test_distinct_raw_names_get_distinct_tags() {
        let (_dir, store) = store();
        let a = store_asset(&store, "w", "", "my plot.png", b"a").unwrap();
        let b = store_asset(&store, "w", "", "my?plot.png", b"b").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.list("w").unwrap().len(), 2);
    }

    #[test]
    fn test_missing_target_folder_is_created() {
        let (_dir, store) = store();
        let rel = store_asset(&store, "w", "assets/img", "a.png", b"x").unwrap();
        assert_eq!(rel, "assets/img/a.png");
    }

    #[test]
    fn test_traversal_target_folder_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store_asset(&store, "w", "../other", "a.png", b"x"),
            Err(EngineError::PathViolation(_))
        ));
    }
}
