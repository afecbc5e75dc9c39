//! Property-based tests for texforge-api
//!
//! Exercises the workspace sandbox, upload sanitization, and log parsing
//! invariants the HTTP layer depends on, using proptest.

use proptest::prelude::*;
use tempfile::TempDir;
use texforge_engine::compiler::parse_log;
use texforge_engine::ingest::sanitize_file_name;
use texforge_engine::{EntryKind, WorkspaceStore};

// ============================================================
// Filename Sanitization
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn sanitized_names_use_only_safe_characters(raw in ".{1,80}") {
        if let Ok(name) = sanitize_file_name(&raw) {
            let safe = name.chars().all(|c| {
                c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'
            });
            prop_assert!(safe);
            prop_assert!(!name.contains('/'));
            prop_assert!(!name.contains('\\'));
        }
    }

    #[test]
    fn safe_names_pass_through_unchanged(raw in "[A-Za-z0-9_-]{1,40}(\\.[a-z]{1,5})?") {
        prop_assert_eq!(sanitize_file_name(&raw).unwrap(), raw);
    }

    #[test]
    fn sanitization_is_idempotent(raw in ".{1,80}") {
        if let Ok(once) = sanitize_file_name(&raw) {
            prop_assert_eq!(sanitize_file_name(&once).unwrap(), once);
        }
    }

    // ============================================================
    // Path Traversal Rejection
    // ============================================================

    #[test]
    fn parent_traversal_is_always_rejected(
        prefix in "[a-z]{0,8}(/[a-z]{1,8}){0,3}",
        suffix in "[a-z]{0,8}"
    ) {
        let dir = TempDir::new().unwrap();
        let store = WorkspaceStore::new(dir.path()).unwrap();

        let rel = if prefix.is_empty() {
            format!("../{suffix}")
        } else {
            format!("{prefix}/../../../{suffix}")
        };
        prop_assert!(store.resolve("w", &rel).is_err());
    }

    #[test]
    fn resolved_paths_stay_under_the_workspace_root(
        rel in "[a-z]{1,8}(/[a-z]{1,8}){0,4}"
    ) {
        let dir = TempDir::new().unwrap();
        let store = WorkspaceStore::new(dir.path()).unwrap();

        let resolved = store.resolve("w", &rel).unwrap();
        prop_assert!(resolved.starts_with(store.root_of("w").unwrap()));
    }

    // ============================================================
    // Listing Order
    // ============================================================

    #[test]
    fn listing_sorts_folders_before_files(
        folders in proptest::collection::btree_set("[a-z]{1,8}", 1..5),
        files in proptest::collection::btree_set("[a-z]{1,8}\\.tex", 1..5)
    ) {
        let dir = TempDir::new().unwrap();
        let store = WorkspaceStore::new(dir.path()).unwrap();
        let root = store.ensure("w").unwrap();

        // Interleave creation order; the contract is about output order.
        for (folder, file) in folders.iter().zip(files.iter()) {
            std::fs::write(root.join(file), b"x").unwrap();
            store.create_folder("w", folder).unwrap();
        }
        for folder in folders.iter().skip(files.len()) {
            store.create_folder("w", folder).unwrap();
        }
        for file in files.iter().skip(folders.len()) {
            std::fs::write(root.join(file), b"x").unwrap();
        }

        let entries = store.list("w").unwrap();
        let first_file = entries
            .iter()
            .position(|e| e.kind == EntryKind::File)
            .unwrap_or(entries.len());
        prop_assert!(entries[..first_file]
            .iter()
            .all(|e| e.kind == EntryKind::Folder));
        prop_assert!(entries[first_file..]
            .iter()
            .all(|e| e.kind == EntryKind::File));

        let paths: Vec<_> = entries[first_file..].iter().map(|e| &e.path).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        prop_assert_eq!(paths, sorted);
    }

    // ============================================================
    // Log Diagnostics
    // ============================================================

    #[test]
    fn first_line_marker_wins(line in 1u32..100_000, later in 1u32..100_000) {
        let log = format!("! Some error.\nl.{line} \\foo\nmore\nl.{later} \\bar");
        let diag = parse_log(&log);
        prop_assert_eq!(diag.line, line);
    }

    #[test]
    fn markerless_logs_report_line_zero(noise in "[a-km-z ]{0,200}") {
        let diag = parse_log(&noise);
        prop_assert_eq!(diag.line, 0);
    }

    #[test]
    fn bannerless_logs_report_unknown_error(noise in "[a-z .]{0,200}") {
        let diag = parse_log(&noise);
        prop_assert_eq!(diag.message, "Unknown Error");
    }
}

// ============================================================
// Unit Tests (non-property)
// ============================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_generated_suffixes_are_hidden() {
        let suffixes = texforge_engine::workspace::GENERATED_SUFFIXES;
        assert_eq!(suffixes.len(), 6);

        let dir = TempDir::new().unwrap();
        let store = WorkspaceStore::new(dir.path()).unwrap();
        let root = store.ensure("w").unwrap();
        for s in suffixes {
            std::fs::write(root.join(format!("document{s}")), b"x").unwrap();
        }
        assert!(store.list("w").unwrap().is_empty());
    }

    #[test]
    fn test_traversal_upload_name_is_neutralized() {
        let name = sanitize_file_name("../../evil.tex").unwrap();
        let traversal = regex::Regex::new(r"[/\\]").unwrap();
        assert!(!traversal.is_match(&name));
    }
}
