//! Filesystem enumeration for skill directories.
//!
//! This is the host-side collaborator that feeds the scanner: it yields
//! `(relative_path, contents)` pairs and never lets one unreadable file abort
//! the walk. Embedded callers skip it entirely via `api::scan_from_source`.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use super::ScanError;

/// Extensions treated as skill source text.
const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "py", "sh", "bash",
];

/// Files larger than this are skipped (generated bundles, vendored blobs).
const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Result of walking a skill directory.
#[derive(Debug, Default)]
pub struct WalkedSkill {
    /// `(relative_path, contents)` pairs in path order.
    pub files: Vec<(String, String)>,
    /// Files that could not be read, attributed individually.
    pub errors: Vec<ScanError>,
}

/// Enumerate a skill's source files under `root`.
///
/// Skips hidden directories and `node_modules`; ordering is lexicographic by
/// relative path so scans are reproducible across platforms.
pub fn walk_skill(root: &Path) -> WalkedSkill {
    let mut walked = WalkedSkill::default();

    let entries = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                let file = err
                    .path()
                    .map(|p| relative_name(root, p))
                    .unwrap_or_else(|| "<unknown>".into());
                walked.errors.push(ScanError {
                    file,
                    message: err.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_source_file(entry.path()) {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            if meta.len() > MAX_FILE_SIZE {
                debug!(file = %entry.path().display(), "skipping oversized file");
                continue;
            }
        }

        let rel = relative_name(root, entry.path());
        match std::fs::read_to_string(entry.path()) {
            Ok(content) => walked.files.push((rel, content)),
            Err(err) => walked.errors.push(ScanError {
                file: rel,
                message: err.to_string(),
            }),
        }
    }

    walked
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == "node_modules" || name.starts_with('.')
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SOURCE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walks_source_files_and_skips_node_modules() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.ts"), "const x = 1;\n").unwrap();
        fs::write(dir.path().join("README.md"), "# docs\n").unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(
            dir.path().join("node_modules").join("dep.js"),
            "eval('x')\n",
        )
        .unwrap();

        let walked = walk_skill(dir.path());
        let paths: Vec<&str> = walked.files.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["index.ts"]);
        assert!(walked.errors.is_empty());
    }

    #[test]
    fn nested_files_keep_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib").join("util.js"), "let a = 1;\n").unwrap();

        let walked = walk_skill(dir.path());
        assert_eq!(walked.files[0].0, "lib/util.js");
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git").join("hook.sh"), "eval x\n").unwrap();
        fs::write(dir.path().join("main.py"), "x = 1\n").unwrap();

        let walked = walk_skill(dir.path());
        let paths: Vec<&str> = walked.files.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["main.py"]);
    }
}
