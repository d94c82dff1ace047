//! Directory-level scanning of skill bundles.
//!
//! [`scan_tree`] walks a bundle, filters files by extension, location, and
//! size, and runs the [`LineScanner`] over what survives. Results are keyed by
//! canonical path so a file reachable through several symlinks is reported
//! once.

use crate::config::PolicyConfig;
use crate::finding::{ScanResult, TrustBoundary};
use crate::scanner::{split_lines, LineScanner};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Directory names holding supporting material rather than instructions.
/// Skipped unless [`PolicyConfig::scan_references`] is set.
pub const REFERENCE_DIRS: &[&str] = &["references", "assets", "scripts"];

/// Extensions treated as markdown for code-fence stripping.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

const FENCE: &str = "```";

/// Scans every eligible file under `root`.
///
/// Per file, in order:
/// 1. Skip anything that is not a regular file or whose extension is not in
///    [`PolicyConfig::extensions`].
/// 2. Skip files under a [`REFERENCE_DIRS`] directory unless references are
///    scanned.
/// 3. Quarantine files whose reported size exceeds
///    [`PolicyConfig::max_file_size`] without opening them.
/// 4. Skip files that cannot be read as UTF-8.
/// 5. Strip fenced code blocks from markdown when code blocks are not scanned.
///
/// Symlinks are followed only while they resolve inside `root`; a link
/// pointing out of the bundle is neither descended into nor read. The policy
/// is compiled once for the whole tree.
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
/// use skill_quarantine::bundle::scan_tree;
/// use skill_quarantine::config::PolicyConfig;
/// use skill_quarantine::finding::TrustBoundary;
///
/// let results = scan_tree(Path::new("./my-skill"), &PolicyConfig::default(), TrustBoundary::File);
/// for (path, result) in &results {
///     println!("{}: {}", path.display(), result.action.kind());
/// }
/// ```
pub fn scan_tree(
    root: &Path,
    policy: &PolicyConfig,
    source: TrustBoundary,
) -> BTreeMap<PathBuf, ScanResult> {
    let scanner = LineScanner::new(policy);
    let canonical_root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let mut results = BTreeMap::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || resolves_inside(e.path(), &canonical_root));

    for entry in walker.filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        if !policy.scan_references && is_reference_path(root, path) {
            debug!(path = %path.display(), "skipping reference file");
            continue;
        }

        if let Some((key, result)) = scan_entry(&scanner, policy, path, source) {
            results.insert(key, result);
        }
    }

    results
}

/// Scans a single file with the same extension, size, and code-block rules
/// as [`scan_tree`]. Reference-directory filtering does not apply.
///
/// Returns the canonical path and its result, or `None` when the file is
/// not eligible or cannot be read.
pub fn scan_file(
    path: &Path,
    policy: &PolicyConfig,
    source: TrustBoundary,
) -> Option<(PathBuf, ScanResult)> {
    let scanner = LineScanner::new(policy);
    scan_entry(&scanner, policy, path, source)
}

fn scan_entry(
    scanner: &LineScanner<'_>,
    policy: &PolicyConfig,
    path: &Path,
    source: TrustBoundary,
) -> Option<(PathBuf, ScanResult)> {
    let ext = lowercase_extension(path)?;
    if !policy.scans_extension(&ext) {
        return None;
    }

    let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    let size = match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => return None,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping file without metadata");
            return None;
        }
    };
    if size > policy.max_file_size {
        debug!(
            path = %key.display(),
            size,
            limit = policy.max_file_size,
            "file exceeds size limit"
        );
        return Some((key, ScanResult::oversized()));
    }

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping unreadable file");
            return None;
        }
    };

    let content = if !policy.scan_code_blocks && MARKDOWN_EXTENSIONS.contains(&ext.as_str()) {
        strip_code_blocks(&content)
    } else {
        content
    };

    let result = scanner.scan(&content, source, Some(key.to_string_lossy().as_ref()));
    Some((key, result))
}

/// `true` if `path` resolves to a location under `canonical_root`.
fn resolves_inside(path: &Path, canonical_root: &Path) -> bool {
    match std::fs::canonicalize(path) {
        Ok(resolved) if resolved.starts_with(canonical_root) => true,
        Ok(resolved) => {
            debug!(
                path = %path.display(),
                target = %resolved.display(),
                "not following link out of bundle"
            );
            false
        }
        Err(_) => false,
    }
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Returns `true` if a directory between `root` and `path` is one of
/// [`REFERENCE_DIRS`]. Directories above `root` are not considered.
fn is_reference_path(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .parent()
        .map(|dir| {
            dir.components().any(|c| match c {
                Component::Normal(name) => name
                    .to_str()
                    .is_some_and(|name| REFERENCE_DIRS.contains(&name)),
                _ => false,
            })
        })
        .unwrap_or(false)
}

/// Removes fenced code blocks, fence lines included. An unterminated fence
/// drops everything after it.
fn strip_code_blocks(content: &str) -> String {
    let mut in_fence = false;
    let mut kept: Vec<&str> = Vec::new();

    for line in split_lines(content) {
        if line.trim().starts_with(FENCE) {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            kept.push(line);
        }
    }

    kept.join("\n")
}
