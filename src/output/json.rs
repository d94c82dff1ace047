//! JSON output formatter.
//!
//! Produces a pretty-printed JSON document containing bundle metadata, a
//! status summary, and per-file decisions. Allowed content is never echoed.

use crate::finding::{BundleReport, FileReport, FileStatus};

#[derive(serde::Serialize)]
struct JsonOutput<'a> {
    bundle: &'a str,
    root: &'a std::path::Path,
    scan_timestamp: &'a str,
    status: FileStatus,
    passed: bool,
    summary: Summary,
    files: Vec<&'a FileReport>,
}

#[derive(serde::Serialize)]
struct Summary {
    files_scanned: usize,
    blocked: usize,
    quarantined: usize,
    warnings: usize,
    clean: usize,
}

/// Formats a [`BundleReport`] as pretty-printed JSON.
///
/// # Panics
///
/// Panics if the report cannot be serialized (should not happen with valid data).
pub fn format(report: &BundleReport, include_clean: bool) -> String {
    let (blocked, quarantined, warnings, clean) = report.count_by_status();
    let files = if include_clean {
        report.files.iter().collect()
    } else {
        report.flagged().collect()
    };

    let output = JsonOutput {
        bundle: &report.bundle,
        root: &report.root,
        scan_timestamp: &report.scan_timestamp,
        status: report.status,
        passed: report.passed,
        summary: Summary {
            files_scanned: report.files_scanned,
            blocked,
            quarantined,
            warnings,
            clean,
        },
        files,
    };

    serde_json::to_string_pretty(&output).expect("JSON serialization failed")
}
