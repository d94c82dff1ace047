//! Human-readable colored text formatter.

use crate::finding::{BundleReport, FileReport, FileStatus, QuarantineAction};
use colored::Colorize;

/// Formats a [`BundleReport`] as human-readable, ANSI-colored text.
///
/// Sections rendered (in order):
/// 1. **Header**: bundle name, root, and timestamp.
/// 2. **Files**: per-file status, matched rules, lines, reason, and excerpt.
/// 3. **Summary**: overall status and per-status counts.
pub fn format(report: &BundleReport, include_clean: bool) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{}\n",
        format!("  Skill Scan: {}  ", report.bundle)
            .bold()
            .on_blue()
            .white()
    ));
    out.push_str(&format!("  Root: {}\n", report.root.display()));
    out.push_str(&format!("  Timestamp: {}\n", report.scan_timestamp));
    out.push_str(&format!("  Files scanned: {}\n\n", report.files_scanned));

    let mut shown = report
        .files
        .iter()
        .filter(|f| include_clean || f.status != FileStatus::Clean)
        .peekable();

    if shown.peek().is_none() {
        out.push_str(&format!("{}\n\n", "✓ No findings".green()));
    } else {
        out.push_str(&format!("{}\n", "Files".bold().underline()));
        for file in shown {
            push_file(&mut out, file);
        }
        out.push('\n');
    }

    let status_str = match report.status {
        FileStatus::Clean => "CLEAN".green().bold().to_string(),
        FileStatus::Warning => "WARNING".yellow().bold().to_string(),
        FileStatus::Quarantined => "QUARANTINED".magenta().bold().to_string(),
        FileStatus::Blocked => "BLOCKED".red().bold().to_string(),
    };
    let (blocked, quarantined, warnings, clean) = report.count_by_status();
    out.push_str(&format!(
        "Result: {status_str}  |  {blocked} blocked, {quarantined} quarantined, {warnings} warnings, {clean} clean\n"
    ));

    out
}

fn push_file(out: &mut String, file: &FileReport) {
    out.push_str(&format!(
        "  [{}] {}\n",
        status_label(file.status),
        file.path.display()
    ));

    let result = &file.result;
    if !result.patterns.is_empty() {
        let names: Vec<String> = result
            .patterns
            .iter()
            .map(|p| format!("{} ({})", p.name, p.id))
            .collect();
        out.push_str(&format!("         Patterns: {}\n", names.join(", ")));
    }
    if !result.matched_lines.is_empty() {
        let lines: Vec<String> = result.matched_lines.iter().map(|l| l.to_string()).collect();
        out.push_str(&format!("         Lines: {}\n", lines.join(", ").dimmed()));
    }

    match &result.action {
        QuarantineAction::Quarantine {
            reason,
            matched,
            excerpt,
        } => {
            out.push_str(&format!("         Reason: {reason}\n"));
            out.push_str(&format!("         Match: {}\n", matched.dimmed()));
            for line in excerpt.lines() {
                out.push_str(&format!("         > {}\n", line.dimmed()));
            }
        }
        QuarantineAction::Block { reason, matched } => {
            out.push_str(&format!("         Reason: {reason}\n"));
            out.push_str(&format!("         Match: {}\n", matched.dimmed()));
        }
        QuarantineAction::Allow { .. } => {}
    }
}

fn status_label(status: FileStatus) -> String {
    match status {
        FileStatus::Blocked => "BLOCK".red().bold().to_string(),
        FileStatus::Quarantined => "QUARANTINE".magenta().bold().to_string(),
        FileStatus::Warning => " WARN".yellow().bold().to_string(),
        FileStatus::Clean => "   OK".green().to_string(),
    }
}
