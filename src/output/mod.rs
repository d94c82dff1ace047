//! Output formatting for bundle reports.
//!
//! Three formats are supported:
//!
//! | Format | Module | Use case |
//! |--------|--------|----------|
//! | [`Pretty`](OutputFormat::Pretty) | [`pretty`] | Terminal / human review |
//! | [`Json`](OutputFormat::Json)     | [`json`]   | Automation / scripting  |
//! | [`Sarif`](OutputFormat::Sarif)   | [`sarif`]  | CI/CD integration       |
//!
//! Use [`format_report`] to render a [`BundleReport`] in any of the above
//! formats.

pub mod json;
pub mod pretty;
pub mod sarif;

use crate::finding::BundleReport;

/// Supported output formats for bundle reports.
#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored text.
    Pretty,
    /// Machine-readable JSON.
    Json,
    /// [SARIF 2.1.0](https://sarifweb.azurewebsites.net/) for CI/CD tool integration.
    Sarif,
}

/// Formats a [`BundleReport`] in the requested [`OutputFormat`].
///
/// With `include_clean` unset, pretty and JSON output list only flagged
/// files. SARIF only ever contains flagged files.
///
/// # Examples
///
/// ```rust,no_run
/// use skill_quarantine::output::{format_report, OutputFormat};
/// # use skill_quarantine::finding::BundleReport;
/// # fn example(report: &BundleReport) {
/// let json = format_report(report, &OutputFormat::Json, false);
/// println!("{json}");
/// # }
/// ```
pub fn format_report(report: &BundleReport, format: &OutputFormat, include_clean: bool) -> String {
    match format {
        OutputFormat::Pretty => pretty::format(report, include_clean),
        OutputFormat::Json => json::format(report, include_clean),
        OutputFormat::Sarif => sarif::format(report),
    }
}
