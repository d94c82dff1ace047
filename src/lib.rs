//! # skill-quarantine
//!
//! Content-safety scanning for AI agent skill bundles.
//!
//! `skill-quarantine` inspects the documentation an agent will read for
//! prompt injection, jailbreak phrasing, and safety-override attempts before
//! a bundle is trusted, installed, or published. Every piece of content gets
//! one of three decisions: **allow**, **quarantine** (held for review with a
//! bounded excerpt), or **block**.
//!
//! The engine is a heuristic, auditable pre-filter built on regular
//! expressions. A match does not prove content is malicious.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use skill_quarantine::config::{PolicyConfig, ScanMode};
//! use skill_quarantine::finding::{BundleReport, TrustBoundary};
//! use skill_quarantine::scanner::InjectionScanner;
//! use skill_quarantine::output;
//!
//! let scanner = InjectionScanner::new(ScanMode::Strict.policy());
//! let root = Path::new("./my-skill");
//! let report = BundleReport::from_results(root, scanner.scan_tree(root, TrustBoundary::File));
//!
//! if !report.passed {
//!     let text = output::format_report(&report, &output::OutputFormat::Pretty, false);
//!     print!("{text}");
//! }
//! ```
//!
//! ## Architecture
//!
//! 1. **[`catalog`]**: the seven built-in detection rules, in priority order.
//! 2. **[`config`]**: [`config::PolicyConfig`], presets, and TOML loading.
//! 3. **[`scanner`]**: the per-line decision algorithm
//!    ([`scanner::LineScanner`]) and the policy-owning
//!    [`scanner::InjectionScanner`].
//! 4. **[`redact`]**: bounded excerpts of matched lines.
//! 5. **[`bundle`]**: directory traversal with extension, location, and
//!    size filters.
//! 6. **[`finding`]**: decision and report types.
//! 7. **[`output`]**: pretty text, JSON, and [SARIF] renderings.
//!
//! ## Rules
//!
//! | Rule | Severity | Detects |
//! |------|----------|---------|
//! | `ignore-previous` | high | Instruction override |
//! | `jailbreak-dan` | critical | DAN jailbreak phrasing |
//! | `jailbreak-developer` | critical | Developer mode markers |
//! | `role-confusion` | high | Role reassignment |
//! | `prompt-leak` | high | System prompt extraction |
//! | `override-safety` | critical | Disabling safety measures |
//! | `code-injection` | medium | Code execution phrasing |
//!
//! [SARIF]: https://sarifweb.azurewebsites.net/

pub mod bundle;
pub mod catalog;
pub mod config;
pub mod error;
pub mod finding;
pub mod output;
pub mod redact;
pub mod scanner;

pub use error::{Error, Result};
