mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use rayon::prelude::*;
use skill_quarantine::catalog::{self, Severity};
use skill_quarantine::config::{PolicyConfig, ScanMode};
use skill_quarantine::finding::{BundleReport, FileStatus, QuarantineAction};
use skill_quarantine::output;
use skill_quarantine::scanner::InjectionScanner;
use std::path::{Path, PathBuf};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan {
            path,
            mode,
            config: config_path,
            format,
            output: output_path,
            all,
            source,
        } => {
            if !path.exists() {
                eprintln!("Error: path does not exist: {}", path.display());
                std::process::exit(2);
            }

            // Detect collection directories early to point at scan-all rather
            // than reporting an empty scan.
            let skill_children = find_skill_dirs(&path);
            if path.is_dir() && !path.join("SKILL.md").exists() && !skill_children.is_empty() {
                eprintln!(
                    "Error: '{}' looks like a skills collection directory, not a single skill.",
                    path.display()
                );
                eprintln!();
                eprintln!("To scan all skills at once:");
                eprintln!("  skill-quarantine scan-all {}", path.display());
                eprintln!();
                eprintln!("To scan a specific skill:");
                for child in &skill_children {
                    eprintln!("  skill-quarantine scan {}", child.display());
                }
                std::process::exit(2);
            }

            let policy = load_policy(config_path.as_deref(), mode);
            let scanner = InjectionScanner::new(policy);

            let (root, target) = resolve_scan_target(&path);
            let results = match target {
                Some(ref file) => scanner.scan_file(file, source).into_iter().collect(),
                None => scanner.scan_tree(&root, source),
            };

            let report = BundleReport::from_results(&root, results);
            let formatted = output::format_report(&report, &format, all || target.is_some());

            if let Some(out_path) = output_path {
                std::fs::write(&out_path, &formatted).unwrap_or_else(|e| {
                    eprintln!("Error writing output: {e}");
                    std::process::exit(2);
                });
                eprintln!("Output written to {}", out_path.display());
            } else {
                print!("{formatted}");
            }

            std::process::exit(if report.passed { 0 } else { 1 });
        }

        Commands::ScanAll {
            path,
            mode,
            config: config_path,
            format,
            all,
            source,
        } => {
            if !path.exists() {
                eprintln!("Error: path does not exist: {}", path.display());
                std::process::exit(2);
            }

            let skill_dirs = find_skill_dirs(&path);
            if skill_dirs.is_empty() {
                eprintln!(
                    "Error: no skill directories found in '{}' (no subdirectory contains a SKILL.md)",
                    path.display()
                );
                std::process::exit(2);
            }

            let policy = load_policy(config_path.as_deref(), mode);
            let scanner = InjectionScanner::new(policy);

            // Bundles are independent; each scan reads its own policy snapshot.
            let reports: Vec<BundleReport> = skill_dirs
                .par_iter()
                .map(|dir| BundleReport::from_results(dir, scanner.scan_tree(dir, source)))
                .collect();

            for report in &reports {
                print!("{}", output::format_report(report, &format, all));
            }

            if matches!(format, output::OutputFormat::Pretty) {
                print!("{}", format_collection_summary(&path, &reports));
            }

            let all_passed = reports.iter().all(|r| r.passed);
            std::process::exit(if all_passed { 0 } else { 1 });
        }

        Commands::ScanText {
            file,
            mode,
            config: config_path,
            source,
            json,
        } => {
            let content = match &file {
                Some(p) => std::fs::read_to_string(p),
                None => std::io::read_to_string(std::io::stdin()),
            }
            .unwrap_or_else(|e| {
                eprintln!("Error reading input: {e}");
                std::process::exit(2);
            });

            let policy = load_policy(config_path.as_deref(), mode);
            let scanner = InjectionScanner::new(policy);
            let id = file.as_ref().map(|p| p.to_string_lossy().to_string());
            let result = scanner.scan(&content, source, id.as_deref());

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&result).expect("JSON serialization failed")
                );
            } else {
                println!("Action: {}", result.action.kind());
                if !result.patterns.is_empty() {
                    let names: Vec<String> = result
                        .patterns
                        .iter()
                        .map(|p| format!("{} ({})", p.name, p.id))
                        .collect();
                    println!("Patterns: {}", names.join(", "));
                }
                if !result.matched_lines.is_empty() {
                    let lines: Vec<String> =
                        result.matched_lines.iter().map(|l| l.to_string()).collect();
                    println!("Lines: {}", lines.join(", "));
                }
                match &result.action {
                    QuarantineAction::Quarantine {
                        reason,
                        matched,
                        excerpt,
                    } => {
                        println!("Reason: {reason}");
                        println!("Match: {matched}");
                        println!("Excerpt:\n{excerpt}");
                    }
                    QuarantineAction::Block { reason, matched } => {
                        println!("Reason: {reason}");
                        println!("Match: {matched}");
                    }
                    QuarantineAction::Allow { .. } => {}
                }
            }

            std::process::exit(if result.action.is_allowed() { 0 } else { 1 });
        }

        Commands::ListRules => {
            let rules = catalog::catalog();
            println!("{}", "Built-in Rules".bold().underline());
            println!();

            for rule in rules {
                println!(
                    "  [{severity}] {id:<22} {name}",
                    severity = severity_label(rule.severity),
                    id = rule.id,
                    name = rule.name,
                );
            }

            println!();
            println!("  Total: {} rules", rules.len());
        }

        Commands::Explain { rule_id } => match catalog::rule(&rule_id) {
            Some(rule) => {
                println!("{}", rule.id.bold());
                println!();
                println!("  Name:         {}", rule.name);
                println!("  Severity:     {}", rule.severity);
                println!("  Description:  {}", rule.description);
                println!("  Pattern:      {}", rule.source);
                println!("  Remediation:  {}", rule.remediation);
            }
            None => {
                eprintln!("Unknown rule: {rule_id}");
                eprintln!("Use 'skill-quarantine list-rules' to see all available rules.");
                std::process::exit(2);
            }
        },
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let env_filter = if verbose {
        EnvFilter::new("skill_quarantine=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn load_policy(config_path: Option<&Path>, mode: ScanMode) -> PolicyConfig {
    PolicyConfig::resolve(config_path, mode).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(2);
    })
}

/// Splits a scan path into the bundle root and, for a file argument, the
/// canonical path of the one file to scan.
fn resolve_scan_target(path: &Path) -> (PathBuf, Option<PathBuf>) {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if canonical.is_dir() {
        return (canonical, None);
    }
    let root = canonical
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    (root, Some(canonical))
}

/// Returns immediate child directories of `path` that contain a `SKILL.md` file,
/// sorted alphabetically by directory name.
fn find_skill_dirs(path: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(path) else {
        return vec![];
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| p.join("SKILL.md").exists())
        .collect();

    dirs.sort();
    dirs
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Critical => "CRITICAL".red().bold().to_string(),
        Severity::High => "    HIGH".magenta().bold().to_string(),
        Severity::Medium => "  MEDIUM".yellow().bold().to_string(),
        Severity::Low => "     LOW".blue().to_string(),
    }
}

/// Renders a compact summary table after all individual bundle reports have been printed.
fn format_collection_summary(collection_path: &Path, reports: &[BundleReport]) -> String {
    let mut out = String::new();
    let separator = "─".repeat(58);

    out.push('\n');
    out.push_str(&format!(
        "{}\n",
        format!(
            "  Collection Summary: {}  ({} skills)",
            collection_path.display(),
            reports.len()
        )
        .bold()
        .underline()
    ));
    out.push_str(&format!("{}\n", separator.dimmed()));

    let mut n_blocked = 0usize;
    let mut n_quarantined = 0usize;
    let mut n_passed = 0usize;

    for report in reports {
        let (icon, status_str) = match report.status {
            FileStatus::Clean | FileStatus::Warning => {
                n_passed += 1;
                (
                    "✓".green().to_string(),
                    "PASSED     ".green().bold().to_string(),
                )
            }
            FileStatus::Quarantined => {
                n_quarantined += 1;
                (
                    "⚠".magenta().to_string(),
                    "QUARANTINED".magenta().bold().to_string(),
                )
            }
            FileStatus::Blocked => {
                n_blocked += 1;
                (
                    "✗".red().to_string(),
                    "BLOCKED    ".red().bold().to_string(),
                )
            }
        };

        let (blocked, quarantined, warnings, _) = report.count_by_status();
        out.push_str(&format!(
            "  {icon}  {name:<22} {status_str}  {blocked}b {quarantined}q {warnings}w\n",
            name = report.bundle,
        ));
    }

    out.push_str(&format!("{}\n", separator.dimmed()));
    out.push_str(&format!(
        "  Total: {}  {}  {}\n",
        format!("{n_blocked} blocked").red().bold(),
        format!("{n_quarantined} quarantined").magenta().bold(),
        format!("{n_passed} passed").green().bold(),
    ));

    out
}
