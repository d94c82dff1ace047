use clap::{Parser, Subcommand};
use skill_quarantine::config::ScanMode;
use skill_quarantine::finding::TrustBoundary;
use skill_quarantine::output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "skill-quarantine",
    version,
    about = "Prompt-injection scanning for AI agent skill bundles"
)]
pub struct Cli {
    /// Log scan decisions and skipped files to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a skill directory, or a single file inside one
    Scan {
        /// Path to the skill directory or a file in it
        path: PathBuf,

        /// Policy preset
        #[arg(long, short, default_value = "default", value_enum)]
        mode: ScanMode,

        /// Policy file (overrides --mode)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, short, default_value = "pretty", value_enum)]
        format: OutputFormat,

        /// Write output to file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Include clean files in output
        #[arg(long)]
        all: bool,

        /// Trust boundary of the content
        #[arg(long, default_value = "file", value_enum)]
        source: TrustBoundary,
    },

    /// Scan every skill directory inside a collection directory
    #[command(name = "scan-all")]
    ScanAll {
        /// Path to a directory containing multiple skill subdirectories
        path: PathBuf,

        /// Policy preset
        #[arg(long, short, default_value = "default", value_enum)]
        mode: ScanMode,

        /// Policy file (overrides --mode)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, short, default_value = "pretty", value_enum)]
        format: OutputFormat,

        /// Include clean files in output
        #[arg(long)]
        all: bool,

        /// Trust boundary of the content
        #[arg(long, default_value = "file", value_enum)]
        source: TrustBoundary,
    },

    /// Scan a single document from a file or stdin
    #[command(name = "scan-text")]
    ScanText {
        /// File to read; stdin when omitted
        file: Option<PathBuf>,

        /// Policy preset
        #[arg(long, short, default_value = "default", value_enum)]
        mode: ScanMode,

        /// Policy file (overrides --mode)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Trust boundary of the content
        #[arg(long, default_value = "unknown", value_enum)]
        source: TrustBoundary,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all built-in rules
    ListRules,

    /// Show full explanation for a rule
    Explain {
        /// Rule ID (e.g., "jailbreak-dan")
        rule_id: String,
    },
}
