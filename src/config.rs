//! Scan policy.
//!
//! A [`PolicyConfig`] decides which rules run, which lines are exempt or
//! force-blocked, how severities map to actions, and which files a bundle scan
//! looks at. Policies come from one of three presets ([`ScanMode`]) or from a
//! TOML file.
//!
//! # Configuration file
//!
//! The default file is `skill-quarantine.toml` in the current working
//! directory. Every field is optional:
//!
//! ```toml
//! enabled_patterns = ["ignore-previous", "jailbreak-dan"]
//! allowlist = ['\[\s*Note\s*\]']
//! blocklist = ["eval("]
//! max_file_size = 250000
//! scan_references = true
//! scan_code_blocks = false
//! block_severity = "critical"
//! quarantine_severity = "high"
//! extensions = ["md", "txt"]
//! ```

use crate::catalog::Severity;
use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// File name looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "skill-quarantine.toml";

/// Policy consumed by the scanning engine.
///
/// All fields carry defaults so a config file may be partial or omitted.
/// No validation is performed beyond what the types enforce; an empty
/// allowlist or blocklist simply disables that override.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Rule ids to run. Empty means every built-in rule.
    pub enabled_patterns: BTreeSet<String>,
    /// Regex sources; a line matching any of them skips every other check.
    pub allowlist: Vec<String>,
    /// Literal substrings that block content as soon as a line contains one.
    pub blocklist: Vec<String>,
    /// Files larger than this many bytes are quarantined without being read.
    pub max_file_size: u64,
    /// Scan files under `references/`, `assets/`, and `scripts/`.
    pub scan_references: bool,
    /// Scan fenced code blocks inside markdown files.
    pub scan_code_blocks: bool,
    /// A single match at or above this severity blocks the content.
    pub block_severity: Severity,
    /// Any match at or above this severity quarantines the content.
    pub quarantine_severity: Severity,
    /// File extensions (lowercase, no dot) a bundle scan reads.
    pub extensions: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            enabled_patterns: BTreeSet::new(),
            allowlist: vec![],
            blocklist: vec![],
            max_file_size: 1_000_000,
            scan_references: false,
            scan_code_blocks: true,
            block_severity: Severity::Critical,
            quarantine_severity: Severity::High,
            extensions: vec!["md".to_string(), "sh".to_string()],
        }
    }
}

impl PolicyConfig {
    /// Preset for trusted sources: skips references and code blocks and
    /// ignores common admonition markers.
    pub fn permissive() -> Self {
        PolicyConfig {
            allowlist: vec![
                r"\[\s*Note\s*\]".to_string(),
                r"\[\s*WARNING\s*\]".to_string(),
                r"\[\s*INFO\s*\]".to_string(),
            ],
            scan_references: false,
            scan_code_blocks: false,
            ..PolicyConfig::default()
        }
    }

    /// Preset for untrusted sources: scans everything, blocks literal
    /// dynamic-execution calls, and lowers the size cap to 500 KB.
    pub fn strict() -> Self {
        PolicyConfig {
            blocklist: vec![
                "eval(".to_string(),
                "exec(".to_string(),
                "system(".to_string(),
                "__import__".to_string(),
            ],
            max_file_size: 500_000,
            scan_references: true,
            scan_code_blocks: true,
            ..PolicyConfig::default()
        }
    }

    /// Loads a policy from a TOML file.
    ///
    /// Resolution order:
    /// 1. If `path` is `Some`, load from that file (error if missing).
    /// 2. If `path` is `None`, try [`DEFAULT_CONFIG_FILE`] in the current directory.
    /// 3. If that file does not exist either, return [`PolicyConfig::default()`].
    ///
    /// Extensions are normalized after loading.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for a missing explicit path, [`Error::Read`] when the
    /// file cannot be read, and [`Error::Parse`] for invalid TOML.
    pub fn load(path: Option<&Path>) -> Result<PolicyConfig> {
        let config_path = match path {
            Some(p) if p.exists() => Some(p.to_path_buf()),
            Some(p) => return Err(Error::NotFound(p.to_path_buf())),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                default_path.exists().then(|| default_path.to_path_buf())
            }
        };

        let Some(path) = config_path else {
            return Ok(PolicyConfig::default());
        };

        let content = std::fs::read_to_string(&path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;
        let mut config: PolicyConfig =
            toml::from_str(&content).map_err(|source| Error::Parse { path, source })?;
        config.normalize();
        Ok(config)
    }

    /// Picks the policy for a CLI invocation.
    ///
    /// An explicit config file wins over `mode`. Without one, the default mode
    /// still honours a [`DEFAULT_CONFIG_FILE`] in the working directory, while
    /// `strict` and `permissive` always use their presets.
    pub fn resolve(config: Option<&Path>, mode: ScanMode) -> Result<PolicyConfig> {
        match (config, mode) {
            (Some(path), _) => PolicyConfig::load(Some(path)),
            (None, ScanMode::Default) => PolicyConfig::load(None),
            (None, mode) => Ok(mode.policy()),
        }
    }

    /// Lowercases extensions and strips any leading dot so that `".MD"` and
    /// `"md"` select the same files.
    pub fn normalize(&mut self) {
        for ext in &mut self.extensions {
            *ext = ext.trim_start_matches('.').to_lowercase();
        }
    }

    /// Returns `true` if files with this (already lowercased) extension are scanned.
    pub fn scans_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }
}

/// Built-in policy presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ScanMode {
    /// Balanced defaults.
    #[default]
    Default,
    /// Scan everything, block literal dynamic-execution calls.
    Strict,
    /// Skip references and code blocks, ignore admonition markers.
    Permissive,
}

impl ScanMode {
    /// Returns the preset policy for this mode.
    pub fn policy(self) -> PolicyConfig {
        match self {
            ScanMode::Default => PolicyConfig::default(),
            ScanMode::Strict => PolicyConfig::strict(),
            ScanMode::Permissive => PolicyConfig::permissive(),
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Default => write!(f, "default"),
            ScanMode::Strict => write!(f, "strict"),
            ScanMode::Permissive => write!(f, "permissive"),
        }
    }
}

impl FromStr for ScanMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(ScanMode::Default),
            "strict" => Ok(ScanMode::Strict),
            "permissive" => Ok(ScanMode::Permissive),
            _ => Err(Error::UnknownMode(s.to_string())),
        }
    }
}
