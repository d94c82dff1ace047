use crate::catalog::InjectionPattern;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where scanned content came from.
///
/// Accepted by every scan entry point and recorded in logs. The decision
/// algorithm does not currently vary by boundary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TrustBoundary {
    User,
    Assistant,
    Tool,
    File,
    Remote,
    #[default]
    Unknown,
}

impl fmt::Display for TrustBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustBoundary::User => write!(f, "user"),
            TrustBoundary::Assistant => write!(f, "assistant"),
            TrustBoundary::Tool => write!(f, "tool"),
            TrustBoundary::File => write!(f, "file"),
            TrustBoundary::Remote => write!(f, "remote"),
            TrustBoundary::Unknown => write!(f, "unknown"),
        }
    }
}

/// Decision reached for a piece of content.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QuarantineAction {
    /// Content may be used. The content itself is not serialized.
    Allow {
        #[serde(skip)]
        content: String,
    },
    /// Content is held for review with a bounded excerpt of the evidence.
    Quarantine {
        reason: String,
        #[serde(rename = "match")]
        matched: String,
        excerpt: String,
    },
    /// Content is rejected outright.
    Block {
        reason: String,
        #[serde(rename = "match")]
        matched: String,
    },
}

impl QuarantineAction {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuarantineAction::Allow { .. })
    }

    pub fn is_quarantined(&self) -> bool {
        matches!(self, QuarantineAction::Quarantine { .. })
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, QuarantineAction::Block { .. })
    }

    /// Short tag for logs (`"allow"`, `"quarantine"`, `"block"`).
    pub fn kind(&self) -> &'static str {
        match self {
            QuarantineAction::Allow { .. } => "allow",
            QuarantineAction::Quarantine { .. } => "quarantine",
            QuarantineAction::Block { .. } => "block",
        }
    }

    /// Reason text for quarantine and block decisions.
    pub fn reason(&self) -> Option<&str> {
        match self {
            QuarantineAction::Allow { .. } => None,
            QuarantineAction::Quarantine { reason, .. } | QuarantineAction::Block { reason, .. } => {
                Some(reason.as_str())
            }
        }
    }

    /// The matched rule ids or blocklist literal for quarantine and block decisions.
    pub fn matched(&self) -> Option<&str> {
        match self {
            QuarantineAction::Allow { .. } => None,
            QuarantineAction::Quarantine { matched, .. }
            | QuarantineAction::Block { matched, .. } => Some(matched.as_str()),
        }
    }
}

/// One rule firing on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PatternHit {
    pub pattern: &'static str,
    pub line: usize,
}

/// Outcome of scanning a single piece of content.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScanResult {
    pub action: QuarantineAction,
    /// Matched rules in encounter order; a rule firing on several lines
    /// appears once per line.
    pub patterns: Vec<InjectionPattern>,
    pub match_count: usize,
    /// Sorted, de-duplicated, 1-indexed line numbers.
    pub matched_lines: Vec<usize>,
    /// Rule/line pairs behind `patterns`, in the same order.
    pub hits: Vec<PatternHit>,
}

impl ScanResult {
    /// An allow decision with no evidence.
    pub fn allow(content: &str) -> Self {
        ScanResult {
            action: QuarantineAction::Allow {
                content: content.to_string(),
            },
            patterns: vec![],
            match_count: 0,
            matched_lines: vec![],
            hits: vec![],
        }
    }

    /// The decision recorded for a file larger than the policy's size cap.
    pub fn oversized() -> Self {
        ScanResult {
            action: QuarantineAction::Quarantine {
                reason: "File exceeds max size limit".to_string(),
                matched: "file_size".to_string(),
                excerpt: String::new(),
            },
            patterns: vec![],
            match_count: 0,
            matched_lines: vec![],
            hits: vec![],
        }
    }

    pub fn status(&self) -> FileStatus {
        match self.action {
            QuarantineAction::Block { .. } => FileStatus::Blocked,
            QuarantineAction::Quarantine { .. } => FileStatus::Quarantined,
            QuarantineAction::Allow { .. } if self.patterns.is_empty() => FileStatus::Clean,
            QuarantineAction::Allow { .. } => FileStatus::Warning,
        }
    }
}

/// Per-file and per-bundle status, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Allowed with no matches.
    Clean,
    /// Allowed, but low-severity matches were recorded.
    Warning,
    Quarantined,
    Blocked,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Clean => write!(f, "clean"),
            FileStatus::Warning => write!(f, "warning"),
            FileStatus::Quarantined => write!(f, "quarantined"),
            FileStatus::Blocked => write!(f, "blocked"),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    #[serde(flatten)]
    pub result: ScanResult,
}

/// Scan results for one bundle, ready for the output formatters.
#[derive(Debug, serde::Serialize)]
pub struct BundleReport {
    pub bundle: String,
    pub root: PathBuf,
    pub scan_timestamp: String,
    pub status: FileStatus,
    pub files_scanned: usize,
    /// Every scanned file, sorted by path.
    pub files: Vec<FileReport>,
    pub passed: bool,
}

impl BundleReport {
    pub fn from_results(root: &Path, results: BTreeMap<PathBuf, ScanResult>) -> Self {
        let files: Vec<FileReport> = results
            .into_iter()
            .map(|(path, result)| FileReport {
                path,
                status: result.status(),
                result,
            })
            .collect();

        let status = files
            .iter()
            .map(|f| f.status)
            .max()
            .unwrap_or(FileStatus::Clean);

        BundleReport {
            bundle: bundle_name(root),
            root: root.to_path_buf(),
            scan_timestamp: chrono::Utc::now().to_rfc3339(),
            status,
            files_scanned: files.len(),
            files,
            passed: status <= FileStatus::Warning,
        }
    }

    /// Files that are not [`FileStatus::Clean`].
    pub fn flagged(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.status != FileStatus::Clean)
    }

    /// Count blocked, quarantined, warning, and clean files in a single pass.
    ///
    /// Returns `(blocked, quarantined, warnings, clean)`.
    pub fn count_by_status(&self) -> (usize, usize, usize, usize) {
        self.files
            .iter()
            .fold((0, 0, 0, 0), |(b, q, w, c), f| match f.status {
                FileStatus::Blocked => (b + 1, q, w, c),
                FileStatus::Quarantined => (b, q + 1, w, c),
                FileStatus::Warning => (b, q, w + 1, c),
                FileStatus::Clean => (b, q, w, c + 1),
            })
    }
}

/// Last path component, or `"unknown"` for paths like `/`.
fn bundle_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
