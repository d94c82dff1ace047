//! Built-in detection rules.
//!
//! The catalog is a fixed, ordered list of [`InjectionPattern`]s. Order is
//! significant: when several rules match the same line they are recorded in
//! catalog order, and the first blocking rule wins.

use crate::config::PolicyConfig;
use regex::Regex;
use std::fmt;

/// Severity of a detection rule.
///
/// Variants are declared most severe first, so the derived ordering sorts
/// `Critical` before `Low`. Use [`Severity::is_at_least`] for threshold
/// checks rather than comparing with `<`/`>` directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Returns `true` when `self` is as severe as `threshold` or more.
    ///
    /// ```
    /// use skill_quarantine::catalog::Severity;
    ///
    /// assert!(Severity::Critical.is_at_least(Severity::High));
    /// assert!(Severity::High.is_at_least(Severity::High));
    /// assert!(!Severity::Medium.is_at_least(Severity::High));
    /// ```
    pub fn is_at_least(self, threshold: Severity) -> bool {
        self <= threshold
    }

    /// Capitalized label used in decision reasons (`"Critical"`, `"High"`, …).
    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// A named detection rule.
///
/// The regex `source` is kept as text and compiled when a scan starts; a
/// source that fails to compile disables the rule for that scan only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct InjectionPattern {
    /// Stable, unique rule identifier (e.g. `"jailbreak-dan"`).
    pub id: &'static str,
    /// Human-readable rule name, used in block reasons.
    pub name: &'static str,
    /// Regex source matched against each line.
    #[serde(skip)]
    pub source: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    /// Guidance shown by `explain` and in SARIF rule help.
    #[serde(skip)]
    pub remediation: &'static str,
}

impl InjectionPattern {
    /// Compiles the rule's regex source.
    pub fn compile(&self) -> Result<Regex, regex::Error> {
        Regex::new(self.source)
    }
}

static CATALOG: [InjectionPattern; 7] = [
    InjectionPattern {
        id: "ignore-previous",
        name: "Ignore Previous Instructions",
        source: r"(?i)(ignore|disregard|forget)\s+(all\s+)?(the\s+)?(previous|above|earlier|following)",
        severity: Severity::High,
        description: "Attempts to override system instructions",
        remediation: "Remove instruction override language from the skill",
    },
    InjectionPattern {
        id: "jailbreak-dan",
        name: "DAN Jailbreak",
        source: r"(?i)(do\s+anything\s+now|you\s+are\s+dan\b|you\s+don'?t\s+have\s+to\s+follow|hello\s+chatgpt)",
        severity: Severity::Critical,
        description: "DAN (Do Anything Now) jailbreak pattern",
        remediation: "Remove jailbreak phrasing from the skill",
    },
    InjectionPattern {
        id: "jailbreak-developer",
        name: "Developer Mode Jailbreak",
        source: r"(?i)(developer\s+mode|\[\s*\*\s*\]|\[\s*##\s*\]|\(\s*\*\s*\))",
        severity: Severity::Critical,
        description: "Developer mode override attempt",
        remediation: "Remove developer mode activation markers from the skill",
    },
    InjectionPattern {
        id: "role-confusion",
        name: "Role Confusion",
        source: r"(?i)(you\s+are\s+now\s+(a|an)\b|pretend\s+(you\s+are|to\s+be)|act\s+as\s+if\s+you\s+are\s+(a\s+)?(human|user|admin))",
        severity: Severity::High,
        description: "Attempts to confuse role boundaries",
        remediation: "Remove language that reassigns the agent's role or identity",
    },
    InjectionPattern {
        id: "prompt-leak",
        name: "Prompt Extraction",
        source: r"(?i)(show\s+me\s+your|print\s+(your|the)|reveal\s+(your|the)|what\s+(are\s+)?your\s+(instructions|prompt|system))",
        severity: Severity::High,
        description: "Attempts to extract system prompt",
        remediation: "Remove instructions that ask the agent to reveal its prompt or instructions",
    },
    InjectionPattern {
        id: "override-safety",
        name: "Safety Override",
        source: r"(?i)(disable|turn\s+off|bypass|ignore)\s+(your|all)?\s*(safety\s+filters?|safety|security|ethical|moral|filters?)",
        severity: Severity::Critical,
        description: "Attempts to disable safety measures",
        remediation: "Remove language asking the agent to disable or bypass safety measures",
    },
    InjectionPattern {
        id: "code-injection",
        name: "Code Injection",
        source: r"(?i)\b(execute|run|eval|exec)(\s+|\s*\()",
        severity: Severity::Medium,
        description: "Suspicious code execution patterns",
        remediation: "Review code execution instructions; prefer explicit, reviewed commands",
    },
];

/// Returns the built-in rules in priority order.
pub fn catalog() -> &'static [InjectionPattern] {
    &CATALOG
}

/// Looks up a built-in rule by id.
pub fn rule(id: &str) -> Option<&'static InjectionPattern> {
    CATALOG.iter().find(|p| p.id == id)
}

/// Selects the rules a policy enables, preserving catalog order.
///
/// An empty `enabled_patterns` set enables every rule. Unknown ids in the set
/// are ignored.
pub fn active_patterns(policy: &PolicyConfig) -> Vec<&'static InjectionPattern> {
    CATALOG
        .iter()
        .filter(|p| policy.enabled_patterns.is_empty() || policy.enabled_patterns.contains(p.id))
        .collect()
}
