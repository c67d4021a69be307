//! Detection rules applied line-by-line to skill source text.
//!
//! Rules are intentionally regex-level: fast, deterministic, and conservative.
//! No AST or dataflow analysis is attempted; each rule pairs a match pattern
//! with an optional line-level exclusion that suppresses known benign shapes
//! (localhost targets, version strings, environment-variable reads).

pub mod catalog;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use catalog::catalog;

/// Severity level of a rule, ordered low to critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Fixed point weight contributed to the risk score.
    pub fn weight(self) -> u32 {
        match self {
            Self::Critical => 25,
            Self::High => 15,
            Self::Medium => 8,
            Self::Low => 3,
        }
    }

    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// One immutable detection rule.
pub struct Rule {
    /// Unique rule identifier (e.g. "SEC-001").
    pub id: &'static str,
    /// Human-readable rule name.
    pub name: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub remediation: &'static str,
    /// Pattern that must match somewhere on the line.
    pattern: &'static Lazy<Regex>,
    /// If present and matching anywhere on the line, the rule does not fire.
    exclude: Option<&'static Lazy<Regex>>,
}

/// A single pattern hit on one line.
pub struct RuleMatch {
    /// Zero-based byte offset of the match start.
    pub column: usize,
    /// Matched text, truncated by the scanner before it reaches a finding.
    pub text: String,
}

impl Rule {
    /// Apply this rule to one source line.
    pub fn matches(&self, line: &str) -> Option<RuleMatch> {
        let m = self.pattern.find(line)?;
        if let Some(exclude) = self.exclude {
            if exclude.is_match(line) {
                return None;
            }
        }
        Some(RuleMatch {
            column: m.start(),
            text: m.as_str().to_string(),
        })
    }
}

/// Serializable rule metadata, used for `list-rules` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMetadata {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub remediation: String,
}

impl From<&Rule> for RuleMetadata {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id.into(),
            name: rule.name.into(),
            severity: rule.severity,
            description: rule.description.into(),
            remediation: rule.remediation.into(),
        }
    }
}

/// Metadata for every rule in the catalogue.
pub fn list_rules() -> Vec<RuleMetadata> {
    catalog().iter().map(RuleMetadata::from).collect()
}
