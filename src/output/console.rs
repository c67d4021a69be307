use crate::rules::Severity;
use crate::scanner::ScanReport;

/// Render a report for terminals: findings in scan order with severity tags,
/// scan errors, and a verdict footer.
pub fn render(report: &ScanReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n  {} — {} file(s) scanned in {} ms\n\n",
        report.skill_name, report.files_scanned, report.scan_duration_ms
    ));

    if report.findings.is_empty() {
        output.push_str("  No security findings detected.\n\n");
    } else {
        output.push_str(&format!(
            "  {} finding(s) detected:\n\n",
            report.total_findings
        ));

        for finding in &report.findings {
            let severity_tag = match finding.severity {
                Severity::Critical => "[CRITICAL]",
                Severity::High => "[HIGH]    ",
                Severity::Medium => "[MEDIUM]  ",
                Severity::Low => "[LOW]     ",
            };

            let location = match &finding.file {
                Some(file) => format!("{}:{}", file, finding.line),
                None => format!("line {}", finding.line),
            };

            output.push_str(&format!(
                "  {} {} {}\n",
                severity_tag, finding.rule_id, finding.description
            ));
            output.push_str(&format!("           at {}\n", location));
            output.push_str(&format!("           fix: {}\n\n", finding.remediation));
        }
    }

    for error in &report.errors {
        output.push_str(&format!(
            "  [ERROR]    could not read {}: {}\n",
            error.file, error.message
        ));
    }
    if !report.errors.is_empty() {
        output.push('\n');
    }

    output.push_str(&format!(
        "  Risk score: {}/100 — verdict: {}\n\n",
        report.risk_score, report.verdict
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    #[test]
    fn renders_findings_and_verdict() {
        let files = vec![("index.js".to_string(), "eval('1')\n".to_string())];
        let report = Scanner::new().scan_skill("demo", &files, vec![]);
        let text = render(&report);

        assert!(text.contains("[HIGH]"));
        assert!(text.contains("SEC-001"));
        assert!(text.contains("index.js:1"));
        assert!(text.contains("verdict: verified"));
    }

    #[test]
    fn renders_clean_report() {
        let files = vec![("index.js".to_string(), "const x = 1;\n".to_string())];
        let report = Scanner::new().scan_skill("clean", &files, vec![]);
        let text = render(&report);

        assert!(text.contains("No security findings detected"));
        assert!(text.contains("Risk score: 0/100"));
    }
}
