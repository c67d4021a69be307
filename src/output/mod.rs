pub mod console;
pub mod json;

use serde::{Deserialize, Serialize};

use crate::badge::Badge;
use crate::error::Result;
use crate::scanner::ScanReport;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Console,
    Json,
    Badge,
    BadgeJson,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Some(Self::Console),
            "json" => Some(Self::Json),
            "badge" | "markdown" | "md" => Some(Self::Badge),
            "badge-json" => Some(Self::BadgeJson),
            _ => None,
        }
    }
}

/// Render a scan report in the specified format.
pub fn render(report: &ScanReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(console::render(report)),
        OutputFormat::Json => json::render(report),
        OutputFormat::Badge => Ok(Badge::from_report(report).to_markdown()),
        OutputFormat::BadgeJson => Badge::from_report(report).to_json(),
    }
}
