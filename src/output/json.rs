use crate::api::format_report_for_api;
use crate::error::Result;
use crate::scanner::ScanReport;

/// Render the external (path-stripped) report as pretty-printed JSON.
pub fn render(report: &ScanReport) -> Result<String> {
    let external = format_report_for_api(report);
    Ok(serde_json::to_string_pretty(&external)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    #[test]
    fn json_output_has_no_file_keys() {
        let files = vec![("internal/secret/path.js".to_string(), "eval('1')\n".to_string())];
        let report = Scanner::new().scan_skill("demo", &files, vec![]);
        let json = render(&report).unwrap();

        assert!(json.contains("\"riskScore\""));
        assert!(json.contains("\"findings\""));
        assert!(!json.contains("internal/secret/path.js"));
    }
}
