//! Tork Guard — skill-sandboxing guardian for the Tork agent platform.
//!
//! Two independent halves protect the host from third-party skill code:
//!
//! - a **static scanner** that applies a fixed rule catalogue to skill source
//!   text, aggregates a 0–100 risk score, and derives a verified/reviewed/
//!   flagged verdict with an embeddable trust badge;
//! - a **runtime network policy engine** that the host consults synchronously
//!   before every port bind, egress connection, and DNS resolution a skill
//!   attempts.
//!
//! The guardian only advises: the host performs the real I/O after an allow
//! and feeds the [`net::monitor::NetworkMonitor`] when actions actually occur.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use torkguard::badge::Badge;
//!
//! let report = torkguard::scan_directory(Path::new("./my-skill"), None);
//! println!("{}", Badge::from_report(&report).to_markdown());
//! ```

pub mod api;
pub mod badge;
pub mod error;
pub mod net;
pub mod output;
pub mod rules;
pub mod scanner;
pub mod store;

use std::path::Path;

use scanner::{ScanReport, Scanner};

pub use api::{format_report_for_api, scan_from_source};
pub use badge::Badge;
pub use error::{GuardError, Result};
pub use net::handler::{Decision, NetworkAccessHandler};
pub use net::monitor::NetworkMonitor;
pub use net::NetworkPolicyConfig;
pub use scanner::Verdict;
pub use store::ReportStore;

/// Scan a skill directory on disk. The skill name defaults to the directory
/// name; unreadable files become per-file errors on the report.
pub fn scan_directory(path: &Path, skill_name: Option<&str>) -> ScanReport {
    let name = skill_name
        .map(str::to_string)
        .or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| api::DEFAULT_SKILL_NAME.to_string());

    let walked = scanner::walker::walk_skill(path);
    Scanner::new().scan_skill(&name, &walked.files, walked.errors)
}
