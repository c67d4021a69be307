//! The policy decision point for skill network actions.
//!
//! Each validator is a pure decision over (config, monitor state, request):
//! no I/O, no suspension, a synchronous allow/deny with a human-readable
//! reason. Denials are ordinary results, not errors — callers and auditors
//! depend on the reason text. The host performs the real syscall only after
//! an allow, and feeds the monitor when the action actually happens.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::monitor::NetworkMonitor;
use super::{NetworkPolicy, NetworkPolicyConfig};
use crate::error::Result;

const MAX_AUDIT_ENTRIES: usize = 10_000;

/// Action kinds a skill can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    PortBind,
    Egress,
    Dns,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PortBind => write!(f, "port_bind"),
            Self::Egress => write!(f, "egress"),
            Self::Dns => write!(f, "dns"),
        }
    }
}

/// Outcome of one policy decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Append-only audit record. Cleared only by explicit operator action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub skill_id: String,
    pub action: ActionKind,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Policy decision point. Owns nothing but the audit log; all runtime state
/// lives in the injected monitor so independent guardian instances can
/// coexist.
pub struct NetworkAccessHandler {
    config: NetworkPolicyConfig,
    monitor: Arc<NetworkMonitor>,
    audit: Mutex<Vec<ActivityLogEntry>>,
}

impl NetworkAccessHandler {
    /// Construct with validated configuration. Malformed config fails here,
    /// before any decision can be made against it.
    pub fn new(config: NetworkPolicyConfig, monitor: Arc<NetworkMonitor>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            monitor,
            audit: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &NetworkPolicyConfig {
        &self.config
    }

    pub fn monitor(&self) -> &Arc<NetworkMonitor> {
        &self.monitor
    }

    /// May this skill bind the given inbound port?
    ///
    /// The same skill re-binding its own live port is allowed (idempotent);
    /// a different skill on a live port is hijacking and is denied.
    pub fn validate_port_bind(&self, skill_id: &str, port: u16) -> Decision {
        let decision = self.check_port_bind(skill_id, port);
        self.audit(skill_id, ActionKind::PortBind, &decision);
        decision
    }

    fn check_port_bind(&self, skill_id: &str, port: u16) -> Decision {
        if port < 1024 {
            return Decision::deny(format!(
                "Privileged port {port} is reserved for the host"
            ));
        }
        if !self.config.inbound_allows(port) {
            return Decision::deny(format!("Port {port} is not in the inbound allowlist"));
        }
        if let Some(owner) = self.monitor.port_owner(port) {
            if owner != skill_id {
                return Decision::deny(format!(
                    "Port {port} is owned by skill '{owner}' (port hijacking)"
                ));
            }
        }
        Decision::allow()
    }

    /// May this skill open an outbound connection to `host:port`?
    ///
    /// Checks run in a fixed order; the first failure wins and names itself
    /// in the reason.
    pub fn validate_egress(&self, skill_id: &str, host: &str, port: u16) -> Decision {
        let decision = self.check_egress(skill_id, host, port);
        self.audit(skill_id, ActionKind::Egress, &decision);
        decision
    }

    fn check_egress(&self, skill_id: &str, host: &str, port: u16) -> Decision {
        if !self.config.allowed_outbound_ports.contains(&port) {
            return Decision::deny(format!("Outbound port {port} is not allowed"));
        }
        if is_private_host(host) {
            return Decision::deny(format!("Private network target '{host}' refused (SSRF)"));
        }
        if self.config.network_policy == NetworkPolicy::Strict
            && !domain_in_list(host, &self.config.allowed_domains)
        {
            return Decision::deny(format!("Host '{host}' is not in the allowlist"));
        }
        if domain_in_list(host, &self.config.blocked_domains) {
            return Decision::deny(format!("Host '{host}' is blocked"));
        }
        let shell = self.monitor.check_shell_activity_for(skill_id);
        if shell.suspicious {
            let signature = shell
                .matches
                .first()
                .map(|m| m.signature.as_str())
                .unwrap_or("unknown");
            return Decision::deny(format!(
                "Reverse shell signature in recent shell history ({signature})"
            ));
        }
        if self.monitor.connections_per_minute(Some(skill_id)) as u32
            >= self.config.max_connections_per_minute
        {
            return Decision::deny(format!(
                "Rate limit exceeded ({} connections/minute)",
                self.config.max_connections_per_minute
            ));
        }
        Decision::allow()
    }

    /// May this skill resolve the given DNS name?
    pub fn validate_dns(&self, skill_id: &str, name: &str) -> Decision {
        let decision = self.check_dns(name);
        self.audit(skill_id, ActionKind::Dns, &decision);
        decision
    }

    fn check_dns(&self, name: &str) -> Decision {
        // A literal IP handed to the resolver is a DNS-bypass smell.
        if name.parse::<IpAddr>().is_ok() {
            return Decision::deny(format!("Raw IP '{name}' passed as a DNS name"));
        }
        if domain_in_list(name, &self.config.blocked_domains) {
            return Decision::deny(format!("Domain '{name}' is blocked"));
        }
        if self.config.network_policy == NetworkPolicy::Strict
            && !domain_in_list(name, &self.config.allowed_domains)
        {
            return Decision::deny(format!("Domain '{name}' is not in the allowlist"));
        }
        Decision::allow()
    }

    /// Snapshot of the activity log.
    pub fn activity_log(&self) -> Vec<ActivityLogEntry> {
        self.audit.lock().clone()
    }

    /// Operator action: discard the audit trail.
    pub fn clear_activity_log(&self) {
        self.audit.lock().clear();
    }

    // Best-effort and purely in-memory: recording can trim the log but can
    // never fail the decision being returned.
    fn audit(&self, skill_id: &str, action: ActionKind, decision: &Decision) {
        if decision.allowed {
            debug!(skill = skill_id, %action, "allowed");
            if !self.config.log_all_activity {
                return;
            }
        } else {
            warn!(
                skill = skill_id,
                %action,
                reason = decision.reason.as_deref().unwrap_or(""),
                "denied"
            );
        }

        let reason = if decision.allowed {
            Some("allowed".to_string())
        } else {
            decision.reason.clone()
        };

        let mut audit = self.audit.lock();
        if audit.len() >= MAX_AUDIT_ENTRIES {
            let half = audit.len() / 2;
            audit.drain(..half);
        }
        audit.push(ActivityLogEntry {
            skill_id: skill_id.to_string(),
            action,
            allowed: decision.allowed,
            reason,
            timestamp: Utc::now(),
        });
    }
}

/// Private, loopback, and link-local targets are refused on any port under
/// any policy.
fn is_private_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => is_private_v4(ip),
        Ok(IpAddr::V6(ip)) => is_private_v6(ip),
        Err(_) => false,
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    // 127/8, 10/8, 172.16/12, 192.168/16, 169.254/16, plus the unspecified
    // address.
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    let segments = ip.segments();
    ip.is_loopback()
        || ip.is_unspecified()
        || (segments[0] & 0xfe00) == 0xfc00 // unique-local fc00::/7
        || (segments[0] & 0xffc0) == 0xfe80 // link-local fe80::/10
}

fn domain_in_list(host: &str, domains: &[String]) -> bool {
    let host = host.to_ascii_lowercase();
    domains.iter().any(|d| {
        let d = d.to_ascii_lowercase();
        host == d || host.ends_with(&format!(".{d}"))
    })
}
