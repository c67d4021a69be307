//! Runtime network policy: configuration, state tracking, and the decision
//! point the host consults before every skill network action.

pub mod handler;
pub mod monitor;
pub mod signatures;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{GuardError, Result};

/// Deployment-wide network policy mode. Closed set: unknown values are a
/// deserialization error, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkPolicy {
    Open,
    Custom,
    Strict,
}

/// Inclusive inbound port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub fn contains(&self, port: u16) -> bool {
        port >= self.start && port <= self.end
    }
}

/// Per-deployment configuration, loaded once at handler construction and
/// immutable for the handler's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NetworkPolicyConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_policy")]
    pub network_policy: NetworkPolicy,
    #[serde(default = "default_outbound_ports")]
    pub allowed_outbound_ports: Vec<u16>,
    #[serde(default = "default_inbound_ranges")]
    pub inbound_port_ranges: Vec<PortRange>,
    /// Exact or subdomain match.
    #[serde(default)]
    pub blocked_domains: Vec<String>,
    /// Consulted only under `strict`.
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections_per_minute: u32,
    #[serde(default)]
    pub log_all_activity: bool,
}

fn default_policy() -> NetworkPolicy {
    NetworkPolicy::Open
}

fn default_outbound_ports() -> Vec<u16> {
    vec![80, 443, 8080, 8443]
}

fn default_inbound_ranges() -> Vec<PortRange> {
    vec![
        PortRange { start: 3000, end: 3999 },
        PortRange { start: 8000, end: 8999 },
    ]
}

fn default_max_connections() -> u32 {
    60
}

impl Default for NetworkPolicyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            network_policy: default_policy(),
            allowed_outbound_ports: default_outbound_ports(),
            inbound_port_ranges: default_inbound_ranges(),
            blocked_domains: Vec::new(),
            allowed_domains: Vec::new(),
            max_connections_per_minute: default_max_connections(),
            log_all_activity: false,
        }
    }
}

impl NetworkPolicyConfig {
    /// Load config from a TOML file. Returns documented defaults if the file
    /// doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject malformed configuration eagerly. A config that fails here never
    /// reaches a handler, so there is no weakened fallback to reason about.
    pub fn validate(&self) -> Result<()> {
        if self.allowed_outbound_ports.is_empty() {
            return Err(GuardError::Config(
                "allowedOutboundPorts must not be empty".into(),
            ));
        }
        for range in &self.inbound_port_ranges {
            if range.start > range.end {
                return Err(GuardError::Config(format!(
                    "invalid inbound port range {}-{}",
                    range.start, range.end
                )));
            }
        }
        if self.inbound_port_ranges.is_empty() {
            return Err(GuardError::Config(
                "inboundPortRanges must not be empty".into(),
            ));
        }
        if self.max_connections_per_minute == 0 {
            return Err(GuardError::Config(
                "maxConnectionsPerMinute must be at least 1".into(),
            ));
        }
        if self.network_policy == NetworkPolicy::Strict && self.allowed_domains.is_empty() {
            // Legitimate lockdown, but worth surfacing: strict with no
            // allowlist denies all egress by domain.
            warn!("strict policy with empty allowedDomains denies all domain egress");
        }
        Ok(())
    }

    pub fn inbound_allows(&self, port: u16) -> bool {
        self.inbound_port_ranges.iter().any(|r| r.contains(port))
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# Tork Guard network policy configuration.

apiKey = ""

# open, custom, or strict. Under strict, egress and DNS are limited to
# allowedDomains.
networkPolicy = "open"

allowedOutboundPorts = [80, 443, 8080, 8443]

# Inbound ports skills may bind.
inboundPortRanges = [
    { start = 3000, end = 3999 },
    { start = 8000, end = 8999 },
]

blockedDomains = []
allowedDomains = []

maxConnectionsPerMinute = 60

# Record approvals as well as denials in the activity log.
logAllActivity = false
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let config = NetworkPolicyConfig::default();
        assert_eq!(config.network_policy, NetworkPolicy::Open);
        assert_eq!(config.allowed_outbound_ports, vec![80, 443, 8080, 8443]);
        assert!(config.inbound_allows(3000));
        assert!(config.inbound_allows(3999));
        assert!(config.inbound_allows(8500));
        assert!(!config.inbound_allows(4000));
        assert!(!config.inbound_allows(22));
        assert_eq!(config.max_connections_per_minute, 60);
        assert!(!config.log_all_activity);
        config.validate().unwrap();
    }

    #[test]
    fn starter_toml_parses_back_to_defaults() {
        let config: NetworkPolicyConfig =
            toml::from_str(NetworkPolicyConfig::starter_toml()).unwrap();
        assert_eq!(config.network_policy, NetworkPolicy::Open);
        assert_eq!(config.inbound_port_ranges.len(), 2);
        config.validate().unwrap();
    }

    #[test]
    fn unknown_policy_value_is_a_parse_error() {
        let result: std::result::Result<NetworkPolicyConfig, _> =
            toml::from_str(r#"networkPolicy = "promiscuous""#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_field_is_a_parse_error() {
        let result: std::result::Result<NetworkPolicyConfig, _> =
            toml::from_str(r#"networkPolicyy = "open""#);
        assert!(result.is_err());
    }

    #[test]
    fn zero_rate_limit_fails_validation() {
        let config = NetworkPolicyConfig {
            max_connections_per_minute: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_port_range_fails_validation() {
        let config = NetworkPolicyConfig {
            inbound_port_ranges: vec![PortRange { start: 9000, end: 8000 }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_outbound_ports_fail_validation() {
        let config = NetworkPolicyConfig {
            allowed_outbound_ports: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
