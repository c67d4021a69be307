//! The runtime ledger behind network policy decisions: port ownership,
//! per-skill connection rates, shell history, and the startup port snapshot.
//!
//! Pure bookkeeping — no policy logic lives here. The handler reads this
//! state; the host writes it whenever a granted action actually happens.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::signatures::match_signatures;

/// Trailing window for connection-rate accounting. Wall-clock, so bursty or
/// interleaved invocations across skills are counted correctly.
const RATE_WINDOW_SECS: i64 = 60;

/// Shell history bound; `check_recent_shell_activity` re-scans the whole
/// history on every call, which stays cheap because of this cap.
const SHELL_HISTORY_LIMIT: usize = 200;

const CONNECTION_HISTORY_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// A live port binding. At most one live owner per port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRegistration {
    pub port: u16,
    pub protocol: Protocol,
    pub skill_id: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEvent {
    pub host: String,
    pub port: u16,
    pub skill_id: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ShellCommandRecord {
    command: String,
    skill_id: String,
}

/// One reverse-shell signature hit in the shell history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellMatch {
    pub signature: String,
    pub command: String,
    pub skill_id: String,
}

/// Result of re-scanning the shell history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellActivity {
    pub suspicious: bool,
    pub matches: Vec<ShellMatch>,
}

/// Snapshot view of monitor state: active ports, recent connections, and
/// anomalies (active ports absent from the startup snapshot).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkReport {
    pub active_ports: Vec<PortRegistration>,
    pub recent_connections: Vec<ConnectionEvent>,
    pub anomalies: Vec<u16>,
}

/// Shared mutable runtime state. The port table and the connection/shell
/// histories are guarded by independent locks; they are never
/// read-modify-written together.
#[derive(Default)]
pub struct NetworkMonitor {
    ports: RwLock<HashMap<u16, PortRegistration>>,
    connections: Mutex<VecDeque<ConnectionEvent>>,
    shell_history: Mutex<VecDeque<ShellCommandRecord>>,
    startup_ports: RwLock<HashSet<u16>>,
}

impl NetworkMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_port(&self, port: u16, protocol: Protocol, skill_id: &str) {
        self.ports.write().insert(
            port,
            PortRegistration {
                port,
                protocol,
                skill_id: skill_id.to_string(),
                registered_at: Utc::now(),
            },
        );
    }

    pub fn unregister_port(&self, port: u16) -> Option<PortRegistration> {
        self.ports.write().remove(&port)
    }

    pub fn port_owner(&self, port: u16) -> Option<String> {
        self.ports.read().get(&port).map(|r| r.skill_id.clone())
    }

    /// Live registrations, sorted by port.
    pub fn active_ports(&self) -> Vec<PortRegistration> {
        let mut ports: Vec<PortRegistration> = self.ports.read().values().cloned().collect();
        ports.sort_by_key(|r| r.port);
        ports
    }

    pub fn record_connection(&self, host: &str, port: u16, skill_id: &str) {
        self.record_connection_at(host, port, skill_id, Utc::now());
    }

    fn record_connection_at(&self, host: &str, port: u16, skill_id: &str, at: DateTime<Utc>) {
        let mut connections = self.connections.lock();
        prune_window(&mut connections, at);
        if connections.len() >= CONNECTION_HISTORY_LIMIT {
            connections.pop_front();
        }
        connections.push_back(ConnectionEvent {
            host: host.to_string(),
            port,
            skill_id: skill_id.to_string(),
            at,
        });
    }

    /// Connections in the trailing 60-second window, filtered by skill when
    /// given, aggregate otherwise.
    pub fn connections_per_minute(&self, skill_id: Option<&str>) -> usize {
        let cutoff = Utc::now() - Duration::seconds(RATE_WINDOW_SECS);
        self.connections
            .lock()
            .iter()
            .filter(|c| c.at > cutoff)
            .filter(|c| skill_id.map_or(true, |s| c.skill_id == s))
            .count()
    }

    pub fn record_shell_command(&self, command: &str, skill_id: &str) {
        let mut history = self.shell_history.lock();
        if history.len() >= SHELL_HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(ShellCommandRecord {
            command: command.to_string(),
            skill_id: skill_id.to_string(),
        });
    }

    /// Re-scan the whole shell history against the reverse-shell signatures.
    pub fn check_recent_shell_activity(&self) -> ShellActivity {
        self.scan_shell_history(None)
    }

    /// Per-skill variant used by the egress check: one skill's reverse shell
    /// never taints another skill's decisions.
    pub fn check_shell_activity_for(&self, skill_id: &str) -> ShellActivity {
        self.scan_shell_history(Some(skill_id))
    }

    fn scan_shell_history(&self, skill_id: Option<&str>) -> ShellActivity {
        let history = self.shell_history.lock();
        let matches: Vec<ShellMatch> = history
            .iter()
            .filter(|r| skill_id.map_or(true, |s| r.skill_id == s))
            .flat_map(|r| {
                match_signatures(&r.command)
                    .into_iter()
                    .map(|signature| ShellMatch {
                        signature: signature.to_string(),
                        command: r.command.clone(),
                        skill_id: r.skill_id.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        ShellActivity {
            suspicious: !matches.is_empty(),
            matches,
        }
    }

    /// Capture the ports the host observed open at process start.
    pub fn snapshot_startup_ports(&self, ports: &[u16]) {
        let mut snapshot = self.startup_ports.write();
        snapshot.clear();
        snapshot.extend(ports.iter().copied());
        info!(count = ports.len(), "startup port snapshot captured");
    }

    pub fn network_report(&self) -> NetworkReport {
        let active_ports = self.active_ports();
        let startup = self.startup_ports.read();
        let anomalies: Vec<u16> = active_ports
            .iter()
            .map(|r| r.port)
            .filter(|p| !startup.contains(p))
            .collect();

        let cutoff = Utc::now() - Duration::seconds(RATE_WINDOW_SECS);
        let recent_connections: Vec<ConnectionEvent> = self
            .connections
            .lock()
            .iter()
            .filter(|c| c.at > cutoff)
            .cloned()
            .collect();

        NetworkReport {
            active_ports,
            recent_connections,
            anomalies,
        }
    }

    /// Clear all state (between test runs / skill reloads).
    pub fn reset(&self) {
        self.ports.write().clear();
        self.connections.lock().clear();
        self.shell_history.lock().clear();
        self.startup_ports.write().clear();
        info!("network monitor reset");
    }
}

fn prune_window(connections: &mut VecDeque<ConnectionEvent>, now: DateTime<Utc>) {
    let cutoff = now - Duration::seconds(RATE_WINDOW_SECS);
    while connections.front().map_or(false, |c| c.at <= cutoff) {
        connections.pop_front();
    }
}
