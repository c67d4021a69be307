//! The built-in rule catalogue: SEC-* code risks and NET-* network risks.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Rule, Severity};

// SEC-001: must not fire on identifiers that merely contain "eval".
static EVAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\beval\s*\(").unwrap());

static NEW_FUNCTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnew\s+Function\s*\(").unwrap());

static CHILD_PROCESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"require\s*\(\s*["'](?:node:)?child_process["']|(?:from|import)\s+["'](?:node:)?child_process["']|\bimport\s+subprocess\b|from\s+subprocess\s+import"#,
    )
    .unwrap()
});

static SENSITIVE_WRITE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b(?:writeFile|writeFileSync|appendFile|appendFileSync|createWriteStream)\s*\(\s*["'](?:/etc/|/usr/|/bin/|/sbin/|/boot/|/root/|~/\.|\.(?:env|ssh|aws|npmrc|bashrc|profile)\b)"#,
    )
    .unwrap()
});

// SEC-005: requires a quoted literal of 20+ token characters, so environment
// variable reads (`process.env.API_KEY`) and short placeholders never match.
static HARDCODED_SECRET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(?:api[_-]?key|apikey|secret|token|passwd|password|private[_-]?key|access[_-]?key)\w*\s*[:=]\s*["'][A-Za-z0-9+/_\-=]{20,}["']"#,
    )
    .unwrap()
});

static PROMPT_INJECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)ignore\s+(?:all\s+)?previous\s+instructions|disregard\s+(?:all\s+)?(?:previous|prior)\s+instructions|you\s+are\s+now\s+a\b",
    )
    .unwrap()
});

static OUTBOUND_HTTP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b(?:fetch|axios(?:\.(?:get|post|put|delete|patch|request))?)\s*\(\s*[`"']https?://"#,
    )
    .unwrap()
});

static LOOPBACK_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?|wss?)://(?:localhost|127\.0\.0\.1|0\.0\.0\.0|\[::1\])").unwrap()
});

static LISTEN_SERVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:https?|net)\.createServer\s*\(|\bcreateServer\s*\(|\.listen\s*\(\s*\d")
        .unwrap()
});

static IPV4_LITERAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b")
        .unwrap()
});

static VERSION_STRING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bversion\b|\bsemver\b|\bv\d+\.\d+\.\d+").unwrap());

static UDP_SOCKET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bdgram\.createSocket\s*\(|createSocket\s*\(\s*["']udp[46]?["']|\bSOCK_DGRAM\b"#)
        .unwrap()
});

static DNS_TXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bresolveTxt\s*\(|\bresolve\s*\([^)]*["']TXT["']"#).unwrap()
});

static SHELL_FETCH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:exec|execSync|spawn|spawnSync|execFile)\s*\(\s*[`"'](?:curl|wget)\b"#)
        .unwrap()
});

static WEBSOCKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bnew\s+WebSocket\s*\(\s*[`"']wss?://"#).unwrap());

static RAW_CONNECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bcreateConnection\s*\(|\.connect\s*\(\s*\{[^}]*\b(?:host|port)\b|\.connect\s*\(\s*\d")
        .unwrap()
});

static CATALOG: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule {
            id: "SEC-001",
            name: "Dynamic code evaluation",
            severity: Severity::High,
            description: "Call to eval() executes arbitrary strings as code",
            remediation: "Remove eval(); parse data with JSON.parse or a purpose-built parser",
            pattern: &EVAL_RE,
            exclude: None,
        },
        Rule {
            id: "SEC-002",
            name: "Dynamic function construction",
            severity: Severity::High,
            description: "new Function(...) builds executable code from strings at runtime",
            remediation: "Replace dynamic function construction with statically defined functions",
            pattern: &NEW_FUNCTION_RE,
            exclude: None,
        },
        Rule {
            id: "SEC-003",
            name: "Process-spawning module import",
            severity: Severity::Critical,
            description: "Imports a module that can spawn arbitrary OS processes",
            remediation: "Skills must not spawn processes; use the platform's task APIs instead",
            pattern: &CHILD_PROCESS_RE,
            exclude: None,
        },
        Rule {
            id: "SEC-004",
            name: "Sensitive path write",
            severity: Severity::Critical,
            description: "Writes to dotfiles or system directories outside the skill workspace",
            remediation: "Write only to the skill's own data directory",
            pattern: &SENSITIVE_WRITE_RE,
            exclude: None,
        },
        Rule {
            id: "SEC-005",
            name: "Hardcoded secret",
            severity: Severity::Critical,
            description: "Long literal assigned to a key/secret-named variable",
            remediation: "Load credentials from the environment or the platform secret store",
            pattern: &HARDCODED_SECRET_RE,
            exclude: None,
        },
        Rule {
            id: "SEC-006",
            name: "Prompt injection payload",
            severity: Severity::Critical,
            description: "String literal carrying prompt-injection phrasing aimed at the host agent",
            remediation: "Remove instruction-override phrasing from skill strings",
            pattern: &PROMPT_INJECTION_RE,
            exclude: None,
        },
        Rule {
            id: "SEC-007",
            name: "Outbound HTTP call",
            severity: Severity::High,
            description: "HTTP request to a non-local host",
            remediation: "Route outbound requests through the platform's egress API",
            pattern: &OUTBOUND_HTTP_RE,
            exclude: Some(&LOOPBACK_URL_RE),
        },
        Rule {
            id: "NET-001",
            name: "Listening server",
            severity: Severity::Medium,
            description: "Creates a raw TCP/HTTP listening server",
            remediation: "Declare inbound ports in the skill manifest and bind via the platform",
            pattern: &LISTEN_SERVER_RE,
            exclude: None,
        },
        Rule {
            id: "NET-002",
            name: "Hardcoded IPv4 address",
            severity: Severity::Medium,
            description: "IPv4 literal embedded in source",
            remediation: "Use hostnames so egress policy and DNS auditing apply",
            pattern: &IPV4_LITERAL_RE,
            exclude: Some(&VERSION_STRING_RE),
        },
        Rule {
            id: "NET-003",
            name: "Raw UDP socket",
            severity: Severity::Medium,
            description: "Creates a raw UDP socket",
            remediation: "UDP is not policy-auditable; use the platform's messaging APIs",
            pattern: &UDP_SOCKET_RE,
            exclude: None,
        },
        Rule {
            id: "NET-004",
            name: "DNS TXT record query",
            severity: Severity::Critical,
            description: "Queries DNS TXT records, a common C2 exfiltration channel",
            remediation: "Remove TXT lookups; fetch configuration over audited HTTPS",
            pattern: &DNS_TXT_RE,
            exclude: None,
        },
        Rule {
            id: "NET-005",
            name: "Shell network fetch",
            severity: Severity::Critical,
            description: "Spawns curl/wget through a shell, bypassing egress policy",
            remediation: "Use the platform's egress API instead of shelling out",
            pattern: &SHELL_FETCH_RE,
            exclude: None,
        },
        Rule {
            id: "NET-006",
            name: "WebSocket to non-local host",
            severity: Severity::Medium,
            description: "Opens a WebSocket connection to a non-local host",
            remediation: "Declare WebSocket endpoints so egress policy can audit them",
            pattern: &WEBSOCKET_RE,
            exclude: Some(&LOOPBACK_URL_RE),
        },
        Rule {
            id: "NET-007",
            name: "Raw socket connect",
            severity: Severity::Medium,
            description: "Raw socket connect/createConnection with explicit host or port",
            remediation: "Route connections through the platform's egress API",
            pattern: &RAW_CONNECT_RE,
            exclude: None,
        },
    ]
});

/// All built-in rules, in catalogue order.
pub fn catalog() -> &'static [Rule] {
    &CATALOG
}
