//! Ping and traceroute against alert-supplied addresses.
//!
//! The target comes straight from an inbound webhook, so it is only ever
//! accepted as a parsed IPv4 address and handed to the binary as a single
//! argument. No shell is involved.

use async_trait::async_trait;
use std::fmt;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::RelayError;

/// Upper bound on the argument vector passed to a diagnostic binary.
pub const MAX_COMMAND_ARGS: usize = 8;

/// A read-only network diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Ping,
    Traceroute,
}

impl DiagnosticKind {
    /// Binary to execute.
    #[must_use]
    pub const fn program(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Traceroute => "traceroute",
        }
    }

    /// Fixed argument vector for `target`.
    #[must_use]
    pub fn args(&self, target: Ipv4Addr) -> Vec<String> {
        let flags: &[&str] = match self {
            Self::Ping => &["-c", "4", "-W", "2"],
            Self::Traceroute => &["-m", "15", "-w", "2"],
        };
        flags
            .iter()
            .map(ToString::to_string)
            .chain(std::iter::once(target.to_string()))
            .collect()
    }

    /// Get display name for this diagnostic.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ping => "PING",
            Self::Traceroute => "TRACEROUTE",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Pull the target address out of a diagnostic request body.
///
/// The first non-empty line is read as `Label: value` when it has a
/// separator, otherwise as a bare value; the first whitespace-delimited
/// token must be a dotted-quad IPv4 address.
pub fn extract_target(body: &str) -> Result<Ipv4Addr, RelayError> {
    let line = body.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let value = line.split_once(": ").map_or(line, |(_, value)| value);
    let token = value.split_whitespace().next().unwrap_or("");

    token
        .parse::<Ipv4Addr>()
        .map_err(|_| RelayError::InvalidTarget(token.to_string()))
}

/// Executes a diagnostic binary and returns what it printed.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and return stdout followed by stderr.
    async fn run(&self, program: &str, args: &[String]) -> Result<String, RelayError>;
}

/// Runs diagnostics as child processes with a hard timeout.
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, RelayError> {
        if args.len() > MAX_COMMAND_ARGS {
            return Err(RelayError::Diagnostic(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{program}: {} arguments exceeds the limit", args.len()),
            )));
        }

        debug!(program, ?args, "Running diagnostic command");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                warn!(program, timeout_secs = self.timeout.as_secs(), "Diagnostic command timed out");
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("{program} did not finish within {}s", self.timeout.as_secs()),
                )
            })??;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            debug!(program, status = %output.status, "Diagnostic command exited with failure");
        }
        if text.trim().is_empty() {
            text = format!("(no output, {})", output.status);
        }

        Ok(text)
    }
}
