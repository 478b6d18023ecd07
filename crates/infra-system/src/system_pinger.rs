// ICMP echo via the system `ping` binary
// reason: raw ICMP sockets need privileges the daemon should not require
use async_trait::async_trait;
use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;
use tokio::net::lookup_host;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use tripwire_core::port::{IcmpProber, PingStatistics, ProbeError};

/// Extra time granted to the `ping` process beyond its own deadline
const PROCESS_GRACE: Duration = Duration::from_secs(2);

/// Extract sent/received counts from the `ping` summary line.
///
/// Accepts both `1 packets transmitted, 1 received, ...` (iputils) and
/// `1 packets transmitted, 1 packets received, ...` (BSD, busybox).
pub fn parse_ping_statistics(output: &str) -> Option<PingStatistics> {
    let line = output.lines().find(|l| l.contains("transmitted"))?;
    let mut stats = PingStatistics::default();
    let mut found_recv = false;

    let leading_count = |segment: &str| segment.split_whitespace().next()?.parse::<u32>().ok();

    for segment in line.split(',') {
        if segment.contains("transmitted") {
            stats.packets_sent = leading_count(segment)?;
        } else if segment.contains("received") {
            stats.packets_recv = leading_count(segment)?;
            found_recv = true;
        }
    }

    found_recv.then_some(stats)
}

/// Whole seconds for `-W`, rounded up, at least one
fn wait_seconds(timeout: Duration) -> u64 {
    let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
    secs.max(1)
}

/// One echo request that got no answer
const NO_REPLY: PingStatistics = PingStatistics {
    packets_sent: 1,
    packets_recv: 0,
};

pub struct SystemPinger {
    program: String,
    /// Placed before the generated `ping` arguments
    args: Vec<String>,
}

impl SystemPinger {
    pub fn new() -> Self {
        Self::with_command("ping", Vec::new())
    }

    /// Use a different command with `ping`-compatible arguments and output
    pub fn with_command(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Default for SystemPinger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IcmpProber for SystemPinger {
    async fn resolve(&self, target: &str) -> Result<IpAddr, ProbeError> {
        let invalid = |reason: String| ProbeError::InvalidTarget {
            target: target.to_string(),
            reason,
        };

        if target.trim().is_empty() {
            return Err(invalid("empty target".to_string()));
        }
        if let Ok(addr) = target.parse::<IpAddr>() {
            return Ok(addr);
        }

        let mut addrs = lookup_host((target, 0))
            .await
            .map_err(|e| invalid(e.to_string()))?;
        addrs
            .next()
            .map(|sock| sock.ip())
            .ok_or_else(|| invalid("no address found".to_string()))
    }

    async fn echo(&self, addr: IpAddr, deadline: Duration) -> Result<PingStatistics, ProbeError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if addr.is_ipv6() {
            cmd.arg("-6");
        }
        cmd.arg("-c")
            .arg("1")
            .arg("-W")
            .arg(wait_seconds(deadline).to_string())
            .arg(addr.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match timeout(deadline + PROCESS_GRACE, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ProbeError::Transport(format!("{}: {}", self.program, e))),
            Err(_) => {
                debug!(addr = %addr, "ping overran its deadline, counting as no reply");
                return Ok(NO_REPLY);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(addr = %addr, exit_code = ?output.status.code(), "ping finished");

        match output.status.code() {
            Some(0) => parse_ping_statistics(&stdout).ok_or_else(|| {
                ProbeError::Transport(format!("unrecognized ping output: {}", stdout.trim()))
            }),
            // No reply within the deadline
            Some(1) => Ok(parse_ping_statistics(&stdout).unwrap_or(NO_REPLY)),
            code => Err(ProbeError::Transport(format!(
                "ping exited with {:?}: {}",
                code,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }
}
