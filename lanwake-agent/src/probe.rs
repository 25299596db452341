//! Reachability probing of the target host
//!
//! A probe is a single boolean answer built from up to [`PROBE_ATTEMPTS`]
//! echo requests. Attempt-level results are never exposed.

use async_trait::async_trait;
use std::future::Future;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

pub const PROBE_ATTEMPTS: u32 = 3;
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(1);

#[async_trait]
pub trait Prober: Send + Sync {
    /// `true` as soon as one attempt is answered
    async fn is_reachable(&self, target: Ipv4Addr) -> bool;
}

/// Uses the system `ping` executable, one echo per attempt
#[derive(Debug, Clone)]
pub struct PingProber {
    attempts: u32,
    attempt_timeout: Duration,
}

impl PingProber {
    pub fn new(attempts: u32, attempt_timeout: Duration) -> Self {
        Self {
            attempts,
            attempt_timeout,
        }
    }

    fn ping_command(target: Ipv4Addr, timeout: Duration) -> AsyncCommand {
        let mut cmd = AsyncCommand::new("ping");
        if cfg!(target_os = "windows") {
            cmd.args(["-n", "1", "-w", &timeout.as_millis().to_string()]);
        } else {
            cmd.args(["-c", "1", "-W", &timeout.as_secs().max(1).to_string()]);
        }
        cmd.arg(target.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    async fn attempt(&self, target: Ipv4Addr) -> bool {
        // Hard cap in case the ping binary ignores its own deadline
        let limit = self.attempt_timeout + Duration::from_secs(1);
        match tokio::time::timeout(limit, Self::ping_command(target, self.attempt_timeout).status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!("ping could not be spawned: {}", e);
                false
            }
            Err(_) => false,
        }
    }
}

impl Default for PingProber {
    fn default() -> Self {
        Self::new(PROBE_ATTEMPTS, ATTEMPT_TIMEOUT)
    }
}

/// Run `attempt` (numbered from 1) until one answers, at most `attempts` times
pub async fn first_answer<F, Fut>(attempts: u32, mut attempt: F) -> bool
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = bool>,
{
    for n in 1..=attempts {
        if attempt(n).await {
            debug!("answered on attempt {}", n);
            return true;
        }
    }
    false
}

#[async_trait]
impl Prober for PingProber {
    async fn is_reachable(&self, target: Ipv4Addr) -> bool {
        let reachable = first_answer(self.attempts, move |_| self.attempt(target)).await;
        if !reachable {
            debug!("{} silent after {} attempts", target, self.attempts);
        }
        reachable
    }
}
