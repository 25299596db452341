//! Command dispatcher
//!
//! Inbound messages are filtered by topic, parsed, and queued. Each
//! [`Dispatcher::step`] either advances a pending wake sequence or runs the
//! next queued command. While a wake sequence waits for the target to boot,
//! later commands (including another `wol`) stay queued in arrival order.

use crate::command::Command;
use crate::config::TargetHost;
use crate::identity::IdentitySource;
use crate::link::InboundMessage;
use crate::probe::Prober;
use crate::status::{StatInfo, StatusMessage};
use crate::uptime::{format_uptime, SessionClock};
use crate::wake::{WakeSequence, WakeState};
use crate::wol::WakeSender;
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Commands waiting behind the current one; later arrivals are dropped
pub const COMMAND_QUEUE_LIMIT: usize = 32;

/// Fixed inputs of the dispatcher, resolved at startup
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub target: TargetHost,
    /// Computed once from the local address and subnet mask
    pub broadcast: Ipv4Addr,
    pub commands_topic: String,
    pub token_prefix: String,
    pub clock: SessionClock,
}

pub struct Dispatcher<P, W, N> {
    prober: P,
    sender: W,
    identity: N,
    settings: DispatchSettings,
    queue: VecDeque<Command>,
    wake: WakeSequence,
}

impl<P, W, N> Dispatcher<P, W, N>
where
    P: Prober,
    W: WakeSender,
    N: IdentitySource,
{
    pub fn new(prober: P, sender: W, identity: N, settings: DispatchSettings) -> Self {
        Self {
            prober,
            sender,
            identity,
            settings,
            queue: VecDeque::new(),
            wake: WakeSequence::new(),
        }
    }

    /// Queue a command; other topics, unknown tokens and overflow are dropped untouched
    pub fn accept(&mut self, msg: &InboundMessage) -> Option<Command> {
        if msg.topic != self.settings.commands_topic {
            debug!("Ignoring message on foreign topic {}", msg.topic);
            return None;
        }
        let Some(command) = Command::parse(&msg.payload, &self.settings.token_prefix) else {
            debug!("Ignoring unknown command payload ({} bytes)", msg.payload.len());
            return None;
        };
        if self.queue.len() >= COMMAND_QUEUE_LIMIT {
            warn!(
                "Command queue full ({} pending), dropping {}",
                self.queue.len(),
                command.token()
            );
            return None;
        }
        if self.wake.is_pending() {
            info!("Command {} queued behind pending wake sequence", command.token());
        }
        self.queue.push_back(command);
        Some(command)
    }

    /// Commands waiting to run
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn wake_state(&self) -> WakeState {
        self.wake.state()
    }

    /// Advance by one unit of work; `None` when there is nothing to emit right now
    pub async fn step(&mut self, now: Instant) -> Option<StatusMessage> {
        if self.wake.is_pending() {
            return self
                .wake
                .poll_recheck(&self.prober, &self.settings.target, now)
                .await;
        }

        let command = self.queue.pop_front()?;
        info!("Executing command: {}", command.token());
        let message = match command {
            Command::Wol => {
                self.wake
                    .start(&self.prober, &self.sender, &self.settings.target, self.settings.broadcast)
                    .await
            }
            Command::Ping => {
                if self.prober.is_reachable(self.settings.target.ip).await {
                    StatusMessage::PingOk
                } else {
                    StatusMessage::PingFail
                }
            }
            Command::Status => StatusMessage::StatInfo(self.stat_info(now)),
        };
        Some(message)
    }

    fn stat_info(&self, now: Instant) -> StatInfo {
        let local_ip = match self.identity.current() {
            Ok(identity) => identity.local_ip,
            Err(e) => {
                warn!("Local identity unavailable: {}", e);
                Ipv4Addr::UNSPECIFIED
            }
        };
        StatInfo {
            status: "Online".to_string(),
            local_ip: local_ip.to_string(),
            ssid: self.identity.network_name().to_string(),
            uptime: format_uptime(self.settings.clock.elapsed_secs(now)),
        }
    }
}
