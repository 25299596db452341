//! Wake sequence
//!
//! ```text
//! CHECK_ONLINE ──reachable──▶ ALREADY_ON
//!      │
//!      └─▶ SEND_PACKET ─▶ AWAITING_BOOT(deadline) ─▶ RECHECK ─▶ CONFIRMED | FAILED
//! ```
//!
//! The grace interval is a deadline, not a sleep: the control loop keeps
//! running and calls [`WakeSequence::poll_recheck`] every cycle.

use crate::config::TargetHost;
use crate::probe::Prober;
use crate::status::StatusMessage;
use crate::wol::WakeSender;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info};

/// Time given to the target to boot before it is probed again
pub const GRACE_INTERVAL: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WakeState {
    #[default]
    Idle,
    AwaitingBoot { deadline: Instant },
}

#[derive(Debug, Default)]
pub struct WakeSequence {
    state: WakeState,
}

impl WakeSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WakeState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, WakeState::AwaitingBoot { .. })
    }

    /// CHECK_ONLINE then SEND_PACKET. Returns `al_on` or `wol_sent`
    /// (`wol_fail` if the local socket refused the packet).
    pub async fn start<P, W>(&mut self, prober: &P, sender: &W, target: &TargetHost, broadcast: Ipv4Addr) -> StatusMessage
    where
        P: Prober,
        W: WakeSender,
    {
        if prober.is_reachable(target.ip).await {
            info!("Target {} already online, no packet sent", target.ip);
            return StatusMessage::AlreadyOn;
        }

        match sender.send_magic_packet(target.mac, broadcast).await {
            Ok(()) => {
                let deadline = Instant::now() + GRACE_INTERVAL;
                self.state = WakeState::AwaitingBoot { deadline };
                info!("Magic packet sent to {} via {}, rechecking in {:?}", target.mac, broadcast, GRACE_INTERVAL);
                StatusMessage::WolSent
            }
            Err(e) => {
                error!("WOL send error to {}: {}", broadcast, e);
                StatusMessage::WolFail
            }
        }
    }

    /// RECHECK once the deadline passed; `None` while idle or still waiting
    pub async fn poll_recheck<P: Prober>(&mut self, prober: &P, target: &TargetHost, now: Instant) -> Option<StatusMessage> {
        let WakeState::AwaitingBoot { deadline } = self.state else {
            return None;
        };
        if now < deadline {
            return None;
        }

        self.state = WakeState::Idle;
        if prober.is_reachable(target.ip).await {
            info!("Target {} came up after wake", target.ip);
            Some(StatusMessage::WolOk)
        } else {
            info!("Target {} still unreachable after grace interval", target.ip);
            Some(StatusMessage::WolFail)
        }
    }
}
