//! Connection supervisor
//!
//! `CONNECTED ⇄ DISCONNECTED`. While connected it only services the link.
//! While disconnected it makes at most one connection attempt per
//! [`RECONNECT_COOLDOWN`], forever, and never reports failures to the broker.

use crate::link::{BrokerLink, InboundMessage};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const RECONNECT_COOLDOWN: Duration = Duration::from_millis(5000);

/// Timestamp of the last failed attempt; `None` once an attempt succeeded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconnectTimer {
    last_failure: Option<Instant>,
}

impl ReconnectTimer {
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_failure {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= RECONNECT_COOLDOWN,
        }
    }

    pub fn record_failure(&mut self, now: Instant) {
        self.last_failure = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_failure = None;
    }

    pub fn last_failure(&self) -> Option<Instant> {
        self.last_failure
    }
}

pub struct ConnectionSupervisor {
    commands_topic: String,
    timer: ReconnectTimer,
    attempts: u64,
    subscribed: bool,
}

impl ConnectionSupervisor {
    pub fn new(commands_topic: impl Into<String>) -> Self {
        Self {
            commands_topic: commands_topic.into(),
            timer: ReconnectTimer::default(),
            attempts: 0,
            subscribed: false,
        }
    }

    pub fn timer(&self) -> ReconnectTimer {
        self.timer
    }

    /// Total connection attempts made so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// One supervision cycle; returns the inbound messages to dispatch
    pub async fn supervise<L: BrokerLink>(&mut self, link: &mut L, now: Instant) -> Vec<InboundMessage> {
        if !link.is_connected() {
            self.subscribed = false;
        } else if self.subscribed {
            return match link.service().await {
                Ok(messages) => messages,
                Err(e) => {
                    debug!("Service tick failed: {}", e);
                    Vec::new()
                }
            };
        }

        if !self.timer.is_due(now) {
            return Vec::new();
        }

        self.attempts += 1;
        match self.reconnect(link).await {
            Ok(()) => {
                self.subscribed = true;
                info!(
                    "Connected to broker (attempt {}), subscribed to {}",
                    self.attempts, self.commands_topic
                );
                self.timer.reset();
            }
            Err(e) => {
                warn!("Broker connection attempt {} failed: {}", self.attempts, e);
                self.timer.record_failure(now);
            }
        }
        Vec::new()
    }

    /// A session whose subscription failed is kept and only resubscribed
    async fn reconnect<L: BrokerLink>(&self, link: &mut L) -> Result<(), crate::error::LinkError> {
        if !link.is_connected() {
            link.connect().await?;
        }
        link.subscribe(&self.commands_topic).await
    }
}
