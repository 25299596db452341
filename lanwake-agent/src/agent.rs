//! Agent control loop
//!
//! Single logical actor. Every tick:
//! 1. the supervisor services or re-establishes the broker link,
//! 2. inbound messages are queued on the dispatcher,
//! 3. the dispatcher runs until it has nothing to emit,
//! 4. each status message is published as soon as it is produced.

use crate::dispatcher::Dispatcher;
use crate::identity::IdentitySource;
use crate::link::BrokerLink;
use crate::probe::Prober;
use crate::status::StatusMessage;
use crate::supervisor::ConnectionSupervisor;
use crate::wol::WakeSender;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

pub const LOOP_TICK: Duration = Duration::from_millis(50);

pub struct Agent<L, P, W, N> {
    link: L,
    supervisor: ConnectionSupervisor,
    dispatcher: Dispatcher<P, W, N>,
    responses_topic: String,
    token_prefix: String,
}

impl<L, P, W, N> Agent<L, P, W, N>
where
    L: BrokerLink,
    P: Prober,
    W: WakeSender,
    N: IdentitySource,
{
    pub fn new(
        link: L,
        supervisor: ConnectionSupervisor,
        dispatcher: Dispatcher<P, W, N>,
        responses_topic: impl Into<String>,
        token_prefix: impl Into<String>,
    ) -> Self {
        Self {
            link,
            supervisor,
            dispatcher,
            responses_topic: responses_topic.into(),
            token_prefix: token_prefix.into(),
        }
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor {
        &self.supervisor
    }

    pub fn dispatcher(&self) -> &Dispatcher<P, W, N> {
        &self.dispatcher
    }

    /// One control-loop iteration
    pub async fn tick(&mut self) {
        let inbound = self.supervisor.supervise(&mut self.link, Instant::now()).await;
        for msg in &inbound {
            self.dispatcher.accept(msg);
        }
        while let Some(status) = self.dispatcher.step(Instant::now()).await {
            self.publish(status).await;
        }
    }

    /// Runs forever; nothing in the loop is fatal
    pub async fn run(mut self) {
        info!("Starting agent main loop...");
        let mut ticker = interval(LOOP_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    async fn publish(&mut self, status: StatusMessage) {
        let payload = status.render(&self.token_prefix);
        match self.link.publish(&self.responses_topic, payload).await {
            Ok(()) => info!("Published {}", status.token()),
            Err(e) => warn!("Dropping status {}: {}", status.token(), e),
        }
    }
}
