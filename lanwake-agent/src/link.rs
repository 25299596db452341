//! Broker link
//!
//! The control loop sees the broker through [`BrokerLink`]: explicit
//! connect attempts, a non-blocking service tick that drains inbound
//! publishes, and immediate publishes.
//!
//! [`MqttLink`] runs the `rumqttc` event loop in a driver task so that
//! keep-alive and socket I/O continue while the control loop is busy.
//! The driver only (re)connects when asked, which leaves the retry cadence
//! to the connection supervisor.

use crate::config::BrokerConfig;
use crate::error::LinkError;
use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, Incoming, MqttOptions, QoS, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Upper bound for one connection attempt (TCP + TLS + CONNACK)
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

/// Inbound publishes buffered between two service ticks; extras are dropped
pub const INBOUND_CAPACITY: usize = 32;

/// A publish received on a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[async_trait]
pub trait BrokerLink: Send {
    fn is_connected(&self) -> bool;

    /// One connection attempt; `Ok` once the broker accepted the session
    async fn connect(&mut self) -> Result<(), LinkError>;

    /// `Ok` once the request is queued on the session. A SUBACK rejection is
    /// not reported back, so only a local client error counts as a failure.
    async fn subscribe(&mut self, topic: &str) -> Result<(), LinkError>;

    /// Non-blocking: everything received since the previous tick, in arrival order
    async fn service(&mut self) -> Result<Vec<InboundMessage>, LinkError>;

    async fn publish(&mut self, topic: &str, payload: String) -> Result<(), LinkError>;
}

/// Build `rumqttc` options from the broker section
pub fn mqtt_options(cfg: &BrokerConfig, fallback_client_id: &str) -> MqttOptions {
    let client_id = cfg.client_id.as_deref().unwrap_or(fallback_client_id);
    let mut opts = MqttOptions::new(client_id, &cfg.host, cfg.port);
    opts.set_keep_alive(Duration::from_secs(cfg.keep_alive_secs.max(5)));
    opts.set_clean_session(true);
    if let Some(user) = &cfg.username {
        opts.set_credentials(user, cfg.password.as_deref().unwrap_or_default());
    }
    if cfg.tls {
        opts.set_transport(Transport::tls_with_default_config());
    }
    opts
}

enum DriverRequest {
    Connect(oneshot::Sender<Result<(), LinkError>>),
}

/// `rumqttc`-backed link
pub struct MqttLink {
    client: AsyncClient,
    requests: mpsc::Sender<DriverRequest>,
    inbound: mpsc::Receiver<InboundMessage>,
    connected: Arc<AtomicBool>,
}

impl MqttLink {
    /// Must be called inside a tokio runtime (spawns the driver task)
    pub fn new(opts: MqttOptions) -> Self {
        let (client, eventloop) = AsyncClient::new(opts, 10);
        let (req_tx, req_rx) = mpsc::channel(1);
        let (in_tx, in_rx) = mpsc::channel(INBOUND_CAPACITY);
        let connected = Arc::new(AtomicBool::new(false));

        tokio::spawn(drive(eventloop, req_rx, in_tx, connected.clone()));

        Self {
            client,
            requests: req_tx,
            inbound: in_rx,
            connected,
        }
    }
}

#[async_trait]
impl BrokerLink for MqttLink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&mut self) -> Result<(), LinkError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests
            .send(DriverRequest::Connect(reply_tx))
            .await
            .map_err(|_| LinkError::DriverStopped)?;
        reply_rx.await.map_err(|_| LinkError::DriverStopped)?
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), LinkError> {
        self.client.subscribe(topic, QoS::AtLeastOnce).await?;
        Ok(())
    }

    async fn service(&mut self) -> Result<Vec<InboundMessage>, LinkError> {
        let mut received = Vec::new();
        while let Ok(msg) = self.inbound.try_recv() {
            received.push(msg);
        }
        if received.is_empty() && !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        Ok(received)
    }

    async fn publish(&mut self, topic: &str, payload: String) -> Result<(), LinkError> {
        // Status messages are never buffered across a disconnection
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        self.client.publish(topic, QoS::AtLeastOnce, false, payload).await?;
        Ok(())
    }
}

/// Driver task: idle until asked to connect, then pump the event loop
/// until the connection drops.
async fn drive(
    mut eventloop: EventLoop,
    mut requests: mpsc::Receiver<DriverRequest>,
    inbound: mpsc::Sender<InboundMessage>,
    connected: Arc<AtomicBool>,
) {
    while let Some(DriverRequest::Connect(reply)) = requests.recv().await {
        let result = match tokio::time::timeout(CONNECT_TIMEOUT, establish(&mut eventloop)).await {
            Ok(result) => result,
            Err(_) => Err(LinkError::Timeout(CONNECT_TIMEOUT)),
        };
        let ok = result.is_ok();
        connected.store(ok, Ordering::SeqCst);
        let _ = reply.send(result);
        if !ok {
            continue;
        }

        info!("Broker session established");
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::Publish(p))) => {
                    debug!("Received MQTT message on topic: {}", p.topic);
                    let msg = InboundMessage {
                        topic: p.topic,
                        payload: p.payload.to_vec(),
                    };
                    match inbound.try_send(msg) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(msg)) => {
                            warn!("Inbound queue full, dropping message on {}", msg.topic);
                        }
                        // Link handle dropped, nobody left to serve
                        Err(mpsc::error::TrySendError::Closed(_)) => return,
                    }
                }
                Ok(Event::Incoming(Incoming::Disconnect)) => {
                    warn!("Broker closed the session");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("MQTT connection lost: {}", e);
                    break;
                }
            }
        }
        connected.store(false, Ordering::SeqCst);
    }
}

async fn establish(eventloop: &mut EventLoop) -> Result<(), LinkError> {
    loop {
        match eventloop.poll().await? {
            Event::Incoming(Incoming::ConnAck(ack)) => {
                return match ack.code {
                    ConnectReturnCode::Success => Ok(()),
                    code => Err(LinkError::Refused(format!("{code:?}"))),
                };
            }
            _ => continue,
        }
    }
}
