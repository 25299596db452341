//! Short-lived broker sessions
//!
//! Each HTTP request opens its own MQTT session, does one thing, and closes
//! it again. Nothing is kept between requests.

use async_trait::async_trait;
use lanwake_agent::config::BrokerConfig;
use lanwake_agent::error::LinkError;
use lanwake_agent::link::mqtt_options;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, Outgoing, QoS};
use std::time::Duration;
use tracing::{debug, info};

pub const SESSION_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait CommandPublisher: Send + Sync {
    /// Publish one command payload and wait for the broker acknowledgement
    async fn publish_command(&self, payload: String) -> Result<(), LinkError>;

    /// Open and close a session without publishing
    async fn check_broker(&self) -> Result<(), LinkError>;

    fn topic(&self) -> &str;
}

pub struct MqttPublisher {
    broker: BrokerConfig,
    topic: String,
}

impl MqttPublisher {
    pub fn new(broker: BrokerConfig, topic: impl Into<String>) -> Self {
        Self {
            broker,
            topic: topic.into(),
        }
    }

    fn session(&self) -> (AsyncClient, EventLoop) {
        AsyncClient::new(mqtt_options(&self.broker, "lanwake-trigger"), 10)
    }
}

/// Poll until `done` matches an event; connection errors end the wait
async fn wait_for<F>(eventloop: &mut EventLoop, done: F) -> Result<(), LinkError>
where
    F: Fn(&Event) -> bool,
{
    let pump = async {
        loop {
            let event = eventloop.poll().await?;
            if done(&event) {
                return Ok::<(), LinkError>(());
            }
        }
    };
    tokio::time::timeout(SESSION_TIMEOUT, pump)
        .await
        .map_err(|_| LinkError::Timeout(SESSION_TIMEOUT))?
}

/// Best effort: the command already went through
async fn close(client: AsyncClient, mut eventloop: EventLoop) {
    if client.disconnect().await.is_ok() {
        let _ = wait_for(&mut eventloop, |e| matches!(e, Event::Outgoing(Outgoing::Disconnect))).await;
    }
}

#[async_trait]
impl CommandPublisher for MqttPublisher {
    async fn publish_command(&self, payload: String) -> Result<(), LinkError> {
        let (client, mut eventloop) = self.session();
        client
            .publish(&self.topic, QoS::AtLeastOnce, false, payload.clone())
            .await?;
        wait_for(&mut eventloop, |e| matches!(e, Event::Incoming(Incoming::PubAck(_)))).await?;
        info!("Message published to {}: {}", self.topic, payload);
        close(client, eventloop).await;
        Ok(())
    }

    async fn check_broker(&self) -> Result<(), LinkError> {
        let (client, mut eventloop) = self.session();
        wait_for(&mut eventloop, |e| matches!(e, Event::Incoming(Incoming::ConnAck(_)))).await?;
        debug!("Broker {}:{} reachable", self.broker.host, self.broker.port);
        close(client, eventloop).await;
        Ok(())
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}
