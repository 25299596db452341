//! Long-lived broker session for the bot
//!
//! Publishes chat commands on the commands topic and forwards every
//! payload seen on the responses topic. The `rumqttc` event loop
//! reconnects on its own; the pump only waits between attempts and
//! resubscribes after each CONNACK.

use async_trait::async_trait;
use lanwake_agent::config::TopicsConfig;
use lanwake_agent::error::LinkError;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, Incoming, MqttOptions, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const RETRY_DELAY: Duration = Duration::from_secs(5);
const RESPONSE_BUFFER: usize = 32;

#[async_trait]
pub trait CommandSink: Send + Sync {
    async fn publish_command(&self, payload: String) -> Result<(), LinkError>;
}

pub struct ResponseBridge {
    client: AsyncClient,
    commands_topic: String,
    connected: Arc<AtomicBool>,
}

impl ResponseBridge {
    /// Spawns the pump task; the receiver yields raw response payloads
    pub fn start(opts: MqttOptions, topics: &TopicsConfig) -> (Self, mpsc::Receiver<String>) {
        let (client, eventloop) = AsyncClient::new(opts, 10);
        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);
        let connected = Arc::new(AtomicBool::new(false));

        tokio::spawn(pump(
            eventloop,
            client.clone(),
            topics.responses.clone(),
            connected.clone(),
            tx,
        ));

        let bridge = Self {
            client,
            commands_topic: topics.commands.clone(),
            connected,
        };
        (bridge, rx)
    }
}

#[async_trait]
impl CommandSink for ResponseBridge {
    async fn publish_command(&self, payload: String) -> Result<(), LinkError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(LinkError::NotConnected);
        }
        self.client
            .publish(&self.commands_topic, QoS::AtLeastOnce, false, payload)
            .await?;
        Ok(())
    }
}

/// Payload of a publish received on `topic`
pub fn response_payload(event: &Event, topic: &str) -> Option<String> {
    match event {
        Event::Incoming(Incoming::Publish(p)) if p.topic == topic => {
            String::from_utf8(p.payload.to_vec()).ok()
        }
        _ => None,
    }
}

async fn pump(
    mut eventloop: EventLoop,
    client: AsyncClient,
    responses_topic: String,
    connected: Arc<AtomicBool>,
    responses: mpsc::Sender<String>,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                if ack.code != ConnectReturnCode::Success {
                    warn!("Broker refused the session: {:?}", ack.code);
                    continue;
                }
                info!("MQTT connected, subscribing to {}", responses_topic);
                connected.store(true, Ordering::SeqCst);
                if let Err(e) = client.try_subscribe(&responses_topic, QoS::AtLeastOnce) {
                    warn!("Subscribe to {} failed: {}", responses_topic, e);
                }
            }
            Ok(event) => {
                if let Some(payload) = response_payload(&event, &responses_topic) {
                    debug!("Response received: {}", payload);
                    if responses.send(payload).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                connected.store(false, Ordering::SeqCst);
                warn!("MQTT connection lost: {}, retrying in {:?}", e, RETRY_DELAY);
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanwake_agent::config::BrokerConfig;
    use lanwake_agent::link::mqtt_options;
    use rumqttc::Publish;

    fn topics() -> TopicsConfig {
        TopicsConfig {
            commands: "home/wol/cmd".into(),
            responses: "home/wol/resp".into(),
            token_prefix: "/".into(),
        }
    }

    #[test]
    fn test_only_responses_topic_forwarded() {
        let on_topic = Event::Incoming(Incoming::Publish(Publish::new(
            "home/wol/resp",
            QoS::AtLeastOnce,
            "/wol_ok",
        )));
        let elsewhere = Event::Incoming(Incoming::Publish(Publish::new(
            "home/wol/cmd",
            QoS::AtLeastOnce,
            "/wol",
        )));

        assert_eq!(response_payload(&on_topic, "home/wol/resp").as_deref(), Some("/wol_ok"));
        assert_eq!(response_payload(&elsewhere, "home/wol/resp"), None);
        assert_eq!(response_payload(&Event::Incoming(Incoming::PingResp), "home/wol/resp"), None);
    }

    #[tokio::test]
    async fn test_publish_refused_before_connack() {
        let broker = BrokerConfig {
            host: "127.0.0.1".into(),
            port: 1, // nothing listens here
            tls: false,
            client_id: None,
            username: None,
            password: None,
            keep_alive_secs: 15,
        };
        let (bridge, _responses) = ResponseBridge::start(mqtt_options(&broker, "lanwake-test"), &topics());

        assert!(matches!(
            bridge.publish_command("/wol".into()).await,
            Err(LinkError::NotConnected)
        ));
    }
}
