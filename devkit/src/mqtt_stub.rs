/*!
Lien broker simulé pour tester sans broker MQTT

Enregistre les tentatives de connexion, abonnements et publications, et
permet de simuler la réception de messages et les pertes de connexion.
*/

use async_trait::async_trait;
use lanwake_agent::error::LinkError;
use lanwake_agent::link::{BrokerLink, InboundMessage};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockMessage {
    pub topic: String,
    pub payload: String,
}

#[derive(Debug, Default)]
struct LinkState {
    connected: bool,
    accept_connections: bool,
    connect_script: VecDeque<bool>,
    fail_next_subscribe: bool,
    connect_attempts: Vec<Instant>,
    subscriptions: Vec<String>,
    inbound: VecDeque<InboundMessage>,
    published: Vec<MockMessage>,
}

/// Implémente `BrokerLink`; les clones partagent le même état
#[derive(Debug, Clone, Default)]
pub struct MockBrokerLink {
    state: Arc<Mutex<LinkState>>,
}

impl MockBrokerLink {
    /// Broker qui accepte toutes les connexions
    pub fn new() -> Self {
        let link = Self::default();
        link.state.lock().accept_connections = true;
        link
    }

    /// Broker injoignable
    pub fn refusing() -> Self {
        Self::default()
    }

    /// Résultats des prochaines tentatives (puis retour au comportement par défaut)
    pub fn script_connects<I: IntoIterator<Item = bool>>(&self, outcomes: I) {
        self.state.lock().connect_script.extend(outcomes);
    }

    pub fn set_accepting(&self, accept: bool) {
        self.state.lock().accept_connections = accept;
    }

    pub fn fail_next_subscribe(&self) {
        self.state.lock().fail_next_subscribe = true;
    }

    /// Simule la perte du lien (côté broker ou réseau)
    pub fn drop_connection(&self) {
        self.state.lock().connected = false;
    }

    /// Simule la réception d'un message sur un topic
    pub fn simulate_incoming<S, V>(&self, topic: S, payload: V)
    where
        S: Into<String>,
        V: Into<Vec<u8>>,
    {
        self.state.lock().inbound.push_back(InboundMessage {
            topic: topic.into(),
            payload: payload.into(),
        });
    }

    pub fn connected(&self) -> bool {
        self.state.lock().connected
    }

    pub fn connect_attempts(&self) -> Vec<Instant> {
        self.state.lock().connect_attempts.clone()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.state.lock().subscriptions.clone()
    }

    pub fn published(&self) -> Vec<MockMessage> {
        self.state.lock().published.clone()
    }

    /// Payloads publiés sur un topic, dans l'ordre
    pub fn payloads_on(&self, topic: &str) -> Vec<String> {
        self.state
            .lock()
            .published
            .iter()
            .filter(|msg| msg.topic == topic)
            .map(|msg| msg.payload.clone())
            .collect()
    }
}

#[async_trait]
impl BrokerLink for MockBrokerLink {
    fn is_connected(&self) -> bool {
        self.connected()
    }

    async fn connect(&mut self) -> Result<(), LinkError> {
        let mut state = self.state.lock();
        state.connect_attempts.push(Instant::now());
        let default = state.accept_connections;
        let accepted = state.connect_script.pop_front().unwrap_or(default);
        state.connected = accepted;
        if accepted {
            Ok(())
        } else {
            Err(LinkError::Refused("mock broker unavailable".into()))
        }
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), LinkError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(LinkError::NotConnected);
        }
        if std::mem::take(&mut state.fail_next_subscribe) {
            return Err(LinkError::Refused("mock subscribe rejected".into()));
        }
        state.subscriptions.push(topic.to_string());
        Ok(())
    }

    async fn service(&mut self) -> Result<Vec<InboundMessage>, LinkError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(LinkError::NotConnected);
        }
        Ok(state.inbound.drain(..).collect())
    }

    async fn publish(&mut self, topic: &str, payload: String) -> Result<(), LinkError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(LinkError::NotConnected);
        }
        state.published.push(MockMessage {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }
}
