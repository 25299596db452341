/*!
Test Harness pour l'agent LanWake

Assemble un agent complet sur les doubles du devkit:
- lien broker simulé, prober scripté, émetteur enregistreur
- cible et réseau fixes (192.168.1.0/24)
- helpers pour envoyer des commandes et lire les réponses publiées
*/

use crate::fakes::{RecordingWakeSender, ScriptedProber, StaticIdentity};
use crate::mqtt_stub::MockBrokerLink;
use lanwake_agent::config::TargetHost;
use lanwake_agent::dispatcher::{DispatchSettings, Dispatcher};
use lanwake_agent::supervisor::ConnectionSupervisor;
use lanwake_agent::uptime::SessionClock;
use lanwake_agent::Agent;
use mac_address::MacAddress;
use std::net::Ipv4Addr;

pub const COMMANDS_TOPIC: &str = "test/wol/commands";
pub const RESPONSES_TOPIC: &str = "test/wol/responses";
pub const TARGET_MAC: [u8; 6] = [0x10, 0x20, 0x30, 0x40, 0x50, 0x60];
pub const TARGET_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 20);
pub const LOCAL_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);
pub const NETMASK: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 0);
pub const BROADCAST: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 255);
pub const NETWORK_NAME: &str = "test-net";

pub type TestAgent = Agent<MockBrokerLink, ScriptedProber, RecordingWakeSender, StaticIdentity>;

pub struct TestHarness {
    pub link: MockBrokerLink,
    pub prober: ScriptedProber,
    pub sender: RecordingWakeSender,
    pub agent: TestAgent,
}

impl TestHarness {
    /// Cible éteinte, broker disponible, pas de préfixe de token
    pub fn new() -> Self {
        Self::build(MockBrokerLink::new(), StaticIdentity::new(LOCAL_IP, NETMASK, NETWORK_NAME), "")
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self::build(MockBrokerLink::new(), StaticIdentity::new(LOCAL_IP, NETMASK, NETWORK_NAME), prefix)
    }

    pub fn with_link(link: MockBrokerLink) -> Self {
        Self::build(link, StaticIdentity::new(LOCAL_IP, NETMASK, NETWORK_NAME), "")
    }

    pub fn with_identity(identity: StaticIdentity) -> Self {
        Self::build(MockBrokerLink::new(), identity, "")
    }

    fn build(link: MockBrokerLink, identity: StaticIdentity, prefix: &str) -> Self {
        tracing_subscriber::fmt().with_test_writer().try_init().ok(); // Logs visibles avec --nocapture

        let prober = ScriptedProber::offline();
        let sender = RecordingWakeSender::new();
        let dispatcher = Dispatcher::new(
            prober.clone(),
            sender.clone(),
            identity,
            DispatchSettings {
                target: Self::target(),
                broadcast: BROADCAST,
                commands_topic: COMMANDS_TOPIC.to_string(),
                token_prefix: prefix.to_string(),
                clock: SessionClock::start(),
            },
        );
        let agent = Agent::new(
            link.clone(),
            ConnectionSupervisor::new(COMMANDS_TOPIC),
            dispatcher,
            RESPONSES_TOPIC,
            prefix,
        );

        Self {
            link,
            prober,
            sender,
            agent,
        }
    }

    pub fn target() -> TargetHost {
        TargetHost {
            mac: MacAddress::new(TARGET_MAC),
            ip: TARGET_IP,
        }
    }

    pub async fn tick(&mut self) {
        self.agent.tick().await;
    }

    /// Premier tick: le superviseur établit la session
    pub async fn connect(&mut self) {
        self.tick().await;
        assert!(self.link.connected(), "mock broker refused the first connection");
    }

    /// Message sur le topic de commandes puis un tick
    pub async fn send_command(&mut self, payload: &str) {
        self.link.simulate_incoming(COMMANDS_TOPIC, payload);
        self.tick().await;
    }

    /// Réponses publiées, dans l'ordre
    pub fn responses(&self) -> Vec<String> {
        self.link.payloads_on(RESPONSES_TOPIC)
    }

    /// Objet JSON du dernier `stat_info` publié
    pub fn last_stat_info(&self) -> Option<serde_json::Value> {
        let last = self
            .responses()
            .into_iter()
            .rev()
            .find(|payload| payload.contains("stat_info "))?;
        let (_, body) = last.split_once("stat_info ")?;
        serde_json::from_str(body).ok()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
