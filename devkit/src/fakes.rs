/*!
Doubles des collaborateurs réseau de l'agent

- `ScriptedProber` : réponses de joignabilité scriptées
- `RecordingWakeSender` : enregistre chaque magic packet au lieu de l'émettre
- `StaticIdentity` : identité réseau fixe
*/

use async_trait::async_trait;
use lanwake_agent::error::{IdentityError, WakeError};
use lanwake_agent::identity::{IdentitySource, NetworkIdentity};
use lanwake_agent::probe::Prober;
use lanwake_agent::wol::WakeSender;
use mac_address::MacAddress;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::Arc;

#[derive(Debug, Default)]
struct ProberState {
    script: VecDeque<bool>,
    fallback: bool,
    probes: Vec<Ipv4Addr>,
}

/// Les clones partagent le même script
#[derive(Debug, Clone, Default)]
pub struct ScriptedProber {
    state: Arc<Mutex<ProberState>>,
}

impl ScriptedProber {
    pub fn online() -> Self {
        let prober = Self::default();
        prober.set_online(true);
        prober
    }

    pub fn offline() -> Self {
        Self::default()
    }

    /// Réponse utilisée quand le script est épuisé
    pub fn set_online(&self, online: bool) {
        self.state.lock().fallback = online;
    }

    /// Réponses des prochaines sondes, dans l'ordre
    pub fn script<I: IntoIterator<Item = bool>>(&self, answers: I) {
        self.state.lock().script.extend(answers);
    }

    pub fn probe_count(&self) -> usize {
        self.state.lock().probes.len()
    }

    pub fn probed(&self) -> Vec<Ipv4Addr> {
        self.state.lock().probes.clone()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn is_reachable(&self, target: Ipv4Addr) -> bool {
        let mut state = self.state.lock();
        state.probes.push(target);
        let fallback = state.fallback;
        state.script.pop_front().unwrap_or(fallback)
    }
}

#[derive(Debug, Default)]
struct SenderState {
    sent: Vec<(MacAddress, Ipv4Addr)>,
    failing: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingWakeSender {
    state: Arc<Mutex<SenderState>>,
}

impl RecordingWakeSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simule un socket UDP inutilisable
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    pub fn sent(&self) -> Vec<(MacAddress, Ipv4Addr)> {
        self.state.lock().sent.clone()
    }
}

#[async_trait]
impl WakeSender for RecordingWakeSender {
    async fn send_magic_packet(&self, mac: MacAddress, broadcast: Ipv4Addr) -> Result<(), WakeError> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(WakeError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "broadcast not permitted",
            )));
        }
        state.sent.push((mac, broadcast));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StaticIdentity {
    identity: Option<NetworkIdentity>,
    network_name: String,
}

impl StaticIdentity {
    pub fn new(local_ip: Ipv4Addr, netmask: Ipv4Addr, network_name: impl Into<String>) -> Self {
        Self {
            identity: Some(NetworkIdentity { local_ip, netmask }),
            network_name: network_name.into(),
        }
    }

    /// Interface absente (identité illisible)
    pub fn unavailable(network_name: impl Into<String>) -> Self {
        Self {
            identity: None,
            network_name: network_name.into(),
        }
    }
}

impl IdentitySource for StaticIdentity {
    fn current(&self) -> Result<NetworkIdentity, IdentityError> {
        self.identity.clone().ok_or(IdentityError::NoInterface(None))
    }

    fn network_name(&self) -> &str {
        &self.network_name
    }
}
