//! Local network identity
//!
//! Reads the agent's own IPv4 address and subnet mask from the interface
//! table. Association with the wireless network is handled by the host
//! system; the configured SSID is reported as the network name.

use crate::error::IdentityError;
use crate::wol::broadcast_address;
use if_addrs::{get_if_addrs, IfAddr, Interface};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Delay between lookups while the host has no usable address yet
pub const NETWORK_RETRY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkIdentity {
    pub local_ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl NetworkIdentity {
    pub fn broadcast(&self) -> Ipv4Addr {
        broadcast_address(self.local_ip, self.netmask)
    }
}

pub trait IdentitySource: Send + Sync {
    /// Read fresh on every call
    fn current(&self) -> Result<NetworkIdentity, IdentityError>;

    fn network_name(&self) -> &str;
}

/// Identity taken from the OS interface list
#[derive(Debug, Clone)]
pub struct InterfaceIdentity {
    interface: Option<String>,
    network_name: String,
}

impl InterfaceIdentity {
    pub fn new(interface: Option<String>, network_name: impl Into<String>) -> Self {
        Self {
            interface,
            network_name: network_name.into(),
        }
    }

    fn select(interfaces: &[Interface], wanted: Option<&str>) -> Option<(Ipv4Addr, Ipv4Addr)> {
        interfaces
            .iter()
            .filter(|iface| !iface.is_loopback())
            .filter(|iface| wanted.map_or(true, |name| iface.name == name))
            .find_map(|iface| match &iface.addr {
                IfAddr::V4(v4) => Some((v4.ip, v4.netmask)),
                IfAddr::V6(_) => None,
            })
    }
}

impl IdentitySource for InterfaceIdentity {
    fn current(&self) -> Result<NetworkIdentity, IdentityError> {
        let interfaces = get_if_addrs()?;
        let (local_ip, netmask) = Self::select(&interfaces, self.interface.as_deref())
            .ok_or_else(|| IdentityError::NoInterface(self.interface.clone()))?;
        debug!("Local identity {}/{} on {:?}", local_ip, netmask, self.interface);
        Ok(NetworkIdentity { local_ip, netmask })
    }

    fn network_name(&self) -> &str {
        &self.network_name
    }
}

/// Wait until `source` reports an address, retrying every `retry`
pub async fn wait_for_network<N: IdentitySource>(source: &N, retry: Duration) -> NetworkIdentity {
    let mut failures: u32 = 0;
    loop {
        match source.current() {
            Ok(identity) => {
                if failures > 0 {
                    info!("Network ready after {} failed lookups", failures);
                }
                return identity;
            }
            Err(e) => {
                failures += 1;
                warn!("Network not ready ({}), retrying in {:?}", e, retry);
                tokio::time::sleep(retry).await;
            }
        }
    }
}
