//! Wake-on-LAN magic packet emission
//!
//! One packet per call, UDP broadcast, no acknowledgement.

use crate::error::WakeError;
use async_trait::async_trait;
use mac_address::MacAddress;
use std::net::{Ipv4Addr, SocketAddrV4};
use tokio::net::UdpSocket;
use tracing::debug;

pub const WOL_PORT: u16 = 9;
pub const MAGIC_PACKET_LEN: usize = 102;

/// 6 x 0xFF followed by 16 copies of the hardware address
pub fn magic_packet(mac: [u8; 6]) -> [u8; MAGIC_PACKET_LEN] {
    let mut pkt = [0xFFu8; MAGIC_PACKET_LEN];
    for chunk in pkt[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&mac);
    }
    pkt
}

/// Directed broadcast address for `ip` within `mask`
pub fn broadcast_address(ip: Ipv4Addr, mask: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(ip) | !u32::from(mask))
}

#[async_trait]
pub trait WakeSender: Send + Sync {
    async fn send_magic_packet(&self, mac: MacAddress, broadcast: Ipv4Addr) -> Result<(), WakeError>;
}

/// Production sender: fresh broadcast-enabled socket per packet
#[derive(Debug, Clone)]
pub struct UdpWakeSender {
    port: u16,
}

impl UdpWakeSender {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Default for UdpWakeSender {
    fn default() -> Self {
        Self::new(WOL_PORT)
    }
}

#[async_trait]
impl WakeSender for UdpWakeSender {
    async fn send_magic_packet(&self, mac: MacAddress, broadcast: Ipv4Addr) -> Result<(), WakeError> {
        let pkt = magic_packet(mac.bytes());
        let sock = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        sock.set_broadcast(true)?;
        let dest = SocketAddrV4::new(broadcast, self.port);
        sock.send_to(&pkt, dest).await?;
        debug!("Magic packet for {} sent to {}", mac, dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_packet_layout() {
        let mac = [0x01, 0x23, 0x45, 0x67, 0x89, 0xab];
        let pkt = magic_packet(mac);
        assert_eq!(&pkt[..6], &[0xFF; 6]);
        for i in 0..16 {
            let base = 6 + i * 6;
            assert_eq!(&pkt[base..base + 6], &mac);
        }
    }

    #[test]
    fn test_broadcast_address() {
        assert_eq!(
            broadcast_address(Ipv4Addr::new(192, 168, 1, 50), Ipv4Addr::new(255, 255, 255, 0)),
            Ipv4Addr::new(192, 168, 1, 255)
        );
        assert_eq!(
            broadcast_address(Ipv4Addr::new(10, 1, 2, 3), Ipv4Addr::new(255, 255, 240, 0)),
            Ipv4Addr::new(10, 1, 15, 255)
        );
        assert_eq!(
            broadcast_address(Ipv4Addr::new(10, 1, 2, 3), Ipv4Addr::UNSPECIFIED),
            Ipv4Addr::BROADCAST
        );
    }

    #[tokio::test]
    async fn test_udp_sender_emits_one_packet() {
        let receiver = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = receiver.local_addr().unwrap().port();
        let mac = MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);

        UdpWakeSender::new(port)
            .send_magic_packet(mac, Ipv4Addr::LOCALHOST)
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(len, MAGIC_PACKET_LEN);
        assert_eq!(&buf[6..12], &mac.bytes());
    }
}
