//! Wake-on-LAN over UDP broadcast.

use std::net::{SocketAddr, SocketAddrV4};

use futures_util::future::BoxFuture;
use tokio::net::UdpSocket;

use deq_app::ports::WakeSender;
use deq_domain::mac::MacAddress;

use crate::config::WolConfig;
use crate::error::NetError;

/// Length of a magic packet: 6 sync bytes plus 16 copies of the MAC.
pub const MAGIC_PACKET_LEN: usize = 6 + 16 * 6;

/// Build the magic packet for `mac`.
#[must_use]
pub fn magic_packet(mac: MacAddress) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0xFF; MAGIC_PACKET_LEN];
    let octets = mac.octets();
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&octets);
    }
    packet
}

/// Sends magic packets to the configured broadcast address.
#[derive(Debug, Clone, Default)]
pub struct UdpWakeSender {
    config: WolConfig,
}

impl UdpWakeSender {
    #[must_use]
    pub fn new(config: WolConfig) -> Self {
        Self { config }
    }

    /// Send one packet to every configured port.
    ///
    /// # Errors
    ///
    /// Fails when the socket cannot be prepared, or when every send failed.
    /// A single successful send is enough.
    pub async fn send(&self, mac: MacAddress) -> Result<(), NetError> {
        let socket = UdpSocket::bind(SocketAddrV4::new([0, 0, 0, 0].into(), 0))
            .await
            .map_err(NetError::Bind)?;
        socket.set_broadcast(true).map_err(NetError::Broadcast)?;

        let packet = magic_packet(mac);
        let mut last_error = None;
        let mut sent = false;
        for &port in &self.config.ports {
            let target = SocketAddr::V4(SocketAddrV4::new(self.config.broadcast, port));
            match socket.send_to(&packet, target).await {
                Ok(_) => {
                    tracing::debug!(%mac, %target, "wake packet sent");
                    sent = true;
                }
                Err(source) => {
                    tracing::warn!(%mac, %target, error = %source, "wake packet send failed");
                    last_error = Some(NetError::Send { target, source });
                }
            }
        }

        match (sent, last_error) {
            (true, _) => Ok(()),
            (false, Some(err)) => Err(err),
            (false, None) => Err(NetError::NoPorts),
        }
    }
}

impl WakeSender for UdpWakeSender {
    fn send_magic_packet(&self, mac: MacAddress) -> BoxFuture<'_, std::io::Result<()>> {
        Box::pin(async move { self.send(mac).await.map_err(Into::into) })
    }
}
