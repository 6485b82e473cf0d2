//! Wake port — emits Wake-on-LAN packets.

use futures_util::future::BoxFuture;

use deq_domain::mac::MacAddress;

/// Sends a wake packet for a hardware address.
///
/// There is no acknowledgment channel: `Ok` means the packet left the host,
/// not that the device woke up.
pub trait WakeSender: Send + Sync {
    fn send_magic_packet(&self, mac: MacAddress) -> BoxFuture<'_, std::io::Result<()>>;
}
