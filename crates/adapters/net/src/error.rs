//! Network adapter error types.

use std::net::SocketAddr;

/// Errors raised while sending wake packets.
///
/// Probes never fail with an error; they classify every problem into a
/// probe outcome instead.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Could not open the local UDP socket.
    #[error("failed to bind UDP socket")]
    Bind(#[source] std::io::Error),

    /// The socket refused to enable broadcast.
    #[error("failed to enable broadcast")]
    Broadcast(#[source] std::io::Error),

    /// A single send failed.
    #[error("failed to send to {target}")]
    Send {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// No port was configured to send to.
    #[error("no wake ports configured")]
    NoPorts,
}

impl From<NetError> for std::io::Error {
    fn from(err: NetError) -> Self {
        match err {
            NetError::Bind(source) | NetError::Broadcast(source) => source,
            NetError::Send { target, source } => {
                std::io::Error::new(source.kind(), format!("send to {target}: {source}"))
            }
            NetError::NoPorts => {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "no wake ports configured")
            }
        }
    }
}
