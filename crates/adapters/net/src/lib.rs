//! # deq-adapter-net
//!
//! Network adapter — implements the reachability and wake ports.
//!
//! ## Responsibilities
//! - `TcpProbe` — TCP connect to the device's probe port
//! - `PingProbe` — one ICMP echo through the system `ping` binary
//! - `NetProbe` — picks one of the above from the poller settings
//! - `UdpWakeSender` — broadcast Wake-on-LAN magic packets
//!
//! ## Dependency rule
//! Depends on `deq-app` (for port traits) and `deq-domain` (for types).
//! The app crate never imports this crate.

pub mod config;
pub mod error;
pub mod probe;
pub mod wake;

pub use config::WolConfig;
pub use error::NetError;
pub use probe::{NetProbe, PingProbe, TcpProbe};
pub use wake::{UdpWakeSender, magic_packet};
