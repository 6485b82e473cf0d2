//! # deqd — DeQ daemon
//!
//! Composition root that wires the adapters into the DeQ core and runs it.
//!
//! ## Responsibilities
//! - Load configuration (`deq.toml`, environment overrides) and validate it
//! - Construct the outbound adapters (`NetProbe`, `SshShell`, `UdpWakeSender`)
//! - Construct the core services and the `Core` facade
//! - Run the extension loading phase; abort startup on configuration errors
//! - Run the status poller and render scheduler until SIGINT/SIGTERM
//! - Export the rendered dashboard as a JSON snapshot
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

pub mod config;
pub mod daemon;
pub mod snapshot;

pub use config::{Config, ConfigError};
pub use daemon::{Adapters, Daemon};
