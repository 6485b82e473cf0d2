//! # deq-adapter-ssh
//!
//! SSH adapter — implements the `RemoteShell` port with the system `ssh`
//! client.
//!
//! ## Responsibilities
//! - Build non-interactive `ssh` invocations from a device's remote access
//! - Reuse connections through OpenSSH multiplexing (`ControlMaster`)
//! - Bound every command by the connect and command timeouts
//! - Report every failure as a failed `ActionResult`
//!
//! ## Dependency rule
//! Depends on `deq-app` (for port traits) and `deq-domain` (for types).
//! The app crate never imports this crate.

pub mod config;
pub mod error;
pub mod shell;

pub use config::SshConfig;
pub use error::SshError;
pub use shell::SshShell;
