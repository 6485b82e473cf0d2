//! # deq-app
//!
//! Application layer — the DeQ core runtime and its **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement (driven/outbound ports):
//!   - `Prober` — reachability check for one device
//!   - `RemoteShell` — run a command on a device
//!   - `WakeSender` — emit a Wake-on-LAN packet
//! - Define the **extension contract** (`Extension`, `RenderFn`)
//! - Run the core services:
//!   - `StatusPoller` + `StatusCache` — periodic probes, lock-free reads
//!   - `ActionExecutor` — wake, power and container actions
//!   - `SectionRegistry` + `RenderScheduler` — time-boxed section renders
//!   - `Core` — the capability facade handed to extensions
//!   - `load_extensions` — the startup phase that registers sections
//!
//! ## Dependency rule
//! Depends on `deq-domain` plus in-process runtime crates (`tokio`,
//! `arc-swap`). Never imports adapter crates. Adapters depend on *this*
//! crate, not the reverse.

pub mod devices;
pub mod executor;
pub mod extension_host;
pub mod facade;
pub mod poller;
pub mod ports;
pub mod registry;
pub mod scheduler;
pub mod status_cache;

pub use devices::DeviceDirectory;
pub use executor::ActionExecutor;
pub use extension_host::load_extensions;
pub use facade::Core;
pub use poller::{StatusPoller, SweepSummary};
pub use registry::{SectionRegistry, SectionSlot, SectionTable};
pub use scheduler::{RenderScheduler, RenderSummary};
pub use status_cache::StatusCache;
