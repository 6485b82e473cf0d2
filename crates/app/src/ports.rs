//! Port definitions — traits that adapters and extensions implement.
//!
//! Ports are the boundaries between the core and the outside world. They are
//! defined here (in `app`) so that both the runtime and the adapter crates can
//! depend on them without creating circular dependencies.

pub mod extension;
pub mod prober;
pub mod remote_shell;
pub mod wake;

pub use extension::{Extension, ExtensionError, RenderFn, render_fn};
pub use prober::Prober;
pub use remote_shell::RemoteShell;
pub use wake::WakeSender;
