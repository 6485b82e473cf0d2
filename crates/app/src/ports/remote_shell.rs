//! Remote shell port — runs a command on a device.

use futures_util::future::BoxFuture;

use deq_domain::action::ActionResult;
use deq_domain::device::{Device, RemoteAccess};

/// Opens (or reuses) a remote session and runs one command.
///
/// The command string is passed through unmodified. Callers are trusted code
/// acting with the operator's intent; the shell does not sanitize or restrict
/// what it runs.
///
/// Failures to connect or execute are returned as a failed [`ActionResult`]
/// with the error text in `stderr`, never as a panic or error value.
pub trait RemoteShell: Send + Sync {
    fn run<'a>(
        &'a self,
        device: &'a Device,
        remote: &'a RemoteAccess,
        command: &'a str,
    ) -> BoxFuture<'a, ActionResult>;
}
