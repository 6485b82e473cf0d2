//! Prober port — the pluggable reachability check behind the poller.

use std::future::Future;
use std::sync::Arc;

use deq_domain::device::Device;
use deq_domain::status::ProbeOutcome;

/// Decides whether a device is reachable right now.
///
/// Implementations should honour their own timeout, but the poller wraps every
/// call in a hard deadline regardless, so a probe that hangs is reported as
/// unreachable rather than stalling the sweep.
pub trait Prober: Send + Sync {
    /// Probe one device.
    fn probe(&self, device: &Device) -> impl Future<Output = ProbeOutcome> + Send;
}

impl<T: Prober> Prober for Arc<T> {
    fn probe(&self, device: &Device) -> impl Future<Output = ProbeOutcome> + Send {
        (**self).probe(device)
    }
}
