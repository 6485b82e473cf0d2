//! Status cache — the latest probe result per device.
//!
//! One [`ArcSwap`] slot per configured device. The poller is the only writer;
//! any number of readers load the current record without blocking. Records are
//! swapped whole, so a reader never observes a half-updated status.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use deq_domain::id::DeviceId;
use deq_domain::status::DeviceStatus;
use deq_domain::time::{self, Timestamp};

use crate::devices::DeviceDirectory;

/// Lock-free, per-device status cache.
#[derive(Debug)]
pub struct StatusCache {
    slots: HashMap<DeviceId, ArcSwap<DeviceStatus>>,
    stale_after: Duration,
}

impl StatusCache {
    /// Create a cache with one `Unknown` entry per device.
    ///
    /// Entries older than `stale_after` are served as `Unknown`.
    #[must_use]
    pub fn new(devices: &DeviceDirectory, stale_after: Duration) -> Self {
        let slots = devices
            .iter()
            .map(|device| {
                (
                    device.id.clone(),
                    ArcSwap::from_pointee(DeviceStatus::unknown(device.id.clone())),
                )
            })
            .collect();
        Self {
            slots,
            stale_after,
        }
    }

    /// Replace the record of one device. Returns `false` for an unknown device.
    pub fn store(&self, status: DeviceStatus) -> bool {
        match self.slots.get(&status.device_id) {
            Some(slot) => {
                slot.store(Arc::new(status));
                true
            }
            None => {
                tracing::debug!(device_id = %status.device_id, "dropping status for unconfigured device");
                false
            }
        }
    }

    /// Current status of a device. Never fails.
    ///
    /// Unknown ids read as `Unknown`; records older than the staleness
    /// window read as `Unknown` with a staleness note.
    #[must_use]
    pub fn get(&self, device_id: &str) -> DeviceStatus {
        self.get_at(device_id, time::now())
    }

    /// Same as [`get`](Self::get) with an explicit clock.
    #[must_use]
    pub fn get_at(&self, device_id: &str, now: Timestamp) -> DeviceStatus {
        let Some(slot) = self.slots.get(device_id) else {
            return DeviceStatus::unknown(DeviceId::lossy(device_id));
        };
        let current = slot.load_full();
        if current.is_stale(self.stale_after, now) {
            return current.as_ref().clone().into_stale();
        }
        current.as_ref().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deq_domain::device::Device;
    use deq_domain::status::{DeviceState, ProbeOutcome};

    fn directory() -> DeviceDirectory {
        let devices = ["nas-1", "router"]
            .into_iter()
            .map(|id| {
                Device::builder()
                    .id(DeviceId::new(id).unwrap())
                    .name(id)
                    .address("10.0.0.5")
                    .build()
                    .unwrap()
            })
            .collect();
        DeviceDirectory::new(devices).unwrap()
    }

    fn online(id: &str, at: Timestamp) -> DeviceStatus {
        DeviceStatus::from_outcome(
            DeviceId::new(id).unwrap(),
            ProbeOutcome::Reachable {
                latency: Duration::from_millis(4),
            },
            at,
        )
    }

    #[test]
    fn should_start_with_unknown_for_every_device() {
        let cache = StatusCache::new(&directory(), Duration::from_secs(90));
        for id in ["nas-1", "router"] {
            let status = cache.get(id);
            assert_eq!(status.state, DeviceState::Unknown);
            assert_eq!(status.device_id.as_str(), id);
        }
    }

    #[test]
    fn should_return_unknown_for_unconfigured_device() {
        let cache = StatusCache::new(&directory(), Duration::from_secs(90));
        let status = cache.get("ghost");
        assert_eq!(status.state, DeviceState::Unknown);
        assert_eq!(status.device_id.as_str(), "ghost");
    }

    #[test]
    fn should_return_unknown_for_malformed_id() {
        let cache = StatusCache::new(&directory(), Duration::from_secs(90));
        assert_eq!(cache.get("").state, DeviceState::Unknown);
    }

    #[test]
    fn should_replace_record_on_store() {
        let cache = StatusCache::new(&directory(), Duration::from_secs(90));
        assert!(cache.store(online("nas-1", time::now())));
        assert_eq!(cache.get("nas-1").state, DeviceState::Online);
        assert_eq!(cache.get("router").state, DeviceState::Unknown);
    }

    #[test]
    fn should_ignore_status_for_unconfigured_device() {
        let cache = StatusCache::new(&directory(), Duration::from_secs(90));
        assert!(!cache.store(online("ghost", time::now())));
    }

    #[test]
    fn should_serve_stale_record_as_unknown() {
        let cache = StatusCache::new(&directory(), Duration::from_secs(90));
        let checked = time::now();
        cache.store(online("nas-1", checked));

        let fresh = cache.get_at("nas-1", checked + chrono::Duration::seconds(60));
        assert_eq!(fresh.state, DeviceState::Online);

        let stale = cache.get_at("nas-1", checked + chrono::Duration::seconds(120));
        assert_eq!(stale.state, DeviceState::Unknown);
        assert_eq!(stale.last_checked, Some(checked));
    }

    #[test]
    fn should_allow_concurrent_readers_during_writes() {
        let cache = Arc::new(StatusCache::new(&directory(), Duration::from_secs(90)));
        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    cache.store(online("nas-1", time::now()));
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        let status = cache.get("nas-1");
                        assert!(matches!(
                            status.state,
                            DeviceState::Online | DeviceState::Unknown
                        ));
                        if status.state == DeviceState::Online {
                            assert!(status.latency_ms.is_some());
                        }
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
