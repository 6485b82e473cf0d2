//! Device status poller — periodic, bounded-parallel reachability sweeps.
//!
//! Every sweep probes all configured devices concurrently (at most
//! `parallelism` at a time) and replaces each device's cache entry as soon as
//! its own probe finishes. A probe that errors or overruns its deadline never
//! aborts the sweep for other devices.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use deq_domain::device::Device;
use deq_domain::settings::PollerSettings;
use deq_domain::status::{DeviceState, DeviceStatus, ProbeOutcome};
use deq_domain::time;

use crate::devices::DeviceDirectory;
use crate::ports::Prober;
use crate::status_cache::StatusCache;

/// Counts of device states after one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub online: usize,
    pub offline: usize,
    pub unknown: usize,
}

impl SweepSummary {
    fn record(&mut self, state: DeviceState) {
        match state {
            DeviceState::Online => self.online += 1,
            DeviceState::Offline => self.offline += 1,
            DeviceState::Unknown => self.unknown += 1,
        }
    }
}

/// Background poller writing into a shared [`StatusCache`].
pub struct StatusPoller<P> {
    prober: P,
    devices: DeviceDirectory,
    cache: Arc<StatusCache>,
    settings: PollerSettings,
}

impl<P: Prober> StatusPoller<P> {
    /// Create a poller. It does nothing until [`sweep`](Self::sweep) or
    /// [`run`](Self::run) is called.
    pub fn new(
        prober: P,
        devices: DeviceDirectory,
        cache: Arc<StatusCache>,
        settings: PollerSettings,
    ) -> Self {
        Self {
            prober,
            devices,
            cache,
            settings,
        }
    }

    /// Probe one device within the configured deadline.
    ///
    /// A probe that does not finish in time yields `Offline`.
    pub async fn probe(&self, device: &Device) -> DeviceStatus {
        let deadline = self.settings.probe_timeout();
        let outcome = match tokio::time::timeout(deadline, self.prober.probe(device)).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::Unreachable {
                reason: format!("probe timed out after {}ms", deadline.as_millis()),
            },
        };
        DeviceStatus::from_outcome(device.id.clone(), outcome, time::now())
    }
}

impl<P: Prober + 'static> StatusPoller<P> {
    /// Run one sweep over every device and update the cache.
    ///
    /// Each probe runs in its own task, at most `parallelism` at a time, and
    /// writes its cache entry as soon as it finishes. A panicking probe only
    /// loses that device's update for this sweep.
    pub async fn sweep(self: &Arc<Self>) -> SweepSummary {
        let permits = Arc::new(Semaphore::new(self.settings.parallelism.max(1)));
        let mut probes = JoinSet::new();

        for device in self.devices.iter().cloned() {
            let this = Arc::clone(self);
            let permits = Arc::clone(&permits);
            probes.spawn(async move {
                let _permit = permits.acquire_owned().await.ok()?;
                let status = this.probe(&device).await;
                if status.state != DeviceState::Online {
                    tracing::debug!(
                        device_id = %status.device_id,
                        state = %status.state,
                        detail = status.detail.as_deref().unwrap_or(""),
                        "device not online"
                    );
                }
                let state = status.state;
                this.cache.store(status);
                Some(state)
            });
        }

        let mut summary = SweepSummary::default();
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(Some(state)) => summary.record(state),
                Ok(None) => {}
                Err(err) => tracing::warn!(%err, "probe task failed"),
            }
        }
        summary
    }

    /// Sweep on a fixed interval until `cancel` fires.
    ///
    /// The first sweep starts immediately. A sweep that fails as a whole is
    /// logged and retried on the next tick; it never ends the loop.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            devices = self.devices.len(),
            interval_secs = self.settings.interval_secs,
            "status poller started"
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let this = Arc::clone(&self);
            match tokio::spawn(async move { this.sweep().await }).await {
                Ok(summary) => tracing::debug!(
                    online = summary.online,
                    offline = summary.offline,
                    unknown = summary.unknown,
                    "sweep finished"
                ),
                Err(err) => {
                    tracing::warn!(%err, "status sweep failed, retrying next interval");
                }
            }
        }

        tracing::info!("status poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use deq_domain::id::DeviceId;

    // ── Scripted prober ────────────────────────────────────────────

    #[derive(Clone, Copy, Debug)]
    enum Script {
        Up,
        Down,
        Dns,
        Hang,
    }

    #[derive(Default)]
    struct ScriptedProber {
        scripts: Mutex<HashMap<String, Script>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedProber {
        fn set(&self, id: &str, script: Script) {
            self.scripts.lock().unwrap().insert(id.to_string(), script);
        }
    }

    impl Prober for ScriptedProber {
        fn probe(&self, device: &Device) -> impl Future<Output = ProbeOutcome> + Send {
            let script = self
                .scripts
                .lock()
                .unwrap()
                .get(device.id.as_str())
                .copied()
                .unwrap_or(Script::Down);
            async move {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                let outcome = match script {
                    Script::Up => ProbeOutcome::Reachable {
                        latency: Duration::from_millis(10),
                    },
                    Script::Down => ProbeOutcome::Unreachable {
                        reason: "no route to host".into(),
                    },
                    Script::Dns => ProbeOutcome::Inconclusive {
                        reason: "name resolution failed".into(),
                    },
                    Script::Hang => std::future::pending().await,
                };
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                outcome
            }
        }
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn directory(ids: &[&str]) -> DeviceDirectory {
        let devices = ids
            .iter()
            .map(|id| {
                Device::builder()
                    .id(DeviceId::new(*id).unwrap())
                    .name(*id)
                    .address("10.0.0.5")
                    .build()
                    .unwrap()
            })
            .collect();
        DeviceDirectory::new(devices).unwrap()
    }

    fn make_poller(
        ids: &[&str],
        settings: PollerSettings,
    ) -> (
        Arc<StatusPoller<Arc<ScriptedProber>>>,
        Arc<ScriptedProber>,
        Arc<StatusCache>,
    ) {
        let devices = directory(ids);
        let cache = Arc::new(StatusCache::new(&devices, settings.stale_after()));
        let prober = Arc::new(ScriptedProber::default());
        let poller = StatusPoller::new(Arc::clone(&prober), devices, Arc::clone(&cache), settings);
        (Arc::new(poller), prober, cache)
    }

    fn settings() -> PollerSettings {
        PollerSettings {
            probe_timeout_ms: 500,
            parallelism: 2,
            ..PollerSettings::default()
        }
    }

    // ── Tests ──────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn should_mark_devices_by_probe_outcome() {
        let (poller, prober, cache) = make_poller(&["nas-1", "router", "printer"], settings());
        prober.set("nas-1", Script::Up);
        prober.set("router", Script::Down);
        prober.set("printer", Script::Dns);

        let summary = poller.sweep().await;

        assert_eq!(
            summary,
            SweepSummary {
                online: 1,
                offline: 1,
                unknown: 1
            }
        );
        assert_eq!(cache.get("nas-1").state, DeviceState::Online);
        assert_eq!(cache.get("router").state, DeviceState::Offline);
        assert_eq!(cache.get("printer").state, DeviceState::Unknown);
        assert!(cache.get("printer").last_checked.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn should_mark_hanging_probe_offline_within_deadline() {
        let (poller, prober, cache) = make_poller(&["nas-1", "router"], settings());
        prober.set("nas-1", Script::Hang);
        prober.set("router", Script::Up);

        let started = tokio::time::Instant::now();
        poller.sweep().await;
        let elapsed = started.elapsed();

        assert!(elapsed <= Duration::from_millis(600), "sweep took {elapsed:?}");
        let status = cache.get("nas-1");
        assert_eq!(status.state, DeviceState::Offline);
        assert!(status.detail.unwrap().contains("timed out"));
        assert_eq!(cache.get("router").state, DeviceState::Online);
    }

    #[tokio::test(start_paused = true)]
    async fn should_bound_parallel_probes() {
        let ids = ["a", "b", "c", "d", "e", "f"];
        let (poller, prober, _cache) = make_poller(&ids, settings());
        for id in ids {
            prober.set(id, Script::Up);
        }

        poller.sweep().await;

        assert_eq!(prober.max_in_flight.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn should_flip_status_between_sweeps() {
        let (poller, prober, cache) = make_poller(&["nas-1"], settings());
        prober.set("nas-1", Script::Down);
        poller.sweep().await;
        assert_eq!(cache.get("nas-1").state, DeviceState::Offline);

        prober.set("nas-1", Script::Up);
        poller.sweep().await;
        assert_eq!(cache.get("nas-1").state, DeviceState::Online);
    }

    #[tokio::test(start_paused = true)]
    async fn should_sweep_on_interval_until_cancelled() {
        let (poller, prober, cache) = make_poller(&["nas-1"], settings());
        prober.set("nas-1", Script::Up);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(Arc::clone(&poller).run(cancel.clone()));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(cache.get("nas-1").state, DeviceState::Online);

        prober.set("nas-1", Script::Down);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(cache.get("nas-1").state, DeviceState::Offline);

        cancel.cancel();
        handle.await.unwrap();
    }
}
