//! Render scheduler: drives every section's render callback on one cadence.
//!
//! Each render runs in its own task under a deadline. Errors, panics and
//! timeouts are recorded on the section and never touch other sections. A
//! section whose previous render is still running is skipped for that tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use deq_domain::section::{SectionOutput, SectionView};
use deq_domain::settings::SchedulerSettings;
use deq_domain::time;

use crate::registry::{SectionSlot, SectionTable};

/// What happened to the sections during one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub rendered: usize,
    pub failed: usize,
    /// Sections still busy with an earlier render.
    pub skipped: usize,
}

/// Periodic invoker of render callbacks.
pub struct RenderScheduler {
    sections: SectionTable,
    settings: SchedulerSettings,
    changes: Arc<watch::Sender<u64>>,
}

impl RenderScheduler {
    #[must_use]
    pub fn new(sections: SectionTable, settings: SchedulerSettings) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            sections,
            settings,
            changes: Arc::new(changes),
        }
    }

    /// Current dashboard in registration order. Never waits on a render.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SectionView> {
        self.sections.iter().map(|slot| slot.view()).collect()
    }

    /// Counter bumped after every stored render result.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    #[must_use]
    pub fn sections(&self) -> &SectionTable {
        &self.sections
    }

    /// Run one cycle and wait until every started render has settled.
    pub async fn render_all(&self) -> RenderSummary {
        let (handles, skipped) = self.dispatch();
        let mut summary = RenderSummary {
            skipped,
            ..RenderSummary::default()
        };
        for handle in handles {
            match handle.await {
                Ok(true) => summary.rendered += 1,
                Ok(false) => summary.failed += 1,
                Err(err) => {
                    tracing::warn!(%err, "render supervisor failed");
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    /// Render on a fixed interval until `cancel` fires.
    ///
    /// Ticks do not wait for slow sections; a section still rendering from
    /// an earlier tick is skipped.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.settings.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            sections = self.sections.len(),
            interval_secs = self.settings.interval_secs,
            timeout_secs = self.settings.timeout_secs,
            "render scheduler started"
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let (_detached, skipped) = self.dispatch();
            if skipped > 0 {
                tracing::debug!(skipped, "sections still rendering, skipped this tick");
            }
        }

        tracing::info!("render scheduler stopped");
    }

    /// Start a render for every idle section.
    fn dispatch(&self) -> (Vec<JoinHandle<bool>>, usize) {
        let mut handles = Vec::with_capacity(self.sections.len());
        let mut skipped = 0;
        for slot in self.sections.iter() {
            if !slot.try_begin() {
                skipped += 1;
                continue;
            }
            let guard = InFlight(Arc::clone(slot));
            let timeout = self.settings.timeout();
            let changes = Arc::clone(&self.changes);
            handles.push(tokio::spawn(async move {
                render_section(&guard.0, timeout, &changes).await
            }));
        }
        (handles, skipped)
    }
}

/// Releases the section's in-flight flag however the render ends.
struct InFlight(Arc<SectionSlot>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Render one section and store the outcome. Returns `true` on success.
///
/// On timeout the failure is stored right away, but the function only
/// returns once the aborted callback has actually stopped. A callback that
/// blocks its thread keeps the section in flight until it yields.
async fn render_section(
    slot: &SectionSlot,
    timeout: Duration,
    changes: &watch::Sender<u64>,
) -> bool {
    let render = slot.render_fn();
    let mut task = tokio::spawn(async move { render().await });

    let (outcome, timed_out) = match tokio::time::timeout(timeout, &mut task).await {
        Ok(Ok(Ok(fragment))) => (Ok(fragment), false),
        Ok(Ok(Err(err))) => (Err(err.to_string()), false),
        Ok(Err(join)) if join.is_panic() => {
            (Err("render callback panicked".to_string()), false)
        }
        Ok(Err(join)) => (Err(format!("render callback cancelled: {join}")), false),
        Err(_) => (Err(format!("render timed out after {}s", timeout.as_secs())), true),
    };

    let section_id = &slot.spec().id;
    let ok = match outcome {
        Ok(fragment) => {
            slot.store(SectionOutput::rendered(fragment, time::now()));
            tracing::debug!(%section_id, "section rendered");
            true
        }
        Err(error) => {
            tracing::warn!(%section_id, %error, "section render failed, keeping previous output");
            let previous = slot.output();
            slot.store(previous.failed(error));
            false
        }
    };
    changes.send_modify(|version| *version = version.wrapping_add(1));

    if timed_out {
        task.abort();
        let _ = task.await;
        tracing::debug!(%section_id, "timed out render stopped");
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use deq_domain::section::{PLACEHOLDER_FRAGMENT, SectionSpec};

    use crate::ports::{ExtensionError, RenderFn, render_fn};
    use crate::registry::SectionRegistry;

    fn table(sections: Vec<(&str, RenderFn)>) -> SectionTable {
        let registry = SectionRegistry::new();
        for (id, render) in sections {
            registry
                .register(SectionSpec::new(id, id, "icon").unwrap(), render)
                .unwrap();
        }
        registry.seal().unwrap()
    }

    fn settings() -> SchedulerSettings {
        SchedulerSettings {
            interval_secs: 30,
            timeout_secs: 2,
        }
    }

    fn counting(counter: Arc<AtomicUsize>) -> RenderFn {
        render_fn(move || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, ExtensionError>(format!("<p>render {n}</p>"))
            }
        })
    }

    fn explode() -> String {
        panic!("extension bug")
    }

    fn hanging() -> RenderFn {
        render_fn(|| async {
            std::future::pending::<()>().await;
            Ok::<_, ExtensionError>(String::new())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn should_render_every_section_in_registration_order() {
        let scheduler = RenderScheduler::new(
            table(vec![
                ("b", render_fn(|| async { Ok::<_, ExtensionError>("<p>b</p>".into()) })),
                ("a", render_fn(|| async { Ok::<_, ExtensionError>("<p>a</p>".into()) })),
            ]),
            settings(),
        );

        let summary = scheduler.render_all().await;

        assert_eq!(summary.rendered, 2);
        let snapshot = scheduler.snapshot();
        assert_eq!(snapshot[0].id.as_str(), "b");
        assert_eq!(snapshot[0].fragment, "<p>b</p>");
        assert_eq!(snapshot[1].fragment, "<p>a</p>");
        assert!(snapshot.iter().all(|s| s.rendered_at.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_previous_output_when_render_fails() {
        let calls = Arc::new(AtomicUsize::new(0));
        let render = {
            let calls = Arc::clone(&calls);
            render_fn(move || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Ok("<p>good</p>".to_string())
                    } else {
                        Err::<String, ExtensionError>("disk query failed".into())
                    }
                }
            })
        };
        let scheduler = RenderScheduler::new(table(vec![("storage", render)]), settings());

        scheduler.render_all().await;
        let first = scheduler.snapshot().remove(0);
        let summary = scheduler.render_all().await;
        let second = scheduler.snapshot().remove(0);

        assert_eq!(summary.failed, 1);
        assert_eq!(second.fragment, "<p>good</p>");
        assert_eq!(second.rendered_at, first.rendered_at);
        assert_eq!(second.last_error.as_deref(), Some("disk query failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn should_clear_error_after_successful_render() {
        let calls = Arc::new(AtomicUsize::new(0));
        let render = {
            let calls = Arc::clone(&calls);
            render_fn(move || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Err::<String, ExtensionError>("boom".into())
                    } else {
                        Ok("<p>back</p>".to_string())
                    }
                }
            })
        };
        let scheduler = RenderScheduler::new(table(vec![("storage", render)]), settings());

        scheduler.render_all().await;
        let failed = scheduler.snapshot().remove(0);
        scheduler.render_all().await;
        let recovered = scheduler.snapshot().remove(0);

        assert_eq!(failed.fragment, PLACEHOLDER_FRAGMENT);
        assert_eq!(failed.last_error.as_deref(), Some("boom"));
        assert_eq!(recovered.fragment, "<p>back</p>");
        assert!(recovered.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_isolate_hanging_section() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scheduler = RenderScheduler::new(
            table(vec![
                ("stuck", hanging()),
                ("clock", counting(Arc::clone(&counter))),
            ]),
            settings(),
        );

        let started = tokio::time::Instant::now();
        let summary = scheduler.render_all().await;

        assert!(started.elapsed() <= Duration::from_secs(3));
        assert_eq!(summary.rendered, 1);
        assert_eq!(summary.failed, 1);
        let snapshot = scheduler.snapshot();
        assert_eq!(snapshot[0].fragment, PLACEHOLDER_FRAGMENT);
        assert!(snapshot[0].last_error.as_deref().unwrap().contains("timed out"));
        assert_eq!(snapshot[1].fragment, "<p>render 1</p>");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_not_overlap_renders_of_a_blocking_section() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let render = {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            render_fn(move || {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(1500));
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, ExtensionError>("<p>late</p>".to_string())
                }
            })
        };
        let scheduler = RenderScheduler::new(
            table(vec![("blocking", render)]),
            SchedulerSettings {
                interval_secs: 30,
                timeout_secs: 1,
            },
        );

        let (first, (second, stored_early)) = tokio::join!(scheduler.render_all(), async {
            tokio::time::sleep(Duration::from_millis(1200)).await;
            let stored = scheduler.snapshot()[0].last_error.clone();
            (scheduler.render_all().await, stored)
        });

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(first.failed, 1);
        assert_eq!(second.skipped, 1);
        assert_eq!(second.rendered + second.failed, 0);
        assert!(stored_early.unwrap().contains("timed out"));
        assert!(!scheduler.sections()[0].is_rendering());
        let view = scheduler.snapshot().remove(0);
        assert_eq!(view.fragment, PLACEHOLDER_FRAGMENT);
        assert!(view.last_error.unwrap().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn should_contain_panicking_callback() {
        let scheduler = RenderScheduler::new(
            table(vec![
                ("broken", render_fn(|| async { Ok::<_, ExtensionError>(explode()) })),
                ("fine", render_fn(|| async { Ok::<_, ExtensionError>("<p>ok</p>".into()) })),
            ]),
            settings(),
        );

        let summary = scheduler.render_all().await;

        assert_eq!(summary.failed, 1);
        let snapshot = scheduler.snapshot();
        assert_eq!(snapshot[0].last_error.as_deref(), Some("render callback panicked"));
        assert_eq!(snapshot[1].fragment, "<p>ok</p>");
        assert!(!scheduler.sections()[0].is_rendering());
    }

    #[tokio::test(start_paused = true)]
    async fn should_skip_section_still_in_flight() {
        let scheduler = RenderScheduler::new(
            table(vec![("slow", hanging())]),
            SchedulerSettings {
                interval_secs: 30,
                timeout_secs: 60,
            },
        );

        let (first, skipped_first) = scheduler.dispatch();
        let summary = scheduler.render_all().await;

        assert_eq!(first.len(), 1);
        assert_eq!(skipped_first, 0);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.rendered + summary.failed, 0);
        for handle in first {
            handle.await.unwrap();
        }
        assert!(!scheduler.sections()[0].is_rendering());
    }

    #[tokio::test(start_paused = true)]
    async fn should_render_on_interval_until_cancelled() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scheduler = Arc::new(RenderScheduler::new(
            table(vec![("clock", counting(Arc::clone(&counter)))]),
            settings(),
        ));
        let mut changes = scheduler.subscribe();
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(Arc::clone(&scheduler).run(cancel.clone()));
        changes.changed().await.unwrap();
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.snapshot()[0].fragment, "<p>render 3</p>");

        cancel.cancel();
        handle.await.unwrap();
    }
}
