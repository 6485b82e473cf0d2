//! Wiring of the core services and their background loops.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use deq_app::ports::{Extension, Prober, RemoteShell, WakeSender};
use deq_app::{
    ActionExecutor, Core, DeviceDirectory, RenderScheduler, SectionRegistry, StatusCache,
    StatusPoller, load_extensions,
};
use deq_domain::error::DeqError;

use crate::config::Config;
use crate::snapshot;

/// The outbound adapters the core runs on.
pub struct Adapters<P> {
    pub prober: P,
    pub shell: Arc<dyn RemoteShell>,
    pub waker: Arc<dyn WakeSender>,
}

/// A fully loaded core, ready to run.
pub struct Daemon<P> {
    core: Core,
    cache: Arc<StatusCache>,
    poller: Arc<StatusPoller<P>>,
    scheduler: Arc<RenderScheduler>,
    snapshot_path: Option<PathBuf>,
}

impl<P: Prober + 'static> Daemon<P> {
    /// Build the core from `config` and run the extension loading phase.
    ///
    /// # Errors
    ///
    /// Returns [`DeqError::Configuration`] for duplicate devices or for any
    /// extension that fails to register. Startup must not continue.
    pub fn assemble(
        config: &Config,
        adapters: Adapters<P>,
        extensions: &[Box<dyn Extension>],
    ) -> Result<Self, DeqError> {
        let devices = DeviceDirectory::new(config.devices.clone())?;
        let settings = Arc::new(config.settings());
        let cache = Arc::new(StatusCache::new(&devices, settings.poller.stale_after()));
        let executor = Arc::new(ActionExecutor::new(
            devices.clone(),
            adapters.shell,
            adapters.waker,
            settings.actions.clone(),
        ));
        let core = Core::new(
            devices.clone(),
            Arc::clone(&settings),
            Arc::clone(&cache),
            executor,
            Arc::new(SectionRegistry::new()),
        );

        let sections = load_extensions(&core, extensions)?;
        let scheduler = Arc::new(RenderScheduler::new(sections, settings.scheduler.clone()));
        let poller = Arc::new(StatusPoller::new(
            adapters.prober,
            devices,
            Arc::clone(&cache),
            settings.poller.clone(),
        ));

        Ok(Self {
            core,
            cache,
            poller,
            scheduler,
            snapshot_path: config.output.snapshot_path.clone(),
        })
    }

    #[must_use]
    pub fn core(&self) -> &Core {
        &self.core
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<StatusCache> {
        &self.cache
    }

    #[must_use]
    pub fn poller(&self) -> &Arc<StatusPoller<P>> {
        &self.poller
    }

    #[must_use]
    pub fn scheduler(&self) -> &Arc<RenderScheduler> {
        &self.scheduler
    }

    /// Run the poller, the scheduler and the snapshot exporter until `cancel`
    /// fires, then wait for all of them to stop.
    pub async fn run(self, cancel: CancellationToken) {
        let mut tasks = JoinSet::new();
        tasks.spawn(Arc::clone(&self.poller).run(cancel.clone()));
        tasks.spawn(Arc::clone(&self.scheduler).run(cancel.clone()));
        if let Some(path) = self.snapshot_path.clone() {
            tasks.spawn(snapshot::export(
                Arc::clone(&self.scheduler),
                path,
                cancel.clone(),
            ));
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                tracing::error!(%err, "background task failed");
                cancel.cancel();
            }
        }
        tracing::info!("all background tasks stopped");
    }
}
