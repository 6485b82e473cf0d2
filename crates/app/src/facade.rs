//! Core facade — the capability object handed to extensions.
//!
//! Extensions never see the cache, the executor or raw credentials directly.
//! Everything they may read or trigger goes through [`Core`], which owns no
//! state of its own and is cheap to clone into render callbacks.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use deq_domain::action::{ActionResult, ContainerAction, ContainerReport};
use deq_domain::device::DeviceSummary;
use deq_domain::error::{ConfigurationError, DeqError};
use deq_domain::section::SectionSpec;
use deq_domain::settings::Settings;
use deq_domain::status::DeviceStatus;

use crate::devices::DeviceDirectory;
use crate::executor::ActionExecutor;
use crate::ports::RenderFn;
use crate::registry::{SectionRegistry, SectionTable};
use crate::status_cache::StatusCache;

/// Handle through which extensions reach the core.
#[derive(Clone)]
pub struct Core {
    devices: DeviceDirectory,
    settings: Arc<Settings>,
    cache: Arc<StatusCache>,
    executor: Arc<ActionExecutor>,
    registry: Arc<SectionRegistry>,
}

impl Core {
    #[must_use]
    pub fn new(
        devices: DeviceDirectory,
        settings: Arc<Settings>,
        cache: Arc<StatusCache>,
        executor: Arc<ActionExecutor>,
        registry: Arc<SectionRegistry>,
    ) -> Self {
        Self {
            devices,
            settings,
            cache,
            executor,
            registry,
        }
    }

    // ── Read-only access ───────────────────────────────────────────

    /// Every configured device in configuration order, without credentials.
    #[must_use]
    pub fn devices(&self) -> Vec<DeviceSummary> {
        self.devices.summaries()
    }

    /// A copy of the runtime settings.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings.as_ref().clone()
    }

    /// Typed `[extensions.<name>]` table, or `T::default()` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidExtensionSettings`] when the
    /// table does not match `T`.
    pub fn extension_config<T>(&self, name: &str) -> Result<T, DeqError>
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.settings.extensions.get(name) else {
            return Ok(T::default());
        };
        T::deserialize(raw).map_err(|err| {
            ConfigurationError::InvalidExtensionSettings {
                extension: name.to_string(),
                reason: err.to_string(),
            }
            .into()
        })
    }

    /// Whether `device_id` names a configured device.
    #[must_use]
    pub fn has_device(&self, device_id: &str) -> bool {
        self.devices.contains(device_id)
    }

    /// Latest cached status. Never blocks and never fails; unknown ids and
    /// stale records read as `Unknown`.
    #[must_use]
    pub fn status(&self, device_id: &str) -> DeviceStatus {
        self.cache.get(device_id)
    }

    // ── Privileged actions ─────────────────────────────────────────

    /// # Errors
    ///
    /// Returns [`DeqError::NotFound`] for an unconfigured device.
    pub async fn wake(&self, device_id: &str) -> Result<ActionResult, DeqError> {
        self.executor.wake(device_id).await
    }

    /// # Errors
    ///
    /// Returns [`DeqError::NotFound`] for an unconfigured device.
    pub async fn shutdown(&self, device_id: &str) -> Result<ActionResult, DeqError> {
        self.executor.shutdown(device_id).await
    }

    /// # Errors
    ///
    /// Returns [`DeqError::NotFound`] for an unconfigured device.
    pub async fn suspend(&self, device_id: &str) -> Result<ActionResult, DeqError> {
        self.executor.suspend(device_id).await
    }

    /// # Errors
    ///
    /// Returns [`DeqError::NotFound`] for an unconfigured device and
    /// [`DeqError::Validation`] for an empty container name.
    pub async fn container_control(
        &self,
        device_id: &str,
        container: &str,
        action: ContainerAction,
    ) -> Result<ContainerReport, DeqError> {
        self.executor
            .container_control(device_id, container, action)
            .await
    }

    /// # Errors
    ///
    /// Returns [`DeqError::NotFound`] for an unconfigured device.
    pub async fn execute(&self, device_id: &str, command: &str) -> Result<ActionResult, DeqError> {
        self.executor.execute(device_id, command).await
    }

    // ── Registration ───────────────────────────────────────────────

    /// Register a dashboard section. Only valid while extensions load.
    ///
    /// # Errors
    ///
    /// Returns [`DeqError::Validation`] for an invalid id or empty title and
    /// [`DeqError::Configuration`] for a duplicate id or a closed registry.
    pub fn register_section(
        &self,
        id: &str,
        title: &str,
        icon: &str,
        render: RenderFn,
    ) -> Result<(), DeqError> {
        let spec = SectionSpec::new(id, title, icon)?;
        self.registry.register(spec, render)?;
        Ok(())
    }

    pub(crate) fn seal_registry(&self) -> Result<SectionTable, ConfigurationError> {
        self.registry.seal()
    }
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core")
            .field("devices", &self.devices.len())
            .field("sealed", &self.registry.is_sealed())
            .finish_non_exhaustive()
    }
}
