//! Remote action executor — privileged operations against configured devices.
//!
//! Every operation resolves the device first; an unconfigured id is the only
//! error returned to the caller. Transport problems, timeouts and failing
//! commands all come back as a failed [`ActionResult`].

use std::sync::Arc;
use std::time::Instant;

use deq_domain::action::{ActionResult, ContainerAction, ContainerReport, ContainerState};
use deq_domain::device::Device;
use deq_domain::error::{DeqError, ValidationError};
use deq_domain::settings::ActionSettings;

use crate::devices::DeviceDirectory;
use crate::ports::{RemoteShell, WakeSender};

/// Command used when a device has no shutdown override.
pub const DEFAULT_SHUTDOWN_COMMAND: &str = "sudo -n shutdown -h now";
/// Command used when a device has no suspend override.
pub const DEFAULT_SUSPEND_COMMAND: &str = "sudo -n systemctl suspend";

/// Runs wake, power and container operations on behalf of the facade.
pub struct ActionExecutor {
    devices: DeviceDirectory,
    shell: Arc<dyn RemoteShell>,
    waker: Arc<dyn WakeSender>,
    settings: ActionSettings,
}

impl ActionExecutor {
    pub fn new(
        devices: DeviceDirectory,
        shell: Arc<dyn RemoteShell>,
        waker: Arc<dyn WakeSender>,
        settings: ActionSettings,
    ) -> Self {
        Self {
            devices,
            shell,
            waker,
            settings,
        }
    }

    /// Broadcast a Wake-on-LAN packet for the device.
    ///
    /// Success only means the packet was sent.
    ///
    /// # Errors
    ///
    /// Returns [`DeqError::NotFound`] when the device is not configured.
    #[tracing::instrument(skip(self))]
    pub async fn wake(&self, device_id: &str) -> Result<ActionResult, DeqError> {
        let device = self.devices.require(device_id)?;
        let started = Instant::now();

        let Some(mac) = device.mac else {
            let result = ActionResult::failed("no MAC address configured", started.elapsed());
            log_result("wake", device, &result);
            return Ok(result);
        };

        let result = match self.waker.send_magic_packet(mac).await {
            Ok(()) => ActionResult::ok(started.elapsed()),
            Err(err) => ActionResult::failed(
                format!("failed to send wake packet: {err}"),
                started.elapsed(),
            ),
        };
        log_result("wake", device, &result);
        Ok(result)
    }

    /// Power the device off over the remote shell.
    ///
    /// # Errors
    ///
    /// Returns [`DeqError::NotFound`] when the device is not configured.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self, device_id: &str) -> Result<ActionResult, DeqError> {
        let device = self.devices.require(device_id)?;
        let command = device
            .shutdown_command
            .as_deref()
            .unwrap_or(DEFAULT_SHUTDOWN_COMMAND);
        let result = self.run_remote(device, command).await;
        log_result("shutdown", device, &result);
        Ok(result)
    }

    /// Suspend the device over the remote shell.
    ///
    /// # Errors
    ///
    /// Returns [`DeqError::NotFound`] when the device is not configured.
    #[tracing::instrument(skip(self))]
    pub async fn suspend(&self, device_id: &str) -> Result<ActionResult, DeqError> {
        let device = self.devices.require(device_id)?;
        let command = device
            .suspend_command
            .as_deref()
            .unwrap_or(DEFAULT_SUSPEND_COMMAND);
        let result = self.run_remote(device, command).await;
        log_result("suspend", device, &result);
        Ok(result)
    }

    /// Start, stop or inspect a container on the device.
    ///
    /// `Status` never changes container state and is the only action that
    /// fills [`ContainerReport::state`].
    ///
    /// # Errors
    ///
    /// Returns [`DeqError::NotFound`] when the device is not configured and
    /// [`DeqError::Validation`] for an empty container name.
    #[tracing::instrument(skip(self))]
    pub async fn container_control(
        &self,
        device_id: &str,
        container: &str,
        action: ContainerAction,
    ) -> Result<ContainerReport, DeqError> {
        let device = self.devices.require(device_id)?;
        if container.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let command = container_command(container, action);
        let result = self.run_remote(device, &command).await;
        let state = action.is_read_only().then(|| container_state(&result)).flatten();

        tracing::info!(
            device_id = %device.id,
            container,
            %action,
            success = result.success,
            state = state.as_ref().map(ToString::to_string),
            duration_ms = millis(&result),
            "container action finished"
        );
        Ok(ContainerReport {
            container: container.to_string(),
            action,
            result,
            state,
        })
    }

    /// Run an arbitrary command on the device, unmodified.
    ///
    /// # Errors
    ///
    /// Returns [`DeqError::NotFound`] when the device is not configured.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, device_id: &str, command: &str) -> Result<ActionResult, DeqError> {
        let device = self.devices.require(device_id)?;
        let result = self.run_remote(device, command).await;
        log_result("execute", device, &result);
        Ok(result)
    }

    async fn run_remote(&self, device: &Device, command: &str) -> ActionResult {
        let started = Instant::now();
        let Some(remote) = device.remote.as_ref() else {
            return ActionResult::failed("remote access not configured", started.elapsed());
        };

        let deadline = self.settings.action_deadline();
        match tokio::time::timeout(deadline, self.shell.run(device, remote, command)).await {
            Ok(result) => result,
            Err(_) => ActionResult::failed(
                format!("command timed out after {}s", deadline.as_secs()),
                started.elapsed(),
            ),
        }
    }
}

fn container_command(container: &str, action: ContainerAction) -> String {
    let name = shell_words::quote(container);
    match action {
        ContainerAction::Start => format!("docker start {name}"),
        ContainerAction::Stop => format!("docker stop {name}"),
        ContainerAction::Status => {
            format!("docker inspect --format '{{{{.State.Status}}}}' {name}")
        }
    }
}

fn container_state(result: &ActionResult) -> Option<ContainerState> {
    if result.success {
        return Some(ContainerState::parse_status(&result.stdout));
    }
    if result.exit_code.is_some() && result.stderr.contains("No such") {
        return Some(ContainerState::Missing);
    }
    None
}

fn millis(result: &ActionResult) -> u64 {
    u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX)
}

fn log_result(action: &'static str, device: &Device, result: &ActionResult) {
    if result.success {
        tracing::info!(
            device_id = %device.id,
            action,
            duration_ms = millis(result),
            "action succeeded"
        );
    } else {
        tracing::warn!(
            device_id = %device.id,
            action,
            exit_code = result.exit_code,
            stderr = result.stderr.trim(),
            duration_ms = millis(result),
            "action failed"
        );
    }
}
