//! Device — a configured network endpoint the dashboard watches and controls.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DeqError, ValidationError};
use crate::id::DeviceId;
use crate::mac::MacAddress;

/// Default SSH port for remote execution.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// A network device loaded from configuration.
///
/// Immutable for the lifetime of the process. The core references devices
/// through shared slices; it never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Hostname or IP address.
    pub address: String,
    pub mac: Option<MacAddress>,
    /// TCP port used by the connect probe. Falls back to the probe default.
    pub probe_port: Option<u16>,
    /// Credentials reference for remote execution, if the device allows it.
    pub remote: Option<RemoteAccess>,
    pub shutdown_command: Option<String>,
    pub suspend_command: Option<String>,
}

/// How to open a remote session on a device.
///
/// This is a *reference* to credentials (user + key path), never the secret
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAccess {
    pub user: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
}

fn default_ssh_port() -> u16 {
    DEFAULT_SSH_PORT
}

impl RemoteAccess {
    #[must_use]
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            port: DEFAULT_SSH_PORT,
            identity_file: None,
        }
    }
}

/// The view of a device handed to extensions. Carries no credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub id: DeviceId,
    pub name: String,
    pub address: String,
    pub mac: Option<MacAddress>,
    pub remote_enabled: bool,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DeqError::Validation`] when `name` or `address` is empty.
    pub fn validate(&self) -> Result<(), DeqError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.address.trim().is_empty() {
            return Err(ValidationError::EmptyAddress.into());
        }
        Ok(())
    }

    /// Strip credentials for exposure to extensions.
    #[must_use]
    pub fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
            mac: self.mac,
            remote_enabled: self.remote.is_some(),
        }
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    address: Option<String>,
    mac: Option<MacAddress>,
    probe_port: Option<u16>,
    remote: Option<RemoteAccess>,
    shutdown_command: Option<String>,
    suspend_command: Option<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn mac(mut self, mac: MacAddress) -> Self {
        self.mac = Some(mac);
        self
    }

    #[must_use]
    pub fn probe_port(mut self, port: u16) -> Self {
        self.probe_port = Some(port);
        self
    }

    #[must_use]
    pub fn remote(mut self, remote: RemoteAccess) -> Self {
        self.remote = Some(remote);
        self
    }

    #[must_use]
    pub fn shutdown_command(mut self, command: impl Into<String>) -> Self {
        self.shutdown_command = Some(command.into());
        self
    }

    #[must_use]
    pub fn suspend_command(mut self, command: impl Into<String>) -> Self {
        self.suspend_command = Some(command.into());
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`DeqError::Validation`] if the id is missing, or if the name
    /// or address is missing or empty.
    pub fn build(self) -> Result<Device, DeqError> {
        let id = self.id.ok_or(ValidationError::EmptyId)?;
        let device = Device {
            id,
            name: self.name.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            mac: self.mac,
            probe_port: self.probe_port,
            remote: self.remote,
            shutdown_command: self.shutdown_command,
            suspend_command: self.suspend_command,
        };
        device.validate()?;
        Ok(device)
    }
}
