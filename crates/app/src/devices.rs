//! Device directory — the immutable, shared list of configured devices.

use std::collections::HashMap;
use std::sync::Arc;

use deq_domain::device::{Device, DeviceSummary};
use deq_domain::error::{ConfigurationError, NotFoundError};
use deq_domain::id::DeviceId;

/// Ordered, indexed device list loaded once at startup.
///
/// Cheap to clone. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct DeviceDirectory {
    devices: Arc<[Device]>,
    index: Arc<HashMap<DeviceId, usize>>,
}

impl DeviceDirectory {
    /// Build the directory, keeping configuration order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateDevice`] if two devices share an id.
    pub fn new(devices: Vec<Device>) -> Result<Self, ConfigurationError> {
        let mut index = HashMap::with_capacity(devices.len());
        for (position, device) in devices.iter().enumerate() {
            if index.insert(device.id.clone(), position).is_some() {
                return Err(ConfigurationError::DuplicateDevice(device.id.clone()));
            }
        }
        Ok(Self {
            devices: devices.into(),
            index: Arc::new(index),
        })
    }

    /// Look up a device by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Device> {
        self.index.get(id).map(|&position| &self.devices[position])
    }

    /// Look up a device by id, failing with "no such device".
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when the id is not configured.
    pub fn require(&self, id: &str) -> Result<&Device, NotFoundError> {
        self.get(id).ok_or_else(|| NotFoundError::device(id))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Devices in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Credential-free copies for extensions.
    #[must_use]
    pub fn summaries(&self) -> Vec<DeviceSummary> {
        self.devices.iter().map(Device::summary).collect()
    }
}
