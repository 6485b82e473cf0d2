//! Runtime settings of the core, as handed to extensions in the config
//! snapshot.
//!
//! Every section has defaults so a configuration file may omit any of them.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings of the whole core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub poller: PollerSettings,
    pub scheduler: SchedulerSettings,
    pub actions: ActionSettings,
    /// Free-form per-extension tables (`[extensions.<name>]`).
    pub extensions: BTreeMap<String, serde_json::Value>,
}

/// Reachability probe mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStrategy {
    /// TCP connect to the device's probe port.
    #[default]
    Tcp,
    /// One ICMP echo via the system `ping` binary.
    Ping,
}

/// Device status poller settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerSettings {
    pub interval_secs: u64,
    pub probe_timeout_ms: u64,
    /// Maximum number of probes in flight during one sweep.
    pub parallelism: usize,
    /// Number of missed sweeps after which a cached status reads as stale.
    pub stale_after_cycles: u32,
    pub probe: ProbeStrategy,
    /// TCP port probed when a device does not set its own.
    pub default_probe_port: u16,
}

impl PollerSettings {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Age beyond which a cached status must not be served as fresh.
    /// Saturates instead of overflowing.
    #[must_use]
    pub fn stale_after(&self) -> Duration {
        self.interval().saturating_mul(self.stale_after_cycles.max(1))
    }
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            probe_timeout_ms: 1500,
            parallelism: 8,
            stale_after_cycles: 3,
            probe: ProbeStrategy::Tcp,
            default_probe_port: 22,
        }
    }
}

/// Render scheduler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl SchedulerSettings {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            timeout_secs: 10,
        }
    }
}

/// Remote action settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSettings {
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: u64,
}

impl ActionSettings {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Upper bound for a whole remote action: connecting plus running.
    #[must_use]
    pub fn action_deadline(&self) -> Duration {
        self.connect_timeout().saturating_add(self.command_timeout())
    }
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            command_timeout_secs: 30,
        }
    }
}
