//! Device reachability status as produced by a probe.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;
use crate::time::{self, Timestamp};

/// Reachability of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    Online,
    Offline,
    #[default]
    Unknown,
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => f.write_str("online"),
            Self::Offline => f.write_str("offline"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// The latest known status of one device.
///
/// Always replaced as a whole record; never mutated field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_id: DeviceId,
    pub state: DeviceState,
    /// When the probe that produced this record finished. `None` until the
    /// first probe completes.
    pub last_checked: Option<Timestamp>,
    /// Round-trip time of a successful probe, in milliseconds.
    pub latency_ms: Option<u64>,
    /// Human-readable failure reason or staleness note.
    pub detail: Option<String>,
}

impl DeviceStatus {
    /// The initial record: never probed.
    #[must_use]
    pub fn unknown(device_id: DeviceId) -> Self {
        Self {
            device_id,
            state: DeviceState::Unknown,
            last_checked: None,
            latency_ms: None,
            detail: None,
        }
    }

    /// Build a record from a completed probe.
    #[must_use]
    pub fn from_outcome(device_id: DeviceId, outcome: ProbeOutcome, checked_at: Timestamp) -> Self {
        let (state, latency_ms, detail) = match outcome {
            ProbeOutcome::Reachable { latency } => (
                DeviceState::Online,
                Some(u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)),
                None,
            ),
            ProbeOutcome::Unreachable { reason } => (DeviceState::Offline, None, Some(reason)),
            ProbeOutcome::Inconclusive { reason } => (DeviceState::Unknown, None, Some(reason)),
        };
        Self {
            device_id,
            state,
            last_checked: Some(checked_at),
            latency_ms,
            detail,
        }
    }

    /// Whether this record is older than `max_age` at `now`.
    ///
    /// Records that were never checked are not considered stale; they are
    /// already `Unknown`.
    #[must_use]
    pub fn is_stale(&self, max_age: Duration, now: Timestamp) -> bool {
        self.last_checked
            .is_some_and(|checked| time::age(checked, now) > max_age)
    }

    /// Downgrade a stale record to `Unknown`, keeping `last_checked` so the
    /// reader can tell how old the last observation was.
    #[must_use]
    pub fn into_stale(self) -> Self {
        Self {
            state: DeviceState::Unknown,
            latency_ms: None,
            detail: Some(format!("stale: last seen {}", self.state)),
            ..self
        }
    }
}

/// Raw result of a reachability probe, before it is stamped into a
/// [`DeviceStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The host answered.
    Reachable { latency: Duration },
    /// The host did not answer (timeout, unreachable network, no reply).
    Unreachable { reason: String },
    /// The probe could not decide (name resolution failed, tool missing).
    Inconclusive { reason: String },
}
