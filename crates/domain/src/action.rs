//! Results of privileged remote actions.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of one remote action.
///
/// Transport and execution failures are reported here with
/// `success == false`; they are never raised to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Remote exit status, when the command actually ran.
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl ActionResult {
    /// A successful action with no captured output.
    #[must_use]
    pub fn ok(duration: Duration) -> Self {
        Self {
            success: true,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            duration,
        }
    }

    /// A failed action that never produced an exit status.
    #[must_use]
    pub fn failed(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: message.into(),
            exit_code: None,
            duration,
        }
    }

    /// A command that ran to completion; success follows the exit status.
    #[must_use]
    pub fn completed(exit_code: i32, stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            success: exit_code == 0,
            stdout,
            stderr,
            exit_code: Some(exit_code),
            duration,
        }
    }
}

/// Operation requested on a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerAction {
    Start,
    Stop,
    /// Read-only; never changes container state.
    Status,
}

impl ContainerAction {
    #[must_use]
    pub fn is_read_only(self) -> bool {
        matches!(self, Self::Status)
    }
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
            Self::Status => f.write_str("status"),
        }
    }
}

/// Error returned when parsing an unknown container action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown container action {0:?} (expected start, stop or status)")]
pub struct ParseContainerActionError(pub String);

impl FromStr for ContainerAction {
    type Err = ParseContainerActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "status" => Ok(Self::Status),
            other => Err(ParseContainerActionError(other.to_string())),
        }
    }
}

/// Runtime state of a container as reported by the container engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Exited,
    Paused,
    Restarting,
    Created,
    /// The engine does not know the container.
    Missing,
    Other(String),
}

impl ContainerState {
    /// Interpret the engine's status word (`docker inspect` `.State.Status`).
    #[must_use]
    pub fn parse_status(raw: &str) -> Self {
        match raw.trim() {
            "running" => Self::Running,
            "exited" | "dead" => Self::Exited,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "created" => Self::Created,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Exited => f.write_str("exited"),
            Self::Paused => f.write_str("paused"),
            Self::Restarting => f.write_str("restarting"),
            Self::Created => f.write_str("created"),
            Self::Missing => f.write_str("missing"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// Result of a container control request.
///
/// `state` is populated only for [`ContainerAction::Status`], which makes a
/// status query distinguishable from a start/stop by shape alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerReport {
    pub container: String,
    pub action: ContainerAction,
    pub result: ActionResult,
    pub state: Option<ContainerState>,
}
