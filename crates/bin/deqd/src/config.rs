//! Daemon configuration — TOML file with environment variable overrides.
//!
//! Every section has defaults so an empty (or missing) file yields a working
//! daemon that watches no devices.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use deq_adapter_net::WolConfig;
use deq_adapter_ssh::SshConfig;
use deq_domain::device::Device;
use deq_domain::error::DeqError;
use deq_domain::settings::{ActionSettings, PollerSettings, SchedulerSettings, Settings};

/// Configuration file read when `DEQ_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "deq.toml";

/// Upper bound for every interval and timeout, in seconds.
pub const MAX_DURATION_SECS: u64 = 86_400;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub poller: PollerSettings,
    pub scheduler: SchedulerSettings,
    pub actions: ActionSettings,
    pub wake: WolConfig,
    pub ssh: SshConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub devices: Vec<Device>,
    /// Free-form `[extensions.<name>]` tables, passed through to extensions.
    pub extensions: BTreeMap<String, serde_json::Value>,
}

/// Where rendered dashboards go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON snapshot rewritten after every render. Disabled when unset.
    pub snapshot_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "deqd=info,deq=info".to_string(),
        }
    }
}

impl Config {
    /// Load from `DEQ_CONFIG` (or `deq.toml`), apply environment overrides
    /// and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, if an
    /// override is malformed, or if validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("DEQ_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or mistyped values.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `DEQ_*` overrides, then `RUST_LOG`, read through `var`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when an interval override is not
    /// a whole number of seconds.
    pub fn apply_env_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var("DEQ_POLL_INTERVAL") {
            self.poller.interval_secs = parse_secs("DEQ_POLL_INTERVAL", &value)?;
        }
        if let Some(value) = var("DEQ_RENDER_INTERVAL") {
            self.scheduler.interval_secs = parse_secs("DEQ_RENDER_INTERVAL", &value)?;
        }
        if let Some(path) = var("DEQ_SNAPSHOT_PATH") {
            self.output.snapshot_path = (!path.is_empty()).then(|| PathBuf::from(path));
        }
        if let Some(filter) = var("DEQ_LOG") {
            self.logging.filter = filter;
        }
        if let Some(filter) = var("RUST_LOG") {
            self.logging.filter = filter;
        }
        Ok(())
    }

    /// Check values serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("poller.interval_secs", self.poller.interval_secs, MAX_DURATION_SECS),
            ("poller.probe_timeout_ms", self.poller.probe_timeout_ms, MAX_DURATION_SECS * 1_000),
            ("scheduler.interval_secs", self.scheduler.interval_secs, MAX_DURATION_SECS),
            ("scheduler.timeout_secs", self.scheduler.timeout_secs, MAX_DURATION_SECS),
            ("actions.connect_timeout_secs", self.actions.connect_timeout_secs, MAX_DURATION_SECS),
            ("actions.command_timeout_secs", self.actions.command_timeout_secs, MAX_DURATION_SECS),
        ];
        for (key, value, max) in durations {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{key} must be greater than 0")));
            }
            if value > max {
                return Err(ConfigError::Validation(format!("{key} must be at most {max}")));
            }
        }
        if self.poller.parallelism == 0 {
            return Err(ConfigError::Validation(
                "poller.parallelism must be greater than 0".to_string(),
            ));
        }
        if self.wake.ports.is_empty() {
            return Err(ConfigError::Validation(
                "wake.ports must list at least one port".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.devices.len());
        for device in &self.devices {
            device
                .validate()
                .map_err(|err| ConfigError::Validation(format!("device {}: {}", device.id, describe(&err))))?;
            if !seen.insert(&device.id) {
                return Err(ConfigError::Validation(format!(
                    "device {} is defined more than once",
                    device.id
                )));
            }
        }

        for (name, table) in &self.extensions {
            if !table.is_object() {
                return Err(ConfigError::Validation(format!(
                    "extensions.{name} must be a table"
                )));
            }
        }
        Ok(())
    }

    /// The settings snapshot handed to the core and its extensions.
    #[must_use]
    pub fn settings(&self) -> Settings {
        Settings {
            poller: self.poller.clone(),
            scheduler: self.scheduler.clone(),
            actions: self.actions.clone(),
            extensions: self.extensions.clone(),
        }
    }
}

/// The innermost message of a domain error.
fn describe(err: &DeqError) -> String {
    std::error::Error::source(err).map_or_else(|| err.to_string(), ToString::to_string)
}

fn parse_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key} must be a number of seconds, got {value:?}")))
}

/// Configuration loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}
