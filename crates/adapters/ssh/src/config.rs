//! SSH client configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// How the `ssh` client is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// Client binary.
    pub binary: String,
    /// Directory for multiplexing sockets. Defaults to a per-process
    /// directory under the system temp dir.
    pub control_dir: Option<PathBuf>,
    /// How long an idle master connection stays open, in seconds.
    pub control_persist_secs: u64,
    /// Value of `StrictHostKeyChecking`.
    pub strict_host_key_checking: String,
}

impl SshConfig {
    /// The control directory to use, resolving the default.
    #[must_use]
    pub fn control_dir(&self) -> PathBuf {
        self.control_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!("deq-ssh-{}", std::process::id()))
        })
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            binary: "ssh".to_string(),
            control_dir: None,
            control_persist_secs: 60,
            strict_host_key_checking: "accept-new".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = SshConfig::default();
        assert_eq!(config.binary, "ssh");
        assert_eq!(config.control_persist_secs, 60);
        assert_eq!(config.strict_host_key_checking, "accept-new");
        assert!(config.control_dir.is_none());
    }

    #[test]
    fn should_default_to_per_process_control_dir() {
        let dir = SshConfig::default().control_dir();
        let name = dir.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, format!("deq-ssh-{}", std::process::id()));
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            binary = "/usr/bin/ssh"
            control_dir = "/run/deq/ssh"
            control_persist_secs = 300
        "#;
        let config: SshConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.binary, "/usr/bin/ssh");
        assert_eq!(config.control_dir(), PathBuf::from("/run/deq/ssh"));
        assert_eq!(config.control_persist_secs, 300);
        assert_eq!(config.strict_host_key_checking, "accept-new");
    }
}
