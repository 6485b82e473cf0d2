//! `RemoteShell` over the system OpenSSH client.
//!
//! Every command is a fresh `ssh` invocation, but connections to the same
//! host are multiplexed over one master connection (`ControlMaster=auto`),
//! so only the first command per host pays for the handshake.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use tokio::process::Command;

use deq_app::ports::RemoteShell;
use deq_domain::action::ActionResult;
use deq_domain::device::{Device, RemoteAccess};
use deq_domain::settings::ActionSettings;

use crate::config::SshConfig;
use crate::error::SshError;

/// Exit status `ssh` itself uses for connection and protocol failures.
const SSH_CONNECTION_FAILURE: i32 = 255;

/// Remote shell backed by `ssh`.
#[derive(Debug, Clone)]
pub struct SshShell {
    config: SshConfig,
    control_dir: PathBuf,
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl SshShell {
    /// Prepare the shell and its control socket directory.
    ///
    /// # Errors
    ///
    /// Returns [`SshError::ControlDir`] if the directory cannot be created.
    pub fn new(config: SshConfig, settings: &ActionSettings) -> Result<Self, SshError> {
        let control_dir = config.control_dir();
        create_private_dir(&control_dir).map_err(|source| SshError::ControlDir {
            path: control_dir.clone(),
            source,
        })?;
        tracing::debug!(control_dir = %control_dir.display(), "ssh control directory ready");

        Ok(Self {
            config,
            control_dir,
            connect_timeout: settings.connect_timeout(),
            command_timeout: settings.command_timeout(),
        })
    }

    /// Build the `ssh` invocation for one command.
    fn command(&self, device: &Device, remote: &RemoteAccess, command: &str) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        cmd.args(["-o", "BatchMode=yes"])
            .arg("-o")
            .arg(format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)))
            .args(["-o", "ControlMaster=auto"])
            .arg("-o")
            .arg(format!(
                "ControlPath={}",
                self.control_dir.join("%C").display()
            ))
            .arg("-o")
            .arg(format!("ControlPersist={}s", self.config.control_persist_secs))
            .arg("-o")
            .arg(format!(
                "StrictHostKeyChecking={}",
                self.config.strict_host_key_checking
            ))
            .arg("-p")
            .arg(remote.port.to_string());
        if let Some(identity) = &remote.identity_file {
            cmd.arg("-i").arg(identity);
        }
        cmd.arg("-l")
            .arg(&remote.user)
            .arg(&device.address)
            .arg("--")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn execute(&self, device: &Device, remote: &RemoteAccess, command: &str) -> ActionResult {
        let started = Instant::now();
        let deadline = self.connect_timeout.saturating_add(self.command_timeout);
        let output = self.command(device, remote, command).output();

        match tokio::time::timeout(deadline, output).await {
            Ok(Ok(output)) => interpret(
                output.status.code(),
                String::from_utf8_lossy(&output.stdout).into_owned(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
                started.elapsed(),
            ),
            Ok(Err(err)) => ActionResult::failed(
                format!("cannot run {}: {err}", self.config.binary),
                started.elapsed(),
            ),
            Err(_) => ActionResult::failed(
                format!("command timed out after {}s", deadline.as_secs()),
                started.elapsed(),
            ),
        }
    }
}

impl RemoteShell for SshShell {
    fn run<'a>(
        &'a self,
        device: &'a Device,
        remote: &'a RemoteAccess,
        command: &'a str,
    ) -> BoxFuture<'a, ActionResult> {
        Box::pin(self.execute(device, remote, command))
    }
}

/// Turn the client's exit status and output into an action result.
fn interpret(code: Option<i32>, stdout: String, stderr: String, took: Duration) -> ActionResult {
    match code {
        Some(SSH_CONNECTION_FAILURE) => ActionResult {
            success: false,
            stdout,
            stderr: format!("ssh connection failed: {}", stderr.trim()),
            exit_code: Some(SSH_CONNECTION_FAILURE),
            duration: took,
        },
        Some(code) => ActionResult::completed(code, stdout, stderr, took),
        None => ActionResult {
            success: false,
            stdout,
            stderr: format!("ssh terminated by signal: {}", stderr.trim()),
            exit_code: None,
            duration: took,
        },
    }
}

fn create_private_dir(path: &Path) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path)
}
