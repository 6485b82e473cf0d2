//! `commands` — one section per configured remote command.
//!
//! The command output is rendered as preformatted text. A failing command
//! fails the render, so the dashboard keeps showing the previous output.

use serde::Deserialize;

use deq_app::Core;
use deq_app::ports::{Extension, ExtensionError, render_fn};
use deq_domain::error::{ConfigurationError, DeqError};
use deq_domain::id::DeviceId;

use crate::html::escape;

/// One command panel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandPanelConfig {
    pub id: String,
    pub title: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub device: String,
    pub command: String,
}

fn default_icon() -> String {
    "terminal".to_string()
}

/// Settings of the `[extensions.commands]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommandPanelsConfig {
    pub panels: Vec<CommandPanelConfig>,
}

/// Sections showing the output of remote commands.
#[derive(Debug, Default)]
pub struct CommandPanel;

impl CommandPanel {
    pub const NAME: &'static str = "commands";
}

impl Extension for CommandPanel {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn register(&self, core: &Core) -> Result<(), DeqError> {
        let config: CommandPanelsConfig = core.extension_config(Self::NAME)?;
        for panel in config.panels {
            let device = DeviceId::new(&panel.device)?;
            if !core.has_device(device.as_str()) {
                return Err(ConfigurationError::UnknownDevice(device).into());
            }

            let handle = core.clone();
            let command = panel.command.clone();
            core.register_section(
                &panel.id,
                &panel.title,
                &panel.icon,
                render_fn(move || {
                    let core = handle.clone();
                    let device = device.clone();
                    let command = command.clone();
                    async move { render(&core, device.as_str(), &command).await }
                }),
            )?;
        }
        Ok(())
    }
}

async fn render(core: &Core, device_id: &str, command: &str) -> Result<String, ExtensionError> {
    let result = core.execute(device_id, command).await?;
    if !result.success {
        let reason = result.stderr.trim();
        return Err(match result.exit_code {
            Some(code) => format!("command exited with status {code}: {reason}").into(),
            None => reason.to_string().into(),
        });
    }
    Ok(format!(
        r#"<pre class="deq-command">{}</pre>"#,
        escape(result.stdout.trim_end())
    ))
}
