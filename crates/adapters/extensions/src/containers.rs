//! `containers` — a status table for configured `(device, container)` pairs.
//!
//! Only the read-only status query is issued. Devices currently offline are
//! not contacted.

use std::fmt::Write as _;

use futures_util::future::join_all;
use serde::Deserialize;

use deq_app::Core;
use deq_app::ports::{Extension, ExtensionError, render_fn};
use deq_domain::action::ContainerAction;
use deq_domain::error::{ConfigurationError, DeqError};
use deq_domain::id::DeviceId;
use deq_domain::status::DeviceState;

use crate::html::escape;

/// One container to watch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerTarget {
    pub device: String,
    pub container: String,
}

/// Settings of the `[extensions.containers]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContainerPanelConfig {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub targets: Vec<ContainerTarget>,
}

impl Default for ContainerPanelConfig {
    fn default() -> Self {
        Self {
            id: "containers".to_string(),
            title: "Containers".to_string(),
            icon: "box".to_string(),
            targets: Vec::new(),
        }
    }
}

/// Container status table.
#[derive(Debug, Default)]
pub struct ContainerPanel;

impl ContainerPanel {
    pub const NAME: &'static str = "containers";
}

impl Extension for ContainerPanel {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn register(&self, core: &Core) -> Result<(), DeqError> {
        let config: ContainerPanelConfig = core.extension_config(Self::NAME)?;
        for target in &config.targets {
            if !core.has_device(&target.device) {
                let id = DeviceId::new(&target.device)?;
                return Err(ConfigurationError::UnknownDevice(id).into());
            }
        }

        let handle = core.clone();
        let targets = config.targets;
        core.register_section(
            &config.id,
            &config.title,
            &config.icon,
            render_fn(move || {
                let core = handle.clone();
                let targets = targets.clone();
                async move { Ok::<_, ExtensionError>(render(&core, &targets).await) }
            }),
        )
    }
}

async fn render(core: &Core, targets: &[ContainerTarget]) -> String {
    if targets.is_empty() {
        return r#"<p class="deq-empty">No containers configured</p>"#.to_string();
    }

    let rows = join_all(targets.iter().map(|target| row_state(core, target))).await;

    let mut out = String::from(
        r#"<table class="deq-containers"><thead><tr><th>Device</th><th>Container</th><th>State</th></tr></thead><tbody>"#,
    );
    for (target, state) in targets.iter().zip(rows) {
        let _ = write!(
            out,
            r#"<tr class="deq-container-{class}"><td>{device}</td><td>{container}</td><td>{state}</td></tr>"#,
            class = escape(&state.replace(' ', "-")),
            device = escape(&target.device),
            container = escape(&target.container),
            state = escape(&state),
        );
    }
    out.push_str("</tbody></table>");
    out
}

async fn row_state(core: &Core, target: &ContainerTarget) -> String {
    if core.status(&target.device).state == DeviceState::Offline {
        return "offline".to_string();
    }
    match core
        .container_control(&target.device, &target.container, ContainerAction::Status)
        .await
    {
        Ok(report) => match report.state {
            Some(state) => state.to_string(),
            None => "unknown".to_string(),
        },
        Err(err) => {
            tracing::debug!(device_id = %target.device, container = %target.container, error = %err, "container status unavailable");
            "unknown".to_string()
        }
    }
}
