//! `devices` — one section listing every device with its current status.

use std::fmt::Write as _;

use serde::Deserialize;

use deq_app::Core;
use deq_app::ports::{Extension, ExtensionError, render_fn};
use deq_domain::device::DeviceSummary;
use deq_domain::error::DeqError;
use deq_domain::status::DeviceStatus;

use crate::html::escape;

/// Settings of the `[extensions.devices]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceOverviewConfig {
    pub id: String,
    pub title: String,
    pub icon: String,
}

impl Default for DeviceOverviewConfig {
    fn default() -> Self {
        Self {
            id: "devices".to_string(),
            title: "Devices".to_string(),
            icon: "server".to_string(),
        }
    }
}

/// Device list with state, latency and last check time.
#[derive(Debug, Default)]
pub struct DeviceOverview;

impl DeviceOverview {
    pub const NAME: &'static str = "devices";
}

impl Extension for DeviceOverview {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn register(&self, core: &Core) -> Result<(), DeqError> {
        let config: DeviceOverviewConfig = core.extension_config(Self::NAME)?;
        let handle = core.clone();
        core.register_section(
            &config.id,
            &config.title,
            &config.icon,
            render_fn(move || {
                let core = handle.clone();
                async move { Ok::<_, ExtensionError>(render(&core)) }
            }),
        )
    }
}

fn render(core: &Core) -> String {
    let devices = core.devices();
    if devices.is_empty() {
        return r#"<p class="deq-empty">No devices configured</p>"#.to_string();
    }

    let mut out = String::from(r#"<ul class="deq-devices">"#);
    for device in &devices {
        let status = core.status(device.id.as_str());
        write_row(&mut out, device, &status);
    }
    out.push_str("</ul>");
    out
}

fn write_row(out: &mut String, device: &DeviceSummary, status: &DeviceStatus) {
    let latency = status
        .latency_ms
        .map(|ms| format!("{ms} ms"))
        .unwrap_or_default();
    let checked = status
        .last_checked
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    let _ = write!(
        out,
        r#"<li class="deq-device deq-{state}" data-device="{id}"><span class="deq-name">{name}</span> <span class="deq-address">{address}</span> <span class="deq-state">{state}</span> <span class="deq-latency">{latency}</span> <span class="deq-checked">{checked}</span></li>"#,
        state = status.state,
        id = escape(device.id.as_str()),
        name = escape(&device.name),
        address = escape(&device.address),
    );
}
