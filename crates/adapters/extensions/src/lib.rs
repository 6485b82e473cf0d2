//! # deq-adapter-extensions
//!
//! Built-in dashboard extensions. They use nothing but the public [`Core`]
//! facade, exactly as a third-party extension would.
//!
//! | Extension | Config table | Sections |
//! |-----------|--------------|----------|
//! | [`DeviceOverview`] | `[extensions.devices]` | one device list |
//! | [`ContainerPanel`] | `[extensions.containers]` | one container status table |
//! | [`CommandPanel`] | `[extensions.commands]` | one per configured command |
//!
//! An extension is loaded only when its table sets `enabled = true`.
//!
//! ## Dependency rule
//! Depends on `deq-app` (facade and extension contract) and `deq-domain`.
//!
//! [`Core`]: deq_app::Core

pub mod commands;
pub mod containers;
pub mod devices;
pub mod html;

#[cfg(test)]
mod testing;

use deq_app::ports::Extension;
use deq_domain::settings::Settings;

pub use commands::CommandPanel;
pub use containers::ContainerPanel;
pub use devices::DeviceOverview;

/// Names of every built-in extension.
pub const BUILTIN: [&str; 3] = [DeviceOverview::NAME, ContainerPanel::NAME, CommandPanel::NAME];

/// Look up a built-in extension by name.
#[must_use]
pub fn builtin(name: &str) -> Option<Box<dyn Extension>> {
    match name {
        DeviceOverview::NAME => Some(Box::new(DeviceOverview)),
        ContainerPanel::NAME => Some(Box::new(ContainerPanel)),
        CommandPanel::NAME => Some(Box::new(CommandPanel)),
        _ => None,
    }
}

/// Whether `[extensions.<name>]` sets `enabled = true`.
#[must_use]
pub fn is_enabled(settings: &Settings, name: &str) -> bool {
    settings
        .extensions
        .get(name)
        .and_then(|table| table.get("enabled"))
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

/// The built-in extensions enabled in `settings`, in a stable order.
#[must_use]
pub fn enabled(settings: &Settings) -> Vec<Box<dyn Extension>> {
    BUILTIN
        .iter()
        .filter(|name| is_enabled(settings, name))
        .filter_map(|name| builtin(name))
        .collect()
}
