//! Extension host — the startup phase that loads extensions.
//!
//! Each configured extension registers through the facade exactly once. The
//! first configuration error aborts loading; otherwise the registry is sealed
//! and its section table is returned for the render scheduler.

use std::collections::HashSet;

use deq_domain::error::{ConfigurationError, DeqError};

use crate::facade::Core;
use crate::ports::Extension;
use crate::registry::SectionTable;

/// Load `extensions` in order and seal the registry.
///
/// # Errors
///
/// Returns the first error raised by an extension's `register`, or
/// [`ConfigurationError::DuplicateExtension`] when two extensions share a
/// name. Both are fatal at startup.
pub fn load_extensions(
    core: &Core,
    extensions: &[Box<dyn Extension>],
) -> Result<SectionTable, DeqError> {
    let mut seen = HashSet::with_capacity(extensions.len());
    for extension in extensions {
        let name = extension.name();
        if !seen.insert(name) {
            return Err(ConfigurationError::DuplicateExtension(name.to_string()).into());
        }

        tracing::info!(extension = name, "loading extension");
        if let Err(err) = extension.register(core) {
            tracing::error!(extension = name, error = %err, "extension failed to register");
            return Err(err);
        }
    }

    let table = core.seal_registry()?;
    tracing::info!(
        extensions = extensions.len(),
        sections = table.len(),
        "extensions loaded"
    );
    Ok(table)
}
