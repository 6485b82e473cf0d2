//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`DeqError`]
//! via `#[from]`. Only configuration errors are fatal; everything else is
//! contained per device, per action, or per section.

use crate::id::{DeviceId, SectionId};

/// Top-level error for the DeQ core.
#[derive(Debug, thiserror::Error)]
pub enum DeqError {
    /// Startup-time configuration problem. Prevents the process from starting.
    #[error("configuration error")]
    Configuration(#[from] ConfigurationError),

    /// A referenced object does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A value failed domain validation.
    #[error("validation error")]
    Validation(#[from] ValidationError),
}

/// Uniqueness and referential-integrity violations detected while loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("section {0} is already registered")]
    DuplicateSection(SectionId),

    #[error("device {0} is defined more than once")]
    DuplicateDevice(DeviceId),

    #[error("device {0} is referenced but not configured")]
    UnknownDevice(DeviceId),

    #[error("sections can only be registered during startup")]
    RegistrationClosed,

    #[error("extension {0} is loaded more than once")]
    DuplicateExtension(String),

    #[error("extension {extension}: {reason}")]
    InvalidExtensionSettings {
        extension: String,
        reason: String,
    },
}

/// A lookup by id failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no such {entity}: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

impl NotFoundError {
    /// Shorthand for a missing device.
    #[must_use]
    pub fn device(id: &str) -> Self {
        Self {
            entity: "device",
            id: id.to_string(),
        }
    }
}

/// Domain validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("identifier must not be empty")]
    EmptyId,

    #[error("identifier {0:?} contains whitespace")]
    InvalidId(String),

    #[error("name must not be empty")]
    EmptyName,

    #[error("address must not be empty")]
    EmptyAddress,

    #[error("invalid MAC address {0:?}")]
    InvalidMac(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_duplicate_section_error() {
        let err = ConfigurationError::DuplicateSection("storage".parse().unwrap());
        assert_eq!(err.to_string(), "section storage is already registered");
    }

    #[test]
    fn should_display_not_found_for_device() {
        let err = NotFoundError::device("nas-1");
        assert_eq!(err.to_string(), "no such device: nas-1");
    }

    #[test]
    fn should_convert_configuration_error_into_deq_error() {
        let err: DeqError = ConfigurationError::RegistrationClosed.into();
        assert!(matches!(
            err,
            DeqError::Configuration(ConfigurationError::RegistrationClosed)
        ));
    }

    #[test]
    fn should_keep_source_when_wrapping_validation_error() {
        let err: DeqError = ValidationError::EmptyName.into();
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "name must not be empty");
    }
}
