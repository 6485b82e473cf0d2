//! Typed identifier newtypes backed by operator-chosen strings.
//!
//! Device and section ids come from configuration and extension code, so they
//! are human-readable slugs (`nas-1`, `storage`) rather than generated UUIDs.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Validate and wrap an identifier.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::EmptyId`] for an empty string and
            /// [`ValidationError::InvalidId`] when it contains whitespace.
            pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
                let value = value.as_ref();
                if value.is_empty() {
                    return Err(ValidationError::EmptyId);
                }
                if value.chars().any(char::is_whitespace) {
                    return Err(ValidationError::InvalidId(value.to_string()));
                }
                Ok(Self(Arc::from(value)))
            }

            /// Build an identifier from arbitrary text, replacing whitespace and
            /// substituting `_` for an empty string. For diagnostics only.
            #[must_use]
            pub fn lossy(value: &str) -> Self {
                let cleaned: String = value
                    .chars()
                    .map(|c| if c.is_whitespace() { '_' } else { c })
                    .collect();
                if cleaned.is_empty() {
                    return Self(Arc::from("_"));
                }
                Self(Arc::from(cleaned))
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        // Lets maps keyed by this id be queried with a plain `&str`.
        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

define_id!(
    /// Unique, stable identifier for a [`Device`](crate::device::Device).
    DeviceId
);

define_id!(
    /// Unique identifier for a dashboard section.
    SectionId
);
