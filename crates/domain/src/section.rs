//! Section — one dashboard widget contributed by an extension.

use serde::Serialize;

use crate::error::{DeqError, ValidationError};
use crate::id::SectionId;
use crate::time::Timestamp;

/// Fragment shown for a section that has never rendered successfully.
pub const PLACEHOLDER_FRAGMENT: &str = r#"<p class="deq-placeholder">No data available</p>"#;

/// Static identity of a section, supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSpec {
    pub id: SectionId,
    pub title: String,
    pub icon: String,
}

impl SectionSpec {
    /// Validate and build a section description.
    ///
    /// # Errors
    ///
    /// Returns [`DeqError::Validation`] when the id is invalid or the title
    /// is empty.
    pub fn new(
        id: impl AsRef<str>,
        title: impl Into<String>,
        icon: impl Into<String>,
    ) -> Result<Self, DeqError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(Self {
            id: SectionId::new(id)?,
            title,
            icon: icon.into(),
        })
    }
}

/// Cached render state of a section. Replaced whole after every render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionOutput {
    /// Last successfully rendered fragment.
    pub last_output: Option<String>,
    /// When the last *successful* render finished.
    pub last_render_at: Option<Timestamp>,
    /// Error of the most recent cycle, cleared by the next success.
    pub last_error: Option<String>,
}

impl SectionOutput {
    /// Record a successful render.
    #[must_use]
    pub fn rendered(fragment: String, at: Timestamp) -> Self {
        Self {
            last_output: Some(fragment),
            last_render_at: Some(at),
            last_error: None,
        }
    }

    /// Record a failed render, keeping the previous fragment.
    #[must_use]
    pub fn failed(&self, error: impl Into<String>) -> Self {
        Self {
            last_output: self.last_output.clone(),
            last_render_at: self.last_render_at,
            last_error: Some(error.into()),
        }
    }

    /// The fragment to display: last good output or the placeholder.
    #[must_use]
    pub fn fragment(&self) -> &str {
        self.last_output.as_deref().unwrap_or(PLACEHOLDER_FRAGMENT)
    }
}

/// One entry of the dashboard snapshot handed to the serving layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionView {
    pub id: SectionId,
    pub title: String,
    pub icon: String,
    pub fragment: String,
    pub rendered_at: Option<Timestamp>,
    pub last_error: Option<String>,
}

impl SectionView {
    #[must_use]
    pub fn new(spec: &SectionSpec, output: &SectionOutput) -> Self {
        Self {
            id: spec.id.clone(),
            title: spec.title.clone(),
            icon: spec.icon.clone(),
            fragment: output.fragment().to_string(),
            rendered_at: output.last_render_at,
            last_error: output.last_error.clone(),
        }
    }
}
