//! Extension registry — the table of dashboard sections.
//!
//! Sections are appended while extensions load and the table is sealed before
//! the render loop starts. After sealing, the set of sections never changes;
//! only each section's cached output is swapped by the scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use deq_domain::error::ConfigurationError;
use deq_domain::section::{SectionOutput, SectionSpec, SectionView};

use crate::ports::RenderFn;

/// Sealed, registration-ordered list of sections.
pub type SectionTable = Arc<[Arc<SectionSlot>]>;

/// One registered section and its cached render state.
pub struct SectionSlot {
    spec: SectionSpec,
    render: RenderFn,
    output: ArcSwap<SectionOutput>,
    in_flight: AtomicBool,
}

impl SectionSlot {
    fn new(spec: SectionSpec, render: RenderFn) -> Self {
        Self {
            spec,
            render,
            output: ArcSwap::from_pointee(SectionOutput::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn spec(&self) -> &SectionSpec {
        &self.spec
    }

    /// Current cached output. Never blocks.
    #[must_use]
    pub fn output(&self) -> Arc<SectionOutput> {
        self.output.load_full()
    }

    #[must_use]
    pub fn view(&self) -> SectionView {
        SectionView::new(&self.spec, &self.output.load())
    }

    pub(crate) fn render_fn(&self) -> RenderFn {
        Arc::clone(&self.render)
    }

    pub(crate) fn store(&self, output: SectionOutput) {
        self.output.store(Arc::new(output));
    }

    /// Claim the section for one render. `false` if a render is running.
    pub(crate) fn try_begin(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn finish(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for SectionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionSlot")
            .field("spec", &self.spec)
            .field("in_flight", &self.is_rendering())
            .finish_non_exhaustive()
    }
}

/// Append-only section registry, sealed once at the end of startup.
pub struct SectionRegistry {
    pending: Mutex<Option<Vec<Arc<SectionSlot>>>>,
}

impl SectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Some(Vec::new())),
        }
    }

    /// Add a section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateSection`] when the id is taken
    /// (the existing section is kept) and
    /// [`ConfigurationError::RegistrationClosed`] after [`seal`](Self::seal).
    pub fn register(&self, spec: SectionSpec, render: RenderFn) -> Result<(), ConfigurationError> {
        let mut guard = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let sections = guard.as_mut().ok_or(ConfigurationError::RegistrationClosed)?;

        if sections.iter().any(|slot| slot.spec.id == spec.id) {
            return Err(ConfigurationError::DuplicateSection(spec.id));
        }

        tracing::debug!(section_id = %spec.id, title = %spec.title, "section registered");
        sections.push(Arc::new(SectionSlot::new(spec, render)));
        Ok(())
    }

    /// Close registration and hand out the section table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::RegistrationClosed`] if already sealed.
    pub fn seal(&self) -> Result<SectionTable, ConfigurationError> {
        let mut guard = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let sections = guard.take().ok_or(ConfigurationError::RegistrationClosed)?;
        tracing::info!(sections = sections.len(), "section registry sealed");
        Ok(sections.into())
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl Default for SectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
