//! Extension port — how dashboard modules plug into the core.
//!
//! An extension is loaded once at startup. Its [`register`](Extension::register)
//! entry point receives the [`Core`] facade and registers one or more sections,
//! each backed by a render callback the scheduler invokes on a fixed cadence.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use deq_domain::error::DeqError;

use crate::facade::Core;

/// Error produced by a render callback. Any error type converts into it.
pub type ExtensionError = Box<dyn std::error::Error + Send + Sync>;

/// A render callback: no arguments, yields a markup fragment or fails.
///
/// Callbacks run with full trust but bounded time. They may perform network
/// I/O and may call back into the [`Core`] they captured at registration.
pub type RenderFn = Arc<dyn Fn() -> BoxFuture<'static, Result<String, ExtensionError>> + Send + Sync>;

/// Wrap an async closure as a [`RenderFn`].
pub fn render_fn<F, Fut>(f: F) -> RenderFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ExtensionError>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// A dashboard module.
///
/// The extension host calls [`register`](Self::register) exactly once per
/// extension, before the render loop starts. Any error aborts startup.
pub trait Extension: Send + Sync {
    /// Unique name identifying this extension (e.g. `"devices"`).
    fn name(&self) -> &'static str;

    /// Register sections through the facade.
    ///
    /// # Errors
    ///
    /// Returns [`DeqError::Configuration`] on duplicate section ids or
    /// references to unknown devices; these are fatal at startup.
    fn register(&self, core: &Core) -> Result<(), DeqError>;
}
