//! The host-facing template engine contract.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::TemplateError;

/// Variable bindings supplied to a template at render time.
///
/// Values are passed through to the engine unmodified.
pub type Context = BTreeMap<String, Value>;

/// A template engine as seen by the host application.
///
/// Implementations wrap a concrete rendering library. The trait is object
/// safe so hosts can hold a `Box<dyn TemplateEngine>`.
pub trait TemplateEngine {
    /// Append `directories`, in order, to the engine's template search path.
    ///
    /// Registration is cumulative across calls. Returns
    /// [`TemplateError::Configuration`] if the engine cannot search the
    /// filesystem; in that case nothing is registered.
    fn add_template_directories(&self, directories: &[PathBuf]) -> Result<(), TemplateError>;

    /// Render the template identified by `template_name` against `context`.
    fn render(&self, template_name: &str, context: &Context) -> Result<String, TemplateError>;
}

impl<T: TemplateEngine + ?Sized> TemplateEngine for Box<T> {
    fn add_template_directories(&self, directories: &[PathBuf]) -> Result<(), TemplateError> {
        (**self).add_template_directories(directories)
    }

    fn render(&self, template_name: &str, context: &Context) -> Result<String, TemplateError> {
        (**self).render(template_name, context)
    }
}

impl<T: TemplateEngine + ?Sized> TemplateEngine for std::sync::Arc<T> {
    fn add_template_directories(&self, directories: &[PathBuf]) -> Result<(), TemplateError> {
        (**self).add_template_directories(directories)
    }

    fn render(&self, template_name: &str, context: &Context) -> Result<String, TemplateError> {
        (**self).render(template_name, context)
    }
}
