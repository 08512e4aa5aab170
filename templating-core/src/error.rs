//! Error types for templating-core.

use thiserror::Error;

/// All errors a [`TemplateEngine`](crate::TemplateEngine) may surface to its host.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The engine was set up in a way that cannot support the requested
    /// operation (e.g. registering directories on an in-memory loader).
    #[error("template engine misconfigured: {reason}")]
    Configuration { reason: String },

    /// No template could be located for the requested name.
    ///
    /// `template` is the name exactly as the caller passed it, before any
    /// engine-specific resolution (such as appending a file suffix).
    #[error("template not found: {template}")]
    NotFound { template: String },

    /// Failure raised by the underlying rendering engine, passed through
    /// untranslated. Use [`TemplateError::render_source`] to downcast.
    #[error("template rendering failed: {0}")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl TemplateError {
    /// Convenience constructor for [`TemplateError::Configuration`].
    pub fn configuration(reason: impl Into<String>) -> Self {
        TemplateError::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`TemplateError::NotFound`].
    pub fn not_found(template: impl Into<String>) -> Self {
        TemplateError::NotFound {
            template: template.into(),
        }
    }

    /// Wrap an engine error without altering it.
    pub fn render<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TemplateError::Render(Box::new(source))
    }

    /// `true` for [`TemplateError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, TemplateError::NotFound { .. })
    }

    /// The original engine error, if this is a [`TemplateError::Render`] of type `E`.
    pub fn render_source<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            TemplateError::Render(source) => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}
