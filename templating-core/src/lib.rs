//! Templating core library — the engine contract hosts program against.
//!
//! Public API surface:
//! - [`engine`] — [`TemplateEngine`] trait and the [`Context`] type
//! - [`error`] — [`TemplateError`]

pub mod engine;
pub mod error;

pub use engine::{Context, TemplateEngine};
pub use error::TemplateError;
