//! # templating-twig
//!
//! Tera-backed rendering environment with Twig-style loaders, and the
//! [`TwigEngine`] adapter that exposes it to hosts as a
//! [`templating_core::TemplateEngine`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use templating_core::Context;
//! use templating_twig::{Environment, FilesystemLoader, TwigEngine};
//!
//! fn render_home() -> Result<String, templating_core::TemplateError> {
//!     let env = Arc::new(Environment::new(FilesystemLoader::new()));
//!     let engine = TwigEngine::new(env);
//!     engine.add_template_directories(["templates"])?;
//!
//!     let mut context = Context::new();
//!     context.insert("title".into(), "Home".into());
//!     engine.render("home", &context)
//! }
//! ```

pub mod config;
pub mod engine;
pub mod environment;
pub mod error;
pub mod loader;

pub use config::{EnvironmentConfig, LoaderConfig};
pub use engine::{template_filename, TwigEngine, TEMPLATE_SUFFIX};
pub use environment::Environment;
pub use error::{ConfigError, LoaderError, RenderError};
pub use loader::{
    ArrayLoader, ChainLoader, DirectoryRegistry, FilesystemLoader, Loader, Source, MAIN_NAMESPACE,
};
