//! [`TwigEngine`] — host-facing adapter over a shared [`Environment`].
//!
//! # Name resolution
//!
//! | Requested          | Loaded             |
//! |--------------------|--------------------|
//! | `index`            | `index.twig`       |
//! | `index.twig`       | `index.twig`       |
//! | `sub/index`        | `sub/index.twig`   |
//! | `index.TWIG`       | `index.TWIG.twig`  |

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use templating_core::{Context, TemplateEngine, TemplateError};

use crate::environment::Environment;
use crate::error::RenderError;

/// Suffix appended to template names that do not already carry it.
pub const TEMPLATE_SUFFIX: &str = ".twig";

/// Adapter exposing an [`Environment`] through [`TemplateEngine`].
///
/// The environment is owned by the host; the adapter only holds a shared
/// reference and never reconfigures it beyond directory registration.
#[derive(Debug, Clone)]
pub struct TwigEngine {
    environment: Arc<Environment>,
}

impl TwigEngine {
    /// Wrap a host-configured environment.
    pub fn new(environment: Arc<Environment>) -> Self {
        TwigEngine { environment }
    }

    /// The shared environment this adapter renders through.
    pub fn environment(&self) -> &Arc<Environment> {
        &self.environment
    }

    /// Append `directories` to the loader's search path, in order.
    ///
    /// Fails with [`TemplateError::Configuration`] before touching anything
    /// if the environment's loader cannot register directories.
    pub fn add_template_directories<I, P>(&self, directories: I) -> Result<(), TemplateError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let registry = self.environment.loader().as_directory_registry().ok_or_else(|| {
            TemplateError::configuration("this operation requires a filesystem loader")
        })?;

        for directory in directories {
            registry.add_directory(&directory.into());
        }
        Ok(())
    }

    /// Render `template_name` against `context`.
    ///
    /// Loader failures become [`TemplateError::NotFound`] carrying
    /// `template_name` as given; everything else is wrapped unchanged in
    /// [`TemplateError::Render`].
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String, TemplateError> {
        let filename = template_filename(template_name);
        self.environment
            .render(&filename, context)
            .map_err(|err| match err {
                RenderError::Loader(ref loader_err) if loader_err.is_missing() => {
                    TemplateError::not_found(template_name)
                }
                other => TemplateError::render(other),
            })
    }

    /// [`TwigEngine::render`] with an empty context.
    pub fn render_template(&self, template_name: &str) -> Result<String, TemplateError> {
        self.render(template_name, &Context::new())
    }
}

impl TemplateEngine for TwigEngine {
    fn add_template_directories(&self, directories: &[PathBuf]) -> Result<(), TemplateError> {
        TwigEngine::add_template_directories(self, directories.iter().cloned())
    }

    fn render(&self, template_name: &str, context: &Context) -> Result<String, TemplateError> {
        TwigEngine::render(self, template_name, context)
    }
}

/// Loader-facing filename for `template_name`.
pub fn template_filename(template_name: &str) -> Cow<'_, str> {
    if template_name.ends_with(TEMPLATE_SUFFIX) {
        Cow::Borrowed(template_name)
    } else {
        Cow::Owned(format!("{template_name}{TEMPLATE_SUFFIX}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{ArrayLoader, ChainLoader, FilesystemLoader};
    use rstest::rstest;

    #[rstest]
    #[case("index", "index.twig")]
    #[case("index.twig", "index.twig")]
    #[case("sub/index", "sub/index.twig")]
    #[case("index.TWIG", "index.TWIG.twig")]
    #[case("twig", "twig.twig")]
    #[case(".twig", ".twig")]
    #[case("", ".twig")]
    #[case("index.twig.html", "index.twig.html.twig")]
    fn template_filename_cases(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(template_filename(name), expected);
    }

    #[test]
    fn resolved_name_is_passed_to_loader() {
        let env = Environment::new(ArrayLoader::new([("page.twig", "resolved")]));
        let engine = TwigEngine::new(Arc::new(env));
        assert_eq!(engine.render_template("page").unwrap(), "resolved");
        assert_eq!(engine.render_template("page.twig").unwrap(), "resolved");
    }

    #[test]
    fn not_found_carries_requested_name() {
        let engine = TwigEngine::new(Arc::new(Environment::new(ArrayLoader::default())));
        let err = engine.render_template("missing").unwrap_err();
        match err {
            TemplateError::NotFound { template } => assert_eq!(template, "missing"),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn invalid_name_is_reported_as_not_found() {
        let engine = TwigEngine::new(Arc::new(Environment::new(FilesystemLoader::new())));
        let err = engine.render_template("../outside").unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { ref template } if template == "../outside"));
    }

    #[rstest]
    #[case::array(Environment::new(ArrayLoader::default()))]
    #[case::chain(Environment::new(ChainLoader::new().with_loader(FilesystemLoader::new())))]
    fn directory_registration_requires_filesystem_loader(#[case] env: Environment) {
        let engine = TwigEngine::new(Arc::new(env));
        let err = engine.add_template_directories(Vec::<PathBuf>::new()).unwrap_err();
        assert!(matches!(err, TemplateError::Configuration { .. }), "got: {err:?}");
    }

    #[test]
    fn directories_are_appended_in_order() {
        let first = tempfile::TempDir::new().unwrap();
        let second = tempfile::TempDir::new().unwrap();
        std::fs::write(first.path().join("page.twig"), "first").unwrap();
        std::fs::write(second.path().join("page.twig"), "second").unwrap();
        std::fs::write(second.path().join("other.twig"), "other").unwrap();

        let engine = TwigEngine::new(Arc::new(Environment::new(FilesystemLoader::new())));
        engine.add_template_directories([first.path()]).unwrap();
        engine.add_template_directories([second.path()]).unwrap();

        assert_eq!(engine.render_template("page").unwrap(), "first");
        assert_eq!(engine.render_template("other").unwrap(), "other");
    }
}
