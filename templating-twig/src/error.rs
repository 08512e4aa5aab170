//! Error types for templating-twig.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`Loader`](crate::loader::Loader) while locating template source.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// No loader path contains the template.
    #[error("unable to find template \"{name}\" (looked into: {})", display_paths(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },

    /// The name cannot be resolved safely (null byte, escapes the search root, …).
    #[error("invalid template name \"{name}\": {reason}")]
    InvalidName { name: String, reason: String },

    /// The template was located but could not be read.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoaderError {
    /// `true` for the errors that mean "no such template" from the caller's
    /// point of view: [`LoaderError::NotFound`] and [`LoaderError::InvalidName`].
    pub fn is_missing(&self) -> bool {
        matches!(self, LoaderError::NotFound { .. } | LoaderError::InvalidName { .. })
    }

    pub(crate) fn not_found(name: impl Into<String>, searched: Vec<PathBuf>) -> Self {
        LoaderError::NotFound {
            name: name.into(),
            searched,
        }
    }

    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        LoaderError::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "<no paths>".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// All errors that can arise from [`Environment::render`](crate::Environment::render).
#[derive(Debug, Error)]
pub enum RenderError {
    /// The template (or one it references) could not be loaded.
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// Tera template engine error (syntax, undefined variable, filter failure, …).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Context or global value could not be serialized for Tera.
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from loading an [`EnvironmentConfig`](crate::config::EnvironmentConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("config io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with the offending file path.
    #[error("failed to parse environment config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML parse error for in-memory input.
    #[error("failed to parse environment config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
