//! YAML environment configuration.
//!
//! ```yaml
//! loader:
//!   kind: filesystem
//!   root: /srv/app          # optional; defaults to the config file's directory
//!   paths: [templates]
//!   namespaces:
//!     admin: [admin/templates]
//! autoescape: true
//! globals:
//!   site_name: Example
//! ```
//!
//! `kind: array` takes a `templates:` map of name to source instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::environment::Environment;
use crate::error::ConfigError;
use crate::loader::{ArrayLoader, FilesystemLoader};

/// Declarative description of an [`Environment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    pub loader: LoaderConfig,
    #[serde(default = "default_autoescape")]
    pub autoescape: bool,
    #[serde(default)]
    pub globals: BTreeMap<String, Value>,
}

/// Which loader the environment uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LoaderConfig {
    Filesystem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        root: Option<PathBuf>,
        #[serde(default)]
        paths: Vec<PathBuf>,
        #[serde(default)]
        namespaces: BTreeMap<String, Vec<PathBuf>>,
    },
    Array {
        #[serde(default)]
        templates: BTreeMap<String, String>,
    },
}

fn default_autoescape() -> bool {
    true
}

impl EnvironmentConfig {
    /// Parse a configuration from YAML text. Relative filesystem paths stay
    /// relative to the process working directory unless `root` is set.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration file.
    ///
    /// A filesystem loader without an explicit `root` is rooted at the
    /// directory containing `path`.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: EnvironmentConfig =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let LoaderConfig::Filesystem { root, .. } = &mut config.loader {
            if root.is_none() {
                *root = path.parent().map(Path::to_path_buf);
            }
        }
        tracing::debug!("loaded environment config from {}", path.display());
        Ok(config)
    }

    /// Construct the described [`Environment`].
    pub fn build(&self) -> Environment {
        let mut env = match &self.loader {
            LoaderConfig::Filesystem {
                root,
                paths,
                namespaces,
            } => {
                let mut loader = FilesystemLoader::with_paths(paths.iter().cloned());
                if let Some(root) = root {
                    loader = loader.with_root(root.clone());
                }
                for (namespace, ns_paths) in namespaces {
                    loader.set_paths(ns_paths.iter().cloned(), namespace);
                }
                Environment::new(loader)
            }
            LoaderConfig::Array { templates } => Environment::new(ArrayLoader::new(templates.clone())),
        };

        env.set_autoescape(self.autoescape);
        for (name, value) in &self.globals {
            env.add_global_value(name.clone(), value.clone());
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_omitted() {
        let config = EnvironmentConfig::from_yaml_str("loader:\n  kind: filesystem\n").unwrap();
        assert!(config.autoescape);
        assert!(config.globals.is_empty());
        assert_eq!(
            config.loader,
            LoaderConfig::Filesystem {
                root: None,
                paths: vec![],
                namespaces: BTreeMap::new(),
            }
        );
    }

    #[test]
    fn unknown_loader_kind_is_rejected() {
        let err = EnvironmentConfig::from_yaml_str("loader:\n  kind: database\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)), "got: {err}");
    }

    #[test]
    fn unknown_top_level_field_is_rejected() {
        let yaml = "loader:\n  kind: array\ncache: true\n";
        assert!(EnvironmentConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn array_config_round_trips_through_yaml() {
        let yaml = "loader:\n  kind: array\n  templates:\n    index.twig: hello\nautoescape: false\n";
        let config = EnvironmentConfig::from_yaml_str(yaml).unwrap();
        let dumped = serde_yaml::to_string(&config).unwrap();
        assert_eq!(EnvironmentConfig::from_yaml_str(&dumped).unwrap(), config);
    }
}
