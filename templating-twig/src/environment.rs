//! Rendering environment — a [`Loader`] paired with a configured Tera instance.
//!
//! Tera only renders templates it has been handed up front, so every
//! [`Environment::render`] call loads the requested template plus everything
//! it references (`extends`, `include`, `import`) through the loader and
//! registers them in a fresh clone of the configured Tera instance. Nothing
//! is cached between renders; edits on disk are picked up immediately.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tera::Tera;

use templating_core::Context;

use crate::error::{LoaderError, RenderError};
use crate::loader::{Loader, Source};

/// Externally owned rendering environment.
///
/// Configure it (loader, globals, filters, functions) before sharing it, then
/// hand it to [`TwigEngine`](crate::TwigEngine) behind an `Arc`.
pub struct Environment {
    loader: Box<dyn Loader>,
    tera: Tera,
    globals: BTreeMap<String, Value>,
}

impl Environment {
    /// Create an environment backed by `loader`, with autoescaping on.
    pub fn new(loader: impl Loader + 'static) -> Self {
        let mut env = Environment {
            loader: Box::new(loader),
            tera: Tera::default(),
            globals: BTreeMap::new(),
        };
        env.set_autoescape(true);
        env
    }

    /// The loader used to locate template source.
    pub fn loader(&self) -> &dyn Loader {
        self.loader.as_ref()
    }

    /// Toggle HTML escaping of `{{ … }}` output for every template.
    pub fn set_autoescape(&mut self, enabled: bool) {
        if enabled {
            self.tera.autoescape_on(vec![""]);
        } else {
            self.tera.autoescape_on(Vec::new());
        }
    }

    /// Make `value` available to every template as `name`.
    ///
    /// Render-time context entries with the same name take precedence.
    pub fn add_global<T>(&mut self, name: impl Into<String>, value: &T) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        self.add_global_value(name, value);
        Ok(())
    }

    /// [`Environment::add_global`] for an already-converted value.
    pub fn add_global_value(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    pub fn globals(&self) -> &BTreeMap<String, Value> {
        &self.globals
    }

    pub fn register_filter<F: tera::Filter + 'static>(&mut self, name: &str, filter: F) {
        self.tera.register_filter(name, filter);
    }

    pub fn register_function<F: tera::Function + 'static>(&mut self, name: &str, function: F) {
        self.tera.register_function(name, function);
    }

    pub fn register_tester<T: tera::Test + 'static>(&mut self, name: &str, tester: T) {
        self.tera.register_tester(name, tester);
    }

    /// Whether the loader can locate `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.loader.exists(name)
    }

    /// Load `name` through the loader and render it against `context`.
    pub fn render(&self, name: &str, context: &Context) -> Result<String, RenderError> {
        tracing::debug!("rendering template {}", name);

        let sources = self.load_with_dependencies(name)?;
        let mut tera = self.tera.clone();
        tera.add_raw_templates(
            sources
                .iter()
                .map(|source| (source.name.as_str(), source.code.as_str())),
        )?;

        let tera_ctx = self.build_context(context)?;
        Ok(tera.render(name, &tera_ctx)?)
    }

    /// `name` followed by every template reachable from it.
    fn load_with_dependencies(&self, name: &str) -> Result<Vec<Source>, RenderError> {
        let mut sources = Vec::new();
        let mut loaded: BTreeSet<String> = BTreeSet::new();
        let mut pending: VecDeque<Reference> = VecDeque::new();
        pending.push_back(Reference {
            candidates: vec![name.to_string()],
            ignore_missing: false,
        });

        while let Some(reference) = pending.pop_front() {
            let mut found = false;
            let mut last_miss = None;
            let mut searched = Vec::new();

            for candidate in &reference.candidates {
                if loaded.contains(candidate) {
                    found = true;
                    continue;
                }
                match self.loader.source(candidate) {
                    Ok(source) => {
                        if let Some(path) = &source.path {
                            tracing::trace!("resolved {} to {}", candidate, path.display());
                        }
                        found = true;
                        loaded.insert(candidate.clone());
                        pending.extend(references(&source.code));
                        sources.push(source);
                    }
                    Err(err) if err.is_missing() => {
                        tracing::debug!("template {} not loaded: {}", candidate, err);
                        if let LoaderError::NotFound { searched: paths, .. } = &err {
                            searched.extend(paths.iter().cloned());
                        }
                        last_miss = Some(err);
                    }
                    Err(err) => return Err(RenderError::Loader(err)),
                }
            }

            if found || reference.ignore_missing {
                continue;
            }
            let err = match last_miss {
                Some(err) if reference.candidates.len() == 1 => err,
                _ => LoaderError::not_found(reference.candidates.join(", "), searched),
            };
            return Err(RenderError::Loader(err));
        }

        Ok(sources)
    }

    fn build_context(&self, context: &Context) -> Result<tera::Context, RenderError> {
        let mut merged = self.globals.clone();
        merged.extend(context.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(tera::Context::from_serialize(&merged)?)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("globals", &self.globals)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Reference scanning
// ---------------------------------------------------------------------------

/// Templates named by one `extends`/`include`/`import` tag.
///
/// A list include (`["a", "b"]`) renders the first candidate that exists, so
/// the reference is satisfied when any candidate loads.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reference {
    candidates: Vec<String>,
    ignore_missing: bool,
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"(?s)\{%-?\s*(?:extends|include|import)\s+(.*?)-?%\}")
            .expect("reference tag pattern is valid")
    })
}

fn name_pattern() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| {
        Regex::new(r#""([^"]+)"|'([^']+)'"#).expect("template name pattern is valid")
    })
}

fn inert_pattern() -> &'static Regex {
    static INERT: OnceLock<Regex> = OnceLock::new();
    INERT.get_or_init(|| {
        Regex::new(r"(?s)\{%-?\s*raw\s*-?%\}.*?\{%-?\s*endraw\s*-?%\}|\{#.*?#\}")
            .expect("raw/comment pattern is valid")
    })
}

/// Templates referenced by `code`, ignoring `raw` blocks and comments.
fn references(code: &str) -> Vec<Reference> {
    let code = inert_pattern().replace_all(code, "");
    let mut out = Vec::new();
    for tag in tag_pattern().captures_iter(&code) {
        let args = &tag[1];
        let names: Vec<&str> = name_pattern()
            .captures_iter(args)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str())
            .collect();
        if names.is_empty() {
            continue;
        }
        out.push(Reference {
            candidates: names.into_iter().map(str::to_string).collect(),
            ignore_missing: args.contains("ignore missing"),
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
