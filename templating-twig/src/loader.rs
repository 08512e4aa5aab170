//! Template loaders — strategies for locating template source by name.
//!
//! | Loader               | Source                          | Accepts directories |
//! |----------------------|---------------------------------|---------------------|
//! | [`FilesystemLoader`] | search paths, per namespace     | yes                 |
//! | [`ArrayLoader`]      | in-memory `name → source` map   | no                  |
//! | [`ChainLoader`]      | first member that has the name  | no                  |
//!
//! Directory registration is a capability, not a concrete type: a loader
//! advertises it through [`Loader::as_directory_registry`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::LoaderError;

/// Namespace used for names without an `@namespace/` prefix.
pub const MAIN_NAMESPACE: &str = "__main__";

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Template source returned by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Name the template was requested under.
    pub name: String,
    /// Raw template text.
    pub code: String,
    /// File the source was read from, for filesystem-backed loaders.
    pub path: Option<PathBuf>,
}

/// Pluggable strategy for locating template source by name.
pub trait Loader: Send + Sync {
    /// Load the source of `name`.
    fn source(&self, name: &str) -> Result<Source, LoaderError>;

    /// Whether `name` can be loaded.
    fn exists(&self, name: &str) -> bool {
        self.source(name).is_ok()
    }

    /// The directory-registration capability, if this loader has one.
    fn as_directory_registry(&self) -> Option<&dyn DirectoryRegistry> {
        None
    }
}

/// Capability of loaders that search filesystem directories.
pub trait DirectoryRegistry {
    /// Append `directory` to the default search path.
    fn add_directory(&self, directory: &Path);
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    fn source(&self, name: &str) -> Result<Source, LoaderError> {
        (**self).source(name)
    }

    fn exists(&self, name: &str) -> bool {
        (**self).exists(name)
    }

    fn as_directory_registry(&self) -> Option<&dyn DirectoryRegistry> {
        (**self).as_directory_registry()
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// FilesystemLoader
// ---------------------------------------------------------------------------

/// Loads templates from directories on disk.
///
/// Paths are grouped by namespace; `@admin/users/list.twig` resolves
/// `users/list.twig` against the `admin` namespace. Relative paths are
/// resolved against the loader's root when a template is looked up, and
/// directories are not checked for existence when they are added.
#[derive(Debug)]
pub struct FilesystemLoader {
    root: PathBuf,
    paths: RwLock<BTreeMap<String, Vec<PathBuf>>>,
}

impl Default for FilesystemLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FilesystemLoader {
    /// A loader with no search paths, rooted at the current directory.
    pub fn new() -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        FilesystemLoader {
            root,
            paths: RwLock::new(BTreeMap::new()),
        }
    }

    /// A loader searching `paths` (main namespace) in order.
    pub fn with_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let loader = Self::new();
        loader.set_paths(paths, MAIN_NAMESPACE);
        loader
    }

    /// Resolve relative search paths against `root` instead of the current directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registered paths of `namespace`, in search order.
    pub fn paths(&self, namespace: &str) -> Vec<PathBuf> {
        read_lock(&self.paths)
            .get(namespace)
            .cloned()
            .unwrap_or_default()
    }

    /// Namespaces with at least one registered path.
    pub fn namespaces(&self) -> Vec<String> {
        read_lock(&self.paths).keys().cloned().collect()
    }

    /// Replace the paths of `namespace`.
    pub fn set_paths<I, P>(&self, paths: I, namespace: &str)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(|p| trim_path(p.into())).collect();
        write_lock(&self.paths).insert(namespace.to_string(), paths);
    }

    /// Append `path` to the paths of `namespace`.
    pub fn add_path(&self, path: impl Into<PathBuf>, namespace: &str) {
        let path = trim_path(path.into());
        tracing::debug!("adding template path {} to @{}", path.display(), namespace);
        write_lock(&self.paths)
            .entry(namespace.to_string())
            .or_default()
            .push(path);
    }

    /// Insert `path` ahead of the existing paths of `namespace`.
    pub fn prepend_path(&self, path: impl Into<PathBuf>, namespace: &str) {
        let path = trim_path(path.into());
        tracing::debug!("prepending template path {} to @{}", path.display(), namespace);
        write_lock(&self.paths)
            .entry(namespace.to_string())
            .or_default()
            .insert(0, path);
    }

    /// Find the file backing `name`. First matching path wins.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, LoaderError> {
        let normalized = normalize_name(name);
        let (namespace, short_name) = parse_name(&normalized)?;
        validate_name(&normalized, short_name)?;

        let paths = self.paths(namespace);
        let mut searched = Vec::with_capacity(paths.len());
        for path in paths {
            let dir = if path.is_absolute() {
                path
            } else {
                self.root.join(path)
            };
            let candidate = dir.join(short_name);
            tracing::trace!("looking for {} in {}", short_name, dir.display());
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(dir);
        }
        Err(LoaderError::not_found(normalized, searched))
    }
}

impl Loader for FilesystemLoader {
    fn source(&self, name: &str) -> Result<Source, LoaderError> {
        let path = self.resolve(name)?;
        let code = std::fs::read_to_string(&path).map_err(|source| LoaderError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Source {
            name: name.to_string(),
            code,
            path: Some(path),
        })
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    fn as_directory_registry(&self) -> Option<&dyn DirectoryRegistry> {
        Some(self)
    }
}

impl DirectoryRegistry for FilesystemLoader {
    fn add_directory(&self, directory: &Path) {
        self.add_path(directory, MAIN_NAMESPACE);
    }
}

/// Strip trailing separators so `templates/` and `templates` compare equal.
fn trim_path(path: PathBuf) -> PathBuf {
    let trimmed = {
        let raw = path.to_string_lossy();
        let stripped = raw.trim_end_matches(['/', '\\']);
        (!stripped.is_empty() && stripped.len() != raw.len()).then(|| PathBuf::from(stripped))
    };
    trimmed.unwrap_or(path)
}

/// Backslashes become `/`, runs of `/` collapse to one.
fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        let ch = if ch == '\\' { '/' } else { ch };
        if ch == '/' && out.ends_with('/') {
            continue;
        }
        out.push(ch);
    }
    out
}

/// Split `@namespace/rest` into its parts; other names use the main namespace.
fn parse_name(name: &str) -> Result<(&str, &str), LoaderError> {
    let Some(rest) = name.strip_prefix('@') else {
        return Ok((MAIN_NAMESPACE, name));
    };
    match rest.split_once('/') {
        Some((namespace, short_name)) if !namespace.is_empty() => Ok((namespace, short_name)),
        _ => Err(LoaderError::invalid(
            name,
            "malformed namespaced template name (expecting \"@namespace/template_name\")",
        )),
    }
}

fn validate_name(name: &str, short_name: &str) -> Result<(), LoaderError> {
    if short_name.contains('\0') {
        return Err(LoaderError::invalid(name, "template name contains a NUL byte"));
    }
    if short_name.starts_with('/') || Path::new(short_name).has_root() || has_prefix(short_name) {
        return Err(LoaderError::invalid(name, "template name must be relative"));
    }

    let mut level: i32 = 0;
    for part in short_name.split('/') {
        match part {
            ".." => level -= 1,
            "." => {}
            _ => level += 1,
        }
        if level < 0 {
            return Err(LoaderError::invalid(
                name,
                "template name resolves outside the configured directories",
            ));
        }
    }
    Ok(())
}

/// Windows drive prefix (`C:`), which `Path::join` would keep.
fn has_prefix(short_name: &str) -> bool {
    matches!(
        Path::new(short_name).components().next(),
        Some(std::path::Component::Prefix(_))
    )
}

// ---------------------------------------------------------------------------
// ArrayLoader
// ---------------------------------------------------------------------------

/// Serves templates from an in-memory map.
#[derive(Debug, Default)]
pub struct ArrayLoader {
    templates: RwLock<BTreeMap<String, String>>,
}

impl ArrayLoader {
    pub fn new<I, N, C>(templates: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        ArrayLoader {
            templates: RwLock::new(
                templates
                    .into_iter()
                    .map(|(name, code)| (name.into(), code.into()))
                    .collect(),
            ),
        }
    }

    /// Add or replace a template.
    pub fn set_template(&self, name: impl Into<String>, code: impl Into<String>) {
        write_lock(&self.templates).insert(name.into(), code.into());
    }
}

impl Loader for ArrayLoader {
    fn source(&self, name: &str) -> Result<Source, LoaderError> {
        read_lock(&self.templates)
            .get(name)
            .map(|code| Source {
                name: name.to_string(),
                code: code.clone(),
                path: None,
            })
            .ok_or_else(|| LoaderError::not_found(name, Vec::new()))
    }

    fn exists(&self, name: &str) -> bool {
        read_lock(&self.templates).contains_key(name)
    }
}

// ---------------------------------------------------------------------------
// ChainLoader
// ---------------------------------------------------------------------------

/// Delegates to several loaders in order.
///
/// Never advertises directory registration, even when a member could.
#[derive(Default)]
pub struct ChainLoader {
    loaders: Vec<Box<dyn Loader>>,
}

impl ChainLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_loader(&mut self, loader: impl Loader + 'static) {
        self.loaders.push(Box::new(loader));
    }

    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.add_loader(loader);
        self
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl Loader for ChainLoader {
    fn source(&self, name: &str) -> Result<Source, LoaderError> {
        let mut searched = Vec::new();
        for loader in &self.loaders {
            match loader.source(name) {
                Ok(source) => return Ok(source),
                Err(LoaderError::NotFound { searched: paths, .. }) => searched.extend(paths),
                Err(err @ LoaderError::InvalidName { .. }) => {
                    tracing::trace!("chain member rejected {}: {}", name, err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(LoaderError::not_found(name, searched))
    }

    fn exists(&self, name: &str) -> bool {
        self.loaders.iter().any(|loader| loader.exists(name))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
