//! Flat settings-module source.
//!
//! A module is a flat table of upper-case names (`DATABASE_HOST`, `DEBUG`)
//! that can be handed over directly or resolved by name through a
//! [`ModuleResolver`]. A module that fails to resolve does not abort a
//! merge: the source simply reports every address as absent.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path as FsPath, PathBuf};

use indexmap::IndexMap;
use tracing::warn;

use super::{upper_snake, Path, Source};
use crate::error::{ConfigError, ConfigResult};
use crate::value::{present, Value};

/// A named, flat table of settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    name: String,
    attrs: IndexMap<String, Value>,
}

impl Module {
    /// Create an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: IndexMap::new(),
        }
    }

    /// Add one attribute.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Build a module from the top-level keys of a TOML document.
    pub fn from_toml_str(name: impl Into<String>, content: &str) -> ConfigResult<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let mut module = Self::new(name);
        for (key, value) in table {
            module.attrs.insert(key, serde_json::to_value(value)?);
        }
        Ok(module)
    }

    /// The module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read one attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }
}

/// Turns a module name into a loaded [`Module`].
pub trait ModuleResolver {
    /// Resolve `name`.
    fn resolve(&self, name: &str) -> ConfigResult<Module>;
}

/// An in-memory registry of modules.
#[derive(Debug, Clone, Default)]
pub struct StaticModules {
    modules: HashMap<String, Module>,
}

impl StaticModules {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under its own name.
    #[must_use]
    pub fn register(mut self, module: Module) -> Self {
        self.modules.insert(module.name.clone(), module);
        self
    }
}

impl ModuleResolver for StaticModules {
    fn resolve(&self, name: &str) -> ConfigResult<Module> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::module_not_found(name))
    }
}

/// Resolves `a.b.settings` to `<dir>/a/b/settings.toml`, searching
/// directories in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct FileModules {
    search_dirs: Vec<PathBuf>,
}

impl FileModules {
    /// Create a resolver with no search directories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a search directory.
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// `None` unless every dotted piece is a plain file name, so a module
    /// name can never reach outside the search directories.
    fn relative_path(name: &str) -> Option<PathBuf> {
        let mut path = PathBuf::new();
        for piece in name.split('.') {
            let mut components = FsPath::new(piece).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(part)), None) if part == piece => path.push(part),
                _ => return None,
            }
        }
        path.set_extension("toml");
        Some(path)
    }
}

impl ModuleResolver for FileModules {
    fn resolve(&self, name: &str) -> ConfigResult<Module> {
        let relative =
            Self::relative_path(name).ok_or_else(|| ConfigError::module_not_found(name))?;
        for dir in &self.search_dirs {
            let candidate = dir.join(&relative);
            if candidate.is_file() {
                let content = fs::read_to_string(&candidate)
                    .map_err(|e| ConfigError::read_error(&candidate, e))?;
                return Module::from_toml_str(name, &content);
            }
        }
        Err(ConfigError::module_not_found(name))
    }
}

/// Reads fields as upper-case attributes of a flat module.
///
/// The address `["database", "host"]` becomes attribute `DATABASE_HOST`.
#[derive(Debug, Clone, Default)]
pub struct FlatModule {
    module: Option<Module>,
}

impl FlatModule {
    /// Read from an already-loaded module.
    pub fn new(module: Module) -> Self {
        Self {
            module: Some(module),
        }
    }

    /// A source with no module behind it; every address is absent.
    pub fn unloaded() -> Self {
        Self::default()
    }

    /// Resolve a module by name.
    ///
    /// Resolution failures are logged and yield an unloaded source rather
    /// than an error.
    pub fn resolve(name: &str, resolver: &dyn ModuleResolver) -> Self {
        match resolver.resolve(name) {
            Ok(module) => Self::new(module),
            Err(e) => {
                warn!(module = name, error = %e, "Failed to load settings module");
                Self::unloaded()
            }
        }
    }

    /// Whether a module was loaded.
    pub fn is_loaded(&self) -> bool {
        self.module.is_some()
    }
}

impl Source for FlatModule {
    fn name(&self) -> String {
        self.module
            .as_ref()
            .map_or_else(|| "unloaded module".to_string(), |m| m.name.clone())
    }

    fn path_for(&self, segments: Vec<String>) -> Path<'_> {
        Path::new(self, segments)
    }

    fn render(&self, segments: &[String]) -> String {
        upper_snake(segments.iter().map(String::as_str))
    }

    fn get_value(&self, segments: &[String]) -> Option<Value> {
        let module = self.module.as_ref()?;
        module.get(&self.render(segments)).cloned().and_then(present)
    }
}
