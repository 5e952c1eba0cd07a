//! Environment variable source.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path as FsPath, PathBuf};

use super::{upper_snake, Path, Source};
use crate::error::ConfigResult;
use crate::value::Value;

/// Key-value accessor backing an [`Environment`] source.
pub trait EnvLookup: Send + Sync {
    /// Read one variable, `None` if unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Variables read from a `.env` file, without exporting them to the process.
#[derive(Debug, Clone)]
pub struct DotenvFile {
    path: PathBuf,
    vars: HashMap<String, String>,
}

impl DotenvFile {
    /// Parse the `.env` file at `path`.
    pub fn load(path: impl AsRef<FsPath>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let mut vars = HashMap::new();
        for item in dotenvy::from_path_iter(path)? {
            let (key, value) = item?;
            vars.insert(key, value);
        }

        Ok(Self {
            path: path.to_path_buf(),
            vars,
        })
    }

    /// The file the variables came from.
    pub fn path(&self) -> &FsPath {
        &self.path
    }
}

impl EnvLookup for DotenvFile {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Reads fields from environment variables.
///
/// The address `["database", "host"]` becomes `DATABASE_HOST`, or
/// `MYAPP_DATABASE_HOST` with prefix `myapp`.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use figure::{Environment, Source};
///
/// let vars = HashMap::from([("MYAPP_PORT".to_string(), "8080".to_string())]);
/// let env = Environment::with_lookup(vars).with_prefix("myapp");
///
/// let path = env.path_for(vec!["port".to_string()]);
/// assert_eq!(path.to_string(), "MYAPP_PORT");
/// assert_eq!(path.value().and_then(|v| v.as_str()), Some("8080"));
/// ```
pub struct Environment {
    prefix: Option<String>,
    lookup: Box<dyn EnvLookup>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Read from the process environment with no prefix.
    pub fn new() -> Self {
        Self::with_lookup(ProcessEnv)
    }

    /// Read from an injected accessor instead of the process environment.
    pub fn with_lookup(lookup: impl EnvLookup + 'static) -> Self {
        Self {
            prefix: None,
            lookup: Box::new(lookup),
        }
    }

    /// Prepend `prefix` (upper-cased) to every variable name.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// The configured prefix, as given.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl Source for Environment {
    fn name(&self) -> String {
        "environment".to_string()
    }

    fn path_for(&self, segments: Vec<String>) -> Path<'_> {
        Path::new(self, segments)
    }

    fn render(&self, segments: &[String]) -> String {
        upper_snake(
            self.prefix
                .iter()
                .chain(segments)
                .map(String::as_str),
        )
    }

    fn get_value(&self, segments: &[String]) -> Option<Value> {
        self.lookup.var(&self.render(segments)).map(Value::String)
    }
}
