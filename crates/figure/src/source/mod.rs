//! Configuration sources and the paths that address them.
//!
//! A [`Source`] is a named provider of configuration data. Fields never read
//! a source directly: they ask it for a [`Path`] over their hierarchical
//! address (root to leaf, e.g. `["database", "host"]`) and read the path's
//! value. How the address maps onto the backing data is the source's
//! business:
//!
//! | Source | Address mapping |
//! |---|---|
//! | [`Environment`] | `PREFIX_DATABASE_HOST` |
//! | [`FlatModule`] | `DATABASE_HOST` attribute of a module |
//! | [`Dict`] | `map["database"]["host"]` |
//! | [`Object`] | `obj.database.host` |
//! | [`ConfigParser`] | section `database`, option `host` |

use std::cell::OnceCell;
use std::fmt;

use crate::value::Value;

mod dict;
mod env;
mod module;
mod object;
mod parser;

pub use dict::Dict;
pub use env::{DotenvFile, EnvLookup, Environment, ProcessEnv};
pub use module::{FileModules, FlatModule, Module, ModuleResolver, StaticModules};
pub use object::{Attr, AttrMap, Attributes, Object};
pub use parser::{ConfigParser, IniParser, SectionedParser};

/// A named provider of configuration data.
///
/// Sources are read-only with respect to merging and can be reused across
/// any number of merges and schemas, including from several threads at once.
pub trait Source: Send + Sync {
    /// Diagnostic name, used only in logs.
    fn name(&self) -> String;

    /// Create a [`Path`] scoped to this source and `segments`.
    fn path_for(&self, segments: Vec<String>) -> Path<'_>;

    /// Human-readable rendition of an address in this source's terms.
    fn render(&self, segments: &[String]) -> String;

    /// Look up an address.
    ///
    /// Returns `None` whenever any part of the address fails to resolve.
    /// Implementations must not panic on missing data.
    fn get_value(&self, segments: &[String]) -> Option<Value>;
}

/// One address within one source.
///
/// The value is looked up on first access and memoized for the life of the
/// path, so repeated reads observe the same result even if the backing data
/// changes in between.
pub struct Path<'a> {
    source: &'a dyn Source,
    segments: Vec<String>,
    value: OnceCell<Option<Value>>,
}

impl<'a> Path<'a> {
    /// Create a path over `segments` in `source`.
    pub fn new(source: &'a dyn Source, segments: Vec<String>) -> Self {
        Self {
            source,
            segments,
            value: OnceCell::new(),
        }
    }

    /// The address segments, root to leaf.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The value at this address, or `None` if it is absent.
    pub fn value(&self) -> Option<&Value> {
        self.value
            .get_or_init(|| self.source.get_value(&self.segments))
            .as_ref()
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source.render(&self.segments))
    }
}

impl fmt::Debug for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("source", &self.source.name())
            .field("segments", &self.segments)
            .finish_non_exhaustive()
    }
}

/// Walk `names` from `root`, applying `step` once per segment.
///
/// Stops at the first step that yields nothing.
pub(crate) fn drill_down<T>(
    root: T,
    names: &[String],
    step: impl Fn(T, &str) -> Option<T>,
) -> Option<T> {
    let mut current = root;
    for name in names {
        current = step(current, name)?;
    }
    Some(current)
}

/// Join segments with `_` and upper-case them, as environment-style keys are spelled.
pub(crate) fn upper_snake<'s>(segments: impl IntoIterator<Item = &'s str>) -> String {
    segments
        .into_iter()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}
