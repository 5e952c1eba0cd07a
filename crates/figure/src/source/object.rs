//! Attribute-tree source.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::{drill_down, Path, Source};
use crate::value::{present, Value};

/// Something that exposes named attributes.
pub trait Attributes: Send + Sync {
    /// Read one attribute, `None` if the object has no such attribute.
    fn attr(&self, name: &str) -> Option<Attr>;
}

/// One attribute: either a leaf value or another object.
#[derive(Clone)]
pub enum Attr {
    /// A leaf value.
    Value(Value),
    /// A child object.
    Object(Arc<dyn Attributes>),
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// An ordered attribute table, the simplest [`Attributes`] implementation.
#[derive(Debug, Clone, Default)]
pub struct AttrMap {
    attrs: IndexMap<String, Attr>,
}

impl AttrMap {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf attribute.
    #[must_use]
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), Attr::Value(value.into()));
        self
    }

    /// Add a child object.
    #[must_use]
    pub fn object(mut self, name: impl Into<String>, object: impl Attributes + 'static) -> Self {
        self.attrs
            .insert(name.into(), Attr::Object(Arc::new(object)));
        self
    }
}

impl Attributes for AttrMap {
    fn attr(&self, name: &str) -> Option<Attr> {
        self.attrs.get(name).cloned()
    }
}

/// Reads fields by attribute access, one attribute per address segment.
///
/// Reaching a leaf before the address is exhausted, or ending on an object
/// rather than a leaf, resolves to absence.
#[derive(Clone)]
pub struct Object {
    root: Arc<dyn Attributes>,
}

impl Object {
    /// Wrap an attribute tree.
    pub fn new(root: impl Attributes + 'static) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    /// Wrap a shared attribute tree.
    pub fn from_shared(root: Arc<dyn Attributes>) -> Self {
        Self { root }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").finish_non_exhaustive()
    }
}

fn step(current: Attr, name: &str) -> Option<Attr> {
    match current {
        Attr::Object(obj) => obj.attr(name),
        Attr::Value(_) => None,
    }
}

impl Source for Object {
    fn name(&self) -> String {
        "object".to_string()
    }

    fn path_for(&self, segments: Vec<String>) -> Path<'_> {
        Path::new(self, segments)
    }

    fn render(&self, segments: &[String]) -> String {
        segments.join(".")
    }

    fn get_value(&self, segments: &[String]) -> Option<Value> {
        match drill_down(Attr::Object(Arc::clone(&self.root)), segments, step)? {
            Attr::Value(value) => present(value),
            Attr::Object(_) => None,
        }
    }
}
