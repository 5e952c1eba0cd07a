//! In-memory mapping source.

use serde::Serialize;

use super::{drill_down, Path, Source};
use crate::error::ConfigResult;
use crate::value::{present, Value};

/// Reads fields from a nested mapping, one level per address segment.
///
/// A missing key at any level, or a non-mapping reached before the address
/// is exhausted, resolves to absence.
#[derive(Debug, Clone, PartialEq)]
pub struct Dict {
    data: Value,
}

impl Dict {
    /// Wrap an existing JSON tree.
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// Parse a JSON document.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(Self::new(serde_json::from_str(content)?))
    }

    /// Parse a TOML document; tables become nested mappings.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let table: toml::Table = toml::from_str(content)?;
        Ok(Self::new(serde_json::to_value(table)?))
    }

    /// Snapshot any serializable value as a mapping.
    pub fn from_serializable<T: Serialize>(data: &T) -> ConfigResult<Self> {
        Ok(Self::new(serde_json::to_value(data)?))
    }

    /// The wrapped tree.
    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl From<Value> for Dict {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}

fn step<'v>(current: &'v Value, name: &str) -> Option<&'v Value> {
    current.as_object()?.get(name)
}

impl Source for Dict {
    fn name(&self) -> String {
        "dict".to_string()
    }

    fn path_for(&self, segments: Vec<String>) -> Path<'_> {
        Path::new(self, segments)
    }

    fn render(&self, segments: &[String]) -> String {
        segments.join(".")
    }

    fn get_value(&self, segments: &[String]) -> Option<Value> {
        drill_down(&self.data, segments, step).and_then(|v| present(v.clone()))
    }
}
