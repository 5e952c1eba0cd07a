//! Live configuration objects.
//!
//! A [`Config`] is one instance of a [`Schema`]. Construction initializes
//! every field (defaults, child configs), merging layers sources over it,
//! and validation checks that every field ended up with a value.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Map;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::Schema;
use crate::source::Source;
use crate::value::{parse_bool, Value};

/// Storage for one attribute.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    /// A value field; `None` while absent.
    Value(Option<Value>),
    /// A nested config.
    Nested(Box<Config>),
}

/// A configuration object built from a [`Schema`].
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use figure::{Config, Dict, Environment, Field, Schema};
/// use serde_json::json;
///
/// # fn main() -> Result<(), figure::ConfigError> {
/// let schema = Schema::builder("app")
///     .field("host", Field::string().default_value("localhost"))
///     .field("port", Field::int())
///     .build()?;
///
/// let file = Dict::new(json!({"host": "db.internal", "port": 5432}));
/// let env = Environment::with_lookup(HashMap::from([
///     ("APP_PORT".to_string(), "6432".to_string()),
/// ]))
/// .with_prefix("app");
///
/// let mut config = Config::new(schema);
/// config.merge_sources(&[&file, &env])?;
/// config.validate()?;
///
/// assert_eq!(config.get_str("host")?, "db.internal");
/// assert_eq!(config.get_int("port")?, 6432);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    schema: Arc<Schema>,
    attrs: IndexMap<String, Slot>,
}

impl Config {
    /// Create a config of `schema` with every field initialized.
    pub fn new(schema: Arc<Schema>) -> Self {
        let mut config = Self {
            schema: Arc::clone(&schema),
            attrs: IndexMap::with_capacity(schema.fields().len()),
        };
        for field in schema.fields() {
            field.instance_for(&mut config).initialize();
        }
        config
    }

    /// The schema this config was built from.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Merge one top-level source.
    pub fn merge_source(&mut self, source: &dyn Source) -> ConfigResult<()> {
        self.merge_source_at(source, &[])
    }

    /// Merge one source with every address placed below `prefix`.
    ///
    /// Fields are loaded in declaration order. A field the source has no
    /// value for keeps its current value. On error, fields loaded before the
    /// failing one keep their new values.
    pub fn merge_source_at(&mut self, source: &dyn Source, prefix: &[String]) -> ConfigResult<()> {
        debug!(source = %source.name(), schema = %self.schema.name(), ?prefix, "Merging source");
        let schema = Arc::clone(&self.schema);
        for field in schema.fields() {
            field.instance_for(self).load_from_source(source, prefix)?;
        }
        Ok(())
    }

    /// Merge sources in order; later sources win where they have a value.
    pub fn merge_sources(&mut self, sources: &[&dyn Source]) -> ConfigResult<()> {
        self.merge_sources_at(sources, &[])
    }

    /// Merge sources in order below `prefix`.
    pub fn merge_sources_at(&mut self, sources: &[&dyn Source], prefix: &[String]) -> ConfigResult<()> {
        for source in sources {
            self.merge_source_at(*source, prefix)?;
        }
        Ok(())
    }

    /// Check that every field, recursively, has a value.
    ///
    /// Stops at the first missing field in declaration order.
    pub fn validate(&self) -> ConfigResult<()> {
        self.schema
            .fields()
            .iter()
            .try_for_each(|field| field.validate_in(self))
    }

    /// Whether `attr_name` is declared by the schema.
    pub fn is_declared(&self, attr_name: &str) -> bool {
        self.schema.field(attr_name).is_some()
    }

    /// Current value of a value field; `None` if absent, unknown or nested.
    pub fn get(&self, attr_name: &str) -> Option<&Value> {
        match self.slot(attr_name) {
            Some(Slot::Value(value)) => value.as_ref(),
            _ => None,
        }
    }

    /// The child config of a nested field.
    pub fn nested(&self, attr_name: &str) -> Option<&Config> {
        match self.slot(attr_name) {
            Some(Slot::Nested(child)) => Some(child),
            _ => None,
        }
    }

    /// Mutable access to the child config of a nested field.
    pub fn nested_mut(&mut self, attr_name: &str) -> Option<&mut Config> {
        match self.slot_mut(attr_name) {
            Some(Slot::Nested(child)) => Some(child),
            _ => None,
        }
    }

    /// Read a field as text.
    pub fn get_str(&self, attr_name: &str) -> ConfigResult<&str> {
        self.require(attr_name)?
            .as_str()
            .ok_or_else(|| ConfigError::type_mismatch(attr_name, "a string"))
    }

    /// Read a field as an integer; integer-looking strings are parsed.
    pub fn get_int(&self, attr_name: &str) -> ConfigResult<i64> {
        let value = self.require(attr_name)?;
        value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| ConfigError::type_mismatch(attr_name, "an integer"))
    }

    /// Read a field as a boolean; `true/false/1/0/yes/no/on/off` strings
    /// are accepted.
    pub fn get_bool(&self, attr_name: &str) -> ConfigResult<bool> {
        let value = self.require(attr_name)?;
        value
            .as_bool()
            .or_else(|| value.as_str().and_then(parse_bool))
            .ok_or_else(|| ConfigError::type_mismatch(attr_name, "a boolean"))
    }

    /// Overwrite a value field directly.
    pub fn set(&mut self, attr_name: &str, value: impl Into<Value>) -> ConfigResult<()> {
        match self.slot_mut(attr_name) {
            Some(Slot::Value(slot)) => {
                *slot = Some(value.into());
                Ok(())
            }
            Some(Slot::Nested(_)) => Err(ConfigError::type_mismatch(attr_name, "a value field")),
            None => Err(ConfigError::unknown_field(attr_name)),
        }
    }

    /// Snapshot the whole tree as JSON, keyed by attribute name.
    ///
    /// Absent fields appear as `null`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (attr_name, slot) in &self.attrs {
            let value = match slot {
                Slot::Value(value) => value.clone().unwrap_or(Value::Null),
                Slot::Nested(child) => child.to_value(),
            };
            map.insert(attr_name.clone(), value);
        }
        Value::Object(map)
    }

    fn require(&self, attr_name: &str) -> ConfigResult<&Value> {
        match self.slot(attr_name) {
            Some(Slot::Value(Some(value))) => Ok(value),
            Some(Slot::Value(None)) => Err(ConfigError::missing_field(attr_name)),
            Some(Slot::Nested(_)) => Err(ConfigError::type_mismatch(attr_name, "a value field")),
            None => Err(ConfigError::unknown_field(attr_name)),
        }
    }

    pub(crate) fn slot(&self, attr_name: &str) -> Option<&Slot> {
        self.attrs.get(attr_name)
    }

    pub(crate) fn slot_mut(&mut self, attr_name: &str) -> Option<&mut Slot> {
        self.attrs.get_mut(attr_name)
    }

    pub(crate) fn put_slot(&mut self, attr_name: &str, slot: Slot) {
        self.attrs.insert(attr_name.to_string(), slot);
    }
}
