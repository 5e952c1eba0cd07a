//! Schema declaration.
//!
//! A [`Schema`] is the ordered set of fields a configuration type declares.
//! Fields are registered explicitly through [`SchemaBuilder`], which assigns
//! each field its attribute name; the order of registration is the order in
//! which fields are initialized, merged and validated.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{ConfigError, ConfigResult};
use crate::field::Field;

/// An ordered set of declared fields.
///
/// # Example
///
/// ```
/// use figure::{Field, Schema};
///
/// # fn main() -> Result<(), figure::ConfigError> {
/// let database = Schema::builder("database")
///     .field("host", Field::string().default_value("localhost"))
///     .field("port", Field::int().default_value(5432))
///     .build()?;
///
/// let app = Schema::builder("app")
///     .field("debug", Field::bool().default_value(false))
///     .field("database", Field::nested(database))
///     .build()?;
///
/// assert_eq!(app.fields().len(), 2);
/// assert_eq!(app.fields()[1].attr_name(), "database");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Start declaring a schema called `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// The schema name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields, in registration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by attribute name.
    pub fn field(&self, attr_name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.attr_name() == attr_name)
    }

    /// Build a config of this schema with every field initialized.
    pub fn instantiate(self: &Arc<Self>) -> Config {
        Config::new(Arc::clone(self))
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Create a builder with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Register `field` under `attr_name`, after all fields registered so far.
    #[must_use]
    pub fn field(mut self, attr_name: impl Into<String>, field: Field) -> Self {
        self.fields.push(field.register(attr_name));
        self
    }

    /// Finish the schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateField`] if two fields share an
    /// attribute name.
    pub fn build(self) -> ConfigResult<Arc<Schema>> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.attr_name()) {
                return Err(ConfigError::duplicate_field(&self.name, field.attr_name()));
            }
        }

        Ok(Arc::new(Schema {
            name: self.name,
            fields: self.fields,
        }))
    }
}
