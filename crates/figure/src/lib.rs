//! Declarative, layered configuration.
//!
//! A configuration type is described once as a [`Schema`]: an ordered set of
//! [`Field`]s, each with an optional external name, an optional default and a
//! kind (primitive, integer, boolean or a nested schema). A [`Config`] built
//! from that schema is then filled from any number of [`Source`]s in
//! precedence order and finally validated.
//!
//! Sources share one addressing scheme. A field's address is the list of
//! external names from the root down to the field, and each source maps that
//! address onto its own storage:
//!
//! - [`Environment`]: upper snake case variables, optionally prefixed
//! - [`FlatModule`]: upper snake case attributes of a named module
//! - [`Dict`]: nested JSON or TOML maps
//! - [`Object`]: dotted attribute access over [`Attributes`]
//! - [`ConfigParser`]: INI-style sections and options
//!
//! Merging never clears a value: a source without a value for a field leaves
//! whatever an earlier source or the default put there.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use figure::{Config, ConfigParser, Environment, Field, IniParser, Schema};
//!
//! # fn main() -> Result<(), figure::ConfigError> {
//! let database = Schema::builder("database")
//!     .field("host", Field::string().default_value("localhost"))
//!     .field("port", Field::int().default_value(5432))
//!     .build()?;
//!
//! let app = Schema::builder("app")
//!     .field("name", Field::string())
//!     .field("debug", Field::bool().default_value(false))
//!     .field("database", Field::nested(database).named("db"))
//!     .build()?;
//!
//! let ini = ConfigParser::new(IniParser::parse(
//!     "[general]\nname = billing\n\n[db]\nhost = db.internal\n",
//! )?);
//! let env = Environment::with_lookup(HashMap::from([
//!     ("BILLING_DB_PORT".to_string(), "6432".to_string()),
//!     ("BILLING_DEBUG".to_string(), "on".to_string()),
//! ]))
//! .with_prefix("billing");
//!
//! let mut config = Config::new(app);
//! config.merge_sources(&[&ini, &env])?;
//! config.validate()?;
//!
//! assert_eq!(config.get_str("name")?, "billing");
//! assert!(config.get_bool("debug")?);
//!
//! let db = config.nested("database").expect("declared nested field");
//! assert_eq!(db.get_str("host")?, "db.internal");
//! assert_eq!(db.get_int("port")?, 6432);
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! Lookups and merges are reported through [`tracing`]: field initialization
//! and every source lookup at `INFO`, each merged source at `DEBUG`, and
//! module resolution failures at `WARN`. The crate never installs a
//! subscriber.

#![warn(missing_docs)]

mod config;
mod error;
mod field;
mod schema;
pub mod source;
pub mod value;

pub use config::Config;
pub use error::{ConfigError, ConfigResult};
pub use field::{Field, FieldInstance, FieldKind};
pub use schema::{Schema, SchemaBuilder};
pub use source::{
    Attr, AttrMap, Attributes, ConfigParser, Dict, DotenvFile, EnvLookup, Environment,
    FileModules, FlatModule, IniParser, Module, ModuleResolver, Object, Path, ProcessEnv,
    SectionedParser, Source, StaticModules,
};
pub use value::Value;
