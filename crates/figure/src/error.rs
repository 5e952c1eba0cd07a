//! Configuration error types.

use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while declaring, merging or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A field never received a value from its default or from any source.
    #[error("missing field '{field}'")]
    MissingField {
        /// Dotted attribute path of the missing field.
        field: String,
    },

    /// An integer field received a value that does not parse as an integer.
    ///
    /// The value and parse error are carried through unchanged. When the
    /// field sits inside nested configs, `field` is qualified with each
    /// enclosing attribute name (`database.port`).
    #[error("invalid integer for field '{field}': {value:?}")]
    Coercion {
        /// Dotted attribute path of the field.
        field: String,
        /// The offending source value, rendered as text.
        value: String,
        /// Underlying parse error.
        #[source]
        source: ParseIntError,
    },

    /// Two fields of one schema share an attribute name.
    #[error("duplicate field '{field}' in schema {schema}")]
    DuplicateField {
        /// Schema being built.
        schema: String,
        /// The repeated attribute name.
        field: String,
    },

    /// A field referenced by attribute name does not exist in the schema.
    #[error("unknown field '{field}'")]
    UnknownField {
        /// The attribute name that was asked for.
        field: String,
    },

    /// A typed accessor found a value of another type.
    #[error("field '{field}' is not {expected}")]
    TypeMismatch {
        /// The attribute name.
        field: String,
        /// Human-readable description of the expected type.
        expected: &'static str,
    },

    /// A flat module could not be resolved by name.
    #[error("module not found: {name}")]
    ModuleNotFound {
        /// The module name that failed to resolve.
        name: String,
    },

    /// Failed to read a backing file.
    #[error("failed to read {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed sectioned key-value text.
    #[error("parse error on line {line}: {reason}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// Explanation of the problem.
        reason: String,
    },

    /// Malformed `.env` content.
    #[error("failed to parse dotenv file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create a new missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a new coercion error.
    pub fn coercion(field: impl Into<String>, value: impl Into<String>, source: ParseIntError) -> Self {
        Self::Coercion {
            field: field.into(),
            value: value.into(),
            source,
        }
    }

    /// Create a new duplicate field error.
    pub fn duplicate_field(schema: impl Into<String>, field: impl Into<String>) -> Self {
        Self::DuplicateField {
            schema: schema.into(),
            field: field.into(),
        }
    }

    /// Create a new unknown field error.
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// Create a new type mismatch error.
    pub fn type_mismatch(field: impl Into<String>, expected: &'static str) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected,
        }
    }

    /// Create a new module not found error.
    pub fn module_not_found(name: impl Into<String>) -> Self {
        Self::ModuleNotFound { name: name.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new parse error.
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }

    /// Qualify the field named by this error with an enclosing attribute.
    ///
    /// Errors that do not name a field are returned unchanged.
    pub fn nested_under(self, parent: &str) -> Self {
        match self {
            Self::MissingField { field } => Self::MissingField {
                field: format!("{parent}.{field}"),
            },
            Self::Coercion {
                field,
                value,
                source,
            } => Self::Coercion {
                field: format!("{parent}.{field}"),
                value,
                source,
            },
            other => other,
        }
    }

    /// Whether this is a validation failure rather than a data or I/O problem.
    pub fn is_missing_field(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }
}
