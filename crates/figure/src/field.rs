//! Field declarations and their per-config bindings.
//!
//! A [`Field`] is the static declaration of one configuration slot and is
//! shared by every config built from its schema. A [`FieldInstance`] binds a
//! field to one [`Config`] and performs that field's part of
//! initialization, merging and validation.

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, Slot};
use crate::error::{ConfigError, ConfigResult};
use crate::schema::Schema;
use crate::source::Source;
use crate::value::{to_text, Value};

/// What a field holds and how source values are turned into it.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Any value, stored as found.
    Primitive,
    /// An integer; source values are parsed.
    Integer,
    /// A boolean, stored as found and interpreted on read.
    Boolean,
    /// A nested configuration built from another schema.
    Nested(Arc<Schema>),
}

impl FieldKind {
    /// Short lowercase name for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primitive => "primitive",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Nested(_) => "nested",
        }
    }
}

/// Declaration of one named, typed configuration slot.
///
/// # Example
///
/// ```
/// use figure::{Field, Value};
///
/// let port = Field::int().named("listen_port").default_value(8080);
/// assert_eq!(port.default(), Some(&Value::from(8080)));
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    name: Option<String>,
    attr_name: String,
    default: Option<Value>,
    kind: FieldKind,
}

impl Field {
    fn of_kind(kind: FieldKind) -> Self {
        Self {
            name: None,
            attr_name: String::new(),
            default: None,
            kind,
        }
    }

    /// A field that passes source values through untouched.
    pub fn primitive() -> Self {
        Self::of_kind(FieldKind::Primitive)
    }

    /// A text field. Behaves exactly like [`Field::primitive`].
    pub fn string() -> Self {
        Self::primitive()
    }

    /// A field whose source values are parsed as integers.
    pub fn int() -> Self {
        Self::of_kind(FieldKind::Integer)
    }

    /// A boolean field.
    pub fn bool() -> Self {
        Self::of_kind(FieldKind::Boolean)
    }

    /// A field holding a nested configuration of `schema`.
    pub fn nested(schema: Arc<Schema>) -> Self {
        Self::of_kind(FieldKind::Nested(schema))
    }

    /// Use `name` as the key in sources instead of the attribute name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Value used when no source supplies one. Ignored for nested fields.
    #[must_use]
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub(crate) fn register(mut self, attr_name: impl Into<String>) -> Self {
        self.attr_name = attr_name.into();
        self
    }

    /// The key this field is looked up under in sources.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.attr_name)
    }

    /// The attribute this field populates.
    pub fn attr_name(&self) -> &str {
        &self.attr_name
    }

    /// The declared default, if any.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The field kind.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Full address of this field below `prefix`.
    pub fn path_segments(&self, prefix: &[String]) -> Vec<String> {
        let mut segments = prefix.to_vec();
        segments.push(self.name().to_string());
        segments
    }

    /// Look this field up in `source` without touching any config.
    pub fn get_from_source(&self, source: &dyn Source, prefix: &[String]) -> Option<Value> {
        let path = source.path_for(self.path_segments(prefix));
        let source_name = source.name();
        match path.value() {
            Some(value) => {
                info!(source = %source_name, path = %path, value = %value, "Got value from source");
                Some(value.clone())
            }
            None => {
                info!(source = %source_name, path = %path, "Value doesn't exist in source");
                None
            }
        }
    }

    pub(crate) fn validate_in(&self, config: &Config) -> ConfigResult<()> {
        match config.slot(&self.attr_name) {
            Some(Slot::Nested(child)) => child
                .validate()
                .map_err(|e| e.nested_under(&self.attr_name)),
            Some(Slot::Value(Some(_))) => Ok(()),
            _ => Err(ConfigError::missing_field(self.attr_name.as_str())),
        }
    }

    /// Bind this field to `config`.
    pub fn instance_for<'c>(&'c self, config: &'c mut Config) -> FieldInstance<'c> {
        FieldInstance {
            field: self,
            config,
        }
    }
}

/// A [`Field`] bound to one [`Config`].
///
/// The config owns its attributes; the instance only mediates reads and
/// writes of the one attribute its field declares.
#[derive(Debug)]
pub struct FieldInstance<'c> {
    field: &'c Field,
    config: &'c mut Config,
}

impl FieldInstance<'_> {
    /// The bound field.
    pub fn field(&self) -> &Field {
        self.field
    }

    /// Current value of the bound attribute.
    ///
    /// `None` while the attribute is absent, and always for nested fields.
    pub fn attr(&self) -> Option<&Value> {
        match self.config.slot(&self.field.attr_name) {
            Some(Slot::Value(value)) => value.as_ref(),
            _ => None,
        }
    }

    /// Write the bound attribute. Writing `None` leaves it unchanged.
    pub fn set_attr(&mut self, value: Option<Value>) {
        if let Some(value) = value {
            self.config
                .put_slot(&self.field.attr_name, Slot::Value(Some(value)));
        }
    }

    /// Establish the attribute's starting state.
    ///
    /// Value fields take their default (possibly absent); nested fields get
    /// a fresh child config.
    pub fn initialize(&mut self) {
        let slot = match &self.field.kind {
            FieldKind::Nested(schema) => {
                info!(field = %self.field.attr_name, "Initializing nested config");
                Slot::Nested(Box::new(Config::new(Arc::clone(schema))))
            }
            _ => {
                info!(
                    field = %self.field.attr_name,
                    default = ?self.field.default,
                    "Initializing field to default"
                );
                Slot::Value(self.field.default.clone())
            }
        };
        self.config.put_slot(&self.field.attr_name, slot);
    }

    /// Look this field up in `source` below `prefix`.
    pub fn get_from_source(&self, source: &dyn Source, prefix: &[String]) -> Option<Value> {
        self.field.get_from_source(source, prefix)
    }

    /// Load the attribute from `source`, leaving it unchanged if the source
    /// has no value for it.
    pub fn load_from_source(&mut self, source: &dyn Source, prefix: &[String]) -> ConfigResult<()> {
        let field = self.field;
        match &field.kind {
            FieldKind::Primitive | FieldKind::Boolean => {
                let value = self.get_from_source(source, prefix);
                self.set_attr(value);
            }
            FieldKind::Integer => {
                if let Some(value) = self.get_from_source(source, prefix) {
                    let parsed = coerce_int(&field.attr_name, &value)?;
                    self.set_attr(Some(Value::from(parsed)));
                }
            }
            FieldKind::Nested(_) => {
                let segments = field.path_segments(prefix);
                self.child_mut()
                    .merge_source_at(source, &segments)
                    .map_err(|e| e.nested_under(&field.attr_name))?;
            }
        }
        Ok(())
    }

    /// Check that the attribute received a value.
    ///
    /// Nested fields validate their child config; its failures are reported
    /// under this field's attribute name.
    pub fn validate(&self) -> ConfigResult<()> {
        self.field.validate_in(&*self.config)
    }

    fn child_mut(&mut self) -> &mut Config {
        if !matches!(self.config.slot(&self.field.attr_name), Some(Slot::Nested(_))) {
            self.initialize();
        }
        match self.config.slot_mut(&self.field.attr_name) {
            Some(Slot::Nested(child)) => &mut **child,
            _ => unreachable!("nested field initializes to a child config"),
        }
    }
}

fn coerce_int(attr_name: &str, value: &Value) -> ConfigResult<i64> {
    if let Some(int) = whole_number(value) {
        return Ok(int);
    }
    let text = to_text(value);
    text.trim()
        .parse::<i64>()
        .map_err(|e| ConfigError::coercion(attr_name, text.as_str(), e))
}

/// Non-string values that convert to an integer without loss.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::Number(number) => number.as_i64().or_else(|| {
            let float = number.as_f64()?;
            // `i64::MAX as f64` rounds up to 2^63, hence the exclusive bound.
            (float.fract() == 0.0 && float >= i64::MIN as f64 && float < i64::MAX as f64)
                .then_some(float as i64)
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Dict;
    use serde_json::json;

    fn single(field: Field) -> Config {
        let schema = Schema::builder("test").field("foo", field).build().unwrap();
        Config::new(schema)
    }

    fn prims() -> Vec<Field> {
        vec![Field::primitive(), Field::string(), Field::int(), Field::bool()]
    }

    fn prefixes() -> Vec<Vec<String>> {
        vec![
            vec![],
            vec!["bar".to_string()],
            vec!["bar".to_string(), "baz".to_string()],
        ]
    }

    #[test]
    fn test_name_falls_back_to_attr_name() {
        let config = single(Field::primitive());
        let field = &config.schema().fields()[0];
        assert_eq!(field.name(), "foo");
        assert_eq!(field.attr_name(), "foo");

        let config = single(Field::primitive().named("external"));
        let field = &config.schema().fields()[0];
        assert_eq!(field.name(), "external");
        assert_eq!(field.attr_name(), "foo");
    }

    #[test]
    fn test_asks_for_correct_path() {
        for field in prims() {
            let schema = Schema::builder("test").field("foo", field).build().unwrap();
            let field = &schema.fields()[0];
            for prefix in prefixes() {
                let mut expected = prefix.clone();
                expected.push("foo".to_string());
                assert_eq!(field.path_segments(&prefix), expected);
            }
        }
    }

    #[test]
    fn test_gets_correct_value() {
        let source = Dict::new(json!({"foo": "bar", "bar": {"foo": 1}, "t": true}));
        let schema = Schema::builder("test")
            .field("foo", Field::primitive())
            .field("t", Field::bool())
            .build()
            .unwrap();
        let foo = &schema.fields()[0];
        assert_eq!(foo.get_from_source(&source, &[]), Some(json!("bar")));
        assert_eq!(
            foo.get_from_source(&source, &["bar".to_string()]),
            Some(json!(1))
        );
        assert_eq!(foo.get_from_source(&source, &["nope".to_string()]), None);
        assert_eq!(schema.fields()[1].get_from_source(&source, &[]), Some(json!(true)));
    }

    #[test]
    fn test_initializes_as_absent_without_default() {
        for field in prims() {
            let config = single(field);
            assert!(config.get("foo").is_none());
            assert!(config.is_declared("foo"));
        }
    }

    #[test]
    fn test_initializes_to_default() {
        for default in [json!("bar"), json!(1), json!(true), json!(false), json!(0)] {
            for field in prims() {
                let config = single(field.default_value(default.clone()));
                assert_eq!(config.get("foo"), Some(&default));
            }
        }
    }

    #[test]
    fn test_absent_value_leaves_attr_unchanged() {
        let empty = Dict::new(json!({}));
        for value in [Some(json!("bar")), Some(json!(1)), Some(json!(true)), None] {
            for field in prims() {
                let field = match &value {
                    Some(v) => field.default_value(v.clone()),
                    None => field,
                };
                let mut config = single(field);
                config.merge_source(&empty).unwrap();
                assert_eq!(config.get("foo"), value.as_ref());
            }
        }
    }

    #[test]
    fn test_absent_nested_value_leaves_attr_unchanged() {
        let inner = Schema::builder("inner")
            .field("foo", Field::primitive().default_value("keep"))
            .build()
            .unwrap();
        let mut config = single(Field::nested(inner));
        config.merge_source(&Dict::new(json!({"foo": {"other": 1}}))).unwrap();
        assert_eq!(
            config.nested("foo").and_then(|c| c.get("foo")),
            Some(&json!("keep"))
        );
    }

    #[test]
    fn test_set_attr_none_is_noop() {
        let schema = Schema::builder("test")
            .field("foo", Field::primitive().default_value("x"))
            .build()
            .unwrap();
        let mut config = Config::new(Arc::clone(&schema));
        let field = &schema.fields()[0];

        let mut instance = field.instance_for(&mut config);
        instance.set_attr(None);
        assert_eq!(instance.attr(), Some(&json!("x")));
        instance.set_attr(Some(json!("y")));
        assert_eq!(instance.attr(), Some(&json!("y")));
    }

    #[test]
    fn test_primitive_and_bool_store_verbatim() {
        let source = Dict::new(json!({"p": "1", "b": "yes"}));
        let schema = Schema::builder("test")
            .field("p", Field::primitive())
            .field("b", Field::bool())
            .build()
            .unwrap();
        let mut config = Config::new(schema);
        config.merge_source(&source).unwrap();
        assert_eq!(config.get("p"), Some(&json!("1")));
        assert_eq!(config.get("b"), Some(&json!("yes")));
    }

    #[test]
    fn test_int_coerces_string() {
        let mut config = single(Field::int());
        config.merge_source(&Dict::new(json!({"foo": "1"}))).unwrap();
        assert_eq!(config.get("foo"), Some(&json!(1)));

        config.merge_source(&Dict::new(json!({"foo": " -42 "}))).unwrap();
        assert_eq!(config.get("foo"), Some(&json!(-42)));

        config.merge_source(&Dict::new(json!({"foo": 7}))).unwrap();
        assert_eq!(config.get("foo"), Some(&json!(7)));
    }

    #[test]
    fn test_int_rejects_non_numeric() {
        let mut config = single(Field::int().default_value(3));
        let err = config
            .merge_source(&Dict::new(json!({"foo": "abc"})))
            .unwrap_err();
        match err {
            ConfigError::Coercion { field, value, .. } => {
                assert_eq!(field, "foo");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(config.get("foo"), Some(&json!(3)));
    }

    #[test]
    fn test_int_rejects_fractional_float() {
        let mut config = single(Field::int());
        let result = config.merge_source(&Dict::new(json!({"foo": 1.5})));
        assert!(matches!(result, Err(ConfigError::Coercion { .. })));

        let result = config.merge_source(&Dict::new(json!({"foo": 1e300})));
        assert!(matches!(result, Err(ConfigError::Coercion { .. })));

        let result = config.merge_source(&Dict::new(json!({"foo": u64::MAX})));
        assert!(matches!(result, Err(ConfigError::Coercion { .. })));
    }

    #[test]
    fn test_int_accepts_whole_floats_and_booleans() {
        let mut config = single(Field::int());
        config.merge_source(&Dict::new(json!({"foo": 8080.0}))).unwrap();
        assert_eq!(config.get("foo"), Some(&json!(8080)));

        config.merge_source(&Dict::new(json!({"foo": -3.0}))).unwrap();
        assert_eq!(config.get("foo"), Some(&json!(-3)));

        config.merge_source(&Dict::new(json!({"foo": true}))).unwrap();
        assert_eq!(config.get("foo"), Some(&json!(1)));

        config.merge_source(&Dict::new(json!({"foo": false}))).unwrap();
        assert_eq!(config.get("foo"), Some(&json!(0)));
    }

    #[test]
    fn test_instance_validate() {
        let inner = Schema::builder("inner")
            .field("port", Field::int())
            .build()
            .unwrap();
        let schema = Schema::builder("test")
            .field("name", Field::primitive())
            .field("db", Field::nested(inner))
            .build()
            .unwrap();
        let mut config = Config::new(Arc::clone(&schema));
        let (name, db) = (&schema.fields()[0], &schema.fields()[1]);

        let err = name.instance_for(&mut config).validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field == "name"));

        let err = db.instance_for(&mut config).validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field == "db.port"));

        name.instance_for(&mut config).set_attr(Some(json!("svc")));
        assert!(name.instance_for(&mut config).validate().is_ok());

        config.nested_mut("db").unwrap().set("port", 5432).unwrap();
        assert!(db.instance_for(&mut config).validate().is_ok());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_instance_get_from_source_leaves_config_untouched() {
        let schema = Schema::builder("test")
            .field("foo", Field::int().default_value(1))
            .build()
            .unwrap();
        let mut config = Config::new(Arc::clone(&schema));
        let source = Dict::new(json!({"outer": {"foo": "2"}}));

        let instance = schema.fields()[0].instance_for(&mut config);
        assert_eq!(
            instance.get_from_source(&source, &["outer".to_string()]),
            Some(json!("2"))
        );
        assert_eq!(instance.attr(), Some(&json!(1)));
    }

    #[test]
    fn test_validate_missing_names_attr() {
        let config = single(Field::primitive().named("external"));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field == "foo"));
    }

    #[test]
    fn test_validate_accepts_falsy_values() {
        for default in [json!(false), json!(0), json!("")] {
            let config = single(Field::primitive().default_value(default));
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_nested_initializes_child() {
        let inner = Schema::builder("inner")
            .field("bar", Field::int().default_value(5))
            .build()
            .unwrap();
        let config = single(Field::nested(inner).default_value("ignored"));
        let child = config.nested("foo").unwrap();
        assert_eq!(child.get("bar"), Some(&json!(5)));
        assert!(config.get("foo").is_none());
    }

    #[test]
    fn test_nested_load_extends_prefix() {
        let inner = Schema::builder("inner")
            .field("bar", Field::primitive())
            .build()
            .unwrap();
        let mut config = single(Field::nested(inner).named("outer"));
        config
            .merge_source(&Dict::new(json!({"outer": {"bar": "baz"}})))
            .unwrap();
        assert_eq!(
            config.nested("foo").and_then(|c| c.get("bar")),
            Some(&json!("baz"))
        );
    }

    #[test]
    fn test_nested_errors_carry_dotted_name() {
        let inner = Schema::builder("inner")
            .field("port", Field::int())
            .build()
            .unwrap();
        let mut config = single(Field::nested(inner));

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field == "foo.port"));

        let err = config
            .merge_source(&Dict::new(json!({"foo": {"port": "x"}})))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Coercion { ref field, .. } if field == "foo.port"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Field::int().kind().as_str(), "integer");
        assert_eq!(Field::string().kind().as_str(), "primitive");
        assert_eq!(Field::bool().kind().as_str(), "boolean");
    }
}
