//! Sectioned key-value source (INI style).

use std::fmt;
use std::fs;
use std::path::Path as FsPath;

use indexmap::IndexMap;

use super::{Path, Source};
use crate::error::{ConfigError, ConfigResult};
use crate::value::{present, Value};

/// A store of options grouped into named sections.
pub trait SectionedParser: Send + Sync {
    /// Read `option` from `section`; `None` if either is missing.
    fn get(&self, section: &str, option: &str) -> Option<Value>;
}

/// A minimal INI document.
///
/// Section names are case-sensitive, option names are not (they are
/// stored lower-cased). Values are kept as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniParser {
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl IniParser {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse INI text.
    ///
    /// Supports `[section]` headers, `key = value` and `key: value` lines,
    /// and full-line `#` / `;` comments.
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let mut parser = Self::new();
        let mut current: Option<String> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or_else(|| ConfigError::parse(idx + 1, "unterminated section header"))?
                    .trim();
                parser.add_section(name);
                current = Some(name.to_string());
                continue;
            }

            let split = line
                .find(|c: char| c == '=' || c == ':')
                .ok_or_else(|| ConfigError::parse(idx + 1, "expected 'key = value'"))?;
            let section = current
                .as_deref()
                .ok_or_else(|| ConfigError::parse(idx + 1, "option outside of any section"))?;
            let (key, value) = line.split_at(split);
            parser.set(section, key.trim(), value[1..].trim());
        }

        Ok(parser)
    }

    /// Read and parse an INI file.
    pub fn read(path: impl AsRef<FsPath>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        Self::parse(&content)
    }

    /// Add a section if it does not exist yet.
    pub fn add_section(&mut self, name: impl Into<String>) {
        self.sections.entry(name.into()).or_default();
    }

    /// Set an option, creating the section if needed.
    pub fn set(
        &mut self,
        section: impl Into<String>,
        option: impl AsRef<str>,
        value: impl Into<String>,
    ) {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(option.as_ref().to_lowercase(), value.into());
    }

    /// Whether `name` is a section.
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Section names in file order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

impl SectionedParser for IniParser {
    fn get(&self, section: &str, option: &str) -> Option<Value> {
        self.sections
            .get(section)?
            .get(&option.to_lowercase())
            .map(|v| Value::String(v.clone()))
    }
}

/// Top-level tables act as sections. A section name is first looked up
/// literally (`["foo.bar"]`) and then as a dotted path of nested tables.
impl SectionedParser for toml::Table {
    fn get(&self, section: &str, option: &str) -> Option<Value> {
        let table = match self.get(section).and_then(toml::Value::as_table) {
            Some(table) => table,
            None => section.split('.').try_fold(self, |table, name| {
                table.get(name).and_then(toml::Value::as_table)
            })?,
        };
        serde_json::to_value(table.get(option)?).ok()
    }
}

/// Reads fields from a sectioned parser.
///
/// All address segments but the last, joined by the separator, name the
/// section (the general section when there is only one segment); the last
/// segment is the option.
pub struct ConfigParser {
    parser: Box<dyn SectionedParser>,
    general: String,
    separator: String,
}

impl ConfigParser {
    /// Default name of the section holding top-level options.
    pub const DEFAULT_GENERAL: &'static str = "general";

    /// Default section separator.
    pub const DEFAULT_SEPARATOR: &'static str = ".";

    /// Wrap a parser with the default general section and separator.
    pub fn new(parser: impl SectionedParser + 'static) -> Self {
        Self {
            parser: Box::new(parser),
            general: Self::DEFAULT_GENERAL.to_string(),
            separator: Self::DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Use `general` as the section for single-segment addresses.
    #[must_use]
    pub fn with_general(mut self, general: impl Into<String>) -> Self {
        self.general = general.into();
        self
    }

    /// Join section segments with `separator`.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// The section an address resolves to.
    pub fn section(&self, segments: &[String]) -> String {
        match segments.split_last() {
            Some((_, prefix)) if !prefix.is_empty() => prefix.join(self.separator.as_str()),
            _ => self.general.clone(),
        }
    }

    /// The option an address resolves to.
    pub fn option<'s>(&self, segments: &'s [String]) -> &'s str {
        segments.last().map_or("", String::as_str)
    }
}

impl fmt::Debug for ConfigParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigParser")
            .field("general", &self.general)
            .field("separator", &self.separator)
            .finish_non_exhaustive()
    }
}

impl Source for ConfigParser {
    fn name(&self) -> String {
        "config parser".to_string()
    }

    fn path_for(&self, segments: Vec<String>) -> Path<'_> {
        Path::new(self, segments)
    }

    fn render(&self, segments: &[String]) -> String {
        format!("[{}]{}", self.section(segments), self.option(segments))
    }

    fn get_value(&self, segments: &[String]) -> Option<Value> {
        self.parser
            .get(&self.section(segments), self.option(segments))
            .and_then(present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn cfg_parser() -> IniParser {
        let mut parser = IniParser::new();
        parser.add_section("general");
        parser.set("general", "bar", "1");
        parser.add_section("foo");
        parser.set("foo", "baz", "true");
        parser.add_section("foo.bar");
        parser.set("foo.bar", "baz", "hello");
        parser
    }

    #[test]
    fn test_single_prefix_section() {
        let source = ConfigParser::new(IniParser::new());
        assert!(source
            .path_for(segs(&["foo", "bar"]))
            .to_string()
            .starts_with("[foo]"));
    }

    #[test]
    fn test_multi_prefix_section() {
        let source = ConfigParser::new(IniParser::new());
        assert_eq!(
            source.path_for(segs(&["foo", "bar", "baz"])).to_string(),
            "[foo.bar]baz"
        );
    }

    #[test]
    fn test_custom_separator() {
        let source = ConfigParser::new(IniParser::new()).with_separator("/");
        assert!(source
            .path_for(segs(&["foo", "bar", "baz"]))
            .to_string()
            .starts_with("[foo/bar]"));
    }

    #[test]
    fn test_general_section() {
        let source = ConfigParser::new(IniParser::new());
        assert_eq!(source.path_for(segs(&["foo"])).to_string(), "[general]foo");
    }

    #[test]
    fn test_custom_general_section() {
        let source = ConfigParser::new(IniParser::new()).with_general("defaults");
        assert!(source
            .path_for(segs(&["foo"]))
            .to_string()
            .starts_with("[defaults]"));
    }

    #[test]
    fn test_general_value() {
        let source = ConfigParser::new(cfg_parser());
        assert_eq!(source.path_for(segs(&["bar"])).value(), Some(&json!("1")));
    }

    #[test]
    fn test_single_nested_value() {
        let source = ConfigParser::new(cfg_parser());
        assert_eq!(
            source.path_for(segs(&["foo", "baz"])).value(),
            Some(&json!("true"))
        );
    }

    #[test]
    fn test_multi_nested_value() {
        let source = ConfigParser::new(cfg_parser());
        assert_eq!(
            source.path_for(segs(&["foo", "bar", "baz"])).value(),
            Some(&json!("hello"))
        );
    }

    #[test]
    fn test_missing_values_are_absent() {
        let source = ConfigParser::new(cfg_parser());
        assert!(source.path_for(segs(&["baz"])).value().is_none());
        assert!(source.path_for(segs(&["foo", "quux"])).value().is_none());
        assert!(source.path_for(segs(&["quux", "bar"])).value().is_none());
    }

    #[test]
    fn test_parse_ini_text() {
        let parser = IniParser::parse(
            "# leading comment\n\
             [general]\n\
             Name = svc\n\
             \n\
             [database]\n\
             ; inline section comment\n\
             host: db.local\n\
             url = postgres://u@h/db?x=1\n",
        )
        .unwrap();

        assert_eq!(parser.sections().collect::<Vec<_>>(), ["general", "database"]);
        assert!(parser.has_section("database"));
        assert_eq!(parser.get("general", "name"), Some(json!("svc")));
        assert_eq!(parser.get("database", "HOST"), Some(json!("db.local")));
        assert_eq!(
            parser.get("database", "url"),
            Some(json!("postgres://u@h/db?x=1"))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            IniParser::parse("key = value"),
            Err(ConfigError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            IniParser::parse("[general]\njust text"),
            Err(ConfigError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            IniParser::parse("[general"),
            Err(ConfigError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_read_ini_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.ini");
        fs::write(&path, "[general]\nport = 80\n").unwrap();
        let source = ConfigParser::new(IniParser::read(&path).unwrap());
        assert_eq!(source.path_for(segs(&["port"])).value(), Some(&json!("80")));

        assert!(IniParser::read(dir.path().join("missing.ini")).is_err());
    }

    #[test]
    fn test_toml_table_sections() {
        let table: toml::Table = toml::from_str(
            r#"
            [general]
            port = 80

            ["foo.bar"]
            baz = "literal"

            [a.b]
            c = true
            "#,
        )
        .unwrap();

        let source = ConfigParser::new(table);
        assert_eq!(source.path_for(segs(&["port"])).value(), Some(&json!(80)));
        assert_eq!(
            source.path_for(segs(&["foo", "bar", "baz"])).value(),
            Some(&json!("literal"))
        );
        assert_eq!(
            source.path_for(segs(&["a", "b", "c"])).value(),
            Some(&json!(true))
        );
        assert!(source.path_for(segs(&["a", "x", "c"])).value().is_none());
    }
}
