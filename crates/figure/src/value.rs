//! Values carried from sources into configuration objects.
//!
//! Every source normalises what it finds into a [`Value`]. Absence is
//! always `None` at the call site; a JSON `null` coming out of a backing
//! store is folded into absence by [`present`].

pub use serde_json::Value;

/// Treat `null` as "no value", pass everything else through.
///
/// `false`, `0` and `""` are ordinary values and stay present.
pub fn present(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        other => Some(other),
    }
}

/// Render a value as plain text, without quoting strings.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse the usual textual spellings of a boolean.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
