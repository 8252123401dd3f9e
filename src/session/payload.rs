//! Display-name extraction from decoded payloads.
//!
//! Badges and tickets often carry a JSON record such as
//! `{"name":"Alice","id":42}`. When the payload parses as an object with a
//! usable `name` member, that member is the display name; otherwise the raw
//! payload is shown as-is.

use serde_json::{Number, Value};

/// Derive the display name for a decoded payload.
///
/// # Example
///
/// ```
/// use qrscan::session::extract_name;
///
/// assert_eq!(extract_name(r#"{"name":"Alice"}"#), "Alice");
/// assert_eq!(extract_name("hello"), "hello");
/// ```
#[must_use]
pub fn extract_name(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(record)) => record
            .get("name")
            .and_then(name_text)
            .unwrap_or_else(|| raw.to_string()),
        Ok(_) => raw.to_string(),
        Err(e) => {
            log::trace!("Payload is not JSON ({}), using raw text", e);
            raw.to_string()
        }
    }
}

/// Render a `name` member, or `None` when it is empty-ish
/// (`null`, `false`, `0`, `""`).
fn name_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(number_text(n)),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Shortest decimal form: `1.0` and `1e2` read as `1` and `100`.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() => format!("{f}"),
        _ => n.to_string(),
    }
}
