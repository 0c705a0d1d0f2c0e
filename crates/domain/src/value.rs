//! Text rendering of JSON values for URLs, query strings and form fields.

use serde_json::Value;

/// Renders a value as plain text.
///
/// Strings are taken verbatim, numbers in decimal, booleans as
/// `true`/`false`, objects and arrays as compact JSON. `Null` has no text
/// form.
#[must_use]
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!("a b")), Some("a b".to_string()));
        assert_eq!(value_to_text(&json!(42)), Some("42".to_string()));
        assert_eq!(value_to_text(&json!(1.5)), Some("1.5".to_string()));
        assert_eq!(value_to_text(&json!(true)), Some("true".to_string()));
        assert_eq!(value_to_text(&json!({"a": [1]})), Some(r#"{"a":[1]}"#.to_string()));
        assert_eq!(value_to_text(&Value::Null), None);
    }
}
