//! JSON-style rendering for failure diagnostics.
//!
//! Rendering follows `JSON.stringify` conventions: values with no JSON form (undefined, symbols, host references) are
//! dropped from objects, become `null` inside arrays, and render as `undefined` at the top level. Non-finite numbers
//! become `null`. Dates render as a `Date(<millis>)` string.

use crate::value::Value;

/// Largest integer magnitude an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Convert a value to its JSON form, or `None` when it has none.
pub fn to_json(value: &Value) -> Option<serde_json::Value> {
    match value {
        Value::Undefined | Value::Symbol(_) | Value::Host(_) => None,
        Value::Null => Some(serde_json::Value::Null),
        Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
        Value::Number(n) => Some(number_to_json(*n)),
        Value::String(s) => Some(serde_json::Value::String(s.to_string())),
        Value::Date(date) => Some(serde_json::Value::String(format!("Date({})", date.millis()))),
        Value::Array(items) => Some(serde_json::Value::Array(
            items
                .iter()
                .map(|item| to_json(item).unwrap_or(serde_json::Value::Null))
                .collect(),
        )),
        Value::Object(obj) => Some(serde_json::Value::Object(
            obj.properties()
                .iter()
                .filter_map(|(k, v)| to_json(v).map(|json| (k.clone(), json)))
                .collect(),
        )),
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    // Integral values print without a fraction, like `1` rather than `1.0`.
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

/// Render a value as pretty-printed JSON with two-space indentation.
pub fn render_pretty(value: &Value) -> String {
    match to_json(value) {
        Some(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string()),
        None => "undefined".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_primitives() {
        assert_eq!(render_pretty(&1.into()), "1");
        assert_eq!(render_pretty(&(-0.0).into()), "0");
        assert_eq!(render_pretty(&1.5.into()), "1.5");
        assert_eq!(render_pretty(&f64::NAN.into()), "null");
        assert_eq!(render_pretty(&"hi".into()), "\"hi\"");
        assert_eq!(render_pretty(&Value::Undefined), "undefined");
        assert_eq!(render_pretty(&Value::symbol("s")), "undefined");
        assert_eq!(render_pretty(&Value::date(3.0)), "\"Date(3)\"");
    }

    #[test]
    fn renders_nested_with_two_space_indent() {
        let v = Value::object([("a", Value::array([1, 2])), ("b", Value::Undefined)]);
        assert_eq!(render_pretty(&v), "{\n  \"a\": [\n    1,\n    2\n  ]\n}");
    }

    #[test]
    fn keeps_insertion_order_of_keys() {
        let v = Value::object([("zeta", Value::from(1)), ("alpha", Value::object([("b", 2), ("a", 3)]))]);
        assert_eq!(
            render_pretty(&v),
            "{\n  \"zeta\": 1,\n  \"alpha\": {\n    \"b\": 2,\n    \"a\": 3\n  }\n}"
        );
    }

    #[test]
    fn unrepresentable_array_items_become_null() {
        let v = Value::array([Value::Undefined, Value::host("x")]);
        assert_eq!(render_pretty(&v), "[\n  null,\n  null\n]");
    }

    #[test]
    fn empty_composites_render_compactly() {
        assert_eq!(render_pretty(&Value::array(Vec::<Value>::new())), "[]");
        assert_eq!(render_pretty(&Value::object(Vec::<(String, Value)>::new())), "{}");
    }
}
