//! Canonical JSON rendering used for value equality and text matching.
//!
//! Object members are emitted in lexicographic key order regardless of how
//! the map was built, arrays keep their order, and no whitespace is added.
//! Numbers render exactly as `serde_json` prints them, so `1` and `1.0` are
//! different values.

use serde_json::Value;

/// Render `value` as canonical compact JSON.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    #[test]
    fn object_keys_are_sorted() {
        let mut forward = Map::new();
        forward.insert("b".into(), json!(2));
        forward.insert("a".into(), json!(1));
        let mut reverse = Map::new();
        reverse.insert("a".into(), json!(1));
        reverse.insert("b".into(), json!(2));

        let left = canonical_json(&Value::Object(forward));
        assert_eq!(left, r#"{"a":1,"b":2}"#);
        assert_eq!(left, canonical_json(&Value::Object(reverse)));
    }

    #[test]
    fn nested_values_are_canonical() {
        let value = json!({"z": [{"y": true, "x": null}], "a": "text"});
        assert_eq!(canonical_json(&value), r#"{"a":"text","z":[{"x":null,"y":true}]}"#);
    }

    #[test]
    fn array_order_is_significant() {
        assert_ne!(canonical_json(&json!([1, 2])), canonical_json(&json!([2, 1])));
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(canonical_json(&json!({"q\"k": "line\nbreak"})), r#"{"q\"k":"line\nbreak"}"#);
    }

    #[test]
    fn integer_and_float_differ() {
        assert_ne!(canonical_json(&json!(1)), canonical_json(&json!(1.0)));
    }
}
