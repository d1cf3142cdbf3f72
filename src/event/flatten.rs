use std::collections::BTreeMap;

use serde_json::Value;

use crate::SerializationError;

pub const DEFAULT_SEPARATOR: &str = "_";

/// Flattens a JSON document into a single-level object.
///
/// Nested object keys are joined with `separator`
/// (`{"event":{"metadata":{"name":"x"}}}` becomes `{"event_metadata_name":"x"}`);
/// leaf values, arrays included, are copied untouched. Nested objects with no
/// keys leave no entry behind. Keys come out sorted.
pub fn flatten_json_str(
    json: &str,
    separator: &str,
) -> std::result::Result<String, SerializationError> {
    let value: Value = serde_json::from_str(json)?;
    let flat = flatten_value(&value, separator)?;
    Ok(serde_json::to_string(&flat)?)
}

/// Same as [`flatten_json_str`] on an already parsed document.
///
/// The top level must be an object.
pub fn flatten_value(
    value: &Value,
    separator: &str,
) -> std::result::Result<BTreeMap<String, Value>, SerializationError> {
    let Value::Object(root) = value else {
        return Err(SerializationError::Flatten(format!(
            "expected a JSON object at the top level, found {}",
            json_kind(value)
        )));
    };

    let mut flat = BTreeMap::new();
    for (key, nested) in root {
        flatten_into(key, nested, &mut flat, separator);
    }
    Ok(flat)
}

fn flatten_into(
    prefix: &str,
    value: &Value,
    flat: &mut BTreeMap<String, Value>,
    separator: &str,
) {
    match value {
        Value::Object(nested) => {
            for (key, inner) in nested {
                let joined = format!("{prefix}{separator}{key}");
                flatten_into(&joined, inner, flat, separator);
            }
        }
        leaf => {
            flat.insert(prefix.to_string(), leaf.clone());
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
