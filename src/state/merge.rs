//! Shallow merge of partial tool state

use serde_json::{Map, Value};

/// Merge `partial` into `target` key by key.
///
/// Keys in `partial` overwrite, keys absent from it are kept, and nested
/// objects are replaced as a whole. A non-object `target` is replaced by an
/// object first.
pub fn shallow_merge(target: &mut Value, partial: Map<String, Value>) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(existing) = target {
        for (key, value) in partial {
            existing.insert(key, value);
        }
    }
}

/// Name of a JSON value's type, for error messages
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
