//! Decoding of Firestore typed values into plain JSON.
//!
//! The REST API wraps every value in a single-key object naming its type,
//! e.g. `{"stringValue": "hi"}` or `{"mapValue": {"fields": {...}}}`.

use serde_json::{Map, Number, Value};
use sitesmith_content::Fields;

use crate::traits::StoreError;

/// Decode a Firestore `fields` object.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields, StoreError> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

/// Decode a single typed value.
pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Some(object) = value.as_object() else {
        return Err(StoreError::Decode(format!("expected typed value object, got {value}")));
    };

    let Some((kind, inner)) = object.iter().next() else {
        return Err(StoreError::Decode("empty typed value".to_string()));
    };

    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        // 64-bit integers travel as strings
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(s.clone())),
            other => other.clone(),
        },
        "doubleValue" => match inner {
            Value::Number(_) => inner.clone(),
            Value::String(s) => s
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => {
            let mut point = Map::new();
            for key in ["latitude", "longitude"] {
                point.insert(
                    key.to_string(),
                    inner.get(key).cloned().unwrap_or(Value::from(0.0)),
                );
            }
            Value::Object(point)
        }
        "mapValue" => match inner.get("fields").and_then(Value::as_object) {
            Some(fields) => Value::Object(decode_fields(fields)?),
            None => Value::Object(Map::new()),
        },
        "arrayValue" => match inner.get("values").and_then(Value::as_array) {
            Some(values) => Value::Array(values.iter().map(decode_value).collect::<Result<_, _>>()?),
            None => Value::Array(Vec::new()),
        },
        other => {
            tracing::debug!("Ignoring unsupported Firestore value type {}", other);
            Value::Null
        }
    };

    Ok(decoded)
}
