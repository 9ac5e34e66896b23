//! Moving payloads between the generated API types, raw JSON and the
//! snake_case field structs each resource declares.

use crate::casing::{keys_to_camel, keys_to_snake};
use crate::error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Serialize a typed API payload into raw camelCase JSON, dropping nulls.
pub(crate) fn to_raw<T: Serialize>(payload: &T) -> Result<Value> {
    Ok(strip_nulls(serde_json::to_value(payload)?))
}

/// Build a typed API request from raw camelCase JSON.
///
/// Goes through text: some generated field types (`FieldMask`) only
/// deserialize from borrowed strings.
pub(crate) fn to_api<T: DeserializeOwned>(raw: Value) -> Result<T> {
    Ok(serde_json::from_str(&raw.to_string())?)
}

/// Bind a raw API payload to a resource's field struct.
pub(crate) fn bind<T: DeserializeOwned>(raw: Value) -> Result<T> {
    Ok(serde_json::from_value(keys_to_snake(strip_nulls(raw)))?)
}

/// Inverse of [`bind`]: camelCase JSON ready for a request body.
pub(crate) fn unbind<T: Serialize>(data: &T) -> Result<Value> {
    Ok(keys_to_camel(to_raw(data)?))
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
