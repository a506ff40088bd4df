//! Conversion between entity structs and store rows.
//!
//! Entities serialize with camelCase keys (the shape the presentation layer
//! consumes). The store uses snake_case columns. The mapping is applied to
//! top-level keys only; nested JSON values (poll options, conversation turns)
//! are stored as-is.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{table::Table, Row, StoreError, StoreResult};

/// An entity persisted in a single store table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: Table;

    fn id(&self) -> &str;
}

/// `classId` -> `class_id`
pub fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (index, ch) in key.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if index > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `class_id` -> `classId`
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Rename every top-level key of a client-shaped row to its store column.
pub fn to_remote(row: Row) -> Row {
    row.into_iter()
        .map(|(key, value)| (camel_to_snake(&key), value))
        .collect()
}

/// Rename every top-level store column back to its client-side key.
pub fn from_remote(row: Row) -> Row {
    row.into_iter()
        .map(|(key, value)| (snake_to_camel(&key), value))
        .collect()
}

/// Serialize a value into a client-shaped (camelCase) row.
pub fn to_client_row<T: Serialize>(value: &T) -> StoreResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Decode(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Deserialize a client-shaped (camelCase) row.
pub fn from_client_row<T: DeserializeOwned>(row: Row) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Serialize an entity or patch into a store row.
pub fn encode<T: Serialize>(value: &T) -> StoreResult<Row> {
    to_client_row(value).map(to_remote)
}

/// Decode a store row into an entity.
pub fn decode<T: DeserializeOwned>(row: Row) -> StoreResult<T> {
    from_client_row(from_remote(row))
}

/// Decode a whole table; fails if any row is malformed.
pub fn decode_all<T: DeserializeOwned>(rows: Vec<Row>) -> StoreResult<Vec<T>> {
    rows.into_iter().map(decode).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
