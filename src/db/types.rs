use rusqlite::types::Value as SqlValue;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Trait for types that can be stored in the database
pub trait Entity: Serialize + DeserializeOwned {}

// Blanket implementation for any type that meets the requirements
impl<T> Entity for T where T: Serialize + DeserializeOwned {}

/// A row in JSON form, keyed by column name.
pub type Row = Map<String, Value>;

/// Columns every resource table carries in addition to its own fields.
/// Callers can never overwrite them through `Db::update`.
pub const IDENTITY_COLUMNS: &[&str] = &["id", "user_id", "created_at"];

/// Converts a JSON value into something rusqlite can bind. Nested arrays and
/// objects are stored as their JSON text.
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}
