//! Tolerant field deserializers for upstream payloads whose numeric fields
//! arrive as numbers, numeric strings, or null depending on the endpoint.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Integer value of `value`, or 0 when it cannot be read as one.
pub fn int_of(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => s.replace(',', "").trim().parse().unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

pub fn float_of(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Positive catalog id, 0 for anything else.
pub fn id_of(value: &Value) -> u32 {
    u32::try_from(int_of(value)).unwrap_or(0)
}

pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Ok(int_of(&Value::deserialize(d)?))
}

pub fn float<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(float_of(&Value::deserialize(d)?))
}

pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(id_of(&Value::deserialize(d)?))
}

/// Positive ids from a JSON array, in order; non-arrays read as empty.
pub fn ids<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u32>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(values) => values.iter().map(id_of).filter(|id| *id > 0).collect(),
        _ => Vec::new(),
    })
}

pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

pub fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(values) => values
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Array of objects, dropping elements that fail to deserialize as `T`.
pub fn records<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(values) => values
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        _ => Vec::new(),
    })
}
