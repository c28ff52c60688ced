//! Bracket-notation flattening of JSON parameters for query strings and
//! form bodies (`a[b]=1`, `list[0]=x`)

use serde_json::Value;
use tokenly_auth::is_empty_params;

use crate::transport::TransportError;

/// Flatten parameters into ordered key/value pairs
///
/// `null` members are skipped and booleans become `1`/`0`. Empty parameters
/// yield no pairs; any other top-level scalar cannot be expressed as fields.
pub fn flatten(params: &Value) -> Result<Vec<(String, String)>, TransportError> {
    if is_empty_params(params) {
        return Ok(Vec::new());
    }

    let mut pairs = Vec::new();
    match params {
        Value::Object(map) => {
            for (key, value) in map {
                push_value(&mut pairs, key.clone(), value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                push_value(&mut pairs, index.to_string(), value);
            }
        }
        other => {
            return Err(TransportError::Encode(format!(
                "parameters must be an object or array, got {}",
                other
            )))
        }
    }
    Ok(pairs)
}

fn push_value(pairs: &mut Vec<(String, String)>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push((key, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_value(pairs, format!("{}[{}]", key, index), item);
            }
        }
        Value::Object(map) => {
            for (child, item) in map {
                push_value(pairs, format!("{}[{}]", key, child), item);
            }
        }
    }
}

/// `application/x-www-form-urlencoded` encoding of the flattened parameters
pub fn encode(params: &Value) -> Result<String, TransportError> {
    let pairs = flatten(params)?;
    serde_urlencoded::to_string(&pairs).map_err(|e| TransportError::Encode(e.to_string()))
}
