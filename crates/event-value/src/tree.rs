//! Tree serializer: [`Value`] → `serde_json::Value` → JSON bytes.
//!
//! The simple path. Every node becomes a generic JSON node first, then
//! serde_json encodes the finished tree. Output is semantically identical to
//! the streaming path in [`crate::stream`].
//!
//! # Example
//! ```
//! use event_value::{to_json_tree, Struct, Value};
//! let mut s = Struct::new();
//! s.insert("a", 1i64);
//! assert_eq!(to_json_tree(&Value::Struct(s)).unwrap(), br#"{"a":1}"#);
//! ```

use serde_json::{Map, Number, Value as Json};

use crate::error::{Result, SerializationError};
use crate::limits::Limits;
use crate::value::Value;

/// Render a value as JSON bytes with the default [`Limits`].
pub fn to_json_tree(value: &Value) -> Result<Vec<u8>> {
    to_json_tree_with(value, &Limits::default())
}

/// Render a value as JSON bytes under explicit [`Limits`].
pub fn to_json_tree_with(value: &Value, limits: &Limits) -> Result<Vec<u8>> {
    let tree = to_json_value_with(value, limits)?;
    Ok(serde_json::to_vec(&tree)?)
}

/// Build the intermediate JSON object model with the default [`Limits`].
pub fn to_json_value(value: &Value) -> Result<Json> {
    to_json_value_with(value, &Limits::default())
}

/// Build the intermediate JSON object model under explicit [`Limits`].
pub fn to_json_value_with(value: &Value, limits: &Limits) -> Result<Json> {
    build(value, 0, limits).inspect_err(|e| {
        tracing::debug!(error = %e, kind = value.kind(), "tree serialization failed");
    })
}

/// Recursive dispatch. `depth` is the number of containers above `value`.
fn build(value: &Value, depth: usize, limits: &Limits) -> Result<Json> {
    let json = match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int32(n) => Json::from(*n),
        Value::Int64(n) => Json::from(*n),
        Value::Uint32(n) => Json::from(*n),
        Value::Uint64(n) => Json::from(*n),
        Value::Float32(f) => Json::Number(float32_number(*f)?),
        Value::Float64(f) => Json::Number(float64_number(*f)?),
        Value::String(s) => Json::String(s.clone()),
        Value::Timestamp(ts) => Json::String(ts.to_rfc3339()?),
        Value::Struct(s) => {
            let depth = descend(depth, limits)?;
            let mut map = Map::with_capacity(s.len());
            for (k, v) in s {
                map.insert(k.clone(), build(v, depth, limits)?);
            }
            Json::Object(map)
        }
        Value::List(items) => {
            let depth = descend(depth, limits)?;
            Json::Array(
                items
                    .iter()
                    .map(|item| build(item, depth, limits))
                    .collect::<Result<Vec<_>>>()?,
            )
        }
    };
    Ok(json)
}

fn descend(depth: usize, limits: &Limits) -> Result<usize> {
    let depth = depth + 1;
    if depth > limits.max_depth {
        return Err(SerializationError::DepthLimitExceeded(limits.max_depth));
    }
    Ok(depth)
}

fn float64_number(f: f64) -> Result<Number> {
    Number::from_f64(f).ok_or(SerializationError::NonFiniteFloat(f))
}

/// A JSON number holding the shortest decimal that identifies `f` as an f32.
///
/// Widening with `as f64` would carry the binary error into the output
/// (`45.3f32` would print as `45.29999923706055`), so the f32's own shortest
/// text is re-read at f64 precision instead.
fn float32_number(f: f32) -> Result<Number> {
    if !f.is_finite() {
        return Err(SerializationError::NonFiniteFloat(f.into()));
    }
    let widened: f64 = f.to_string().parse().unwrap_or(f64::from(f));
    float64_number(widened)
}
