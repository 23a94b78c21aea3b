//! [`Value`] → native conversion, the inverse of [`convert`](fn@crate::convert).
//!
//! Used to check round trips and by consumers that want plain Rust data back.
//! Every variant has a native counterpart, so [`as_native`] cannot fail.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::timestamp::{self, Timestamp};
use crate::value::Value;

/// Dynamically typed native data with the same width-preserving numbers as
/// [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Map(BTreeMap<String, NativeValue>),
    Seq(Vec<NativeValue>),
}

/// Rebuild native data from a value tree.
///
/// Timestamps outside chrono's range, which only hand-built trees can hold,
/// are clamped to the nearest representable instant.
pub fn as_native(value: &Value) -> NativeValue {
    match value {
        Value::Null => NativeValue::Null,
        Value::Bool(b) => NativeValue::Bool(*b),
        Value::Int32(n) => NativeValue::I32(*n),
        Value::Int64(n) => NativeValue::I64(*n),
        Value::Uint32(n) => NativeValue::U32(*n),
        Value::Uint64(n) => NativeValue::U64(*n),
        Value::Float32(f) => NativeValue::F32(*f),
        Value::Float64(f) => NativeValue::F64(*f),
        Value::String(s) => NativeValue::String(s.clone()),
        Value::Timestamp(ts) => NativeValue::Timestamp(instant(ts)),
        Value::Struct(s) => {
            NativeValue::Map(s.iter().map(|(k, v)| (k.clone(), as_native(v))).collect())
        }
        Value::List(items) => NativeValue::Seq(items.iter().map(as_native).collect()),
    }
}

fn instant(ts: &Timestamp) -> DateTime<Utc> {
    if let Some(dt) = ts.to_datetime() {
        return dt;
    }
    let nanos = ts.nanos.clamp(0, 999_999_999) as u32;
    DateTime::from_timestamp(ts.seconds, nanos).unwrap_or(if ts.seconds < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

macro_rules! impl_from_native {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for NativeValue {
                fn from(v: $ty) -> Self {
                    NativeValue::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_native! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    &str => String,
    DateTime<Utc> => Timestamp,
    Vec<NativeValue> => Seq,
    BTreeMap<String, NativeValue> => Map,
}

impl From<&Value> for NativeValue {
    fn from(value: &Value) -> Self {
        as_native(value)
    }
}

/// Serializes with the same shapes the converter expects, so
/// `convert(&as_native(v))` reproduces `v` for in-range timestamps.
impl Serialize for NativeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NativeValue::Null => serializer.serialize_unit(),
            NativeValue::Bool(b) => serializer.serialize_bool(*b),
            NativeValue::I32(n) => serializer.serialize_i32(*n),
            NativeValue::I64(n) => serializer.serialize_i64(*n),
            NativeValue::U32(n) => serializer.serialize_u32(*n),
            NativeValue::U64(n) => serializer.serialize_u64(*n),
            NativeValue::F32(f) => serializer.serialize_f32(*f),
            NativeValue::F64(f) => serializer.serialize_f64(*f),
            NativeValue::String(s) => serializer.serialize_str(s),
            NativeValue::Timestamp(dt) => timestamp::serialize_datetime(dt, serializer),
            NativeValue::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            NativeValue::Seq(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(item)?;
                }
                out.end()
            }
        }
    }
}
