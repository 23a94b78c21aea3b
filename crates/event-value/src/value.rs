//! The tagged-union value model.
//!
//! A [`Value`] holds exactly one variant. Numeric variants keep the width and
//! signedness of their source instead of collapsing everything into a double,
//! so `u64::MAX` survives the trip to JSON digit for digit.

use std::collections::btree_map;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::{ConversionError, ConvertResult};
use crate::timestamp::Timestamp;

/// A shape-independent event value.
///
/// Trees own their children exclusively and are built bottom-up; nothing in
/// this crate mutates a tree after construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Timestamp(Timestamp),
    Struct(Struct),
    List(Vec<Value>),
}

impl Value {
    /// Short name of the active variant, for errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Uint32(_) => "uint32",
            Value::Uint64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Struct(_) => "struct",
            Value::List(_) => "list",
        }
    }

    /// Name of the tagged-union field this variant occupies on the wire.
    pub fn field_name(&self) -> &'static str {
        match self {
            Value::Null => "null_value",
            Value::Bool(_) => "bool_value",
            Value::Int32(_) => "int32_value",
            Value::Int64(_) => "int64_value",
            Value::Uint32(_) => "uint32_value",
            Value::Uint64(_) => "uint64_value",
            Value::Float32(_) => "float32_value",
            Value::Float64(_) => "float64_value",
            Value::String(_) => "string_value",
            Value::Timestamp(_) => "timestamp_value",
            Value::Struct(_) => "struct_value",
            Value::List(_) => "list_value",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// The mapping variant: unique string keys to values.
///
/// Backed by a sorted map so output is reproducible, but iteration order is
/// not part of the contract. Inserting an existing key overwrites it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Struct {
    data: BTreeMap<String, Value>,
}

impl Struct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.data.iter()
    }
}

impl FromIterator<(String, Value)> for Struct {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Struct {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a> IntoIterator for &'a Struct {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl From<BTreeMap<String, Value>> for Struct {
    fn from(data: BTreeMap<String, Value>) -> Self {
        Self { data }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => Int32,
    i16 => Int32,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint32,
    u16 => Uint32,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
    String => String,
    &str => String,
    Timestamp => Timestamp,
    Struct => Struct,
    Vec<Value> => List,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Fails for leap-second instants, which have no `(seconds, nanos)` form.
impl TryFrom<DateTime<Utc>> for Value {
    type Error = ConversionError;

    fn try_from(dt: DateTime<Utc>) -> ConvertResult<Self> {
        Timestamp::from_datetime(&dt).map(Value::Timestamp)
    }
}

/// Lets an envelope type embed a `Value` directly. Timestamps go through the
/// [`Timestamp`] marker, so converting a serialized value yields the same tree.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int32(n) => serializer.serialize_i32(*n),
            Value::Int64(n) => serializer.serialize_i64(*n),
            Value::Uint32(n) => serializer.serialize_u32(*n),
            Value::Uint64(n) => serializer.serialize_u64(*n),
            Value::Float32(f) => serializer.serialize_f32(*f),
            Value::Float64(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => ts.serialize(serializer),
            Value::Struct(s) => s.serialize(serializer),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Struct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (k, v) in &self.data {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
