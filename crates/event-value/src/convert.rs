//! Native value → [`Value`] conversion.
//!
//! Dispatch is by shape, not by concrete type: any `T: Serialize` is walked
//! through serde's data model and each callback maps one shape class onto one
//! variant. Shapes with no mapping (128-bit integers, maps keyed by anything
//! but text) fail with [`ConversionError::UnsupportedShape`]; there is no
//! fallback branch.
//!
//! | serde shape                        | variant                              |
//! |------------------------------------|--------------------------------------|
//! | `None`, unit, unit struct          | `Null` (`Some(x)` converts `x`)      |
//! | `i8`/`i16`/`i32`, `i64`            | `Int32`, `Int64`                     |
//! | `u8`/`u16`/`u32`, `u64`            | `Uint32`, `Uint64`                   |
//! | `f32`, `f64`                       | `Float32`, `Float64`                 |
//! | `str`, `char`, unit enum variant   | `String`                             |
//! | bytes                              | `String` holding standard base64     |
//! | [`Timestamp`], `SystemTime`        | `Timestamp`                          |
//! | map with text keys, struct         | `Struct`                             |
//! | seq, tuple, tuple struct           | `List`                               |
//! | data-carrying enum variant         | `Struct` of `{variant: payload}`     |
//!
//! A bare `chrono::DateTime<Utc>` serializes as plain text and converts to a
//! `String`. Tag such fields with
//! `#[serde(with = "event_value::timestamp::chrono_instant")]`, or build the
//! value with `Value::try_from(dt)`, to keep them as instants.
//!
//! `Vec<u8>` is a sequence in serde's model and converts to a `List`; wrap it in
//! [`Bytes`] (or use any type that calls `serialize_bytes`) to get base64 text.
//!
//! # Example
//! ```
//! use event_value::{convert, Value};
//! let v = convert(&("hello", 3u8)).unwrap();
//! assert_eq!(v, Value::List(vec![Value::from("hello"), Value::Uint32(3)]));
//! ```

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::ser::{self, Impossible, Serialize};

use crate::error::{ConversionError, ConvertResult};
use crate::limits::Limits;
use crate::timestamp::{self, Timestamp, TIMESTAMP_MARKER};
use crate::value::{Struct, Value};

/// Converts native values into [`Value`] trees under a fixed set of [`Limits`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Converter {
    limits: Limits,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Convert any serializable value. Pure: the same input always yields the
    /// same tree.
    pub fn convert<T: ?Sized + Serialize>(&self, value: &T) -> ConvertResult<Value> {
        let root = ValueSerializer {
            depth: 0,
            limits: self.limits,
        };
        value.serialize(root).inspect_err(|e| {
            tracing::debug!(error = %e, max_depth = self.limits.max_depth, "value conversion rejected");
        })
    }
}

/// Convert a native value with the default [`Limits`].
pub fn convert<T: ?Sized + Serialize>(value: &T) -> ConvertResult<Value> {
    Converter::new().convert(value)
}

/// Convert a native value under explicit [`Limits`].
pub fn convert_with<T: ?Sized + Serialize>(value: &T, limits: &Limits) -> ConvertResult<Value> {
    Converter::with_limits(*limits).convert(value)
}

/// Parse a JSON document and convert it.
///
/// Non-negative integers become `Uint64`, negative ones `Int64`, every other
/// number `Float64`.
pub fn from_json_slice(json: &[u8]) -> ConvertResult<Value> {
    let doc: serde_json::Value = serde_json::from_slice(json)?;
    convert(&doc)
}

/// Parse a JSON string and convert it; see [`from_json_slice`].
pub fn from_json_str(json: &str) -> ConvertResult<Value> {
    from_json_slice(json.as_bytes())
}

/// Marks a byte buffer so it converts to base64 text instead of a list of
/// small integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bytes<B>(pub B);

impl<B: AsRef<[u8]>> Serialize for Bytes<B> {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0.as_ref())
    }
}

fn unsupported(shape: impl Into<String>) -> ConversionError {
    ConversionError::UnsupportedShape(shape.into())
}

/// The shape visitor. `depth` counts the containers above the value being
/// visited.
#[derive(Debug, Clone, Copy)]
struct ValueSerializer {
    depth: usize,
    limits: Limits,
}

impl ValueSerializer {
    /// Descend into a container, failing once the limit is passed.
    fn enter(self) -> ConvertResult<Self> {
        let depth = self.depth + 1;
        if depth > self.limits.max_depth {
            return Err(ConversionError::DepthLimitExceeded(self.limits.max_depth));
        }
        Ok(Self { depth, ..self })
    }

    fn record(self) -> ConvertResult<StructBuilder> {
        Ok(StructBuilder {
            ser: self.enter()?,
            data: BTreeMap::new(),
            next_key: None,
        })
    }

    fn list(self, len: usize) -> ConvertResult<ListBuilder> {
        Ok(ListBuilder {
            ser: self.enter()?,
            items: Vec::with_capacity(len),
        })
    }
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = ConversionError;

    type SerializeSeq = ListBuilder;
    type SerializeTuple = ListBuilder;
    type SerializeTupleStruct = ListBuilder;
    type SerializeTupleVariant = Tagged<ListBuilder>;
    type SerializeMap = StructBuilder;
    type SerializeStruct = RecordBuilder;
    type SerializeStructVariant = Tagged<StructBuilder>;

    fn serialize_bool(self, v: bool) -> ConvertResult<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> ConvertResult<Value> {
        Ok(Value::Int32(v.into()))
    }

    fn serialize_i16(self, v: i16) -> ConvertResult<Value> {
        Ok(Value::Int32(v.into()))
    }

    fn serialize_i32(self, v: i32) -> ConvertResult<Value> {
        Ok(Value::Int32(v))
    }

    fn serialize_i64(self, v: i64) -> ConvertResult<Value> {
        Ok(Value::Int64(v))
    }

    fn serialize_i128(self, _v: i128) -> ConvertResult<Value> {
        Err(unsupported("i128"))
    }

    fn serialize_u8(self, v: u8) -> ConvertResult<Value> {
        Ok(Value::Uint32(v.into()))
    }

    fn serialize_u16(self, v: u16) -> ConvertResult<Value> {
        Ok(Value::Uint32(v.into()))
    }

    fn serialize_u32(self, v: u32) -> ConvertResult<Value> {
        Ok(Value::Uint32(v))
    }

    fn serialize_u64(self, v: u64) -> ConvertResult<Value> {
        Ok(Value::Uint64(v))
    }

    fn serialize_u128(self, _v: u128) -> ConvertResult<Value> {
        Err(unsupported("u128"))
    }

    fn serialize_f32(self, v: f32) -> ConvertResult<Value> {
        Ok(Value::Float32(v))
    }

    fn serialize_f64(self, v: f64) -> ConvertResult<Value> {
        Ok(Value::Float64(v))
    }

    fn serialize_char(self, v: char) -> ConvertResult<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> ConvertResult<Value> {
        Ok(Value::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> ConvertResult<Value> {
        Ok(Value::String(STANDARD.encode(v)))
    }

    fn serialize_none(self) -> ConvertResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> ConvertResult<Value> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> ConvertResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> ConvertResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> ConvertResult<Value> {
        Ok(Value::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> ConvertResult<Value> {
        if name != TIMESTAMP_MARKER {
            return value.serialize(self);
        }
        // the payload only fails when the instant has no RFC 3339 form
        let payload = value.serialize(self).map_err(|e| match e {
            ConversionError::Custom(reason) => ConversionError::MalformedTimestamp(reason),
            other => other,
        })?;
        match payload {
            Value::String(text) => Ok(Value::Timestamp(Timestamp::parse_rfc3339(&text)?)),
            other => Err(ConversionError::MalformedTimestamp(format!(
                "expected RFC 3339 text, found {}",
                other.kind()
            ))),
        }
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> ConvertResult<Value> {
        let inner = value.serialize(self.enter()?)?;
        Ok(tag(variant, inner))
    }

    fn serialize_seq(self, len: Option<usize>) -> ConvertResult<ListBuilder> {
        self.list(len.unwrap_or(0))
    }

    fn serialize_tuple(self, len: usize) -> ConvertResult<ListBuilder> {
        self.list(len)
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> ConvertResult<ListBuilder> {
        self.list(len)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> ConvertResult<Tagged<ListBuilder>> {
        Ok(Tagged {
            variant,
            inner: self.enter()?.list(len)?,
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> ConvertResult<StructBuilder> {
        self.record()
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> ConvertResult<RecordBuilder> {
        if name == "SystemTime" && len == 2 {
            return Ok(RecordBuilder::SystemTime(SystemTimeBuilder {
                ser: self,
                secs: None,
                nanos: None,
            }));
        }
        Ok(RecordBuilder::Fields(self.record()?))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> ConvertResult<Tagged<StructBuilder>> {
        Ok(Tagged {
            variant,
            inner: self.enter()?.record()?,
        })
    }
}

/// Externally tagged enum payload: `{variant: inner}`.
fn tag(variant: &'static str, inner: Value) -> Value {
    Value::Struct(Struct::from_iter([(variant.to_owned(), inner)]))
}

struct ListBuilder {
    ser: ValueSerializer,
    items: Vec<Value>,
}

impl ListBuilder {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> ConvertResult<()> {
        self.items.push(value.serialize(self.ser)?);
        Ok(())
    }
}

impl ser::SerializeSeq for ListBuilder {
    type Ok = Value;
    type Error = ConversionError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> ConvertResult<()> {
        self.push(value)
    }

    fn end(self) -> ConvertResult<Value> {
        Ok(Value::List(self.items))
    }
}

impl ser::SerializeTuple for ListBuilder {
    type Ok = Value;
    type Error = ConversionError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> ConvertResult<()> {
        self.push(value)
    }

    fn end(self) -> ConvertResult<Value> {
        Ok(Value::List(self.items))
    }
}

impl ser::SerializeTupleStruct for ListBuilder {
    type Ok = Value;
    type Error = ConversionError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> ConvertResult<()> {
        self.push(value)
    }

    fn end(self) -> ConvertResult<Value> {
        Ok(Value::List(self.items))
    }
}

struct StructBuilder {
    ser: ValueSerializer,
    data: BTreeMap<String, Value>,
    next_key: Option<String>,
}

impl StructBuilder {
    fn field<T: ?Sized + Serialize>(&mut self, key: String, value: &T) -> ConvertResult<()> {
        let value = value.serialize(self.ser)?;
        self.data.insert(key, value);
        Ok(())
    }

    fn finish(self) -> Value {
        Value::Struct(Struct::from(self.data))
    }
}

impl ser::SerializeMap for StructBuilder {
    type Ok = Value;
    type Error = ConversionError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> ConvertResult<()> {
        self.next_key = Some(key.serialize(MapKeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> ConvertResult<()> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| ConversionError::Custom("map value serialized before its key".into()))?;
        self.field(key, value)
    }

    fn end(self) -> ConvertResult<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Value;
    type Error = ConversionError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> ConvertResult<()> {
        self.field(key.to_owned(), value)
    }

    fn end(self) -> ConvertResult<Value> {
        Ok(self.finish())
    }
}

/// A record is either an ordinary struct or serde's encoding of `SystemTime`.
enum RecordBuilder {
    Fields(StructBuilder),
    SystemTime(SystemTimeBuilder),
}

impl ser::SerializeStruct for RecordBuilder {
    type Ok = Value;
    type Error = ConversionError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> ConvertResult<()> {
        match self {
            RecordBuilder::Fields(b) => ser::SerializeStruct::serialize_field(b, key, value),
            RecordBuilder::SystemTime(b) => b.field(key, value),
        }
    }

    fn end(self) -> ConvertResult<Value> {
        match self {
            RecordBuilder::Fields(b) => Ok(b.finish()),
            RecordBuilder::SystemTime(b) => b.finish(),
        }
    }
}

struct SystemTimeBuilder {
    ser: ValueSerializer,
    secs: Option<u64>,
    nanos: Option<u32>,
}

impl SystemTimeBuilder {
    fn field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> ConvertResult<()> {
        match (key, value.serialize(self.ser)?) {
            ("secs_since_epoch", Value::Uint64(secs)) => self.secs = Some(secs),
            ("nanos_since_epoch", Value::Uint32(nanos)) => self.nanos = Some(nanos),
            (key, other) => {
                return Err(ConversionError::MalformedTimestamp(format!(
                    "unexpected SystemTime field {key} of kind {}",
                    other.kind()
                )))
            }
        }
        Ok(())
    }

    fn finish(self) -> ConvertResult<Value> {
        match (self.secs, self.nanos) {
            (Some(secs), Some(nanos)) => Ok(Value::Timestamp(timestamp::from_epoch_offset(
                secs, nanos, false,
            )?)),
            _ => Err(ConversionError::MalformedTimestamp(
                "SystemTime is missing its epoch offset".into(),
            )),
        }
    }
}

struct Tagged<B> {
    variant: &'static str,
    inner: B,
}

impl ser::SerializeTupleVariant for Tagged<ListBuilder> {
    type Ok = Value;
    type Error = ConversionError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> ConvertResult<()> {
        self.inner.push(value)
    }

    fn end(self) -> ConvertResult<Value> {
        Ok(tag(self.variant, Value::List(self.inner.items)))
    }
}

impl ser::SerializeStructVariant for Tagged<StructBuilder> {
    type Ok = Value;
    type Error = ConversionError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> ConvertResult<()> {
        self.inner.field(key.to_owned(), value)
    }

    fn end(self) -> ConvertResult<Value> {
        Ok(tag(self.variant, self.inner.finish()))
    }
}

/// Accepts only text-like map keys; the key text is copied verbatim.
struct MapKeySerializer;

fn key_error(kind: &str) -> ConversionError {
    unsupported(format!("map key of type {kind}"))
}

impl ser::Serializer for MapKeySerializer {
    type Ok = String;
    type Error = ConversionError;

    type SerializeSeq = Impossible<String, ConversionError>;
    type SerializeTuple = Impossible<String, ConversionError>;
    type SerializeTupleStruct = Impossible<String, ConversionError>;
    type SerializeTupleVariant = Impossible<String, ConversionError>;
    type SerializeMap = Impossible<String, ConversionError>;
    type SerializeStruct = Impossible<String, ConversionError>;
    type SerializeStructVariant = Impossible<String, ConversionError>;

    fn serialize_str(self, v: &str) -> ConvertResult<String> {
        Ok(v.to_owned())
    }

    fn serialize_char(self, v: char) -> ConvertResult<String> {
        Ok(v.to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> ConvertResult<String> {
        Ok(variant.to_owned())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> ConvertResult<String> {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> ConvertResult<String> {
        Err(key_error("bool"))
    }

    fn serialize_i8(self, _v: i8) -> ConvertResult<String> {
        Err(key_error("i8"))
    }

    fn serialize_i16(self, _v: i16) -> ConvertResult<String> {
        Err(key_error("i16"))
    }

    fn serialize_i32(self, _v: i32) -> ConvertResult<String> {
        Err(key_error("i32"))
    }

    fn serialize_i64(self, _v: i64) -> ConvertResult<String> {
        Err(key_error("i64"))
    }

    fn serialize_u8(self, _v: u8) -> ConvertResult<String> {
        Err(key_error("u8"))
    }

    fn serialize_u16(self, _v: u16) -> ConvertResult<String> {
        Err(key_error("u16"))
    }

    fn serialize_u32(self, _v: u32) -> ConvertResult<String> {
        Err(key_error("u32"))
    }

    fn serialize_u64(self, _v: u64) -> ConvertResult<String> {
        Err(key_error("u64"))
    }

    fn serialize_f32(self, _v: f32) -> ConvertResult<String> {
        Err(key_error("f32"))
    }

    fn serialize_f64(self, _v: f64) -> ConvertResult<String> {
        Err(key_error("f64"))
    }

    fn serialize_bytes(self, _v: &[u8]) -> ConvertResult<String> {
        Err(key_error("bytes"))
    }

    fn serialize_none(self) -> ConvertResult<String> {
        Err(key_error("none"))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> ConvertResult<String> {
        Err(key_error("option"))
    }

    fn serialize_unit(self) -> ConvertResult<String> {
        Err(key_error("unit"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> ConvertResult<String> {
        Err(key_error(name))
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> ConvertResult<String> {
        Err(key_error(name))
    }

    fn serialize_seq(self, _len: Option<usize>) -> ConvertResult<Self::SerializeSeq> {
        Err(key_error("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> ConvertResult<Self::SerializeTuple> {
        Err(key_error("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> ConvertResult<Self::SerializeTupleStruct> {
        Err(key_error(name))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> ConvertResult<Self::SerializeTupleVariant> {
        Err(key_error(name))
    }

    fn serialize_map(self, _len: Option<usize>) -> ConvertResult<Self::SerializeMap> {
        Err(key_error("map"))
    }

    fn serialize_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> ConvertResult<Self::SerializeStruct> {
        Err(key_error(name))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> ConvertResult<Self::SerializeStructVariant> {
        Err(key_error(name))
    }
}
