//! # event-value
//!
//! Generic value codec for event payloads. Any serializable Rust value is
//! converted into a closed, width-preserving tagged union ([`Value`]) and
//! rendered as JSON through one of two serializers that always agree:
//!
//! - a **tree** serializer that builds a `serde_json::Value` first, and
//! - a **streaming** serializer that writes directly into a caller-owned
//!   `Vec<u8>` without per-node allocation.
//!
//! ## Quick start
//!
//! ```rust
//! use event_value::{as_native, convert, to_json_streaming, to_json_tree, NativeValue};
//! use std::collections::BTreeMap;
//!
//! let fields = BTreeMap::from([("count", 3u64), ("max", u64::MAX)]);
//! let value = convert(&fields).unwrap();
//!
//! // tree path
//! let json = to_json_tree(&value).unwrap();
//! assert_eq!(json, br#"{"count":3,"max":18446744073709551615}"#);
//!
//! // streaming path, into a reused buffer
//! let mut buf = Vec::new();
//! to_json_streaming(&value, &mut buf).unwrap();
//! assert_eq!(buf, json);
//!
//! // and back to plain data
//! let native = as_native(&value);
//! assert_eq!(
//!     native,
//!     NativeValue::Map(BTreeMap::from([
//!         ("count".to_string(), NativeValue::U64(3)),
//!         ("max".to_string(), NativeValue::U64(u64::MAX)),
//!     ]))
//! );
//! ```
//!
//! ## Modules
//!
//! - [`value`]: the [`Value`] tagged union and its [`Struct`] mapping
//! - [`timestamp`]: nanosecond instants and RFC 3339 rendering
//! - [`convert`](mod@convert): native value → [`Value`] (shape dispatch over serde)
//! - [`native`]: [`Value`] → [`NativeValue`]
//! - [`tree`]: [`Value`] → JSON through `serde_json::Value`
//! - [`stream`]: [`Value`] → JSON written straight into a buffer
//! - [`limits`]: recursion limits shared by all of the above
//! - [`error`]: error types for both directions

pub mod convert;
pub mod error;
pub mod limits;
pub mod native;
pub mod stream;
pub mod timestamp;
pub mod tree;
pub mod value;

pub use convert::{convert, convert_with, from_json_slice, from_json_str, Bytes, Converter};
pub use error::{ConversionError, SerializationError};
pub use limits::{Limits, DEFAULT_MAX_DEPTH};
pub use native::{as_native, NativeValue};
pub use stream::{to_json_streaming, to_json_streaming_vec, StreamSerializer};
pub use timestamp::Timestamp;
pub use tree::{to_json_tree, to_json_tree_with, to_json_value};
pub use value::{Struct, Value};
