//! Streaming serializer: [`Value`] → JSON written straight into a caller-owned
//! buffer.
//!
//! The hot path. Nothing is allocated per node: numbers go through
//! serde_json's stack-buffered formatters, timestamps through
//! [`Timestamp::write_rfc3339`](crate::Timestamp::write_rfc3339), and strings
//! are copied run by run between escapes. Parsed output always equals the
//! output of [`crate::tree`].
//!
//! # Example
//! ```
//! use event_value::{to_json_streaming, Value};
//! let list = Value::List(vec![Value::Float32(45.3), Value::from("x")]);
//! let mut out = Vec::new();
//! to_json_streaming(&list, &mut out).unwrap();
//! assert_eq!(out, br#"[45.3,"x"]"#);
//! ```

use crate::error::{Result, SerializationError};
use crate::limits::Limits;
use crate::value::Value;

/// Append `value` as JSON to `out` with the default [`Limits`].
pub fn to_json_streaming(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    StreamSerializer::default().serialize(value, out)
}

/// Render `value` into a fresh buffer.
pub fn to_json_streaming_vec(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(128);
    to_json_streaming(value, &mut out)?;
    Ok(out)
}

/// Reusable streaming serializer bound to a set of [`Limits`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamSerializer {
    limits: Limits,
}

impl StreamSerializer {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Append `value` as JSON to `out`.
    ///
    /// On error `out` is truncated back to its length at entry, so a failed
    /// call never leaves a partial document behind.
    pub fn serialize(&self, value: &Value, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();
        self.write_value(value, 0, out).inspect_err(|e| {
            out.truncate(start);
            tracing::debug!(error = %e, kind = value.kind(), "streaming serialization failed");
        })
    }

    fn write_value(&self, value: &Value, depth: usize, out: &mut Vec<u8>) -> Result<()> {
        match value {
            Value::Null => out.extend_from_slice(b"null"),
            Value::Bool(true) => out.extend_from_slice(b"true"),
            Value::Bool(false) => out.extend_from_slice(b"false"),
            Value::Int32(n) => serde_json::to_writer(&mut *out, n)?,
            Value::Int64(n) => serde_json::to_writer(&mut *out, n)?,
            Value::Uint32(n) => serde_json::to_writer(&mut *out, n)?,
            Value::Uint64(n) => serde_json::to_writer(&mut *out, n)?,
            Value::Float32(f) => {
                if !f.is_finite() {
                    return Err(SerializationError::NonFiniteFloat((*f).into()));
                }
                serde_json::to_writer(&mut *out, f)?;
            }
            Value::Float64(f) => {
                if !f.is_finite() {
                    return Err(SerializationError::NonFiniteFloat(*f));
                }
                serde_json::to_writer(&mut *out, f)?;
            }
            Value::String(s) => write_json_string(out, s),
            Value::Timestamp(ts) => {
                out.push(b'"');
                ts.write_rfc3339(out)?;
                out.push(b'"');
            }
            Value::Struct(s) => {
                let depth = self.descend(depth)?;
                out.push(b'{');
                for (i, (key, val)) in s.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    write_json_string(out, key);
                    out.push(b':');
                    self.write_value(val, depth, out)?;
                }
                out.push(b'}');
            }
            Value::List(items) => {
                let depth = self.descend(depth)?;
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    self.write_value(item, depth, out)?;
                }
                out.push(b']');
            }
        }
        Ok(())
    }

    fn descend(&self, depth: usize) -> Result<usize> {
        let depth = depth + 1;
        if depth > self.limits.max_depth {
            return Err(SerializationError::DepthLimitExceeded(self.limits.max_depth));
        }
        Ok(depth)
    }
}

/// Write `s` as a quoted JSON string. Used for both member keys and string
/// values.
///
/// Escapes `"`, `\` and the C0 control characters; everything else, including
/// non-ASCII UTF-8, is copied through unchanged in contiguous runs.
pub fn write_json_string(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    out.reserve(bytes.len() + 2);
    out.push(b'"');
    let mut run_start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let escape: &[u8] = match b {
            b'"' => b"\\\"",
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            0x08 => b"\\b",
            0x0c => b"\\f",
            0x00..=0x1f => {
                out.extend_from_slice(&bytes[run_start..i]);
                write_unicode_escape(out, b);
                run_start = i + 1;
                continue;
            }
            _ => continue,
        };
        out.extend_from_slice(&bytes[run_start..i]);
        out.extend_from_slice(escape);
        run_start = i + 1;
    }
    out.extend_from_slice(&bytes[run_start..]);
    out.push(b'"');
}

fn write_unicode_escape(out: &mut Vec<u8>, b: u8) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    out.extend_from_slice(b"\\u00");
    out.push(HEX[(b >> 4) as usize]);
    out.push(HEX[(b & 0x0f) as usize]);
}
