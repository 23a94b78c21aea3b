//! Error types for value conversion and JSON serialization.

use std::fmt::Display;

use thiserror::Error;

/// Errors produced while converting a native value into a [`Value`](crate::Value).
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The input has a shape with no mapping onto the value model.
    /// Carries the serde shape or type name that was rejected.
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    /// An instant could not be decomposed into seconds and nanoseconds, or
    /// has no RFC 3339 form (years outside 0000-9999).
    ///
    /// A pre-epoch `SystemTime` does not land here: serde's own impl refuses
    /// it before the converter sees it, so it surfaces as [`Custom`](Self::Custom).
    /// Convert it with `Timestamp::try_from` instead.
    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),

    /// Nesting went deeper than the configured limit.
    #[error("nesting exceeds maximum depth of {0}")]
    DepthLimitExceeded(usize),

    /// A `Serialize` implementation reported its own failure.
    #[error("{0}")]
    Custom(String),

    /// The input was not valid JSON (JSON input path only).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl serde::ser::Error for ConversionError {
    fn custom<T: Display>(msg: T) -> Self {
        ConversionError::Custom(msg.to_string())
    }
}

/// Errors produced while rendering a [`Value`](crate::Value) as JSON.
#[derive(Error, Debug)]
pub enum SerializationError {
    /// A value variant has no rendering rule.
    #[error("no JSON rendering for value variant {0}")]
    UnhandledVariant(&'static str),

    /// NaN and the infinities have no JSON representation.
    #[error("non-finite float {0} cannot be rendered as JSON")]
    NonFiniteFloat(f64),

    /// The timestamp lies outside RFC 3339 years 0000-9999 or has nanos out of range.
    #[error("timestamp out of range: seconds={seconds}, nanos={nanos}")]
    InvalidTimestamp { seconds: i64, nanos: i32 },

    /// Nesting went deeper than the configured limit.
    #[error("nesting exceeds maximum depth of {0}")]
    DepthLimitExceeded(usize),

    /// The generic JSON encoder failed (tree path).
    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing into the output buffer failed (streaming path).
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for the conversion direction.
pub type ConvertResult<T> = std::result::Result<T, ConversionError>;

/// Result alias for the serialization direction.
pub type Result<T> = std::result::Result<T, SerializationError>;
