//! Nanosecond-resolution instants and their RFC 3339 rendering.
//!
//! Both serializers render timestamps through [`Timestamp::write_rfc3339`], so
//! the tree and streaming paths always agree on the exact text.

use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

use crate::error::{ConversionError, ConvertResult, Result, SerializationError};

/// Newtype-struct name the converter intercepts to recognise an instant.
/// The payload is the instant's RFC 3339 text.
pub(crate) const TIMESTAMP_MARKER: &str = "$event_value::private::Timestamp";

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// An instant since the Unix epoch: whole `seconds` plus `nanos` in `0..1e9`.
///
/// Mirrors the `timestamp_value{seconds, nanos}` wire shape. Instants before
/// the epoch have negative `seconds` and non-negative `nanos`, so
/// `-0.5s` is `{ seconds: -1, nanos: 500_000_000 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    pub const fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    /// Decompose a chrono instant. Fails for leap-second representations,
    /// where chrono reports nanos of one billion or more.
    pub fn from_datetime(dt: &DateTime<Utc>) -> ConvertResult<Self> {
        let nanos = dt.timestamp_subsec_nanos();
        if nanos >= NANOS_PER_SECOND as u32 {
            return Err(ConversionError::MalformedTimestamp(format!(
                "leap second at {} cannot be decomposed",
                dt.timestamp()
            )));
        }
        Ok(Self::new(dt.timestamp(), nanos as i32))
    }

    /// The current wall-clock instant.
    pub fn now() -> Self {
        let now = Utc::now();
        // chrono only reports >= 1e9 nanos for leap seconds, which `now` never yields
        Self::new(now.timestamp(), now.timestamp_subsec_nanos().min(999_999_999) as i32)
    }

    /// Rebuild the chrono instant, or `None` when the pair is out of range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        if !self.has_valid_nanos() {
            return None;
        }
        DateTime::from_timestamp(self.seconds, self.nanos as u32)
    }

    fn has_valid_nanos(&self) -> bool {
        (0..NANOS_PER_SECOND).contains(&self.nanos)
    }

    /// Render as RFC 3339 in UTC, e.g. `2026-03-01T09:30:00.1234Z`.
    ///
    /// Fractional seconds are written only when `nanos != 0`, with trailing
    /// zero digits stripped. Years outside 0000-9999 have no RFC 3339 form and
    /// fail with [`SerializationError::InvalidTimestamp`].
    pub fn write_rfc3339<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        let dt = self
            .to_datetime()
            .filter(|dt| (0..=9999).contains(&dt.year()))
            .ok_or(SerializationError::InvalidTimestamp {
                seconds: self.seconds,
                nanos: self.nanos,
            })?;

        write!(
            out,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        )?;

        if self.nanos != 0 {
            let mut frac = self.nanos;
            let mut width = 9;
            while frac % 10 == 0 {
                frac /= 10;
                width -= 1;
            }
            write!(out, ".{:0width$}", frac, width = width)?;
        }
        out.write_all(b"Z")?;
        Ok(())
    }

    /// Owned RFC 3339 text; see [`Timestamp::write_rfc3339`].
    pub fn to_rfc3339(&self) -> Result<String> {
        let mut buf = Vec::with_capacity(30);
        self.write_rfc3339(&mut buf)?;
        // the renderer only emits ASCII
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Parse RFC 3339 text with any offset back into an instant.
    pub fn parse_rfc3339(text: &str) -> ConvertResult<Self> {
        let dt = DateTime::parse_from_rfc3339(text)
            .map_err(|e| ConversionError::MalformedTimestamp(format!("{text:?}: {e}")))?;
        Self::from_datetime(&dt.with_timezone(&Utc))
    }
}

impl TryFrom<DateTime<Utc>> for Timestamp {
    type Error = ConversionError;

    fn try_from(dt: DateTime<Utc>) -> ConvertResult<Self> {
        Self::from_datetime(&dt)
    }
}

impl TryFrom<SystemTime> for Timestamp {
    type Error = ConversionError;

    fn try_from(time: SystemTime) -> ConvertResult<Self> {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => from_epoch_offset(after.as_secs(), after.subsec_nanos(), false),
            Err(before) => {
                let before = before.duration();
                from_epoch_offset(before.as_secs(), before.subsec_nanos(), true)
            }
        }
    }
}

/// Build a timestamp from an unsigned offset to the epoch, borrowing one
/// second when a pre-epoch offset has a fractional part.
pub(crate) fn from_epoch_offset(secs: u64, nanos: u32, before_epoch: bool) -> ConvertResult<Timestamp> {
    if nanos >= NANOS_PER_SECOND as u32 {
        return Err(ConversionError::MalformedTimestamp(format!(
            "nanosecond field {nanos} out of range"
        )));
    }
    let secs = i64::try_from(secs).map_err(|_| {
        ConversionError::MalformedTimestamp(format!("{secs} seconds exceeds the signed 64-bit range"))
    })?;
    let nanos = nanos as i32;
    if !before_epoch {
        return Ok(Timestamp::new(secs, nanos));
    }
    if nanos == 0 {
        Ok(Timestamp::new(-secs, 0))
    } else {
        Ok(Timestamp::new(-secs - 1, NANOS_PER_SECOND - nanos))
    }
}

/// Generic serializers see the RFC 3339 text; the converter recognises the
/// marker name and keeps the instant as a [`Value::Timestamp`](crate::Value::Timestamp).
impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(TIMESTAMP_MARKER, &MarkerPayload::Instant(self))
    }
}

/// Content of the marker newtype. Any error it raises means the instant has
/// no RFC 3339 form; the converter reports those as malformed timestamps.
enum MarkerPayload<'a> {
    Instant(&'a Timestamp),
    Invalid(String),
}

impl Serialize for MarkerPayload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            MarkerPayload::Instant(ts) => {
                let text = ts.to_rfc3339().map_err(S::Error::custom)?;
                serializer.serialize_str(&text)
            }
            MarkerPayload::Invalid(reason) => Err(S::Error::custom(reason)),
        }
    }
}

/// Serialize a chrono instant the way [`Timestamp`] does. An instant that
/// cannot be decomposed still travels under the marker so the converter can
/// tell it apart from other failures.
pub(crate) fn serialize_datetime<S: Serializer>(
    dt: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match Timestamp::from_datetime(dt) {
        Ok(ts) => ts.serialize(serializer),
        Err(e) => {
            let reason = match e {
                ConversionError::MalformedTimestamp(reason) => reason,
                other => other.to_string(),
            };
            serializer.serialize_newtype_struct(TIMESTAMP_MARKER, &MarkerPayload::Invalid(reason))
        }
    }
}

/// Serde adapter for `chrono::DateTime<Utc>` fields.
///
/// chrono serializes instants as plain text, which the converter cannot tell
/// apart from any other string. Fields tagged with this adapter convert to
/// [`Value::Timestamp`](crate::Value::Timestamp) instead, while generic
/// serializers still see the same RFC 3339 text.
///
/// ```
/// use chrono::{DateTime, TimeZone, Utc};
/// use event_value::{convert, Value};
///
/// #[derive(serde::Serialize)]
/// struct Event {
///     #[serde(with = "event_value::timestamp::chrono_instant")]
///     at: DateTime<Utc>,
/// }
///
/// let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
/// let v = convert(&Event { at }).unwrap();
/// assert!(matches!(v.as_struct().unwrap().get("at"), Some(Value::Timestamp(_))));
/// ```
pub mod chrono_instant {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        super::serialize_datetime(dt, serializer)
    }

    /// Reads the RFC 3339 text written by [`serialize`].
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(deserializer)
    }
}
