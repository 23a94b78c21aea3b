/// Converter contract tests: one section per shape class.
///
/// Every native shape maps onto exactly one variant, numbers keep their source
/// width, byte buffers become base64 text and anything unmapped is an error.
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};
use event_value::{
    convert, convert_with, from_json_str, Bytes, ConversionError, Converter, Limits, Struct,
    Timestamp, Value,
};
use serde::Serialize;

/// Build a `Value::Struct` from key/value pairs.
fn strukt<const N: usize>(pairs: [(&str, Value); N]) -> Value {
    Value::Struct(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn convert_string() {
    assert_eq!(convert("hello").unwrap(), Value::String("hello".into()));
    assert_eq!(convert(&"test-string".to_string()).unwrap(), Value::from("test-string"));
}

#[test]
fn convert_char() {
    assert_eq!(convert(&'x').unwrap(), Value::from("x"));
}

#[test]
fn convert_bool() {
    assert_eq!(convert(&true).unwrap(), Value::Bool(true));
    assert_eq!(convert(&false).unwrap(), Value::Bool(false));
}

#[test]
fn signed_integers_keep_width() {
    assert_eq!(convert(&-8i8).unwrap(), Value::Int32(-8));
    assert_eq!(convert(&-16i16).unwrap(), Value::Int32(-16));
    assert_eq!(convert(&32i32).unwrap(), Value::Int32(32));
    assert_eq!(convert(&32i64).unwrap(), Value::Int64(32));
    assert_eq!(convert(&i64::MIN).unwrap(), Value::Int64(i64::MIN));
}

#[test]
fn unsigned_integers_keep_width() {
    assert_eq!(convert(&8u8).unwrap(), Value::Uint32(8));
    assert_eq!(convert(&16u16).unwrap(), Value::Uint32(16));
    assert_eq!(convert(&32u32).unwrap(), Value::Uint32(32));
    assert_eq!(convert(&32u64).unwrap(), Value::Uint64(32));
    assert_eq!(convert(&u64::MAX).unwrap(), Value::Uint64(u64::MAX));
}

#[test]
fn pointer_sized_integers_are_64_bit() {
    // serde reports isize/usize as i64/u64
    assert_eq!(convert(&32isize).unwrap(), Value::Int64(32));
    assert_eq!(convert(&32usize).unwrap(), Value::Uint64(32));
}

#[test]
fn floats_keep_width() {
    assert_eq!(convert(&32.5f32).unwrap(), Value::Float32(32.5));
    assert_eq!(convert(&32.5f64).unwrap(), Value::Float64(32.5));
}

#[test]
fn wide_integers_are_unsupported() {
    let err = convert(&1i128).unwrap_err();
    assert!(
        matches!(&err, ConversionError::UnsupportedShape(name) if name == "i128"),
        "unexpected error: {err:?}"
    );
    assert!(matches!(
        convert(&1u128),
        Err(ConversionError::UnsupportedShape(_))
    ));
}

// ============================================================================
// Null and optional
// ============================================================================

#[test]
fn none_is_null() {
    assert_eq!(convert(&None::<i32>).unwrap(), Value::Null);
}

#[test]
fn some_is_transparent() {
    assert_eq!(convert(&Some(5i64)).unwrap(), Value::Int64(5));
    assert_eq!(convert(&Some(Some("x"))).unwrap(), Value::from("x"));
}

#[test]
fn unit_is_null() {
    #[derive(Serialize)]
    struct Marker;
    assert_eq!(convert(&()).unwrap(), Value::Null);
    assert_eq!(convert(&Marker).unwrap(), Value::Null);
}

#[test]
fn boxed_and_borrowed_values_dereference() {
    let boxed: Box<u32> = Box::new(7);
    assert_eq!(convert(&boxed).unwrap(), Value::Uint32(7));
    let borrowed: std::borrow::Cow<'_, str> = std::borrow::Cow::Borrowed("x");
    assert_eq!(convert(&&borrowed).unwrap(), Value::from("x"));
}

// ============================================================================
// Byte sequences
// ============================================================================

#[test]
fn bytes_become_base64() {
    assert_eq!(convert(&Bytes([0xFFu8, 0xFF])).unwrap(), Value::from("//8="));
    assert_eq!(
        convert(&Bytes(vec![0xFFu8; 6])).unwrap(),
        Value::from("////////")
    );
}

#[test]
fn empty_bytes_are_empty_text() {
    assert_eq!(convert(&Bytes(Vec::<u8>::new())).unwrap(), Value::from(""));
}

#[test]
fn unmarked_byte_vec_is_a_list() {
    assert_eq!(
        convert(&vec![1u8, 2]).unwrap(),
        Value::List(vec![Value::Uint32(1), Value::Uint32(2)])
    );
}

// ============================================================================
// Timestamps
// ============================================================================

#[test]
fn timestamp_is_kept() {
    let ts = Timestamp::new(1_772_355_600, 123_456_789);
    assert_eq!(convert(&ts).unwrap(), Value::Timestamp(ts));
}

#[test]
fn chrono_instant_via_timestamp() {
    let dt = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let ts = Timestamp::try_from(dt).unwrap();
    assert_eq!(ts.seconds, dt.timestamp());
    assert_eq!(ts.nanos, 0);
    assert_eq!(convert(&ts).unwrap(), Value::Timestamp(ts));
}

#[test]
fn bare_chrono_instant_is_text_unless_built_as_value() {
    let dt = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    // chrono's own Serialize emits plain RFC 3339 text
    assert_eq!(convert(&dt).unwrap(), Value::from("2026-03-01T09:00:00Z"));
    let v = Value::try_from(dt).unwrap();
    assert_eq!(v, Value::Timestamp(Timestamp::new(dt.timestamp(), 0)));
}

#[test]
fn chrono_field_with_adapter_is_a_timestamp() {
    #[derive(Serialize)]
    struct Event {
        #[serde(rename = "@timestamp", with = "event_value::timestamp::chrono_instant")]
        at: DateTime<Utc>,
        message: &'static str,
    }
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + chrono::Duration::nanoseconds(5);
    let v = convert(&Event { at, message: "hi" }).unwrap();
    assert_eq!(
        v,
        strukt([
            ("@timestamp", Value::Timestamp(Timestamp::new(at.timestamp(), 5))),
            ("message", Value::from("hi")),
        ])
    );
}

#[test]
fn chrono_newtype_with_adapter_is_a_timestamp() {
    #[derive(Serialize)]
    struct At(#[serde(with = "event_value::timestamp::chrono_instant")] DateTime<Utc>);
    let dt = Utc.with_ymd_and_hms(1969, 7, 20, 20, 17, 0).unwrap();
    assert_eq!(
        convert(&At(dt)).unwrap(),
        Value::Timestamp(Timestamp::new(dt.timestamp(), 0))
    );
}

#[test]
fn adapter_round_trips_through_json_text() {
    #[derive(Serialize, serde::Deserialize, Debug, PartialEq)]
    struct Event {
        #[serde(with = "event_value::timestamp::chrono_instant")]
        at: DateTime<Utc>,
    }
    let e = Event {
        at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
    };
    let text = serde_json::to_string(&e).unwrap();
    assert_eq!(text, r#"{"at":"2026-03-01T09:00:00Z"}"#);
    assert_eq!(serde_json::from_str::<Event>(&text).unwrap(), e);
}

#[test]
fn leap_second_field_is_malformed() {
    #[derive(Serialize)]
    struct Event {
        #[serde(with = "event_value::timestamp::chrono_instant")]
        at: DateTime<Utc>,
    }
    let leap = chrono::NaiveDate::from_ymd_opt(2016, 12, 31)
        .unwrap()
        .and_hms_nano_opt(23, 59, 59, 1_500_000_000)
        .unwrap()
        .and_utc();
    let err = convert(&Event { at: leap }).unwrap_err();
    assert!(
        matches!(err, ConversionError::MalformedTimestamp(_)),
        "unexpected error: {err:?}"
    );
    assert!(Value::try_from(leap).is_err());
}

#[test]
fn timestamp_without_rfc3339_form_is_malformed() {
    // 10000-01-01T00:00:00Z
    for ts in [Timestamp::new(253_402_300_800, 0), Timestamp::new(0, 1_000_000_000)] {
        let err = convert(&ts).unwrap_err();
        assert!(
            matches!(&err, ConversionError::MalformedTimestamp(msg) if msg.contains("out of range")),
            "unexpected error for {ts:?}: {err:?}"
        );
    }
}

#[test]
fn system_time_is_recognised() {
    let t = UNIX_EPOCH + Duration::new(1_700_000_000, 42);
    assert_eq!(
        convert(&t).unwrap(),
        Value::Timestamp(Timestamp::new(1_700_000_000, 42))
    );
}

#[test]
fn pre_epoch_system_time_is_rejected_by_serde() {
    let t = UNIX_EPOCH - Duration::from_secs(1);
    // serde's SystemTime impl fails before the converter sees any fields
    assert!(matches!(convert(&t), Err(ConversionError::Custom(_))));
    // the explicit conversion handles it
    assert_eq!(Timestamp::try_from(t).unwrap(), Timestamp::new(-1, 0));
}

#[test]
fn timestamp_inside_struct() {
    let ts = Timestamp::new(1_000, 5);
    let mut fields = HashMap::new();
    fields.insert("@timestamp", ts);
    assert_eq!(
        convert(&fields).unwrap(),
        strukt([("@timestamp", Value::Timestamp(ts))])
    );
}

#[test]
fn now_is_recognised() {
    let now = SystemTime::now();
    assert!(matches!(convert(&now).unwrap(), Value::Timestamp(_)));
}

// ============================================================================
// Mappings and records
// ============================================================================

#[test]
fn map_with_string_keys() {
    let mut m = BTreeMap::new();
    m.insert("a".to_string(), 1i64);
    m.insert("b".to_string(), 2i64);
    assert_eq!(
        convert(&m).unwrap(),
        strukt([("a", Value::Int64(1)), ("b", Value::Int64(2))])
    );
}

#[test]
fn map_keys_are_copied_verbatim() {
    let mut m = HashMap::new();
    m.insert("a\"b", 1i32);
    m.insert("", 2i32);
    m.insert("line\nbreak", 3i32);
    let v = convert(&m).unwrap();
    let s = v.as_struct().unwrap();
    assert_eq!(s.get("a\"b"), Some(&Value::Int32(1)));
    assert_eq!(s.get(""), Some(&Value::Int32(2)));
    assert_eq!(s.get("line\nbreak"), Some(&Value::Int32(3)));
}

#[test]
fn map_with_integer_keys_is_unsupported() {
    let mut m = BTreeMap::new();
    m.insert(1u32, "x");
    let err = convert(&m).unwrap_err();
    assert!(
        matches!(&err, ConversionError::UnsupportedShape(name) if name.contains("u32")),
        "unexpected error: {err:?}"
    );
}

#[test]
fn map_with_enum_keys_uses_variant_names() {
    #[derive(Serialize, PartialEq, Eq, PartialOrd, Ord)]
    enum Level {
        Info,
        Warn,
    }
    let mut m = BTreeMap::new();
    m.insert(Level::Info, 1u64);
    m.insert(Level::Warn, 2u64);
    assert_eq!(
        convert(&m).unwrap(),
        strukt([("Info", Value::Uint64(1)), ("Warn", Value::Uint64(2))])
    );
}

#[test]
fn record_fields_become_members() {
    #[derive(Serialize)]
    struct Record {
        a: i64,
        b: String,
    }
    let r = Record {
        a: 5,
        b: "test".into(),
    };
    assert_eq!(
        convert(&r).unwrap(),
        strukt([("a", Value::Int64(5)), ("b", Value::from("test"))])
    );
}

#[test]
fn skipped_and_renamed_fields_follow_serde() {
    #[derive(Serialize)]
    struct Record {
        #[serde(rename = "@timestamp")]
        at: Timestamp,
        #[serde(skip)]
        _secret: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }
    let r = Record {
        at: Timestamp::new(0, 0),
        _secret: 1,
        note: None,
    };
    assert_eq!(
        convert(&r).unwrap(),
        strukt([("@timestamp", Value::Timestamp(Timestamp::new(0, 0)))])
    );
}

#[test]
fn nested_records_and_maps() {
    #[derive(Serialize)]
    struct Inner {
        value: bool,
        #[serde(rename = "value-str")]
        value_str: &'static str,
    }
    let mut outer = BTreeMap::new();
    outer.insert(
        "field1",
        Inner {
            value: false,
            value_str: "test",
        },
    );
    assert_eq!(
        convert(&outer).unwrap(),
        strukt([(
            "field1",
            strukt([("value", Value::Bool(false)), ("value-str", Value::from("test"))])
        )])
    );
}

#[test]
fn newtype_struct_is_transparent() {
    #[derive(Serialize)]
    struct Meters(f64);
    assert_eq!(convert(&Meters(2.5)).unwrap(), Value::Float64(2.5));
}

// ============================================================================
// Sequences
// ============================================================================

#[test]
fn list_of_strings() {
    assert_eq!(
        convert(&vec!["value1", "value2"]).unwrap(),
        Value::List(vec![Value::from("value1"), Value::from("value2")])
    );
}

#[test]
fn list_of_uint32() {
    let input: [u32; 5] = [45, 56, 7343, 3242, 5673];
    assert_eq!(
        convert(&input).unwrap(),
        Value::List(input.iter().map(|&n| Value::Uint32(n)).collect())
    );
}

#[test]
fn tuple_is_a_heterogeneous_list() {
    assert_eq!(
        convert(&("value1", 3i64, false)).unwrap(),
        Value::List(vec![Value::from("value1"), Value::Int64(3), Value::Bool(false)])
    );
}

#[test]
fn list_order_is_preserved() {
    let input = vec![3i32, 1, 2];
    assert_eq!(
        convert(&input).unwrap(),
        Value::List(vec![Value::Int32(3), Value::Int32(1), Value::Int32(2)])
    );
}

#[test]
fn empty_containers() {
    assert_eq!(convert(&Vec::<i32>::new()).unwrap(), Value::List(vec![]));
    assert_eq!(
        convert(&BTreeMap::<String, i32>::new()).unwrap(),
        Value::Struct(Struct::new())
    );
}

// ============================================================================
// Enums
// ============================================================================

#[test]
fn enum_variants_follow_external_tagging() {
    #[derive(Serialize)]
    enum Event {
        Started,
        Progress(u32),
        Moved(i32, i32),
        Failed { code: i64 },
    }
    assert_eq!(convert(&Event::Started).unwrap(), Value::from("Started"));
    assert_eq!(
        convert(&Event::Progress(50)).unwrap(),
        strukt([("Progress", Value::Uint32(50))])
    );
    assert_eq!(
        convert(&Event::Moved(1, -1)).unwrap(),
        strukt([("Moved", Value::List(vec![Value::Int32(1), Value::Int32(-1)]))])
    );
    assert_eq!(
        convert(&Event::Failed { code: 7 }).unwrap(),
        strukt([("Failed", strukt([("code", Value::Int64(7))]))])
    );
}

// ============================================================================
// Depth limits
// ============================================================================

fn nested_lists(depth: usize) -> serde_json::Value {
    let mut v = serde_json::Value::Null;
    for _ in 0..depth {
        v = serde_json::Value::Array(vec![v]);
    }
    v
}

#[test]
fn depth_at_limit_is_accepted() {
    let input = nested_lists(4);
    assert!(convert_with(&input, &Limits::new(4)).is_ok());
}

#[test]
fn depth_past_limit_is_rejected() {
    let input = nested_lists(5);
    let err = convert_with(&input, &Limits::new(4)).unwrap_err();
    assert!(matches!(err, ConversionError::DepthLimitExceeded(4)));
}

#[test]
fn default_limit_guards_pathological_nesting() {
    let input = nested_lists(200);
    let err = convert(&input).unwrap_err();
    assert!(matches!(err, ConversionError::DepthLimitExceeded(128)));
    assert!(Converter::with_limits(Limits::new(256)).convert(&input).is_ok());
}

// ============================================================================
// Errors from Serialize impls and JSON input
// ============================================================================

#[test]
fn custom_serialize_errors_surface() {
    struct Broken;
    impl Serialize for Broken {
        fn serialize<S: serde::Serializer>(&self, _s: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refused"))
        }
    }
    let err = convert(&Broken).unwrap_err();
    assert!(matches!(&err, ConversionError::Custom(msg) if msg == "refused"));
}

#[test]
fn json_document_input() {
    let v = from_json_str(r#"{"a":1,"b":-2,"c":1.5,"d":[null,true],"e":"x"}"#).unwrap();
    assert_eq!(
        v,
        strukt([
            ("a", Value::Uint64(1)),
            ("b", Value::Int64(-2)),
            ("c", Value::Float64(1.5)),
            ("d", Value::List(vec![Value::Null, Value::Bool(true)])),
            ("e", Value::from("x")),
        ])
    );
}

#[test]
fn invalid_json_input() {
    assert!(matches!(
        from_json_str("{not json"),
        Err(ConversionError::Json(_))
    ));
}

// ============================================================================
// Value is itself convertible
// ============================================================================

#[test]
fn converting_a_value_is_identity() {
    let v = strukt([
        ("n", Value::Uint64(u64::MAX)),
        ("f", Value::Float32(45.3)),
        ("t", Value::Timestamp(Timestamp::new(1, 2))),
        ("l", Value::List(vec![Value::Null, Value::Int32(-1)])),
    ]);
    assert_eq!(convert(&v).unwrap(), v);
}

#[test]
fn conversion_is_deterministic() {
    let mut m = HashMap::new();
    for i in 0..50u32 {
        m.insert(format!("k{i}"), i);
    }
    assert_eq!(convert(&m).unwrap(), convert(&m).unwrap());
}
