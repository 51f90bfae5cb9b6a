//! Integration tests for the KLV format dispatcher.
//!
//! These exercise the public trait-object surface the way an enclosing
//! packet layer would: read a field of announced length, hold the
//! dynamic value, write it back, and compare bytes.

use klv_codec::cursor::{ReadCursor, WriteCursor};
use klv_codec::error::Error;
use klv_codec::format::{
    BerFormat, BerOidFormat, BlobFormat, DataFormat, DataFormatRef, FloatFormat, ImapFormat,
    SflintFormat, SintFormat, StringFormat, UflintFormat, UintFormat, UuidFormat,
};
use klv_codec::value::{Blob, SizedFloat, Uuid, Value};
use std::sync::Arc;

/// Read one field of `length` bytes from the front of `bytes`.
fn read_field(format: &dyn DataFormat, bytes: &[u8], length: usize) -> Value {
    let mut cursor = ReadCursor::new(bytes);
    let value = format.read(&mut cursor, length).unwrap();
    assert_eq!(cursor.position(), length, "read must consume the field");
    value
}

/// Write one field and return the emitted bytes.
fn write_field(format: &dyn DataFormat, value: &Value) -> Vec<u8> {
    let needed = format.length_of(value).unwrap();
    let mut buf = vec![0u8; needed];
    let mut cursor = WriteCursor::new(&mut buf);
    format.write(value, &mut cursor, needed).unwrap();
    assert_eq!(cursor.position(), needed, "write must emit length_of bytes");
    buf
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_integer_roundtrips() {
    let uint = UintFormat::min_length();
    for v in [0u64, 1, 127, 128, 255, 256, 65535, 1 << 32, u64::MAX] {
        let bytes = write_field(&uint, &Value::new(v, 0));
        let back = read_field(&uint, &bytes, bytes.len());
        assert_eq!(*back.get::<u64>().unwrap(), v);
    }

    let sint = SintFormat::min_length();
    for v in [0i64, -1, 127, 128, -128, -129, i64::MIN, i64::MAX] {
        let bytes = write_field(&sint, &Value::new(v, 0));
        let back = read_field(&sint, &bytes, bytes.len());
        assert_eq!(*back.get::<i64>().unwrap(), v);
    }
}

#[test]
fn test_varint_roundtrips() {
    let ber = BerFormat::new();
    let ber_oid = BerOidFormat::new();
    for v in [0u64, 127, 128, 255, 256, 16383, 16384, u64::MAX] {
        for format in [&ber as &dyn DataFormat, &ber_oid] {
            let bytes = write_field(format, &Value::new(v, 0));
            let back = read_field(format, &bytes, bytes.len());
            assert_eq!(*back.get::<u64>().unwrap(), v, "{}", format.description());
        }
    }
}

#[test]
fn test_float_roundtrips_exact() {
    for length in [4usize, 8] {
        let format = FloatFormat::new(length);
        for v in [0.0f64, 1.0, -1.5, 0.25, f64::INFINITY, f64::NEG_INFINITY] {
            let value = Value::new(SizedFloat::new(v, length), 0);
            let bytes = write_field(&format, &value);
            assert_eq!(bytes.len(), length);
            let back = read_field(&format, &bytes, length);
            assert_eq!(back.get::<SizedFloat>().unwrap().value, v);
        }
    }
}

#[test]
fn test_string_and_blob_roundtrips() {
    let string = StringFormat::variable();
    let text = "MISSION01\0".to_string();
    let bytes = write_field(&string, &Value::new(text.clone(), 0));
    let back = read_field(&string, &bytes, bytes.len());
    assert_eq!(*back.get::<String>().unwrap(), text);

    let blob = BlobFormat::variable();
    let payload = Blob::from(vec![0x00, 0xFF, 0x80, 0x7F]);
    let bytes = write_field(&blob, &Value::new(payload.clone(), 0));
    let back = read_field(&blob, &bytes, bytes.len());
    assert_eq!(*back.get::<Blob>().unwrap(), payload);
}

#[test]
fn test_uuid_roundtrip() {
    let format = UuidFormat::new();
    let id = Uuid([
        0x06, 0x0E, 0x2B, 0x34, 0x02, 0x0B, 0x01, 0x01, 0x0E, 0x01, 0x03, 0x01, 0x01, 0x00, 0x00,
        0x00,
    ]);
    let bytes = write_field(&format, &Value::new(id, 0));
    assert_eq!(bytes.len(), 16);
    let back = read_field(&format, &bytes, 16);
    assert_eq!(*back.get::<Uuid>().unwrap(), id);
}

#[test]
fn test_mapped_roundtrips_within_step() {
    let cases: Vec<(DataFormatRef, f64, f64)> = vec![
        (
            Arc::new(UflintFormat::new(0.0, 360.0, 2)),
            360.0 / 65535.0,
            271.5,
        ),
        (
            Arc::new(SflintFormat::new(-90.0, 90.0, 2)),
            90.0 / 32767.0,
            -33.7,
        ),
        (
            Arc::new(ImapFormat::new(-900.0, 19000.0, 2)),
            1.0,
            1503.0,
        ),
    ];
    for (format, step, sample) in cases {
        let value = Value::new(SizedFloat::new(sample, 2), 0);
        let bytes = write_field(format.as_ref(), &value);
        let back = read_field(format.as_ref(), &bytes, 2);
        let got = back.get::<SizedFloat>().unwrap().value;
        assert!(
            (got - sample).abs() <= step,
            "{}: {sample} -> {got}",
            format.description()
        );
    }
}

// ============================================================================
// Standard byte patterns
// ============================================================================

#[test]
fn test_ber_byte_patterns() {
    let format = BerFormat::new();
    let cases: &[(u64, &[u8])] = &[
        (0, &[0x00]),
        (127, &[0x7F]),
        (128, &[0x81, 0x80]),
        (256, &[0x82, 0x01, 0x00]),
    ];
    for (value, expected) in cases {
        assert_eq!(write_field(&format, &Value::new(*value, 0)), *expected);
    }
}

#[test]
fn test_ber_oid_byte_patterns() {
    let format = BerOidFormat::new();
    let cases: &[(u64, &[u8])] = &[
        (0, &[0x00]),
        (127, &[0x7F]),
        (128, &[0x81, 0x00]),
        (16383, &[0xFF, 0x7F]),
        (16384, &[0x81, 0x80, 0x00]),
    ];
    for (value, expected) in cases {
        assert_eq!(write_field(&format, &Value::new(*value, 0)), *expected);
    }
}

#[test]
fn test_sint_min_length_patterns() {
    let format = SintFormat::min_length();
    let cases: &[(i64, &[u8])] = &[
        (-1, &[0xFF]),
        (127, &[0x7F]),
        (128, &[0x00, 0x80]),
        (-128, &[0x80]),
        (-129, &[0xFF, 0x7F]),
    ];
    for (value, expected) in cases {
        assert_eq!(write_field(&format, &Value::new(*value, 0)), *expected);
    }
}

#[test]
fn test_float_byte_pattern() {
    let format = FloatFormat::new(4);
    let value = Value::new(SizedFloat::new(1.0, 4), 0);
    assert_eq!(write_field(&format, &value), vec![0x3F, 0x80, 0x00, 0x00]);
}

#[test]
fn test_float_nan_bytes_stable() {
    let format = FloatFormat::new(4);
    let pattern = [0x7F, 0xC0, 0x00, 0x01];
    let value = read_field(&format, &pattern, 4);
    assert!(value.get::<SizedFloat>().unwrap().value.is_nan());
    assert_eq!(write_field(&format, &value), pattern);
}

#[test]
fn test_uflint_midpoint_pattern() {
    let format = UflintFormat::new(0.0, 100.0, 2);
    let bytes = write_field(&format, &Value::new(SizedFloat::new(50.0, 2), 0));
    let code = i32::from(u16::from_be_bytes([bytes[0], bytes[1]]));
    assert!((code - 0x7FFF).abs() <= 1);

    let back = read_field(&format, &bytes, 2);
    let got = back.get::<SizedFloat>().unwrap().value;
    assert!((got - 50.0).abs() <= 100.0 / 65535.0);
}

#[test]
fn test_imap_infinity_pattern() {
    let format = ImapFormat::new(-900.0, 19000.0, 2);
    let value = Value::new(SizedFloat::new(f64::INFINITY, 2), 0);
    let bytes = write_field(&format, &value);
    assert_eq!(bytes, vec![0xC8, 0x00]);

    let back = read_field(&format, &bytes, 2);
    assert_eq!(back.get::<SizedFloat>().unwrap().value, f64::INFINITY);
    assert_eq!(write_field(&format, &back), vec![0xC8, 0x00]);
}

// ============================================================================
// Recovery and edge behavior
// ============================================================================

#[test]
fn test_unparsed_fields_survive_roundtrip() {
    // An IMAP field holding a reserved special-value pattern cannot be
    // interpreted, but its bytes must come back out unchanged
    let format = ImapFormat::new(-900.0, 19000.0, 2);
    let raw = [0xA1, 0x23];
    let value = read_field(&format, &raw, 2);
    assert!(value.is_unparsed());
    assert_eq!(format.length_of(&value).unwrap(), 2);
    assert_eq!(write_field(&format, &value), raw);
}

#[test]
fn test_zero_length_field_is_empty() {
    let format = UintFormat::min_length();
    let mut cursor = ReadCursor::new(&[0x01, 0x02]);
    let value = format.read(&mut cursor, 0).unwrap();
    assert!(value.is_empty());
    assert_eq!(cursor.position(), 0);

    assert_eq!(write_field(&format, &value), Vec::<u8>::new());
}

#[test]
fn test_truncated_field_propagates() {
    let format = UintFormat::min_length();
    let mut cursor = ReadCursor::new(&[0x01]);
    assert!(matches!(
        format.read(&mut cursor, 4),
        Err(Error::Truncated { .. })
    ));
}

#[test]
fn test_fixed_length_enforced_through_trait_object() {
    let format: DataFormatRef = Arc::new(FloatFormat::new(8));
    let mut cursor = ReadCursor::new(&[0u8; 8]);
    assert!(matches!(
        format.read(&mut cursor, 4),
        Err(Error::WrongLength {
            expected: 8,
            got: 4
        })
    ));
}

#[test]
fn test_packed_field_sequence() {
    // Several fields back to back in one buffer, the way a local set
    // carries them: each (format, length) pair consumes its own range
    let formats: Vec<(DataFormatRef, Value)> = vec![
        (
            Arc::new(UintFormat::min_length()),
            Value::new(1_234_567u64, 0),
        ),
        (
            Arc::new(StringFormat::variable()),
            Value::new("EO-IR".to_string(), 0),
        ),
        (
            Arc::new(ImapFormat::new(-900.0, 19000.0, 2)),
            Value::new(SizedFloat::new(1500.0, 2), 0),
        ),
        (Arc::new(SintFormat::min_length()), Value::new(-40i64, 0)),
    ];

    let mut buf = vec![0u8; 64];
    let mut writer = WriteCursor::new(&mut buf);
    let mut lengths = Vec::new();
    for (format, value) in &formats {
        let needed = format.length_of(value).unwrap();
        format.write(value, &mut writer, needed).unwrap();
        lengths.push(needed);
    }
    let total = writer.position();
    buf.truncate(total);

    let mut reader = ReadCursor::new(&buf);
    for ((format, original), length) in formats.iter().zip(&lengths) {
        let value = format.read(&mut reader, *length).unwrap();
        assert_eq!(format.length_of(&value).unwrap(), *length);
        match original {
            Value::Typed { datum, .. } => match value {
                Value::Typed {
                    datum: ref back, ..
                } => match (datum, back) {
                    (
                        klv_codec::value::Datum::Float(a),
                        klv_codec::value::Datum::Float(b),
                    ) => assert!((a.value - b.value).abs() <= 1.0),
                    (a, b) => assert_eq!(a, b),
                },
                other => panic!("expected typed value, got {other}"),
            },
            _ => unreachable!(),
        }
    }
    assert_eq!(reader.position(), total);
}
