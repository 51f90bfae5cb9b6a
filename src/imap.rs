//! MISB ST 1201 IMAP codec.
//!
//! IMAP maps a floating-point range `[minimum, maximum]` onto an
//! unsigned integer of L bytes, reserving the most-significant bit for
//! special values. The linear portion uses a power-of-two step derived
//! from the range magnitude, so in-range values survive a round trip
//! within one least-significant step.
//!
//! Special values occupy MSB-set codes whose first byte selects the
//! meaning and whose remaining bytes are zero:
//!
//! | first byte | meaning |
//! |------------|---------|
//! | `0xC8` | positive infinity |
//! | `0xE8` | negative infinity |
//! | `0xD0` | quiet NaN |
//! | `0xD8` | signaling NaN |
//! | `0xF0` | negative quiet NaN |
//! | `0xF8` | negative signaling NaN |
//! | `0xC0` | above maximum |
//! | `0xE0` | below minimum |
//!
//! The code with only the MSB set is not special: it is the ordinary
//! top-of-range mapping produced when `maximum - minimum` is an exact
//! power of two. All other MSB-set codes are user-defined or reserved
//! and fail with [`Error::ReservedImapValue`].

use crate::cursor::{ReadCursor, WriteCursor};
use crate::encoding::{read_uint, write_uint};
use crate::error::{Error, Result};

// First-byte patterns for the assigned special values.
const POSITIVE_INFINITY: u8 = 0xC8;
const NEGATIVE_INFINITY: u8 = 0xE8;
const POSITIVE_QUIET_NAN: u8 = 0xD0;
const POSITIVE_SIGNAL_NAN: u8 = 0xD8;
const NEGATIVE_QUIET_NAN: u8 = 0xF0;
const NEGATIVE_SIGNAL_NAN: u8 = 0xF8;
const ABOVE_MAXIMUM: u8 = 0xC0;
const BELOW_MINIMUM: u8 = 0xE0;

// Quiet bit of an IEEE-754 double's mantissa.
const F64_QUIET_BIT: u64 = 1 << 51;

/// Scale factors and zero alignment for one (range, length) pairing.
struct ImapTerms {
    forward_scale: f64,
    backward_scale: f64,
    zero_offset: f64,
}

fn imap_terms(minimum: f64, maximum: f64, length: usize) -> ImapTerms {
    let range_power = (maximum - minimum).log2().ceil() as i32;
    let data_power = (8 * length - 1) as i32;
    let forward_scale = f64_pow2(data_power - range_power);
    let backward_scale = f64_pow2(range_power - data_power);
    // Align 0.0 onto an integer code when the range spans zero
    let zero_offset = if minimum < 0.0 && maximum > 0.0 {
        let scaled = forward_scale * minimum;
        scaled - scaled.floor()
    } else {
        0.0
    };
    ImapTerms {
        forward_scale,
        backward_scale,
        zero_offset,
    }
}

fn f64_pow2(exponent: i32) -> f64 {
    2.0f64.powi(exponent)
}

/// Read an IMAP-encoded value of `length` bytes mapped onto
/// `[minimum, maximum]`.
///
/// Assigned special values decode to infinities and NaNs; the
/// above-maximum and below-minimum markers decode to the clamped range
/// endpoints. Unassigned MSB-set codes fail with
/// [`Error::ReservedImapValue`].
pub fn read_imap(
    minimum: f64,
    maximum: f64,
    cursor: &mut ReadCursor<'_>,
    length: usize,
) -> Result<f64> {
    let code = read_uint(cursor, length)?;
    let msb = 1u64 << (8 * length - 1);
    if code & msb != 0 && code != msb {
        return decode_special(code, minimum, maximum, length);
    }
    let terms = imap_terms(minimum, maximum, length);
    Ok((code as f64 - terms.zero_offset) * terms.backward_scale + minimum)
}

/// Write `value` IMAP-encoded over `[minimum, maximum]` in `length`
/// bytes, clamping finite out-of-range input and rounding half to even.
pub fn write_imap(
    value: f64,
    minimum: f64,
    maximum: f64,
    cursor: &mut WriteCursor<'_>,
    length: usize,
) -> Result<()> {
    if length == 0 || length > 8 {
        return Err(Error::WrongLength {
            expected: 1,
            got: length,
        });
    }
    if !value.is_finite() {
        return write_uint(encode_special(value, length), cursor, length);
    }
    let terms = imap_terms(minimum, maximum, length);
    let clamped = value.clamp(minimum, maximum);
    let code = ((clamped - minimum) * terms.forward_scale + terms.zero_offset).round_ties_even();
    write_uint(code as u64, cursor, length)
}

fn encode_special(value: f64, length: usize) -> u64 {
    let first = if value == f64::INFINITY {
        POSITIVE_INFINITY
    } else if value == f64::NEG_INFINITY {
        NEGATIVE_INFINITY
    } else {
        // NaN: sign and quiet bit select among the four patterns
        let bits = value.to_bits();
        let quiet = bits & F64_QUIET_BIT != 0;
        match (bits >> 63 != 0, quiet) {
            (false, true) => POSITIVE_QUIET_NAN,
            (false, false) => POSITIVE_SIGNAL_NAN,
            (true, true) => NEGATIVE_QUIET_NAN,
            (true, false) => NEGATIVE_SIGNAL_NAN,
        }
    };
    u64::from(first) << (8 * (length - 1))
}

fn decode_special(code: u64, minimum: f64, maximum: f64, length: usize) -> Result<f64> {
    let first = (code >> (8 * (length - 1))) as u8;
    let tail = code & !(u64::from(first) << (8 * (length - 1)));
    if tail != 0 {
        return Err(Error::ReservedImapValue(code));
    }
    match first {
        POSITIVE_INFINITY => Ok(f64::INFINITY),
        NEGATIVE_INFINITY => Ok(f64::NEG_INFINITY),
        POSITIVE_QUIET_NAN => Ok(f64::from_bits(0x7FF8_0000_0000_0000)),
        POSITIVE_SIGNAL_NAN => Ok(f64::from_bits(0x7FF0_0000_0000_0001)),
        NEGATIVE_QUIET_NAN => Ok(f64::from_bits(0xFFF8_0000_0000_0000)),
        NEGATIVE_SIGNAL_NAN => Ok(f64::from_bits(0xFFF0_0000_0000_0001)),
        ABOVE_MAXIMUM => Ok(maximum),
        BELOW_MINIMUM => Ok(minimum),
        _ => Err(Error::ReservedImapValue(code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: f64, minimum: f64, maximum: f64, length: usize) -> Vec<u8> {
        let mut buf = vec![0u8; length];
        let mut cursor = WriteCursor::new(&mut buf);
        write_imap(value, minimum, maximum, &mut cursor, length).unwrap();
        buf
    }

    fn decode(bytes: &[u8], minimum: f64, maximum: f64) -> f64 {
        let mut cursor = ReadCursor::new(bytes);
        read_imap(minimum, maximum, &mut cursor, bytes.len()).unwrap()
    }

    #[test]
    fn test_altitude_range_zero() {
        // [-900, 19000] at 2 bytes: unit step, zero lands on code 900
        assert_eq!(encode(0.0, -900.0, 19000.0, 2), vec![0x03, 0x84]);
        assert_eq!(decode(&[0x03, 0x84], -900.0, 19000.0), 0.0);
    }

    #[test]
    fn test_altitude_range_known_codes() {
        assert_eq!(encode(-900.0, -900.0, 19000.0, 2), vec![0x00, 0x00]);
        assert_eq!(encode(10.0, -900.0, 19000.0, 2), vec![0x03, 0x8E]);
        assert_eq!(encode(19000.0, -900.0, 19000.0, 2), vec![0x4D, 0xBC]);
    }

    #[test]
    fn test_roundtrip_within_step() {
        let (minimum, maximum, length): (f64, f64, usize) = (-900.0, 19000.0, 2);
        let step = f64_pow2((maximum - minimum).log2().ceil() as i32 - 15);
        for value in [-900.0, -899.5, 0.0, 0.3, 1234.56, 18999.9, 19000.0] {
            let bytes = encode(value, minimum, maximum, length);
            let back = decode(&bytes, minimum, maximum);
            assert!(
                (back - value).abs() <= step,
                "{value} -> {back} (step {step})"
            );
        }
    }

    #[test]
    fn test_positive_infinity_pattern() {
        assert_eq!(encode(f64::INFINITY, -900.0, 19000.0, 2), vec![0xC8, 0x00]);
        let back = decode(&[0xC8, 0x00], -900.0, 19000.0);
        assert_eq!(back, f64::INFINITY);

        // Bit-for-bit stable across a second pass
        assert_eq!(encode(back, -900.0, 19000.0, 2), vec![0xC8, 0x00]);
    }

    #[test]
    fn test_negative_infinity_pattern() {
        assert_eq!(
            encode(f64::NEG_INFINITY, -900.0, 19000.0, 3),
            vec![0xE8, 0x00, 0x00]
        );
        assert_eq!(
            decode(&[0xE8, 0x00, 0x00], -900.0, 19000.0),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn test_nan_patterns() {
        assert_eq!(encode(f64::NAN, 0.0, 1.0, 2), vec![0xD0, 0x00]);
        assert_eq!(encode(-f64::NAN, 0.0, 1.0, 2), vec![0xF0, 0x00]);
        assert!(decode(&[0xD0, 0x00], 0.0, 1.0).is_nan());
        assert!(decode(&[0xD8, 0x00], 0.0, 1.0).is_nan());
        assert!(decode(&[0xF8, 0x00], 0.0, 1.0).is_nan());
    }

    #[test]
    fn test_out_of_range_markers() {
        assert_eq!(decode(&[0xC0, 0x00], -900.0, 19000.0), 19000.0);
        assert_eq!(decode(&[0xE0, 0x00], -900.0, 19000.0), -900.0);
    }

    #[test]
    fn test_reserved_patterns_rejected() {
        // User-defined region
        let mut cursor = ReadCursor::new(&[0xA5, 0x00]);
        assert!(matches!(
            read_imap(-900.0, 19000.0, &mut cursor, 2),
            Err(Error::ReservedImapValue(_))
        ));

        // Assigned first byte but nonzero tail
        let mut cursor = ReadCursor::new(&[0xC8, 0x01]);
        assert!(matches!(
            read_imap(-900.0, 19000.0, &mut cursor, 2),
            Err(Error::ReservedImapValue(_))
        ));
    }

    #[test]
    fn test_power_of_two_range_top_code() {
        // [0, 128] spans exactly 2^7, so the maximum maps onto the bare
        // MSB code, which must not be mistaken for a special
        let bytes = encode(128.0, 0.0, 128.0, 2);
        assert_eq!(bytes, vec![0x80, 0x00]);
        assert_eq!(decode(&bytes, 0.0, 128.0), 128.0);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(
            encode(20000.0, -900.0, 19000.0, 2),
            encode(19000.0, -900.0, 19000.0, 2)
        );
        assert_eq!(
            encode(-1000.0, -900.0, 19000.0, 2),
            encode(-900.0, -900.0, 19000.0, 2)
        );
    }

    #[test]
    fn test_monotonic_after_clamp() {
        let mut last = 0u64;
        for i in 0..200 {
            let value = -900.0 + i as f64 * 100.0;
            let bytes = encode(value, -900.0, 19000.0, 2);
            let code = u64::from(bytes[0]) << 8 | u64::from(bytes[1]);
            assert!(code >= last, "value {value}");
            last = code;
        }
    }

    #[test]
    fn test_negative_range() {
        // Range entirely below zero has no zero offset
        let bytes = encode(-50.0, -100.0, -25.0, 2);
        let back = decode(&bytes, -100.0, -25.0);
        assert!((back + 50.0).abs() < 0.01);
    }
}
