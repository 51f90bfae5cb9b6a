//! Primitive wire codecs for KLV fields.
//!
//! Pure read/write/length function triples for each encoding rule used
//! by the format layer:
//!
//! - Big-endian unsigned and signed integers, 1-8 bytes, with
//!   minimum-length encoding when no width is imposed
//! - BER length fields (ITU-T X.690 short and long form)
//! - BER-OID varints (7 bits per byte, big-endian)
//! - IEEE-754 floats at 4 or 8 bytes
//! - Linear integer-to-range mappings (UFLINT / SFLINT)
//! - Counted strings, UUIDs, and opaque blobs
//!
//! All multi-byte values are most-significant-byte first. Every reader
//! consumes exactly the bytes it reports; every writer emits exactly
//! `*_length()` bytes. The non-linear IMAP mapping lives in
//! [`crate::imap`].

use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{Error, Result};
use crate::value::{Blob, Uuid};

// ============================================================================
// Big-endian integers
// ============================================================================

/// Read a big-endian unsigned integer of `length` bytes.
///
/// Lengths outside 1-8 do not fit a `u64` and fail with
/// [`Error::OverflowInDecode`].
pub fn read_uint(cursor: &mut ReadCursor<'_>, length: usize) -> Result<u64> {
    if length == 0 || length > 8 {
        return Err(Error::OverflowInDecode);
    }
    let bytes = cursor.take(length)?;
    let mut value = 0u64;
    for &byte in bytes {
        value = (value << 8) | u64::from(byte);
    }
    Ok(value)
}

/// Write `value` as a big-endian unsigned integer of exactly `length`
/// bytes, zero-padded on the left.
///
/// Fails with [`Error::WrongLength`] if the value needs more bytes than
/// `length` provides.
pub fn write_uint(value: u64, cursor: &mut WriteCursor<'_>, length: usize) -> Result<()> {
    if length == 0 || length > 8 {
        return Err(Error::WrongLength {
            expected: uint_length(value),
            got: length,
        });
    }
    if uint_length(value) > length {
        return Err(Error::WrongLength {
            expected: uint_length(value),
            got: length,
        });
    }
    for i in (0..length).rev() {
        cursor.put_u8((value >> (8 * i)) as u8)?;
    }
    Ok(())
}

/// Minimum number of bytes needed to represent `value` unsigned (1-8).
pub fn uint_length(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

/// Read a big-endian two's-complement signed integer of `length` bytes,
/// sign-extending to 64 bits.
pub fn read_sint(cursor: &mut ReadCursor<'_>, length: usize) -> Result<i64> {
    let raw = read_uint(cursor, length)?;
    if length == 8 {
        return Ok(raw as i64);
    }
    let sign_bit = 1u64 << (8 * length - 1);
    if raw & sign_bit != 0 {
        // Extend the sign through the unused high bytes
        Ok((raw | !(sign_bit | (sign_bit - 1))) as i64)
    } else {
        Ok(raw as i64)
    }
}

/// Write `value` as a big-endian two's-complement integer of exactly
/// `length` bytes, sign-extension-padded on the left.
pub fn write_sint(value: i64, cursor: &mut WriteCursor<'_>, length: usize) -> Result<()> {
    if length == 0 || length > 8 || sint_length(value) > length {
        return Err(Error::WrongLength {
            expected: sint_length(value),
            got: length,
        });
    }
    for i in (0..length).rev() {
        cursor.put_u8((value >> (8 * i)) as u8)?;
    }
    Ok(())
}

/// Minimum number of bytes that preserve `value` and its sign (1-8).
///
/// Non-negative values whose top bit would read as a sign gain a leading
/// `0x00`; negative values whose top bit would read as positive gain a
/// leading `0xFF`.
pub fn sint_length(value: i64) -> usize {
    let significant = if value < 0 {
        (!value).leading_zeros()
    } else {
        value.leading_zeros()
    } as usize;
    // One extra bit for the sign
    (65 - significant).div_ceil(8)
}

// ============================================================================
// BER length fields
// ============================================================================

/// Read a BER-encoded length (short or long form).
///
/// Long form with zero following bytes is the X.690 indeterminate
/// marker, which KLV does not use; it and counts above 8 fail with
/// [`Error::OverflowInDecode`].
pub fn read_ber(cursor: &mut ReadCursor<'_>) -> Result<u64> {
    let first = cursor.take_u8()?;
    if first & 0x80 == 0 {
        return Ok(u64::from(first));
    }
    let count = usize::from(first & 0x7F);
    if count == 0 || count > 8 {
        return Err(Error::OverflowInDecode);
    }
    read_uint(cursor, count)
}

/// Write `value` in BER, shortest form.
pub fn write_ber(value: u64, cursor: &mut WriteCursor<'_>) -> Result<()> {
    if value < 128 {
        return cursor.put_u8(value as u8);
    }
    let count = uint_length(value);
    cursor.put_u8(0x80 | count as u8)?;
    write_uint(value, cursor, count)
}

/// Encoded byte count of `value` in shortest-form BER.
pub fn ber_length(value: u64) -> usize {
    if value < 128 {
        1
    } else {
        1 + uint_length(value)
    }
}

// ============================================================================
// BER-OID varints
// ============================================================================

/// Read a BER-OID varint: 7 bits per byte, big-endian, the top bit set
/// on every byte except the last.
///
/// Accumulation past 64 bits fails with [`Error::OverflowInDecode`].
pub fn read_ber_oid(cursor: &mut ReadCursor<'_>) -> Result<u64> {
    let mut value = 0u64;
    loop {
        let byte = cursor.take_u8()?;
        if value > u64::MAX >> 7 {
            return Err(Error::OverflowInDecode);
        }
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

/// Write `value` as a BER-OID varint, shortest form (no leading `0x80`).
pub fn write_ber_oid(value: u64, cursor: &mut WriteCursor<'_>) -> Result<()> {
    let count = ber_oid_length(value);
    for i in (0..count).rev() {
        let septet = ((value >> (7 * i)) & 0x7F) as u8;
        cursor.put_u8(if i == 0 { septet } else { septet | 0x80 })?;
    }
    Ok(())
}

/// Encoded byte count of `value` as a BER-OID varint.
pub fn ber_oid_length(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

// ============================================================================
// IEEE-754 floats
// ============================================================================

/// Read a big-endian IEEE-754 float of 4 or 8 bytes.
pub fn read_float(cursor: &mut ReadCursor<'_>, length: usize) -> Result<f64> {
    match length {
        4 => {
            let bytes: [u8; 4] = cursor.take(4)?.try_into().expect("length checked");
            Ok(f64::from(f32::from_be_bytes(bytes)))
        }
        8 => {
            let bytes: [u8; 8] = cursor.take(8)?.try_into().expect("length checked");
            Ok(f64::from_be_bytes(bytes))
        }
        other => Err(Error::UnsupportedFloatWidth(other)),
    }
}

/// Write a big-endian IEEE-754 float of 4 or 8 bytes.
pub fn write_float(value: f64, cursor: &mut WriteCursor<'_>, length: usize) -> Result<()> {
    match length {
        4 => cursor.put(&(value as f32).to_be_bytes()),
        8 => cursor.put(&value.to_be_bytes()),
        other => Err(Error::UnsupportedFloatWidth(other)),
    }
}

// ============================================================================
// Linear mapped integers (UFLINT / SFLINT)
// ============================================================================

/// Largest unsigned code for a field of `length` bytes.
fn uint_max(length: usize) -> u64 {
    if length >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * length)) - 1
    }
}

/// Largest positive signed code for a field of `length` bytes.
fn sint_max(length: usize) -> i64 {
    if length >= 8 {
        i64::MAX
    } else {
        (1i64 << (8 * length - 1)) - 1
    }
}

/// Read an unsigned integer of `length` bytes linearly mapped onto
/// `[minimum, maximum]`.
pub fn read_uflint(
    minimum: f64,
    maximum: f64,
    cursor: &mut ReadCursor<'_>,
    length: usize,
) -> Result<f64> {
    let code = read_uint(cursor, length)?;
    let scale = (maximum - minimum) / uint_max(length) as f64;
    Ok(minimum + code as f64 * scale)
}

/// Write `value` as an unsigned integer of `length` bytes linearly
/// mapped onto `[minimum, maximum]`, clamping and rounding half to even.
pub fn write_uflint(
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
    let max_code = uint_max(length);
    let scale = max_code as f64 / (maximum - minimum);
    let clamped = value.clamp(minimum, maximum);
    let code = (((clamped - minimum) * scale).round_ties_even() as u64).min(max_code);
    write_uint(code, cursor, length)
}

/// Read a signed integer of `length` bytes mapped symmetrically onto
/// `[minimum, maximum]`, zero at the midpoint.
pub fn read_sflint(
    minimum: f64,
    maximum: f64,
    cursor: &mut ReadCursor<'_>,
    length: usize,
) -> Result<f64> {
    let code = read_sint(cursor, length)?;
    let midpoint = (minimum + maximum) / 2.0;
    let scale = (maximum - minimum) / 2.0 / sint_max(length) as f64;
    // The most negative code sits one step outside the scale; clamping
    // folds it back onto the minimum
    Ok((midpoint + code as f64 * scale).clamp(minimum, maximum))
}

/// Write `value` as a signed integer of `length` bytes mapped
/// symmetrically onto `[minimum, maximum]`, clamping and rounding half
/// to even.
pub fn write_sflint(
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
    let max_code = sint_max(length);
    let midpoint = (minimum + maximum) / 2.0;
    let scale = max_code as f64 / ((maximum - minimum) / 2.0);
    let clamped = value.clamp(minimum, maximum);
    let code = (((clamped - midpoint) * scale).round_ties_even() as i64).clamp(-max_code, max_code);
    write_sint(code, cursor, length)
}

// ============================================================================
// Blobs, strings, UUIDs
// ============================================================================

/// Read `length` bytes as an opaque blob.
pub fn read_blob(cursor: &mut ReadCursor<'_>, length: usize) -> Result<Blob> {
    Ok(Blob::from(cursor.take(length)?))
}

/// Write a blob verbatim.
pub fn write_blob(value: &Blob, cursor: &mut WriteCursor<'_>) -> Result<()> {
    cursor.put(value.as_bytes())
}

/// Read `length` bytes as UTF-8 text. Trailing NULs are preserved.
pub fn read_string(cursor: &mut ReadCursor<'_>, length: usize) -> Result<String> {
    Ok(String::from_utf8(cursor.take(length)?.to_vec())?)
}

/// Write a string's bytes verbatim, without a terminator.
pub fn write_string(value: &str, cursor: &mut WriteCursor<'_>) -> Result<()> {
    cursor.put(value.as_bytes())
}

/// Read a 16-byte UUID.
pub fn read_uuid(cursor: &mut ReadCursor<'_>) -> Result<Uuid> {
    let bytes: [u8; 16] = cursor.take(Uuid::LENGTH)?.try_into().expect("length checked");
    Ok(Uuid(bytes))
}

/// Write a 16-byte UUID.
pub fn write_uuid(value: &Uuid, cursor: &mut WriteCursor<'_>) -> Result<()> {
    cursor.put(&value.0)
}
