//! KLV data formats.
//!
//! A format is a shared, immutable descriptor that knows how to read,
//! write, measure, and render exactly one data type under one encoding
//! rule. The pieces:
//!
//! - [`DataFormat`]: the object-safe capability every format exposes:
//!   `read`, `write`, `length_of`, `type_tag`, `print`, `description`.
//!   Callers hold formats as [`DataFormatRef`] trait objects.
//! - [`TypedFormat`]: the three small hooks a concrete format supplies
//!   (`read_typed`, `write_typed`, `length_of_typed`, optionally
//!   `print_typed`). A blanket impl turns any `TypedFormat` into a
//!   [`DataFormat`], handling zero-length fields, fixed-length checks,
//!   the parse-failure-to-blob fallback, and post-write length
//!   reconciliation in one place.
//! - The concrete formats: [`BlobFormat`], [`StringFormat`],
//!   [`UintFormat`], [`SintFormat`], [`BerFormat`], [`BerOidFormat`],
//!   [`FloatFormat`], [`UflintFormat`], [`SflintFormat`],
//!   [`ImapFormat`], [`UuidFormat`], [`EnumFormat`].
//!
//! # Recovery policy
//!
//! Reads never drop a field. When a typed reader fails, or consumes a
//! different number of bytes than the field announced, the wrapper logs
//! the error, rewinds, and re-consumes the same bytes as
//! [`Value::Unparsed`], so writing the value back reproduces the
//! original stream byte for byte. Write-path errors always propagate.
//!
//! # Example
//!
//! ```rust
//! use klv_codec::cursor::{ReadCursor, WriteCursor};
//! use klv_codec::format::{DataFormat, UintFormat};
//! use klv_codec::value::Value;
//!
//! let format = UintFormat::min_length();
//!
//! let mut buf = [0u8; 4];
//! let mut writer = WriteCursor::new(&mut buf);
//! format.write(&Value::new(4660u64, 0), &mut writer, 4).unwrap();
//! assert_eq!(writer.written(), &[0x12, 0x34]);
//!
//! let mut reader = ReadCursor::new(&buf[..2]);
//! let value = format.read(&mut reader, 2).unwrap();
//! assert_eq!(*value.get::<u64>().unwrap(), 4660);
//! ```

use crate::cursor::{ReadCursor, WriteCursor};
use crate::encoding::{
    ber_length, ber_oid_length, read_ber, read_ber_oid, read_blob, read_float, read_sflint,
    read_sint, read_string, read_uflint, read_uint, read_uuid, sint_length, uint_length,
    write_blob, write_ber, write_ber_oid, write_float, write_sflint, write_sint, write_string,
    write_uflint, write_uint, write_uuid,
};
use crate::error::{Error, Result};
use crate::imap::{read_imap, write_imap};
use crate::value::{Blob, DatumType, SizedFloat, TypeTag, Uuid, Value};
use std::fmt;
use std::sync::Arc;

/// Shared handle to a format descriptor.
pub type DataFormatRef = Arc<dyn DataFormat>;

// ============================================================================
// DataFormat - the dispatcher capability
// ============================================================================

/// The polymorphic contract every KLV data format satisfies.
///
/// Formats are pure and stateless after construction, so one instance
/// can serve any number of concurrent readers and writers.
pub trait DataFormat: Send + Sync {
    /// Parse `length` bytes into a dynamic value, advancing the cursor
    /// by exactly `length`.
    ///
    /// Zero-length fields yield [`Value::Empty`] without touching the
    /// cursor. Bytes a typed reader cannot interpret come back as
    /// [`Value::Unparsed`].
    fn read(&self, cursor: &mut ReadCursor<'_>, length: usize) -> Result<Value>;

    /// Serialize `value`, advancing the cursor by exactly
    /// `length_of(value)` bytes; fails with [`Error::Overflow`] when
    /// that exceeds `max_length`.
    fn write(&self, value: &Value, cursor: &mut WriteCursor<'_>, max_length: usize) -> Result<()>;

    /// Total on-wire bytes needed to write `value`.
    fn length_of(&self, value: &Value) -> Result<usize>;

    /// The kind of typed payload this format produces.
    fn type_tag(&self) -> TypeTag;

    /// Render `value` for diagnostics, at the precision the on-wire
    /// length supports.
    fn print(&self, value: &Value) -> String;

    /// Human-readable description of this format for schema
    /// documentation.
    fn description(&self) -> String;

    /// Exact byte count of every instance, or zero when the length is
    /// variable.
    fn fixed_length(&self) -> usize;
}

// ============================================================================
// TypedFormat - the per-type hooks
// ============================================================================

/// The hooks a concrete format supplies.
///
/// Everything else (length enforcement, empty and unparsed handling,
/// fallback-to-blob, post-write reconciliation) is implemented once by
/// the blanket [`DataFormat`] impl, so a concrete format only deals in
/// fully-validated calls over its own data type.
pub trait TypedFormat {
    /// The typed payload this format reads and writes.
    type Data: DatumType + fmt::Display;

    /// Exact byte count of every instance, or zero when variable.
    fn fixed_len(&self) -> usize;

    /// Human-readable description of this format.
    fn describe(&self) -> String;

    /// Parse exactly `length` bytes into the payload type.
    fn read_typed(&self, cursor: &mut ReadCursor<'_>, length: usize) -> Result<Self::Data>;

    /// Emit the payload in exactly `length` bytes.
    fn write_typed(
        &self,
        value: &Self::Data,
        cursor: &mut WriteCursor<'_>,
        length: usize,
    ) -> Result<()>;

    /// On-wire byte count of `value` for a variable-length format.
    ///
    /// The default requires a nonzero hint; formats whose payload
    /// determines its own length override this.
    fn length_of_typed(&self, value: &Self::Data, length_hint: usize) -> Result<usize> {
        let _ = value;
        if length_hint != 0 {
            Ok(length_hint)
        } else {
            Err(Error::UnspecifiedLength(self.describe()))
        }
    }

    /// Render the payload for diagnostics.
    fn print_typed(&self, value: &Self::Data, length_hint: usize) -> String {
        let _ = length_hint;
        value.to_string()
    }
}

impl<F: TypedFormat + Send + Sync> DataFormat for F {
    fn read(&self, cursor: &mut ReadCursor<'_>, length: usize) -> Result<Value> {
        if length == 0 {
            // Zero length: null / unknown value
            return Ok(Value::Empty);
        }
        let fixed = self.fixed_len();
        if fixed != 0 && length != fixed {
            return Err(Error::WrongLength {
                expected: fixed,
                got: length,
            });
        }

        let start = cursor.position();
        let fallback = |cursor: &mut ReadCursor<'_>| -> Result<Value> {
            cursor.set_position(start);
            Ok(Value::unparsed(cursor.take(length)?, length))
        };
        match self.read_typed(cursor, length) {
            Ok(data) => {
                if cursor.position() - start == length {
                    Ok(Value::new(data, length))
                } else {
                    tracing::error!(
                        target: "klv::read",
                        format = %self.describe(),
                        announced = length,
                        consumed = cursor.position() - start,
                        "reader consumed wrong byte count, preserving raw bytes"
                    );
                    fallback(cursor)
                }
            }
            Err(error) => {
                tracing::error!(
                    target: "klv::read",
                    format = %self.describe(),
                    %error,
                    "error occurred during parsing, preserving raw bytes"
                );
                fallback(cursor)
            }
        }
    }

    fn write(&self, value: &Value, cursor: &mut WriteCursor<'_>, max_length: usize) -> Result<()> {
        match value {
            // Null / unknown value: write nothing
            Value::Empty => Ok(()),
            // Unparsed value: restore the raw bytes
            Value::Unparsed { bytes, .. } => {
                if bytes.len() > max_length {
                    return Err(Error::Overflow {
                        needed: bytes.len(),
                        remaining: max_length,
                    });
                }
                write_blob(bytes, cursor)
            }
            Value::Typed { .. } => {
                let needed = self.length_of(value)?;
                if needed > max_length {
                    return Err(Error::Overflow {
                        needed,
                        remaining: max_length,
                    });
                }

                let data = value.get::<F::Data>()?;
                let start = cursor.position();
                self.write_typed(data, cursor, needed)?;

                // The byte count emitted must match the byte count
                // computed; anything else is a bug in the format
                let actual = cursor.position() - start;
                if actual != needed {
                    return Err(Error::LengthMismatch {
                        computed: needed,
                        actual,
                    });
                }
                Ok(())
            }
        }
    }

    fn length_of(&self, value: &Value) -> Result<usize> {
        match value {
            Value::Empty => Ok(0),
            Value::Unparsed { bytes, .. } => Ok(bytes.len()),
            Value::Typed { length_hint, .. } => {
                let fixed = self.fixed_len();
                if fixed != 0 {
                    Ok(fixed)
                } else {
                    self.length_of_typed(value.get::<F::Data>()?, *length_hint)
                }
            }
        }
    }

    fn type_tag(&self) -> TypeTag {
        F::Data::TAG
    }

    fn print(&self, value: &Value) -> String {
        match value.get::<F::Data>() {
            Ok(data) => self.print_typed(data, value.length_hint()),
            Err(_) => value.to_string(),
        }
    }

    fn description(&self) -> String {
        self.describe()
    }

    fn fixed_length(&self) -> usize {
        self.fixed_len()
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// "length N" or "variable length", for description strings.
fn length_description(fixed_length: usize) -> String {
    if fixed_length != 0 {
        format!("length {fixed_length}")
    } else {
        "variable length".to_string()
    }
}

/// Resolve the on-wire width of a float payload: its own recorded
/// length, else the container hint, else fail.
fn sized_float_length(
    value: &SizedFloat,
    length_hint: usize,
    description: impl FnOnce() -> String,
) -> Result<usize> {
    if value.length != 0 {
        Ok(value.length)
    } else if length_hint != 0 {
        Ok(length_hint)
    } else {
        Err(Error::UnspecifiedLength(description()))
    }
}

/// Decimal digits needed to express `bits` bits of precision.
fn bits_to_decimal_digits(bits: usize) -> usize {
    (bits as f64 * std::f64::consts::LOG10_2).ceil() as usize
}

/// Significant digits that reproduce a binary32 value exactly.
const FLOAT_DIGITS: usize = 8;

/// Significant digits that reproduce a binary64 value exactly.
const DOUBLE_DIGITS: usize = 17;

/// Format `value` to `digits` significant decimal digits, choosing
/// fixed or scientific notation the way C's `%g` does.
fn fmt_significant(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }
    let digits = digits.max(1) as i32;
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= digits {
        format!("{:.*e}", (digits - 1) as usize, value)
    } else {
        let rendered = format!("{:.*}", (digits - 1 - exponent).max(0) as usize, value);
        if rendered.contains('.') {
            rendered.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            rendered
        }
    }
}

/// Reject out-of-range finite input when a mapped format is strict.
fn check_strict(strict: bool, value: f64, minimum: f64, maximum: f64) -> Result<()> {
    if strict && value.is_finite() && (value < minimum || value > maximum) {
        return Err(Error::OutOfRange {
            value,
            min: minimum,
            max: maximum,
        });
    }
    Ok(())
}

// ============================================================================
// Blob / String
// ============================================================================

/// Treats data as an uninterpreted sequence of bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlobFormat {
    fixed_length: usize,
}

impl BlobFormat {
    /// A blob of exactly `fixed_length` bytes (zero = variable).
    pub fn new(fixed_length: usize) -> Self {
        Self { fixed_length }
    }

    /// A blob of any length.
    pub fn variable() -> Self {
        Self::new(0)
    }
}

impl TypedFormat for BlobFormat {
    type Data = Blob;

    fn fixed_len(&self) -> usize {
        self.fixed_length
    }

    fn describe(&self) -> String {
        format!("raw bytes of {}", length_description(self.fixed_length))
    }

    fn read_typed(&self, cursor: &mut ReadCursor<'_>, length: usize) -> Result<Blob> {
        read_blob(cursor, length)
    }

    fn write_typed(
        &self,
        value: &Blob,
        cursor: &mut WriteCursor<'_>,
        _length: usize,
    ) -> Result<()> {
        write_blob(value, cursor)
    }

    fn length_of_typed(&self, value: &Blob, _length_hint: usize) -> Result<usize> {
        Ok(value.len())
    }
}

/// Interprets data as a counted UTF-8 string.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringFormat {
    fixed_length: usize,
}

impl StringFormat {
    /// A string of exactly `fixed_length` bytes (zero = variable).
    pub fn new(fixed_length: usize) -> Self {
        Self { fixed_length }
    }

    /// A string of any length.
    pub fn variable() -> Self {
        Self::new(0)
    }
}

impl TypedFormat for StringFormat {
    type Data = String;

    fn fixed_len(&self) -> usize {
        self.fixed_length
    }

    fn describe(&self) -> String {
        format!("string of {}", length_description(self.fixed_length))
    }

    fn read_typed(&self, cursor: &mut ReadCursor<'_>, length: usize) -> Result<String> {
        read_string(cursor, length)
    }

    fn write_typed(
        &self,
        value: &String,
        cursor: &mut WriteCursor<'_>,
        _length: usize,
    ) -> Result<()> {
        write_string(value, cursor)
    }

    fn length_of_typed(&self, value: &String, _length_hint: usize) -> Result<usize> {
        Ok(value.len())
    }

    fn print_typed(&self, value: &String, _length_hint: usize) -> String {
        format!("\"{value}\"")
    }
}

// ============================================================================
// Integers
// ============================================================================

/// Interprets data as a big-endian unsigned integer.
#[derive(Clone, Copy, Debug, Default)]
pub struct UintFormat {
    fixed_length: usize,
}

impl UintFormat {
    /// An unsigned integer of exactly `fixed_length` bytes (zero =
    /// minimum-length encoding).
    pub fn new(fixed_length: usize) -> Self {
        Self { fixed_length }
    }

    /// An unsigned integer written with the fewest bytes that hold it.
    pub fn min_length() -> Self {
        Self::new(0)
    }
}

impl TypedFormat for UintFormat {
    type Data = u64;

    fn fixed_len(&self) -> usize {
        self.fixed_length
    }

    fn describe(&self) -> String {
        format!("unsigned integer of {}", length_description(self.fixed_length))
    }

    fn read_typed(&self, cursor: &mut ReadCursor<'_>, length: usize) -> Result<u64> {
        read_uint(cursor, length)
    }

    fn write_typed(&self, value: &u64, cursor: &mut WriteCursor<'_>, length: usize) -> Result<()> {
        write_uint(*value, cursor, length)
    }

    fn length_of_typed(&self, value: &u64, _length_hint: usize) -> Result<usize> {
        Ok(uint_length(*value))
    }
}

/// Interprets data as a big-endian two's-complement signed integer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SintFormat {
    fixed_length: usize,
}

impl SintFormat {
    /// A signed integer of exactly `fixed_length` bytes (zero =
    /// minimum-length encoding).
    pub fn new(fixed_length: usize) -> Self {
        Self { fixed_length }
    }

    /// A signed integer written with the fewest bytes that preserve
    /// value and sign.
    pub fn min_length() -> Self {
        Self::new(0)
    }
}

impl TypedFormat for SintFormat {
    type Data = i64;

    fn fixed_len(&self) -> usize {
        self.fixed_length
    }

    fn describe(&self) -> String {
        format!("signed integer of {}", length_description(self.fixed_length))
    }

    fn read_typed(&self, cursor: &mut ReadCursor<'_>, length: usize) -> Result<i64> {
        read_sint(cursor, length)
    }

    fn write_typed(&self, value: &i64, cursor: &mut WriteCursor<'_>, length: usize) -> Result<()> {
        write_sint(*value, cursor, length)
    }

    fn length_of_typed(&self, value: &i64, _length_hint: usize) -> Result<usize> {
        Ok(sint_length(*value))
    }
}

/// Interprets data as an unsigned integer in BER length encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct BerFormat;

impl BerFormat {
    /// A BER-encoded unsigned integer (always variable length).
    pub fn new() -> Self {
        Self
    }
}

impl TypedFormat for BerFormat {
    type Data = u64;

    fn fixed_len(&self) -> usize {
        0
    }

    fn describe(&self) -> String {
        format!("BER-encoded unsigned integer of {}", length_description(0))
    }

    fn read_typed(&self, cursor: &mut ReadCursor<'_>, _length: usize) -> Result<u64> {
        read_ber(cursor)
    }

    fn write_typed(&self, value: &u64, cursor: &mut WriteCursor<'_>, _length: usize) -> Result<()> {
        write_ber(*value, cursor)
    }

    fn length_of_typed(&self, value: &u64, _length_hint: usize) -> Result<usize> {
        Ok(ber_length(*value))
    }
}

/// Interprets data as an unsigned integer in BER-OID varint encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct BerOidFormat;

impl BerOidFormat {
    /// A BER-OID-encoded unsigned integer (always variable length).
    pub fn new() -> Self {
        Self
    }
}

impl TypedFormat for BerOidFormat {
    type Data = u64;

    fn fixed_len(&self) -> usize {
        0
    }

    fn describe(&self) -> String {
        format!("BER-OID-encoded unsigned integer of {}", length_description(0))
    }

    fn read_typed(&self, cursor: &mut ReadCursor<'_>, _length: usize) -> Result<u64> {
        read_ber_oid(cursor)
    }

    fn write_typed(&self, value: &u64, cursor: &mut WriteCursor<'_>, _length: usize) -> Result<()> {
        write_ber_oid(*value, cursor)
    }

    fn length_of_typed(&self, value: &u64, _length_hint: usize) -> Result<usize> {
        Ok(ber_oid_length(*value))
    }
}

// ============================================================================
// Floating point
// ============================================================================

/// Interprets data as an IEEE-754 floating-point number of 4 or 8
/// bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct FloatFormat {
    fixed_length: usize,
}

impl FloatFormat {
    /// A float of exactly `fixed_length` bytes; zero lets each value
    /// carry its own width.
    pub fn new(fixed_length: usize) -> Self {
        debug_assert!(matches!(fixed_length, 0 | 4 | 8));
        Self { fixed_length }
    }
}

impl TypedFormat for FloatFormat {
    type Data = SizedFloat;

    fn fixed_len(&self) -> usize {
        self.fixed_length
    }

    fn describe(&self) -> String {
        format!(
            "IEEE-754 floating-point number of {}",
            length_description(self.fixed_length)
        )
    }

    fn read_typed(&self, cursor: &mut ReadCursor<'_>, length: usize) -> Result<SizedFloat> {
        Ok(SizedFloat::new(read_float(cursor, length)?, length))
    }

    fn write_typed(
        &self,
        value: &SizedFloat,
        cursor: &mut WriteCursor<'_>,
        length: usize,
    ) -> Result<()> {
        write_float(value.value, cursor, length)
    }

    fn length_of_typed(&self, value: &SizedFloat, length_hint: usize) -> Result<usize> {
        sized_float_length(value, length_hint, || self.describe())
    }

    fn print_typed(&self, value: &SizedFloat, length_hint: usize) -> String {
        let length = if self.fixed_length != 0 {
            self.fixed_length
        } else if value.length != 0 {
            value.length
        } else {
            length_hint
        };
        let digits = if length == 4 { FLOAT_DIGITS } else { DOUBLE_DIGITS };
        fmt_significant(value.value, digits)
    }
}

// ============================================================================
// Mapped integers
// ============================================================================

/// Interprets data as an unsigned integer linearly mapped onto a
/// floating-point range.
#[derive(Clone, Copy, Debug)]
pub struct UflintFormat {
    minimum: f64,
    maximum: f64,
    fixed_length: usize,
    strict: bool,
}

impl UflintFormat {
    /// Map `[minimum, maximum]` onto an unsigned integer of
    /// `fixed_length` bytes (zero = each value carries its own width).
    pub fn new(minimum: f64, maximum: f64, fixed_length: usize) -> Self {
        debug_assert!(minimum < maximum);
        Self {
            minimum,
            maximum,
            fixed_length,
            strict: false,
        }
    }

    /// Fail with [`Error::OutOfRange`] on out-of-range input instead of
    /// clamping.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Lower bound of the mapped range.
    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    /// Upper bound of the mapped range.
    pub fn maximum(&self) -> f64 {
        self.maximum
    }
}

impl TypedFormat for UflintFormat {
    type Data = SizedFloat;

    fn fixed_len(&self) -> usize {
        self.fixed_length
    }

    fn describe(&self) -> String {
        format!(
            "unsigned integer of {}, mapped to [{}, {}]",
            length_description(self.fixed_length),
            self.minimum,
            self.maximum
        )
    }

    fn read_typed(&self, cursor: &mut ReadCursor<'_>, length: usize) -> Result<SizedFloat> {
        Ok(SizedFloat::new(
            read_uflint(self.minimum, self.maximum, cursor, length)?,
            length,
        ))
    }

    fn write_typed(
        &self,
        value: &SizedFloat,
        cursor: &mut WriteCursor<'_>,
        length: usize,
    ) -> Result<()> {
        check_strict(self.strict, value.value, self.minimum, self.maximum)?;
        write_uflint(value.value, self.minimum, self.maximum, cursor, length)
    }

    fn length_of_typed(&self, value: &SizedFloat, length_hint: usize) -> Result<usize> {
        sized_float_length(value, length_hint, || self.describe())
    }

    fn print_typed(&self, value: &SizedFloat, length_hint: usize) -> String {
        print_mapped(self.fixed_length, value, length_hint, 0)
    }
}

/// Interprets data as a signed integer mapped symmetrically onto a
/// floating-point range, zero at the midpoint.
#[derive(Clone, Copy, Debug)]
pub struct SflintFormat {
    minimum: f64,
    maximum: f64,
    fixed_length: usize,
    strict: bool,
}

impl SflintFormat {
    /// Map `[minimum, maximum]` onto a signed integer of `fixed_length`
    /// bytes (zero = each value carries its own width).
    pub fn new(minimum: f64, maximum: f64, fixed_length: usize) -> Self {
        debug_assert!(minimum < maximum);
        Self {
            minimum,
            maximum,
            fixed_length,
            strict: false,
        }
    }

    /// Fail with [`Error::OutOfRange`] on out-of-range input instead of
    /// clamping.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Lower bound of the mapped range.
    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    /// Upper bound of the mapped range.
    pub fn maximum(&self) -> f64 {
        self.maximum
    }
}

impl TypedFormat for SflintFormat {
    type Data = SizedFloat;

    fn fixed_len(&self) -> usize {
        self.fixed_length
    }

    fn describe(&self) -> String {
        format!(
            "signed integer of {}, mapped to [{}, {}]",
            length_description(self.fixed_length),
            self.minimum,
            self.maximum
        )
    }

    fn read_typed(&self, cursor: &mut ReadCursor<'_>, length: usize) -> Result<SizedFloat> {
        Ok(SizedFloat::new(
            read_sflint(self.minimum, self.maximum, cursor, length)?,
            length,
        ))
    }

    fn write_typed(
        &self,
        value: &SizedFloat,
        cursor: &mut WriteCursor<'_>,
        length: usize,
    ) -> Result<()> {
        check_strict(self.strict, value.value, self.minimum, self.maximum)?;
        write_sflint(value.value, self.minimum, self.maximum, cursor, length)
    }

    fn length_of_typed(&self, value: &SizedFloat, length_hint: usize) -> Result<usize> {
        sized_float_length(value, length_hint, || self.describe())
    }

    fn print_typed(&self, value: &SizedFloat, length_hint: usize) -> String {
        print_mapped(self.fixed_length, value, length_hint, 0)
    }
}

/// Interprets data as a floating-point value in MISB ST 1201 IMAP
/// encoding.
#[derive(Clone, Copy, Debug)]
pub struct ImapFormat {
    minimum: f64,
    maximum: f64,
    fixed_length: usize,
    strict: bool,
}

impl ImapFormat {
    /// Map `[minimum, maximum]` in IMAP encoding at `fixed_length`
    /// bytes (zero = each value carries its own width).
    pub fn new(minimum: f64, maximum: f64, fixed_length: usize) -> Self {
        debug_assert!(minimum < maximum);
        Self {
            minimum,
            maximum,
            fixed_length,
            strict: false,
        }
    }

    /// Fail with [`Error::OutOfRange`] on out-of-range input instead of
    /// clamping.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Lower bound of the mapped range.
    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    /// Upper bound of the mapped range.
    pub fn maximum(&self) -> f64 {
        self.maximum
    }
}

impl TypedFormat for ImapFormat {
    type Data = SizedFloat;

    fn fixed_len(&self) -> usize {
        self.fixed_length
    }

    fn describe(&self) -> String {
        format!(
            "IMAP-encoded range [{}, {}], of {}",
            self.minimum,
            self.maximum,
            length_description(self.fixed_length)
        )
    }

    fn read_typed(&self, cursor: &mut ReadCursor<'_>, length: usize) -> Result<SizedFloat> {
        Ok(SizedFloat::new(
            read_imap(self.minimum, self.maximum, cursor, length)?,
            length,
        ))
    }

    fn write_typed(
        &self,
        value: &SizedFloat,
        cursor: &mut WriteCursor<'_>,
        length: usize,
    ) -> Result<()> {
        check_strict(self.strict, value.value, self.minimum, self.maximum)?;
        write_imap(value.value, self.minimum, self.maximum, cursor, length)
    }

    fn length_of_typed(&self, value: &SizedFloat, length_hint: usize) -> Result<usize> {
        sized_float_length(value, length_hint, || self.describe())
    }

    fn print_typed(&self, value: &SizedFloat, length_hint: usize) -> String {
        // One bit of the code space is reserved for special values
        print_mapped(self.fixed_length, value, length_hint, 1)
    }
}

/// Shared print path for the mapped formats: precision follows the
/// on-wire bit count, minus any reserved bits.
fn print_mapped(
    fixed_length: usize,
    value: &SizedFloat,
    length_hint: usize,
    reserved_bits: usize,
) -> String {
    let length = if fixed_length != 0 {
        fixed_length
    } else if value.length != 0 {
        value.length
    } else {
        length_hint
    };
    let digits = if length != 0 {
        bits_to_decimal_digits(8 * length - reserved_bits)
    } else {
        DOUBLE_DIGITS
    };
    fmt_significant(value.value, digits)
}

// ============================================================================
// UUID
// ============================================================================

/// Interprets data as a 16-byte UUID.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidFormat;

impl UuidFormat {
    /// A UUID format (always 16 bytes).
    pub fn new() -> Self {
        Self
    }
}

impl TypedFormat for UuidFormat {
    type Data = Uuid;

    fn fixed_len(&self) -> usize {
        Uuid::LENGTH
    }

    fn describe(&self) -> String {
        format!("UUID of {}", length_description(Uuid::LENGTH))
    }

    fn read_typed(&self, cursor: &mut ReadCursor<'_>, _length: usize) -> Result<Uuid> {
        read_uuid(cursor)
    }

    fn write_typed(
        &self,
        value: &Uuid,
        cursor: &mut WriteCursor<'_>,
        _length: usize,
    ) -> Result<()> {
        write_uuid(value, cursor)
    }

    fn length_of_typed(&self, _value: &Uuid, _length_hint: usize) -> Result<usize> {
        Ok(Uuid::LENGTH)
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Interprets data as an unsigned integer drawn from a named code
/// table.
///
/// Unknown codes still read and write; they just print as numbers.
#[derive(Clone, Copy, Debug)]
pub struct EnumFormat {
    name: &'static str,
    entries: &'static [(u64, &'static str)],
    fixed_length: usize,
}

impl EnumFormat {
    /// An enumeration called `name` over `entries`, encoded as an
    /// unsigned integer of `fixed_length` bytes (zero = minimum-length
    /// encoding).
    pub fn new(
        name: &'static str,
        entries: &'static [(u64, &'static str)],
        fixed_length: usize,
    ) -> Self {
        Self {
            name,
            entries,
            fixed_length,
        }
    }

    /// The symbolic name for `code`, if the table has one.
    pub fn name_of(&self, code: u64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(value, _)| *value == code)
            .map(|(_, name)| *name)
    }
}

impl TypedFormat for EnumFormat {
    type Data = u64;

    fn fixed_len(&self) -> usize {
        self.fixed_length
    }

    fn describe(&self) -> String {
        format!(
            "{} enumeration of {}",
            self.name,
            length_description(self.fixed_length)
        )
    }

    fn read_typed(&self, cursor: &mut ReadCursor<'_>, length: usize) -> Result<u64> {
        read_uint(cursor, length)
    }

    fn write_typed(&self, value: &u64, cursor: &mut WriteCursor<'_>, length: usize) -> Result<()> {
        write_uint(*value, cursor, length)
    }

    fn length_of_typed(&self, value: &u64, _length_hint: usize) -> Result<usize> {
        Ok(uint_length(*value))
    }

    fn print_typed(&self, value: &u64, _length_hint: usize) -> String {
        match self.name_of(*value) {
            Some(name) => name.to_string(),
            None => value.to_string(),
        }
    }
}
