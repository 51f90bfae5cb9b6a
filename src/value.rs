//! Dynamic value container for KLV fields.
//!
//! A [`Value`] is what every format produces on read and accepts on
//! write. It has three states:
//!
//! - **Empty**: unknown / absent; serializes to zero bytes.
//! - **Unparsed**: raw bytes that no format could interpret, preserved
//!   verbatim so a round trip reproduces the original stream.
//! - **Typed**: one of the primitive [`Datum`] kinds plus an optional
//!   length hint (zero means unspecified).
//!
//! Typed access goes through [`Value::get`], which fails with
//! [`Error::TypeMismatch`] when the held kind differs from the one
//! requested.

use crate::error::{Error, Result};
use std::fmt;

// ============================================================================
// Primitive payload types
// ============================================================================

/// An owned, uninterpreted byte sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blob(pub Vec<u8>);

impl Blob {
    /// Byte count of the blob.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the blob holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Blob {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A double paired with the on-wire byte length that produced it or that
/// it should be written with.
///
/// Variable-length float and mapped-integer formats need both pieces:
/// the length selects print precision and keeps the round trip
/// byte-exact. A `length` of zero means unspecified.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizedFloat {
    /// The floating-point value.
    pub value: f64,
    /// On-wire byte length, zero if unknown.
    pub length: usize,
}

impl SizedFloat {
    /// Pair a value with its on-wire length.
    pub fn new(value: f64, length: usize) -> Self {
        Self { value, length }
    }
}

impl From<f64> for SizedFloat {
    fn from(value: f64) -> Self {
        Self { value, length: 0 }
    }
}

impl fmt::Display for SizedFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A 16-byte opaque identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Uuid(pub [u8; 16]);

impl Uuid {
    /// Byte count of a UUID on the wire.
    pub const LENGTH: usize = 16;
}

impl From<[u8; 16]> for Uuid {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                write!(f, "-")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Datum - tagged sum of the primitive kinds
// ============================================================================

/// The universe of typed payloads a format can produce.
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    /// Owned byte sequence of any length.
    Blob(Blob),
    /// 64-bit unsigned integer.
    UInt(u64),
    /// 64-bit signed integer.
    SInt(i64),
    /// Double plus its on-wire byte length.
    Float(SizedFloat),
    /// UTF-8 text.
    String(String),
    /// 16 opaque bytes.
    Uuid(Uuid),
}

impl Datum {
    /// The kind tag of this payload.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Datum::Blob(_) => TypeTag::Blob,
            Datum::UInt(_) => TypeTag::UInt,
            Datum::SInt(_) => TypeTag::SInt,
            Datum::Float(_) => TypeTag::Float,
            Datum::String(_) => TypeTag::String,
            Datum::Uuid(_) => TypeTag::Uuid,
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Blob(blob) => write!(f, "{blob}"),
            Datum::UInt(v) => write!(f, "{v}"),
            Datum::SInt(v) => write!(f, "{v}"),
            Datum::Float(v) => write!(f, "{v}"),
            Datum::String(s) => write!(f, "\"{s}\""),
            Datum::Uuid(u) => write!(f, "{u}"),
        }
    }
}

/// Kind discriminator for [`Datum`], used in diagnostics and
/// [`Error::TypeMismatch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Uninterpreted bytes.
    Blob,
    /// UTF-8 text.
    String,
    /// Unsigned integer.
    UInt,
    /// Signed integer.
    SInt,
    /// Floating-point number.
    Float,
    /// 16-byte identifier.
    Uuid,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Blob => "blob",
            TypeTag::String => "string",
            TypeTag::UInt => "unsigned integer",
            TypeTag::SInt => "signed integer",
            TypeTag::Float => "floating-point number",
            TypeTag::Uuid => "UUID",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// DatumType - typed access into the sum
// ============================================================================

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Blob {}
    impl Sealed for u64 {}
    impl Sealed for i64 {}
    impl Sealed for super::SizedFloat {}
    impl Sealed for String {}
    impl Sealed for super::Uuid {}
}

/// A Rust type that corresponds to exactly one [`Datum`] kind.
///
/// Implemented for [`Blob`], `u64`, `i64`, [`SizedFloat`], `String`, and
/// [`Uuid`]; sealed against outside implementations so the sum stays
/// closed.
pub trait DatumType: sealed::Sealed + Sized {
    /// The kind tag this type maps to.
    const TAG: TypeTag;

    /// Wrap a value of this type into a [`Datum`].
    fn into_datum(self) -> Datum;

    /// Borrow this type out of a [`Datum`], if the kind matches.
    fn from_datum(datum: &Datum) -> Option<&Self>;
}

macro_rules! impl_datum_type {
    ($ty:ty, $tag:expr, $variant:ident) => {
        impl DatumType for $ty {
            const TAG: TypeTag = $tag;

            fn into_datum(self) -> Datum {
                Datum::$variant(self)
            }

            fn from_datum(datum: &Datum) -> Option<&Self> {
                match datum {
                    Datum::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_datum_type!(Blob, TypeTag::Blob, Blob);
impl_datum_type!(u64, TypeTag::UInt, UInt);
impl_datum_type!(i64, TypeTag::SInt, SInt);
impl_datum_type!(SizedFloat, TypeTag::Float, Float);
impl_datum_type!(String, TypeTag::String, String);
impl_datum_type!(Uuid, TypeTag::Uuid, Uuid);

// ============================================================================
// Value - the dynamic container
// ============================================================================

/// Dynamic container holding a parsed field, raw fallback bytes, or
/// nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Unknown / absent. Serializes to zero bytes.
    #[default]
    Empty,
    /// Bytes that failed to parse, preserved verbatim.
    Unparsed {
        /// The raw bytes.
        bytes: Blob,
        /// Announced field length when the bytes were read.
        length_hint: usize,
    },
    /// A successfully parsed payload.
    Typed {
        /// The typed payload.
        datum: Datum,
        /// On-wire byte length if known, zero otherwise.
        length_hint: usize,
    },
}

impl Value {
    /// Wrap a typed payload with a length hint (zero = unspecified).
    pub fn new<T: DatumType>(value: T, length_hint: usize) -> Self {
        Value::Typed {
            datum: value.into_datum(),
            length_hint,
        }
    }

    /// Wrap raw bytes that could not (or should not) be interpreted.
    pub fn unparsed(bytes: impl Into<Blob>, length_hint: usize) -> Self {
        Value::Unparsed {
            bytes: bytes.into(),
            length_hint,
        }
    }

    /// Whether this is the empty / unknown state.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Whether this holds uninterpreted fallback bytes.
    pub fn is_unparsed(&self) -> bool {
        matches!(self, Value::Unparsed { .. })
    }

    /// Whether this holds a typed payload.
    pub fn is_typed(&self) -> bool {
        matches!(self, Value::Typed { .. })
    }

    /// The length hint carried alongside the payload, zero if none.
    pub fn length_hint(&self) -> usize {
        match self {
            Value::Empty => 0,
            Value::Unparsed { length_hint, .. } | Value::Typed { length_hint, .. } => *length_hint,
        }
    }

    /// The kind tag of the typed payload, if any.
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Value::Typed { datum, .. } => Some(datum.type_tag()),
            _ => None,
        }
    }

    /// Borrow the typed payload as `T`.
    ///
    /// Fails with [`Error::TypeMismatch`] when the container is empty,
    /// unparsed, or holds a different kind.
    pub fn get<T: DatumType>(&self) -> Result<&T> {
        let found = match self {
            Value::Empty => "empty".to_string(),
            Value::Unparsed { .. } => "unparsed bytes".to_string(),
            Value::Typed { datum, .. } => match T::from_datum(datum) {
                Some(v) => return Ok(v),
                None => datum.type_tag().to_string(),
            },
        };
        Err(Error::TypeMismatch {
            expected: T::TAG,
            found,
        })
    }
}

impl<T: DatumType> From<T> for Value {
    fn from(value: T) -> Self {
        Value::new(value, 0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => write!(f, "(empty)"),
            Value::Unparsed { bytes, .. } => write!(f, "(unparsed) {bytes}"),
            Value::Typed { datum, .. } => write!(f, "{datum}"),
        }
    }
}
