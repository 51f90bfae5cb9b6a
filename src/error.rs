//! Error types for the KLV codec core.

use crate::value::TypeTag;
use thiserror::Error;

/// Result type alias using this crate's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for KLV codec operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A read would run past the end of the buffer.
    #[error("truncated data: needed {needed} bytes, {remaining} remain")]
    Truncated {
        /// Bytes the operation needed.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// A write would run past the end of the buffer.
    #[error("write overflows buffer: needed {needed} bytes, {remaining} remain")]
    Overflow {
        /// Bytes the operation needed.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// A fixed-length format was handed the wrong byte count, or a value
    /// does not fit the requested encoding width.
    #[error("wrong length: expected {expected} bytes, got {got}")]
    WrongLength {
        /// Byte count the format requires.
        expected: usize,
        /// Byte count actually supplied.
        got: usize,
    },

    /// A decoded integer exceeds 64 bits, or an integer field is wider
    /// than 8 bytes.
    #[error("decoded value does not fit in 64 bits")]
    OverflowInDecode,

    /// A floating-point field with a width other than 4 or 8 bytes.
    #[error("unsupported floating-point width: {0} bytes")]
    UnsupportedFloatWidth(usize),

    /// A strict-mode mapped format was given a value outside its range.
    #[error("value {value} outside mapped range [{min}, {max}]")]
    OutOfRange {
        /// The offending value.
        value: f64,
        /// Lower bound of the mapping.
        min: f64,
        /// Upper bound of the mapping.
        max: f64,
    },

    /// A typed accessor was called on a value of a different kind.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Kind the caller asked for.
        expected: TypeTag,
        /// Kind actually held, as display text ("empty" and "unparsed"
        /// included).
        found: String,
    },

    /// Post-write self-check failed: a format wrote a different number of
    /// bytes than it computed. This is a bug in the format, not in the
    /// data.
    #[error("format wrote {actual} bytes but computed {computed}")]
    LengthMismatch {
        /// Byte count `length_of` computed.
        computed: usize,
        /// Byte count the writer actually emitted.
        actual: usize,
    },

    /// A variable-length value carries no length hint, so its on-wire
    /// width cannot be determined at write time.
    #[error("variable-length format `{0}` requires a length hint")]
    UnspecifiedLength(String),

    /// A string field held invalid UTF-8.
    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// An IMAP code with the special-value bit set that matches no
    /// assigned ST 1201 pattern.
    #[error("reserved IMAP special-value pattern: {0:#x}")]
    ReservedImapValue(u64),
}
