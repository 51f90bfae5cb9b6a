//! # klv-codec
//!
//! Codec core for the KLV (Key-Length-Value) metadata encodings used in
//! motion-imagery streams: SMPTE ST 336, MISB ST 0601, and MISB ST 1201.
//!
//! Each field on the wire is described by a *format*: a shared,
//! immutable descriptor that knows how to read, write, measure, and
//! render exactly one data type under one encoding rule. The supported
//! encodings:
//!
//! - Big-endian unsigned/signed integers (fixed or minimum length)
//! - BER length fields and BER-OID varints
//! - IEEE-754 floats at 4 or 8 bytes
//! - `UFLINT`/`SFLINT` linear integer-to-range mappings
//! - ST 1201 `IMAP` non-linear mapping with special values
//! - Counted strings, UUIDs, and opaque blobs
//!
//! Fields that fail to parse are preserved verbatim as
//! [`Value::Unparsed`](value::Value) rather than dropped, so a
//! read-then-write round trip reproduces the original byte stream
//! exactly.
//!
//! This crate does not frame packets, compute checksums, or resolve tag
//! dictionaries; an enclosing packet layer pre-parses each field's
//! length (typically with [`format::BerFormat`]) and hands it down.
//!
//! ## Quick Start
//!
//! ```rust
//! use klv_codec::prelude::*;
//!
//! // MISB ST 0601 sensor true altitude: IMAP over [-900, 19000] at 2 bytes
//! let altitude = ImapFormat::new(-900.0, 19000.0, 2);
//!
//! let mut buf = [0u8; 2];
//! let mut writer = WriteCursor::new(&mut buf);
//! altitude
//!     .write(&Value::new(SizedFloat::new(0.0, 2), 0), &mut writer, 2)
//!     .unwrap();
//! assert_eq!(buf, [0x03, 0x84]);
//!
//! let mut reader = ReadCursor::new(&buf);
//! let value = altitude.read(&mut reader, 2).unwrap();
//! assert_eq!(value.get::<SizedFloat>().unwrap().value, 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod encoding;
pub mod error;
pub mod format;
pub mod imap;
pub mod value;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cursor::{ReadCursor, WriteCursor};
    pub use crate::error::{Error, Result};
    pub use crate::format::{
        BerFormat, BerOidFormat, BlobFormat, DataFormat, DataFormatRef, EnumFormat, FloatFormat,
        ImapFormat, SflintFormat, StringFormat, TypedFormat, UflintFormat, UintFormat, SintFormat,
        UuidFormat,
    };
    pub use crate::value::{Blob, Datum, SizedFloat, TypeTag, Uuid, Value};
}

pub use error::{Error, Result};
