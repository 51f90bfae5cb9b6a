//! Positioned read/write handles over contiguous byte buffers.
//!
//! Every codec call in this crate works through one of these cursors: a
//! borrowed slice plus a position, advanced by bounds-checked reads or
//! writes. Reads that would pass the end fail with [`Error::Truncated`];
//! writes fail with [`Error::Overflow`]. The cursor position can be saved
//! and restored, which the format layer uses to rewind after a failed
//! parse and re-consume the same bytes as an uninterpreted blob.

use crate::error::{Error, Result};

/// A positioned reader over a borrowed byte slice.
#[derive(Clone, Debug)]
pub struct ReadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    /// Create a cursor at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current position from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Rewind or seek to an absolute position.
    ///
    /// Positions past the end are clamped to the buffer length.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.buf.len());
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Consume and return the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::Truncated {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Consume and return a single byte.
    pub fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }
}

/// A positioned writer over a borrowed mutable byte slice.
#[derive(Debug)]
pub struct WriteCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> WriteCursor<'a> {
    /// Create a cursor at the start of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current position from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to write.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Emit `bytes`, advancing the cursor.
    pub fn put(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.remaining() {
            return Err(Error::Overflow {
                needed: bytes.len(),
                remaining: self.remaining(),
            });
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Emit a single byte.
    pub fn put_u8(&mut self, byte: u8) -> Result<()> {
        self.put(&[byte])
    }

    /// The bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_cursor_advance() {
        let data = [1u8, 2, 3, 4];
        let mut cursor = ReadCursor::new(&data);
        assert_eq!(cursor.take(2).unwrap(), &[1, 2]);
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.remaining(), 2);
        assert_eq!(cursor.take_u8().unwrap(), 3);
    }

    #[test]
    fn test_read_cursor_truncated() {
        let data = [1u8, 2];
        let mut cursor = ReadCursor::new(&data);
        let err = cursor.take(3).unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                needed: 3,
                remaining: 2
            }
        ));
        // Failed read leaves the position untouched
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_read_cursor_rewind() {
        let data = [1u8, 2, 3];
        let mut cursor = ReadCursor::new(&data);
        cursor.take(2).unwrap();
        cursor.set_position(0);
        assert_eq!(cursor.take(3).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_write_cursor_advance() {
        let mut buf = [0u8; 4];
        let mut cursor = WriteCursor::new(&mut buf);
        cursor.put(&[0xAA, 0xBB]).unwrap();
        cursor.put_u8(0xCC).unwrap();
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.written(), &[0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_write_cursor_overflow() {
        let mut buf = [0u8; 2];
        let mut cursor = WriteCursor::new(&mut buf);
        let err = cursor.put(&[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            Error::Overflow {
                needed: 3,
                remaining: 2
            }
        ));
        assert_eq!(cursor.position(), 0);
    }
}
