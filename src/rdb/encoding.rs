//! RDB Length and String Encodings
//!
//! Every size in an RDB file is written with a variable-width "length
//! encoding". The top two bits of the first byte select the form:
//!
//! ```text
//! 00xxxxxx                      6-bit length
//! 01xxxxxx yyyyyyyy             14-bit length (x = high bits, y = low byte)
//! 10______ b0 b1 b2 b3          32-bit length, little-endian
//! 11xxxxxx                      special string encoding selector
//! ```
//!
//! A string is a length followed by that many raw bytes, unless the length
//! byte starts with `11`. In that case the remaining six bits select a compact
//! integer form (i8, i16, i32) that is rendered back to decimal text, or a
//! compressed form that this decoder rejects.

use crate::rdb::decoder::{SnapshotError, SnapshotResult};
use bytes::{Buf, Bytes};

/// Mode bits of a length byte.
mod mode {
    pub const BITS_6: u8 = 0b00;
    pub const BITS_14: u8 = 0b01;
    pub const BITS_32: u8 = 0b10;
    pub const SPECIAL: u8 = 0b11;
}

/// Special string encodings selected by a `11xxxxxx` length byte.
pub mod special {
    pub const INT8: u8 = 0;
    pub const INT16: u8 = 1;
    pub const INT32: u8 = 2;
    pub const COMPRESSED: u8 = 3;
}

/// A decoded length byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// A plain length
    Plain(u32),
    /// A special string encoding selector (only valid where a string is read)
    Special(u8),
}

/// A bounds-checked cursor over snapshot bytes.
///
/// Every read checks the remaining length first, so truncated input turns
/// into [`SnapshotError::UnexpectedEof`] instead of a panic.
#[derive(Debug)]
pub struct Reader {
    buf: Bytes,
    total: usize,
}

impl Reader {
    pub fn new(buf: Bytes) -> Self {
        let total = buf.len();
        Self { buf, total }
    }

    /// Byte offset of the next read from the start of the input.
    pub fn offset(&self) -> usize {
        self.total - self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn ensure(&self, needed: usize) -> SnapshotResult<()> {
        if self.buf.remaining() < needed {
            return Err(SnapshotError::UnexpectedEof {
                offset: self.offset(),
                needed,
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> SnapshotResult<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u32_le(&mut self) -> SnapshotResult<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_i64_le(&mut self) -> SnapshotResult<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64_le())
    }

    pub fn read_i8(&mut self) -> SnapshotResult<i8> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn read_i16_le(&mut self) -> SnapshotResult<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16_le())
    }

    pub fn read_i32_le(&mut self) -> SnapshotResult<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    /// Takes `len` raw bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> SnapshotResult<Bytes> {
        self.ensure(len)?;
        Ok(self.buf.split_to(len))
    }

    /// Reads a length encoding.
    pub fn read_length(&mut self) -> SnapshotResult<Length> {
        let first = self.read_u8()?;
        let low = first & 0x3F;

        match first >> 6 {
            mode::BITS_6 => Ok(Length::Plain(u32::from(low))),
            mode::BITS_14 => {
                let next = self.read_u8()?;
                Ok(Length::Plain((u32::from(low) << 8) | u32::from(next)))
            }
            mode::BITS_32 => Ok(Length::Plain(self.read_u32_le()?)),
            mode::SPECIAL => Ok(Length::Special(low)),
            _ => unreachable!("two-bit mode"),
        }
    }

    /// Reads a length where a special string encoding is not allowed.
    pub fn read_plain_length(&mut self) -> SnapshotResult<usize> {
        let offset = self.offset();
        match self.read_length()? {
            Length::Plain(len) => Ok(len as usize),
            Length::Special(selector) => Err(SnapshotError::UnexpectedSpecialEncoding {
                offset,
                selector,
            }),
        }
    }

    /// Reads a string, rendering integer encodings as decimal text.
    pub fn read_string(&mut self) -> SnapshotResult<Bytes> {
        match self.read_length()? {
            Length::Plain(len) => self.read_bytes(len as usize),
            Length::Special(special::INT8) => Ok(decimal(self.read_i8()?)),
            Length::Special(special::INT16) => Ok(decimal(self.read_i16_le()?)),
            Length::Special(special::INT32) => Ok(decimal(self.read_i32_le()?)),
            Length::Special(special::COMPRESSED) => Err(SnapshotError::UnsupportedCompression),
            Length::Special(selector) => Err(SnapshotError::InvalidStringEncoding(selector)),
        }
    }
}

fn decimal(n: impl ToString) -> Bytes {
    Bytes::from(n.to_string())
}
