//! RESP Command Decoder
//!
//! Clients send each command as a multi-bulk array of bulk strings:
//!
//! ```text
//! *3\r\n$3\r\nSET\r\n$4\r\nname\r\n$4\r\nAriz\r\n
//! ```
//!
//! or, from a terminal, as an inline command: `PING\r\n`.
//!
//! [`parse_command`] reads one command off the front of a buffer and returns
//! either:
//! - `Ok(Some((args, consumed)))` - a full command, `consumed` bytes were used
//! - `Ok(None)` - the command is incomplete, read more data and retry
//! - `Err(ParseError)` - the bytes are not valid RESP

use crate::protocol::types::{prefix, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while decoding a command.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// A length header was not a valid integer
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in a length header or inline command
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array length is negative (but not -1)
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// A multi-bulk element was not a bulk string
    #[error("expected bulk string, got type prefix {0:#04x}")]
    UnexpectedType(u8),

    /// Protocol violation (missing CRLF, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// A header announced more data than allowed
    #[error("message too large: {size} (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of arguments in one command
pub const MAX_ARGS: usize = 1024 * 1024;

/// Decodes one command from the front of `buf`.
///
/// An empty multi-bulk (`*0\r\n`), a null multi-bulk (`*-1\r\n`) and a blank
/// inline line all decode to an empty argument list.
///
/// # Example
///
/// ```
/// use snapkv::protocol::parse_command;
///
/// let (args, consumed) = parse_command(b"*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n")
///     .unwrap()
///     .unwrap();
/// assert_eq!(args, vec!["ECHO", "hi"]);
/// assert_eq!(consumed, 22);
/// ```
pub fn parse_command(buf: &[u8]) -> ParseResult<Option<(Vec<Bytes>, usize)>> {
    match buf.first() {
        None => Ok(None),
        Some(&prefix::ARRAY) => parse_multi_bulk(buf),
        Some(_) => parse_inline(buf),
    }
}

/// Parses `*<count>\r\n` followed by `count` bulk strings.
fn parse_multi_bulk(buf: &[u8]) -> ParseResult<Option<(Vec<Bytes>, usize)>> {
    let (count, mut consumed) = match parse_header(buf)? {
        Some(header) => header,
        None => return Ok(None),
    };

    if count == -1 {
        return Ok(Some((Vec::new(), consumed)));
    }
    if count < 0 {
        return Err(ParseError::InvalidArrayLength(count));
    }

    let count = count as usize;
    if count > MAX_ARGS {
        return Err(ParseError::MessageTooLarge {
            size: count,
            max: MAX_ARGS,
        });
    }

    let mut args = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        match parse_bulk_string(&buf[consumed..])? {
            Some((arg, used)) => {
                args.push(arg);
                consumed += used;
            }
            None => return Ok(None),
        }
    }

    Ok(Some((args, consumed)))
}

/// Parses `$<length>\r\n<data>\r\n`.
fn parse_bulk_string(buf: &[u8]) -> ParseResult<Option<(Bytes, usize)>> {
    match buf.first() {
        None => return Ok(None),
        Some(&prefix::BULK_STRING) => {}
        Some(&other) => return Err(ParseError::UnexpectedType(other)),
    }

    let (length, data_start) = match parse_header(buf)? {
        Some(header) => header,
        None => return Ok(None),
    };

    if length < 0 {
        return Err(ParseError::InvalidBulkLength(length));
    }

    let length = length as usize;
    if length > MAX_BULK_SIZE {
        return Err(ParseError::MessageTooLarge {
            size: length,
            max: MAX_BULK_SIZE,
        });
    }

    let total_needed = data_start + length + CRLF.len();
    if buf.len() < total_needed {
        return Ok(None);
    }

    if &buf[data_start + length..total_needed] != CRLF {
        return Err(ParseError::ProtocolError(
            "bulk string missing trailing CRLF".to_string(),
        ));
    }

    let data = Bytes::copy_from_slice(&buf[data_start..data_start + length]);
    Ok(Some((data, total_needed)))
}

/// Parses the integer after a one-byte prefix, up to CRLF.
///
/// Returns the integer and the number of bytes consumed including the CRLF.
fn parse_header(buf: &[u8]) -> ParseResult<Option<(i64, usize)>> {
    let end = match find_crlf(&buf[1..]) {
        Some(pos) => pos,
        None => return Ok(None),
    };

    let text =
        std::str::from_utf8(&buf[1..1 + end]).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
    let n = text
        .parse::<i64>()
        .map_err(|e| ParseError::InvalidInteger(e.to_string()))?;

    Ok(Some((n, 1 + end + CRLF.len())))
}

/// Parses a space-separated inline command terminated by CRLF.
fn parse_inline(buf: &[u8]) -> ParseResult<Option<(Vec<Bytes>, usize)>> {
    let end = match find_crlf(buf) {
        Some(pos) => pos,
        None => return Ok(None),
    };

    let line =
        std::str::from_utf8(&buf[..end]).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

    let args = line
        .split_whitespace()
        .map(|s| Bytes::copy_from_slice(s.as_bytes()))
        .collect();

    Ok(Some((args, end + CRLF.len())))
}

/// Finds the position of CRLF in the buffer.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}
