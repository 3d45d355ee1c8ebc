//! RDB Snapshot Decoder
//!
//! Turns the bytes of an RDB file into a [`Snapshot`]: the format version,
//! the auxiliary metadata fields, and every string key with its optional
//! absolute expiry.
//!
//! ## File Layout
//!
//! ```text
//! "REDIS"  "0011"  ( opcode ... )*  [0xFF checksum]
//! ```
//!
//! | Opcode | Name      | Payload                                         |
//! |--------|-----------|-------------------------------------------------|
//! | `0xFA` | AUX       | string key, string value                        |
//! | `0xFB` | RESIZEDB  | two lengths (hash table size hints)             |
//! | `0xFC` | EXPIREMS  | i64 LE Unix milliseconds for the next key       |
//! | `0xFD` | EXPIRE    | u32 LE Unix seconds for the next key            |
//! | `0xFE` | SELECTDB  | one length (database index)                     |
//! | `0xFF` | EOF       | end of data                                     |
//! | other  | value tag | string key, then a value of that type           |
//!
//! Only value type `0` (plain string) is supported.

use crate::rdb::encoding::Reader;
use bytes::Bytes;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, trace};

/// The magic literal at the start of every RDB file.
pub const MAGIC: &[u8; 5] = b"REDIS";

/// Opcodes of the RDB stream.
pub mod opcode {
    pub const AUX: u8 = 0xFA;
    pub const RESIZE_DB: u8 = 0xFB;
    pub const EXPIRE_MS: u8 = 0xFC;
    pub const EXPIRE: u8 = 0xFD;
    pub const SELECT_DB: u8 = 0xFE;
    pub const EOF: u8 = 0xFF;
}

/// Value type tags introducing a key-value record.
pub mod value_type {
    pub const STRING: u8 = 0;
}

/// Errors that can occur while reading a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot file could not be read
    #[error("cannot read snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with `REDIS`
    #[error("invalid magic: {0:?}")]
    InvalidMagic(Bytes),

    /// The input ended in the middle of a field
    #[error("unexpected end of snapshot at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: usize, needed: usize },

    /// A record uses a value type other than string
    #[error("unsupported value type: {0:#04x}")]
    UnsupportedValueType(u8),

    /// A string uses the compressed encoding
    #[error("compressed strings are not supported")]
    UnsupportedCompression,

    /// A string uses an unknown special encoding
    #[error("invalid string encoding: {0}")]
    InvalidStringEncoding(u8),

    /// A special string encoding appeared where a plain length was expected
    #[error("special encoding {selector} where a length was expected at offset {offset}")]
    UnexpectedSpecialEncoding { offset: usize, selector: u8 },
}

/// Result type for snapshot decoding.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// One key-value pair read from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub key: Bytes,
    pub value: Bytes,
    /// Absolute expiry in Unix milliseconds, if the key had one
    pub expires_at: Option<u64>,
}

impl SnapshotRecord {
    pub fn has_expiry(&self) -> bool {
        self.expires_at.is_some()
    }
}

/// The decoded contents of a snapshot file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Format version from the header (0 if the digits did not parse)
    pub version: u32,
    /// AUX metadata fields in file order
    pub aux: Vec<(Bytes, Bytes)>,
    /// Records keyed by name; a later duplicate replaces an earlier one
    pub records: HashMap<Bytes, SnapshotRecord>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by key.
    pub fn get(&self, key: &[u8]) -> Option<&SnapshotRecord> {
        self.records.get(key)
    }

    /// Consumes the snapshot, yielding its records.
    pub fn into_records(self) -> impl Iterator<Item = SnapshotRecord> {
        self.records.into_values()
    }
}

/// Decodes a complete snapshot.
///
/// Decoding stops at the EOF opcode (trailing checksum bytes are ignored) or
/// when the input ends exactly at an opcode boundary.
///
/// # Example
///
/// ```
/// use snapkv::rdb::decode;
///
/// let data = b"REDIS0011\xFE\x00\x00\x03foo\x03bar\xFF";
/// let snapshot = decode(&data[..]).unwrap();
///
/// assert_eq!(snapshot.version, 11);
/// assert_eq!(&snapshot.get(b"foo").unwrap().value[..], b"bar");
/// ```
pub fn decode(data: impl Into<Bytes>) -> SnapshotResult<Snapshot> {
    let mut reader = Reader::new(data.into());

    let magic = reader.read_bytes(MAGIC.len())?;
    if !magic.eq_ignore_ascii_case(&MAGIC[..]) {
        return Err(SnapshotError::InvalidMagic(magic));
    }

    let version_digits = reader.read_bytes(4)?;
    let version = std::str::from_utf8(&version_digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    debug!(version, "Decoding snapshot");

    let mut snapshot = Snapshot {
        version,
        ..Snapshot::default()
    };
    let mut pending_expiry: Option<u64> = None;

    while !reader.is_empty() {
        let op = reader.read_u8()?;

        match op {
            opcode::AUX => {
                let key = reader.read_string()?;
                let value = reader.read_string()?;
                trace!(key = ?key, value = ?value, "Snapshot aux field");
                snapshot.aux.push((key, value));
            }
            opcode::RESIZE_DB => {
                let db_size = reader.read_plain_length()?;
                let expires_size = reader.read_plain_length()?;
                trace!(db_size, expires_size, "Snapshot resize hint");
            }
            opcode::EXPIRE_MS => {
                // Timestamps before the epoch are already in the past
                let millis = reader.read_i64_le()?;
                pending_expiry = Some(u64::try_from(millis).unwrap_or(0));
            }
            opcode::EXPIRE => {
                let seconds = reader.read_u32_le()?;
                pending_expiry = Some(u64::from(seconds) * 1000);
            }
            opcode::SELECT_DB => {
                let db = reader.read_plain_length()?;
                trace!(db, "Snapshot database selector");
            }
            opcode::EOF => break,
            tag => {
                let record = read_record(&mut reader, tag, pending_expiry.take())?;
                snapshot.records.insert(record.key.clone(), record);
            }
        }
    }

    debug!(
        keys = snapshot.records.len(),
        aux = snapshot.aux.len(),
        "Snapshot decoded"
    );
    Ok(snapshot)
}

/// Reads the key and value following a value-type tag.
fn read_record(
    reader: &mut Reader,
    tag: u8,
    expires_at: Option<u64>,
) -> SnapshotResult<SnapshotRecord> {
    let key = reader.read_string()?;
    let value = match tag {
        value_type::STRING => reader.read_string()?,
        other => return Err(SnapshotError::UnsupportedValueType(other)),
    };

    Ok(SnapshotRecord {
        key,
        value,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds snapshot bytes for tests.
    struct Builder {
        buf: Vec<u8>,
    }

    impl Builder {
        fn new() -> Self {
            Self {
                buf: b"REDIS0011".to_vec(),
            }
        }

        fn string(mut self, s: &str) -> Self {
            assert!(s.len() < 64);
            self.buf.push(s.len() as u8);
            self.buf.extend_from_slice(s.as_bytes());
            self
        }

        fn raw(mut self, bytes: &[u8]) -> Self {
            self.buf.extend_from_slice(bytes);
            self
        }

        fn aux(self, key: &str, value: &str) -> Self {
            self.raw(&[opcode::AUX]).string(key).string(value)
        }

        fn select_db(self, db: u8) -> Self {
            self.raw(&[opcode::SELECT_DB, db])
        }

        fn resize_db(self, size: u8, expires: u8) -> Self {
            self.raw(&[opcode::RESIZE_DB, size, expires])
        }

        fn expire_ms(self, at: i64) -> Self {
            self.raw(&[opcode::EXPIRE_MS]).raw(&at.to_le_bytes())
        }

        fn expire_secs(self, at: u32) -> Self {
            self.raw(&[opcode::EXPIRE]).raw(&at.to_le_bytes())
        }

        fn entry(self, key: &str, value: &str) -> Self {
            self.raw(&[value_type::STRING]).string(key).string(value)
        }

        fn eof(self) -> Vec<u8> {
            self.raw(&[opcode::EOF]).raw(&[0u8; 8]).buf
        }
    }

    #[test]
    fn test_decode_single_key() {
        let data = Builder::new()
            .aux("redis-ver", "7.2.0")
            .select_db(0)
            .resize_db(1, 0)
            .entry("foo", "bar")
            .eof();

        let snapshot = decode(data).unwrap();
        assert_eq!(snapshot.version, 11);
        assert_eq!(snapshot.len(), 1);

        let record = snapshot.get(b"foo").unwrap();
        assert_eq!(record.value, Bytes::from("bar"));
        assert!(!record.has_expiry());
        assert_eq!(
            snapshot.aux,
            vec![(Bytes::from("redis-ver"), Bytes::from("7.2.0"))]
        );
    }

    #[test]
    fn test_expiry_applies_to_next_key_only() {
        let data = Builder::new()
            .select_db(0)
            .resize_db(3, 1)
            .entry("plain", "1")
            .expire_ms(1_713_824_559_637)
            .entry("expiring", "2")
            .entry("after", "3")
            .eof();

        let snapshot = decode(data).unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.get(b"plain").unwrap().expires_at, None);
        assert_eq!(
            snapshot.get(b"expiring").unwrap().expires_at,
            Some(1_713_824_559_637)
        );
        assert_eq!(snapshot.get(b"after").unwrap().expires_at, None);
    }

    #[test]
    fn test_pre_epoch_expiry_clamped_to_zero() {
        let data = Builder::new()
            .expire_ms(-1000)
            .entry("ancient", "value")
            .eof();

        let snapshot = decode(data).unwrap();
        assert_eq!(snapshot.get(b"ancient").unwrap().expires_at, Some(0));

        let store = crate::storage::Store::from_records(snapshot.into_records());
        assert_eq!(store.get(b"ancient"), None);
    }

    #[test]
    fn test_expire_seconds_converted_to_millis() {
        let data = Builder::new()
            .expire_secs(1_700_000_000)
            .entry("key", "value")
            .eof();

        let snapshot = decode(data).unwrap();
        assert_eq!(
            snapshot.get(b"key").unwrap().expires_at,
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn test_lowercase_magic_accepted() {
        let mut data = Builder::new().entry("k", "v").eof();
        data[..5].copy_from_slice(b"redis");

        assert_eq!(decode(data).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_magic() {
        let result = decode(&b"RDB00011\xFF"[..]);
        assert!(matches!(result, Err(SnapshotError::InvalidMagic(_))));
    }

    #[test]
    fn test_non_numeric_version_recorded_as_zero() {
        let data = b"REDISabcd\xFF".to_vec();
        assert_eq!(decode(data).unwrap().version, 0);
    }

    #[test]
    fn test_missing_eof_is_clean_end() {
        let data = Builder::new().entry("k", "v").buf;
        assert_eq!(decode(data).unwrap().len(), 1);
    }

    #[test]
    fn test_truncated_record() {
        let mut data = Builder::new().entry("key", "value").buf;
        data.truncate(data.len() - 2);

        let result = decode(data);
        assert!(matches!(result, Err(SnapshotError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_truncated_header() {
        let result = decode(&b"REDIS00"[..]);
        assert!(matches!(result, Err(SnapshotError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_unsupported_value_type() {
        // Type 1 is a list
        let data = Builder::new().raw(&[0x01]).string("list").eof();
        let result = decode(data);
        assert!(matches!(result, Err(SnapshotError::UnsupportedValueType(1))));
    }

    #[test]
    fn test_compressed_value_rejected() {
        let data = Builder::new()
            .raw(&[value_type::STRING])
            .string("key")
            .raw(&[0xC3, 0x01, 0x01, b'a'])
            .eof();

        let result = decode(data);
        assert!(matches!(result, Err(SnapshotError::UnsupportedCompression)));
    }

    #[test]
    fn test_integer_encoded_value() {
        let data = Builder::new()
            .raw(&[value_type::STRING])
            .string("counter")
            .raw(&[0xC1, 0x39, 0x30])
            .eof();

        let snapshot = decode(data).unwrap();
        assert_eq!(snapshot.get(b"counter").unwrap().value, Bytes::from("12345"));
    }

    #[test]
    fn test_integer_encoded_key() {
        let data = Builder::new()
            .raw(&[value_type::STRING, 0xC0, 0x2A])
            .string("answer")
            .eof();

        let snapshot = decode(data).unwrap();
        assert_eq!(snapshot.get(b"42").unwrap().value, Bytes::from("answer"));
    }

    #[test]
    fn test_trailing_bytes_after_eof_ignored() {
        let mut data = Builder::new().entry("k", "v").eof();
        data.extend_from_slice(b"garbage");

        assert_eq!(decode(data).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let data = Builder::new().entry("k", "old").entry("k", "new").eof();

        let snapshot = decode(data).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(b"k").unwrap().value, Bytes::from("new"));
    }
}
