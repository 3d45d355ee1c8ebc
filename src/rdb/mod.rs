//! RDB Snapshot Support
//!
//! This module reads Redis RDB snapshot files so the server can start with a
//! pre-populated keyspace. Decoding is a pure function of the input bytes;
//! nothing here touches the network or the live store.
//!
//! ## Modules
//!
//! - `encoding`: length encodings and string encodings
//! - `decoder`: the opcode stream, records, and [`Snapshot`]
//!
//! ## Example
//!
//! ```
//! use snapkv::rdb::decode;
//! use snapkv::storage::Store;
//!
//! let data = b"REDIS0011\xFE\x00\x00\x03foo\x03bar\xFF";
//! let snapshot = decode(&data[..]).unwrap();
//! let store = Store::from_records(snapshot.into_records());
//!
//! assert_eq!(&store.get(b"foo").unwrap()[..], b"bar");
//! ```

pub mod decoder;
pub mod encoding;

use std::path::Path;

pub use decoder::{decode, Snapshot, SnapshotError, SnapshotRecord, SnapshotResult};

/// Reads and decodes the snapshot file at `path`.
pub fn load(path: impl AsRef<Path>) -> SnapshotResult<Snapshot> {
    let data = std::fs::read(path)?;
    decode(data)
}
