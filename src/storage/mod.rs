//! Storage Module
//!
//! This module provides the keyspace shared by all client connections:
//! a thread-safe map from key to value with per-key absolute expiry.
//!
//! ## Features
//!
//! - **RwLock**: Multiple concurrent readers, one exclusive writer
//! - **TTL Support**: Every key carries an absolute expiry timestamp
//! - **Lazy Expiry**: Expired keys are removed when a read observes them
//! - **Snapshot Seeding**: A store can be built directly from RDB records
//!
//! ## Example
//!
//! ```
//! use snapkv::storage::{KeyPattern, Store};
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let store = Store::new();
//! store.set(Bytes::from("name"), Bytes::from("Ariz"), Duration::MAX);
//!
//! assert_eq!(store.get(b"name"), Some(Bytes::from("Ariz")));
//! assert_eq!(store.keys(&KeyPattern::All), vec![Bytes::from("name")]);
//! ```

pub mod engine;

pub use engine::{now_millis, Entry, KeyPattern, Store, NEVER_EXPIRES};
