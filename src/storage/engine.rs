//! Thread-Safe Store with Lazy Expiry
//!
//! This module implements the keyspace shared by every client connection.
//! Each key maps to an [`Entry`] holding the value and an absolute expiry
//! timestamp in Unix milliseconds.
//!
//! ## Design Decisions
//!
//! 1. **One RwLock**: Every mutation is serialized; readers share the lock.
//! 2. **Absolute expiry**: Every entry has an expiry instant. Keys that never
//!    expire use [`NEVER_EXPIRES`], so a lookup is a single comparison.
//! 3. **Lazy expiry only**: Expired entries are removed when a `get` observes
//!    them or when a `set` overwrites them. There is no background sweep, so
//!    expired keys that are never read again stay in memory.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │                  Store                    │
//! │   RwLock<HashMap<Bytes, Entry>>           │
//! │                                           │
//! │   set ─────────────── write lock          │
//! │   get (live) ──────── read lock           │
//! │   get (expired) ───── write lock + remove │
//! │   keys ────────────── read lock           │
//! └───────────────────────────────────────────┘
//! ```

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::rdb::SnapshotRecord;

/// Expiry timestamp for keys that never expire.
pub const NEVER_EXPIRES: u64 = u64::MAX;

/// Returns the current wall-clock time in Unix milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Adds a TTL to a timestamp, saturating at [`NEVER_EXPIRES`].
fn deadline(now: u64, ttl: Duration) -> u64 {
    let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    now.saturating_add(ttl_ms)
}

/// A stored value and the instant it stops being visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The value returned to clients
    pub value: Bytes,
    /// Absolute expiry in Unix milliseconds
    pub expires_at: u64,
}

impl Entry {
    /// Creates an entry that expires `ttl` from now.
    pub fn with_ttl(value: Bytes, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: deadline(now_millis(), ttl),
        }
    }

    /// Creates an entry with an absolute expiry.
    pub fn expiring_at(value: Bytes, expires_at: u64) -> Self {
        Self { value, expires_at }
    }

    /// Checks whether this entry is expired at `now`.
    #[inline]
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

impl From<SnapshotRecord> for Entry {
    fn from(record: SnapshotRecord) -> Self {
        Entry::expiring_at(record.value, record.expires_at.unwrap_or(NEVER_EXPIRES))
    }
}

/// Patterns accepted by [`Store::keys`].
///
/// Only the match-everything pattern `*` is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPattern {
    /// `*`
    All,
}

impl KeyPattern {
    /// Parses a client-supplied pattern, returning `None` if unsupported.
    pub fn parse(pattern: &[u8]) -> Option<Self> {
        match pattern {
            b"*" => Some(KeyPattern::All),
            _ => None,
        }
    }

    fn matches(&self, _key: &[u8]) -> bool {
        match self {
            KeyPattern::All => true,
        }
    }
}

/// The keyspace shared by every connection.
///
/// Wrap it in an `Arc` to share it across connection tasks. The backing map
/// is never exposed; callers only see [`set`](Store::set),
/// [`get`](Store::get) and [`keys`](Store::keys).
///
/// # Example
///
/// ```
/// use snapkv::storage::Store;
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// let store = Store::new();
///
/// store.set(Bytes::from("name"), Bytes::from("Ariz"), Duration::MAX);
/// assert_eq!(store.get(b"name"), Some(Bytes::from("Ariz")));
///
/// store.set(Bytes::from("session"), Bytes::from("abc123"), Duration::from_secs(60));
/// ```
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<HashMap<Bytes, Entry>>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded from decoded snapshot records.
    ///
    /// Records without an expiry never expire. Records whose expiry is already
    /// in the past are loaded as-is and become invisible to reads.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = SnapshotRecord>,
    {
        let data = records
            .into_iter()
            .map(|record| (record.key.clone(), Entry::from(record)))
            .collect();

        Self {
            data: RwLock::new(data),
        }
    }

    // A panic while holding the lock cannot leave the map half-written
    // (every mutation is a single insert or remove), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Bytes, Entry>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Bytes, Entry>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or overwrites `key`, expiring `ttl` from now.
    ///
    /// `Duration::MAX` stores the key with [`NEVER_EXPIRES`].
    pub fn set(&self, key: Bytes, value: Bytes, ttl: Duration) {
        let entry = Entry::with_ttl(value, ttl);
        self.write().insert(key, entry);
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired. An expired
    /// entry is removed as a side effect.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        // Fast path: live or missing keys only need the read lock
        {
            let data = self.read();
            match data.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired_at(now_millis()) => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        let mut data = self.write();
        let now = now_millis();
        let expired = data.get(key).map(|entry| entry.is_expired_at(now));
        match expired {
            Some(true) => {
                data.remove(key);
                None
            }
            // Another writer replaced the key between the two locks
            Some(false) => data.get(key).map(|entry| entry.value.clone()),
            None => None,
        }
    }

    /// Returns every live key matching `pattern`, in no particular order.
    ///
    /// Expired entries are skipped but not removed.
    pub fn keys(&self, pattern: &KeyPattern) -> Vec<Bytes> {
        let now = now_millis();
        self.read()
            .iter()
            .filter(|(key, entry)| !entry.is_expired_at(now) && pattern.matches(key))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
