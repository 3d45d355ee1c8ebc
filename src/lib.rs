//! snapkv - A Redis-Compatible Key-Value Server with Snapshot Bootstrap
//!
//! snapkv speaks the Redis RESP protocol, so `redis-cli` and ordinary Redis
//! client libraries can talk to it. It keeps string keys in memory with
//! optional millisecond expiry, and can seed its keyspace from an RDB
//! snapshot file at startup.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            snapkv                                │
//! │                                                                  │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐       ┌────────────┐  │
//! │  │ Client 1 │  │ Client 2 │  │ Client N │       │  dump.rdb  │  │
//! │  └────┬─────┘  └────┬─────┘  └────┬─────┘       └─────┬──────┘  │
//! │       │             │             │                   │         │
//! │       ▼             ▼             ▼                   ▼         │
//! │  ┌────────────────────────────────────────┐   ┌──────────────┐  │
//! │  │  Connection tasks (one per client)     │   │ RDB decoder  │  │
//! │  │  RESP decode ─> CommandHandler ─> reply│   │ (at startup) │  │
//! │  └───────────────────┬────────────────────┘   └──────┬───────┘  │
//! │                      │                               │          │
//! │                      ▼                               ▼          │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │              Store (RwLock<HashMap>, lazy expiry)         │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use snapkv::{Config, Server};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::with_snapshot("/var/lib/redis", "dump.rdb");
//!     let (server, _outcome) = Server::bootstrap(config);
//!
//!     let listener = TcpListener::bind("127.0.0.1:6379").await.unwrap();
//!     server.serve(listener).await;
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `PING`
//! - `ECHO message`
//! - `SET key value [PX milliseconds]`
//! - `GET key`
//! - `KEYS *`
//! - `CONFIG GET dir|dbfilename`
//! - `QUIT`
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP request decoder and reply types
//! - [`storage`]: Thread-safe store with lazy expiry
//! - [`rdb`]: RDB snapshot decoder
//! - [`commands`]: Command validation and dispatch
//! - [`connection`]: Per-client connection loop
//! - [`server`]: Snapshot bootstrap and accept loop
//! - [`config`]: Startup configuration
//!
//! ## Expiry
//!
//! Expiry is lazy. A key whose deadline has passed is removed the next time
//! it is read; `KEYS` skips it. There is no background sweeper, so an expired
//! key that is never read again stays in memory until it is overwritten.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod rdb;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandError, CommandHandler, Response};
pub use config::{Config, DEFAULT_HOST, DEFAULT_PORT};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{ParseError, RespValue};
pub use rdb::{Snapshot, SnapshotError};
pub use server::{Server, SnapshotOutcome};
pub use storage::Store;

/// Version of snapkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
