//! Connection Handler Module
//!
//! Each client connection is handled by its own async task. A connection
//! carries no session state; it only shares the store and configuration
//! through its [`CommandHandler`](crate::commands::CommandHandler).
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                TCP Listener                  │
//! │                (server.rs)                   │
//! └──────────────────────┬───────────────────────┘
//!                        │ accept(), spawn task
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │             ConnectionHandler                │
//! │                                              │
//! │  Read bytes ─> Decode ─> Execute ─> Reply    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use snapkv::connection::{handle_connection, ConnectionStats};
//! use snapkv::commands::CommandHandler;
//! use snapkv::{Config, Store};
//! use std::sync::Arc;
//!
//! let handler = CommandHandler::new(Arc::new(Store::new()), Arc::new(Config::default()));
//! let stats = Arc::new(ConnectionStats::new());
//!
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, handler.clone(), stats));
//! ```

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
