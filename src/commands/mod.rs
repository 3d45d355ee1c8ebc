//! Command Dispatch Module
//!
//! Takes decoded requests from the connection loop, validates them and
//! executes them against the store.
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RESP Decoder   │  (protocol module)
//! └────────┬────────┘
//!          │ Vec<Bytes>
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Dispatch     │
//! │  - Validate     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     Store       │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `PING`, `ECHO`, `QUIT`
//! - `SET` (with optional `PX`), `GET`, `KEYS *`
//! - `CONFIG GET dir|dbfilename`

pub mod handler;

pub use handler::{CommandError, CommandHandler, Response};
