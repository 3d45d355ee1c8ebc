//! RESP Protocol Implementation
//!
//! The wire codec between clients and the command dispatcher. It has no
//! business logic: requests come in as an ordered list of byte-string
//! arguments, replies go out as typed [`RespValue`]s.
//!
//! ## Modules
//!
//! - `parser`: decodes multi-bulk and inline commands
//! - `types`: defines the `RespValue` reply enum and its serialization
//!
//! ## Example
//!
//! ```
//! use snapkv::protocol::{parse_command, RespValue};
//! use bytes::Bytes;
//!
//! // Decoding a request
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (args, consumed) = parse_command(data).unwrap().unwrap();
//! assert_eq!(args.len(), 2);
//! assert_eq!(consumed, data.len());
//!
//! // Encoding a reply
//! let reply = RespValue::bulk_string(Bytes::from("Ariz"));
//! assert_eq!(reply.serialize(), b"$4\r\nAriz\r\n");
//! ```

pub mod parser;
pub mod types;

pub use parser::{parse_command, ParseError, ParseResult};
pub use types::RespValue;
