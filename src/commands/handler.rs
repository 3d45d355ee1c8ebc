//! Command Handler Module
//!
//! Validates decoded commands and executes them against the store.
//!
//! ## Supported Commands
//!
//! - `PING` - Test connection
//! - `ECHO message` - Echo message
//! - `SET key value [PX milliseconds]` - Set a key, optionally expiring
//! - `GET key` - Get a key's value
//! - `KEYS *` - List every live key
//! - `CONFIG GET parameter` - Read `dir` or `dbfilename`
//! - `QUIT` - Close the connection
//!
//! ## Failure Handling
//!
//! A command that fails validation returns a [`CommandError`] instead of a
//! reply. The connection loop logs it, sends nothing, and reads the next
//! command. Unknown commands are reported the same way.

use crate::config::Config;
use crate::protocol::RespValue;
use crate::storage::{KeyPattern, Store};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Reasons a command produced no reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The request had no arguments
    #[error("empty command")]
    Empty,

    /// The command name is not recognized
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// The command has the wrong number of arguments
    #[error("wrong number of arguments for '{command}' command ({got} given)")]
    WrongArity { command: &'static str, got: usize },

    /// An option keyword is not recognized
    #[error("syntax error in '{command}' command near '{near}'")]
    Syntax { command: &'static str, near: String },

    /// The SET expiry is not a non-negative integer
    #[error("invalid expire time '{0}'")]
    InvalidExpireTime(String),

    /// KEYS was called with a pattern other than `*`
    #[error("unsupported KEYS pattern '{0}'")]
    UnsupportedPattern(String),

    /// CONFIG was called with a subcommand other than GET
    #[error("unknown CONFIG subcommand '{0}'")]
    UnknownSubcommand(String),

    /// CONFIG GET was called with an unrecognized parameter
    #[error("unknown CONFIG parameter '{0}'")]
    UnknownParameter(String),
}

impl CommandError {
    /// True for requests that are ignored rather than rejected.
    pub fn is_ignored(&self) -> bool {
        matches!(self, CommandError::Empty | CommandError::UnknownCommand(_))
    }
}

/// The outcome of a successfully validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Send the reply and keep reading commands
    Reply(RespValue),
    /// Send the reply, then close the connection
    Close(RespValue),
}

impl Response {
    /// The reply to send.
    pub fn value(&self) -> &RespValue {
        match self {
            Response::Reply(value) | Response::Close(value) => value,
        }
    }

    /// Whether the connection ends after this reply.
    pub fn closes_connection(&self) -> bool {
        matches!(self, Response::Close(_))
    }
}

type CommandResult = Result<Response, CommandError>;

/// Dispatches commands against the shared store and configuration.
///
/// Cheap to clone; every connection gets its own handle.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    /// The shared keyspace
    store: Arc<Store>,
    /// Startup configuration, read by CONFIG GET
    config: Arc<Config>,
}

impl CommandHandler {
    /// Creates a new command handler.
    pub fn new(store: Arc<Store>, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    /// Executes one decoded command.
    ///
    /// # Arguments
    ///
    /// * `args` - The command name followed by its arguments
    pub fn execute(&self, args: &[Bytes]) -> CommandResult {
        let (name, _) = args.split_first().ok_or(CommandError::Empty)?;
        let name = String::from_utf8_lossy(name).to_ascii_uppercase();

        match name.as_str() {
            "QUIT" => self.cmd_quit(args),
            "PING" => self.cmd_ping(args),
            "ECHO" => self.cmd_echo(args),
            "SET" => self.cmd_set(args),
            "GET" => self.cmd_get(args),
            "KEYS" => self.cmd_keys(args),
            "CONFIG" => self.cmd_config(args),
            _ => Err(CommandError::UnknownCommand(name)),
        }
    }

    /// QUIT
    fn cmd_quit(&self, args: &[Bytes]) -> CommandResult {
        expect_arity("QUIT", args, 1)?;
        Ok(Response::Close(RespValue::ok()))
    }

    /// PING
    fn cmd_ping(&self, args: &[Bytes]) -> CommandResult {
        expect_arity("PING", args, 1)?;
        Ok(Response::Reply(RespValue::pong()))
    }

    /// ECHO message
    fn cmd_echo(&self, args: &[Bytes]) -> CommandResult {
        expect_arity("ECHO", args, 2)?;
        Ok(Response::Reply(RespValue::bulk_string(args[1].clone())))
    }

    /// SET key value [PX milliseconds]
    fn cmd_set(&self, args: &[Bytes]) -> CommandResult {
        let ttl = match args.len() {
            3 => Duration::MAX,
            5 => {
                if !args[3].eq_ignore_ascii_case(b"PX") {
                    return Err(CommandError::Syntax {
                        command: "SET",
                        near: lossy(&args[3]),
                    });
                }
                parse_millis(&args[4])?
            }
            got => return Err(CommandError::WrongArity { command: "SET", got }),
        };

        self.store.set(args[1].clone(), args[2].clone(), ttl);
        Ok(Response::Reply(RespValue::ok()))
    }

    /// GET key
    fn cmd_get(&self, args: &[Bytes]) -> CommandResult {
        expect_arity("GET", args, 2)?;

        let reply = match self.store.get(&args[1]) {
            Some(value) => RespValue::bulk_string(value),
            None => RespValue::null(),
        };
        Ok(Response::Reply(reply))
    }

    /// KEYS pattern
    fn cmd_keys(&self, args: &[Bytes]) -> CommandResult {
        expect_arity("KEYS", args, 2)?;

        let pattern = KeyPattern::parse(&args[1])
            .ok_or_else(|| CommandError::UnsupportedPattern(lossy(&args[1])))?;

        let keys = self.store.keys(&pattern);
        if keys.is_empty() {
            return Ok(Response::Reply(RespValue::null()));
        }

        let values = keys.into_iter().map(RespValue::bulk_string).collect();
        Ok(Response::Reply(RespValue::array(values)))
    }

    /// CONFIG GET parameter
    fn cmd_config(&self, args: &[Bytes]) -> CommandResult {
        expect_arity("CONFIG", args, 3)?;

        if !args[1].eq_ignore_ascii_case(b"GET") {
            return Err(CommandError::UnknownSubcommand(lossy(&args[1])));
        }

        let (name, value) = self
            .config
            .get(&args[2])
            .ok_or_else(|| CommandError::UnknownParameter(lossy(&args[2])))?;

        Ok(Response::Reply(RespValue::array(vec![
            RespValue::bulk_string(name),
            RespValue::bulk_string(Bytes::copy_from_slice(value.as_bytes())),
        ])))
    }
}

fn expect_arity(command: &'static str, args: &[Bytes], expected: usize) -> Result<(), CommandError> {
    if args.len() != expected {
        return Err(CommandError::WrongArity {
            command,
            got: args.len(),
        });
    }
    Ok(())
}

fn parse_millis(arg: &[u8]) -> Result<Duration, CommandError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .ok_or_else(|| CommandError::InvalidExpireTime(lossy(arg)))
}

fn lossy(arg: &[u8]) -> String {
    String::from_utf8_lossy(arg).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn create_handler() -> CommandHandler {
        let store = Arc::new(Store::new());
        let config = Arc::new(Config::with_snapshot("/var/lib/snapkv", "dump.rdb"));
        CommandHandler::new(store, config)
    }

    fn make_command(args: &[&str]) -> Vec<Bytes> {
        args.iter().map(|s| Bytes::from(s.to_string())).collect()
    }

    fn reply(handler: &CommandHandler, args: &[&str]) -> RespValue {
        match handler.execute(&make_command(args)) {
            Ok(Response::Reply(value)) => value,
            other => panic!("expected a reply to {:?}, got {:?}", args, other),
        }
    }

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk_string(Bytes::from(s.to_string()))
    }

    #[test]
    fn test_ping() {
        let handler = create_handler();
        assert_eq!(reply(&handler, &["PING"]), RespValue::pong());
        assert_eq!(reply(&handler, &["ping"]), RespValue::pong());
    }

    #[test]
    fn test_ping_with_argument_rejected() {
        let handler = create_handler();
        assert_eq!(
            handler.execute(&make_command(&["PING", "hello"])),
            Err(CommandError::WrongArity {
                command: "PING",
                got: 2
            })
        );
    }

    #[test]
    fn test_echo() {
        let handler = create_handler();
        assert_eq!(reply(&handler, &["ECHO", "hi"]), bulk("hi"));
        assert!(handler.execute(&make_command(&["ECHO"])).is_err());
        assert!(handler.execute(&make_command(&["ECHO", "a", "b"])).is_err());
    }

    #[test]
    fn test_set_get() {
        let handler = create_handler();

        assert_eq!(reply(&handler, &["SET", "key", "value"]), RespValue::ok());
        assert_eq!(reply(&handler, &["GET", "key"]), bulk("value"));
    }

    #[test]
    fn test_get_nonexistent() {
        let handler = create_handler();
        assert_eq!(reply(&handler, &["GET", "nonexistent"]), RespValue::null());
    }

    #[test]
    fn test_set_overwrites() {
        let handler = create_handler();

        reply(&handler, &["SET", "key", "v1", "PX", "1"]);
        reply(&handler, &["SET", "key", "v2"]);
        thread::sleep(Duration::from_millis(10));

        assert_eq!(reply(&handler, &["GET", "key"]), bulk("v2"));
    }

    #[test]
    fn test_set_px_expires() {
        let handler = create_handler();

        assert_eq!(
            reply(&handler, &["SET", "key", "value", "px", "100"]),
            RespValue::ok()
        );
        assert_eq!(reply(&handler, &["GET", "key"]), bulk("value"));

        thread::sleep(Duration::from_millis(150));
        assert_eq!(reply(&handler, &["GET", "key"]), RespValue::null());
    }

    #[test]
    fn test_set_px_zero() {
        let handler = create_handler();

        reply(&handler, &["SET", "key", "value", "PX", "0"]);
        thread::sleep(Duration::from_millis(2));
        assert_eq!(reply(&handler, &["GET", "key"]), RespValue::null());
    }

    #[test]
    fn test_set_validation() {
        let handler = create_handler();

        assert_eq!(
            handler.execute(&make_command(&["SET", "key"])),
            Err(CommandError::WrongArity {
                command: "SET",
                got: 2
            })
        );
        assert_eq!(
            handler.execute(&make_command(&["SET", "key", "value", "PX"])),
            Err(CommandError::WrongArity {
                command: "SET",
                got: 4
            })
        );
        assert_eq!(
            handler.execute(&make_command(&["SET", "key", "value", "EX", "10"])),
            Err(CommandError::Syntax {
                command: "SET",
                near: "EX".to_string()
            })
        );
        assert_eq!(
            handler.execute(&make_command(&["SET", "key", "value", "PX", "soon"])),
            Err(CommandError::InvalidExpireTime("soon".to_string()))
        );
        assert_eq!(
            handler.execute(&make_command(&["SET", "key", "value", "PX", "-5"])),
            Err(CommandError::InvalidExpireTime("-5".to_string()))
        );

        // Nothing was stored by the rejected commands
        assert_eq!(reply(&handler, &["GET", "key"]), RespValue::null());
    }

    #[test]
    fn test_keys() {
        let handler = create_handler();

        assert_eq!(reply(&handler, &["KEYS", "*"]), RespValue::null());

        reply(&handler, &["SET", "a", "1"]);
        reply(&handler, &["SET", "b", "2"]);

        let mut keys = match reply(&handler, &["KEYS", "*"]) {
            RespValue::Array(values) => values,
            other => panic!("expected an array, got {:?}", other),
        };
        keys.sort_by_key(|v| format!("{:?}", v));
        assert_eq!(keys, vec![bulk("a"), bulk("b")]);
    }

    #[test]
    fn test_keys_skips_expired() {
        let handler = create_handler();

        reply(&handler, &["SET", "live", "1"]);
        reply(&handler, &["SET", "dead", "2", "PX", "1"]);
        thread::sleep(Duration::from_millis(10));

        assert_eq!(
            reply(&handler, &["KEYS", "*"]),
            RespValue::array(vec![bulk("live")])
        );
    }

    #[test]
    fn test_keys_unsupported_pattern() {
        let handler = create_handler();
        assert_eq!(
            handler.execute(&make_command(&["KEYS", "user:*"])),
            Err(CommandError::UnsupportedPattern("user:*".to_string()))
        );
    }

    #[test]
    fn test_config_get() {
        let handler = create_handler();

        assert_eq!(
            reply(&handler, &["CONFIG", "GET", "dir"]),
            RespValue::array(vec![bulk("dir"), bulk("/var/lib/snapkv")])
        );
        assert_eq!(
            reply(&handler, &["config", "get", "DBFILENAME"]),
            RespValue::array(vec![bulk("dbfilename"), bulk("dump.rdb")])
        );
    }

    #[test]
    fn test_config_validation() {
        let handler = create_handler();

        assert_eq!(
            handler.execute(&make_command(&["CONFIG", "GET", "maxmemory"])),
            Err(CommandError::UnknownParameter("maxmemory".to_string()))
        );
        assert_eq!(
            handler.execute(&make_command(&["CONFIG", "SET", "dir"])),
            Err(CommandError::UnknownSubcommand("SET".to_string()))
        );
        assert!(handler.execute(&make_command(&["CONFIG", "GET"])).is_err());
    }

    #[test]
    fn test_quit() {
        let handler = create_handler();

        let response = handler.execute(&make_command(&["QUIT"])).unwrap();
        assert!(response.closes_connection());
        assert_eq!(response.value(), &RespValue::ok());
    }

    #[test]
    fn test_unknown_and_empty_commands_ignored() {
        let handler = create_handler();

        let err = handler.execute(&make_command(&["FLUSHALL"])).unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("FLUSHALL".to_string()));
        assert!(err.is_ignored());

        let err = handler.execute(&[]).unwrap_err();
        assert_eq!(err, CommandError::Empty);
        assert!(err.is_ignored());

        let err = handler.execute(&make_command(&["GET"])).unwrap_err();
        assert!(!err.is_ignored());
    }
}
