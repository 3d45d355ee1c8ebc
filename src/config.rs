//! Server Configuration
//!
//! Immutable settings fixed at startup. The snapshot location is used twice:
//! once to seed the store at boot, and afterwards to answer `CONFIG GET`.

use std::path::PathBuf;

/// The default port (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host to bind to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Parameter names exposed through `CONFIG GET`.
pub mod param {
    pub const DIR: &str = "dir";
    pub const DBFILENAME: &str = "dbfilename";
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Directory holding the snapshot file
    pub snapshot_dir: String,
    /// Snapshot file name inside `snapshot_dir`
    pub snapshot_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            snapshot_dir: String::new(),
            snapshot_file: String::new(),
        }
    }
}

impl Config {
    /// Creates a default configuration pointing at a snapshot.
    pub fn with_snapshot(dir: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            snapshot_dir: dir.into(),
            snapshot_file: file.into(),
            ..Self::default()
        }
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Full path of the snapshot, or `None` unless both parts are set.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        if self.snapshot_dir.is_empty() || self.snapshot_file.is_empty() {
            return None;
        }
        Some(PathBuf::from(&self.snapshot_dir).join(&self.snapshot_file))
    }

    /// Looks up a `CONFIG GET` parameter, ignoring case.
    ///
    /// Returns the canonical parameter name and its value.
    pub fn get(&self, name: &[u8]) -> Option<(&'static str, &str)> {
        if name.eq_ignore_ascii_case(param::DIR.as_bytes()) {
            Some((param::DIR, &self.snapshot_dir))
        } else if name.eq_ignore_ascii_case(param::DBFILENAME.as_bytes()) {
            Some((param::DBFILENAME, &self.snapshot_file))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "127.0.0.1:6379");
        assert_eq!(config.snapshot_path(), None);
    }

    #[test]
    fn test_snapshot_path_needs_both_parts() {
        assert_eq!(
            Config::with_snapshot("/tmp/redis", "dump.rdb").snapshot_path(),
            Some(PathBuf::from("/tmp/redis/dump.rdb"))
        );
        assert_eq!(Config::with_snapshot("/tmp/redis", "").snapshot_path(), None);
        assert_eq!(Config::with_snapshot("", "dump.rdb").snapshot_path(), None);
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let config = Config::with_snapshot("/data", "dump.rdb");

        assert_eq!(config.get(b"dir"), Some(("dir", "/data")));
        assert_eq!(config.get(b"DIR"), Some(("dir", "/data")));
        assert_eq!(config.get(b"DbFileName"), Some(("dbfilename", "dump.rdb")));
        assert_eq!(config.get(b"port"), None);
    }
}
