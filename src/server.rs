//! Server
//!
//! Owns the shared store and configuration, seeds the store from the
//! snapshot at startup and runs the accept loop.
//!
//! ```text
//!   Config ──> bootstrap ──> Store (maybe seeded from <dir>/<dbfilename>)
//!                               │
//!   TcpListener ──> serve ──────┼──> connection task
//!                               ├──> connection task
//!                               └──> ...
//! ```

use crate::commands::CommandHandler;
use crate::config::Config;
use crate::connection::{handle_connection, ConnectionStats};
use crate::rdb::{self, SnapshotError};
use crate::storage::Store;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// What happened to the snapshot during bootstrap.
#[derive(Debug)]
pub enum SnapshotOutcome {
    /// The snapshot was decoded and seeded this many keys
    Loaded { keys: usize },
    /// No snapshot was configured, or the file does not exist
    Skipped,
    /// The snapshot could not be read or decoded; the store starts empty
    Failed(SnapshotError),
}

/// A configured server, ready to accept connections.
#[derive(Debug, Clone)]
pub struct Server {
    store: Arc<Store>,
    config: Arc<Config>,
    stats: Arc<ConnectionStats>,
}

impl Server {
    /// Creates a server with an empty store.
    pub fn new(config: Config) -> Self {
        Self::with_store(config, Store::new())
    }

    fn with_store(config: Config, store: Store) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            stats: Arc::new(ConnectionStats::new()),
        }
    }

    /// Creates a server, seeding the store from the configured snapshot.
    ///
    /// Never fails: a broken snapshot is logged, reported in the outcome,
    /// and leaves the store empty.
    pub fn bootstrap(config: Config) -> (Self, SnapshotOutcome) {
        let Some(path) = config.snapshot_path() else {
            debug!("No snapshot configured");
            return (Self::new(config), SnapshotOutcome::Skipped);
        };

        match rdb::load(&path) {
            Ok(snapshot) => {
                info!(
                    path = %path.display(),
                    version = snapshot.version,
                    aux_fields = snapshot.aux.len(),
                    "Snapshot decoded"
                );
                let store = Store::from_records(snapshot.into_records());
                let keys = store.len();
                info!(keys, "Store seeded from snapshot");
                (Self::with_store(config, store), SnapshotOutcome::Loaded { keys })
            }
            Err(SnapshotError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Snapshot file not found, starting empty");
                (Self::new(config), SnapshotOutcome::Skipped)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to load snapshot, starting empty");
                (Self::new(config), SnapshotOutcome::Failed(e))
            }
        }
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// The startup configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Connection statistics.
    pub fn stats(&self) -> &Arc<ConnectionStats> {
        &self.stats
    }

    /// Accepts connections forever, one task per client.
    ///
    /// A failed accept is logged and does not stop the loop.
    pub async fn serve(self, listener: TcpListener) {
        let handler = CommandHandler::new(Arc::clone(&self.store), Arc::clone(&self.config));

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!(client = %addr, error = %e, "Failed to set TCP_NODELAY");
                    }
                    let handler = handler.clone();
                    let stats = Arc::clone(&self.stats);

                    tokio::spawn(async move {
                        handle_connection(stream, addr, handler, stats).await;
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
