//! snapkv - A Redis-Compatible Key-Value Server
//!
//! This is the main entry point for the snapkv server.
//! It parses arguments, seeds the store from the snapshot and accepts
//! connections until Ctrl+C.

use clap::Parser;
use snapkv::{Config, Server, SnapshotOutcome, DEFAULT_HOST, DEFAULT_PORT};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host to bind to. Defaults to loopback only; pass 0.0.0.0 to accept
    /// connections on every interface, as stock Redis does
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory holding the RDB snapshot
    #[arg(long, default_value = "")]
    dir: String,

    /// RDB snapshot file name inside --dir
    #[arg(long, default_value = "")]
    dbfilename: String,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            host: args.host,
            port: args.port,
            snapshot_dir: args.dir,
            snapshot_file: args.dbfilename,
        }
    }
}

fn init_tracing(level: &str) {
    // Allow RUST_LOG to override the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = Config::from(args);
    info!(version = snapkv::VERSION, "Starting snapkv");

    let (server, outcome) = Server::bootstrap(config);
    match outcome {
        SnapshotOutcome::Loaded { keys } => info!(keys, "Snapshot loaded"),
        SnapshotOutcome::Skipped => info!("Starting with an empty store"),
        SnapshotOutcome::Failed(e) => warn!(error = %e, "Snapshot ignored"),
    }

    let bind_address = server.config().bind_address();
    let listener = TcpListener::bind(&bind_address).await.map_err(|e| {
        error!(address = %bind_address, error = %e, "Failed to bind");
        e
    })?;
    info!("Listening on {}", bind_address);

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    tokio::select! {
        _ = server.serve(listener) => {}
        _ = shutdown => {}
    }

    info!("Server shutdown complete");
    Ok(())
}
