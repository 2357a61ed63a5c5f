//! hashchaind - replicated hashchain ledger node
//!
//! Listens for peer connections, dials the configured peers and keeps the
//! local ledger converged with the network by gossip.

use clap::Parser;
use hashchaind::config::Config;
use hashchaind::server::Server;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse configuration
    let config = Config::parse();

    // Initialize logging
    let directive = if config.verbose {
        "hashchaind=debug,hashchain_core=debug,hashchain_net=debug"
    } else {
        "hashchaind=info,hashchain_core=info,hashchain_net=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    info!("hashchaind v{}", env!("CARGO_PKG_VERSION"));

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to initialize server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown.shutdown();
    });

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    let stats = server.stats();
    info!(
        chain_length = stats.chain_length,
        peers = stats.peer_count,
        "Stopped"
    );
    ExitCode::SUCCESS
}
