//! Configuration for hashchaind

use clap::Parser;
use hashchain_net::framing::DEFAULT_MAX_FRAME_SIZE;
use std::net::SocketAddr;

/// hashchaind - replicated hashchain ledger node
#[derive(Parser, Debug, Clone)]
#[command(name = "hashchaind")]
#[command(about = "Replicated hashchain ledger node")]
pub struct Config {
    /// Listen address for peer connections
    #[arg(short, long, env = "HASHCHAIN_LISTEN", default_value = "0.0.0.0:6001")]
    pub listen: SocketAddr,

    /// Peers to dial at start-up (comma-separated addresses)
    #[arg(long, env = "HASHCHAIN_PEERS", value_delimiter = ',')]
    pub peers: Vec<SocketAddr>,

    /// Ask every new peer for its tip as soon as it connects
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub query_on_connect: bool,

    /// Largest accepted frame in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_bytes: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log format (json or pretty)
    #[arg(long, default_value = "pretty")]
    pub log_format: String,
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_frame_bytes == 0 {
            anyhow::bail!("max-frame-bytes must be greater than zero");
        }
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            anyhow::bail!("Unknown log format: {}", self.log_format);
        }
        Ok(())
    }

    /// Node settings derived from this configuration
    pub fn node_options(&self) -> NodeOptions {
        NodeOptions {
            query_on_connect: self.query_on_connect,
            max_frame_bytes: self.max_frame_bytes,
        }
    }
}

/// Settings consumed by [`crate::node::Node`]
#[derive(Debug, Clone, Copy)]
pub struct NodeOptions {
    pub query_on_connect: bool,
    pub max_frame_bytes: usize,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            query_on_connect: true,
            max_frame_bytes: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}
