//! hashchaind - replicated hashchain ledger node
//!
//! This daemon provides:
//! - The in-memory ledger shared by all connections
//! - Gossip message handling (tip and full-chain queries, chain announcements)
//! - Longest-valid-chain fork choice on data received from peers
//! - Operations for a front door: read the chain, submit data, manage peers

pub mod config;
pub mod node;
pub mod server;

pub use config::Config;
pub use node::Node;
pub use server::Server;
