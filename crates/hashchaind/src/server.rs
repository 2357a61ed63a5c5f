//! hashchaind server - main service loop

use crate::config::Config;
use crate::node::Node;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Bind failed on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Server state
pub struct Server {
    config: Config,
    node: Arc<Node>,
    listener: TcpListener,
    /// Shutdown signal
    shutdown_tx: broadcast::Sender<()>,
}

/// Cloneable handle that stops a running [`Server`]
#[derive(Clone)]
pub struct ShutdownHandle(broadcast::Sender<()>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.0.send(());
    }
}

impl Server {
    /// Bind the listener and create a fresh node
    pub async fn bind(config: Config) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.listen)
            .await
            .map_err(|source| ServerError::BindFailed {
                addr: config.listen,
                source,
            })?;
        let node = Node::new(config.node_options());
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            node,
            listener,
            shutdown_tx,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// The node served by this server
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Handle for stopping the accept loop from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(self.shutdown_tx.clone())
    }

    /// Start dialing the configured peers and accept connections until shutdown
    pub async fn run(&self) -> Result<(), ServerError> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        info!("Listening on {}", self.local_addr()?);

        self.connect_bootstrap_peers();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            debug!("Accepted connection from {}", addr);
                            if let Err(e) = self.node.accept(stream) {
                                warn!("Failed to register {}: {}", addr, e);
                            }
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutting down...");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Dial every configured peer in its own task; the accept loop does not
    /// wait for any of them.
    fn connect_bootstrap_peers(&self) {
        for &addr in &self.config.peers {
            info!("Bootstrap peer: {}", addr);
            let node = self.node.clone();
            tokio::spawn(async move {
                if let Err(e) = node.connect_peer(addr).await {
                    warn!("Failed connection to peer {}: {}", addr, e);
                }
            });
        }
    }

    /// Get server statistics
    pub fn stats(&self) -> ServerStats {
        let latest = self.node.latest();
        ServerStats {
            chain_length: self.node.chain_len(),
            latest_index: latest.index,
            latest_hash: latest.hash,
            peer_count: self.node.registry().len(),
        }
    }
}

/// Server statistics
#[derive(Debug, Clone)]
pub struct ServerStats {
    pub chain_length: usize,
    pub latest_index: u64,
    pub latest_hash: String,
    pub peer_count: usize,
}
