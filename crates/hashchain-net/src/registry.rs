//! Registry of live peer connections
//!
//! Each registered peer owns an unbounded outbound queue drained by its
//! connection's writer task. Sending never waits on the network: a frame is
//! queued or, if the writer has gone away, the peer is dropped.

use crate::framing::Frame;
use crate::peer::{Direction, PeerId, PeerInfo};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Peer not found: {0}")]
    PeerNotFound(PeerId),
    #[error("Connection closed: {0}")]
    ConnectionClosed(PeerId),
}

struct PeerHandle {
    info: PeerInfo,
    tx: mpsc::UnboundedSender<Frame>,
}

/// Set of currently connected peers
pub struct PeerRegistry {
    peers: RwLock<HashMap<PeerId, PeerHandle>>,
    next_id: AtomicU64,
}

impl PeerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new connection. The returned receiver yields every frame
    /// queued for this peer until it is removed.
    pub fn register(
        &self,
        addr: SocketAddr,
        direction: Direction,
    ) -> (PeerId, mpsc::UnboundedReceiver<Frame>) {
        let id = PeerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        let info = PeerInfo::new(id, addr, direction);

        self.peers.write().insert(id, PeerHandle { info, tx });
        info!(peer = %id, %addr, ?direction, "New peer connection");
        (id, rx)
    }

    /// Remove a peer. Dropping its queue stops the writer task.
    pub fn remove(&self, id: PeerId) -> Option<PeerInfo> {
        let removed = self.peers.write().remove(&id).map(|handle| handle.info);
        if let Some(info) = &removed {
            info!(peer = %id, addr = %info.addr, "Peer removed");
        }
        removed
    }

    /// Queue a frame for one peer.
    pub fn send(&self, id: PeerId, frame: Frame) -> Result<(), RegistryError> {
        let result = match self.peers.read().get(&id) {
            Some(handle) => handle.tx.send(frame).map_err(|_| RegistryError::ConnectionClosed(id)),
            None => return Err(RegistryError::PeerNotFound(id)),
        };
        if result.is_err() {
            warn!(peer = %id, "Send failed");
            self.remove(id);
        }
        result
    }

    /// Queue a frame for every peer. Returns how many peers accepted it;
    /// peers whose queue is closed are removed.
    pub fn broadcast(&self, frame: &Frame) -> usize {
        let mut failed = Vec::new();
        let mut delivered = 0;
        {
            let peers = self.peers.read();
            for (id, handle) in peers.iter() {
                match handle.tx.send(frame.clone()) {
                    Ok(()) => delivered += 1,
                    Err(_) => failed.push(*id),
                }
            }
        }

        for id in failed {
            warn!(peer = %id, "Broadcast failed");
            self.remove(id);
        }
        debug!(delivered, frame_type = ?frame.frame_type, "Broadcast");
        delivered
    }

    /// Record activity from a peer
    pub fn touch(&self, id: PeerId) {
        if let Some(handle) = self.peers.write().get_mut(&id) {
            handle.info.touch();
        }
    }

    /// Snapshot of connected peers, ordered by id
    pub fn peers(&self) -> Vec<PeerInfo> {
        let mut peers: Vec<_> = self.peers.read().values().map(|h| h.info.clone()).collect();
        peers.sort_by_key(|p| p.id);
        peers
    }

    /// Is this peer registered?
    pub fn contains(&self, id: PeerId) -> bool {
        self.peers.read().contains_key(&id)
    }

    /// Number of connected peers
    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
