//! Peer identity and information

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Local handle for one live connection. Assigned by the registry and
/// never reused within a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub u64);

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Who opened the connection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The remote node dialed us
    Inbound,
    /// We dialed the remote node
    Outbound,
}

/// Information about a connected peer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeerInfo {
    /// Peer identifier
    pub id: PeerId,
    /// Remote socket address
    pub addr: SocketAddr,
    /// Who opened the connection
    pub direction: Direction,
    /// Connection time (unix millis)
    pub connected_at: i64,
    /// Last frame received (unix millis)
    pub last_seen: i64,
}

impl PeerInfo {
    /// Create new peer info
    pub fn new(id: PeerId, addr: SocketAddr, direction: Direction) -> Self {
        let now = hashchain_core::now_millis();
        Self {
            id,
            addr,
            direction,
            connected_at: now,
            last_seen: now,
        }
    }

    /// Update last seen time
    pub fn touch(&mut self) {
        self.last_seen = hashchain_core::now_millis();
    }

    /// `host:port` form used when listing peers
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }
}
