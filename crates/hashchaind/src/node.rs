//! Ledger node: gossip protocol handler and front-door operations
//!
//! A [`Node`] owns the ledger and the peer registry. Peer frames arrive
//! through [`FrameHandler`]; local callers use [`Node::submit_entry`],
//! [`Node::get_chain`], [`Node::list_peers`] and [`Node::connect_peer`].
//!
//! The ledger lock is held for the whole validate-then-mutate step of every
//! mutation and released before anything is sent to peers.

use crate::config::NodeOptions;
use hashchain_core::{
    now_millis, on_local_submit, on_received_chain, ChainOutcome, Entry, Ledger, SubmitOutcome,
};
use hashchain_net::transport::{self, FrameHandler, TransportError};
use hashchain_net::{Direction, Frame, FrameError, Message, PeerId, PeerInfo, PeerRegistry};
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Node errors
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// A ledger replica and its peer connections
pub struct Node {
    ledger: RwLock<Ledger>,
    registry: Arc<PeerRegistry>,
    options: NodeOptions,
}

impl Node {
    /// Create a node holding only the genesis entry
    pub fn new(options: NodeOptions) -> Arc<Self> {
        Arc::new(Self {
            ledger: RwLock::new(Ledger::new()),
            registry: Arc::new(PeerRegistry::new()),
            options,
        })
    }

    /// Snapshot of the whole chain
    pub fn get_chain(&self) -> Vec<Entry> {
        self.ledger.read().entries()
    }

    /// Current tip
    pub fn latest(&self) -> Entry {
        self.ledger.read().latest().clone()
    }

    /// Number of entries, genesis included
    pub fn chain_len(&self) -> usize {
        self.ledger.read().len()
    }

    /// Append `data` as a new entry and announce it to all peers.
    pub fn submit_entry(&self, data: impl Into<String>) -> SubmitOutcome {
        let outcome = {
            let mut ledger = self.ledger.write();
            on_local_submit(&mut ledger, data, now_millis())
        };
        if let SubmitOutcome::Applied(entry) = &outcome {
            self.broadcast(&Message::ResponseBlockchain(vec![entry.clone()]));
        }
        outcome
    }

    /// Connected peers
    pub fn list_peers(&self) -> Vec<PeerInfo> {
        self.registry.peers()
    }

    /// The registry of live connections
    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    /// Dial a peer and register the connection.
    pub async fn connect_peer(self: &Arc<Self>, addr: SocketAddr) -> Result<PeerId, NodeError> {
        let stream = transport::connect(addr).await?;
        let peer = self.attach(stream, Direction::Outbound)?;
        info!(%peer, %addr, "Connected to peer");
        Ok(peer)
    }

    /// Register a connection accepted by the listener.
    pub fn accept(self: &Arc<Self>, stream: TcpStream) -> Result<PeerId, NodeError> {
        self.attach(stream, Direction::Inbound)
    }

    fn attach(self: &Arc<Self>, stream: TcpStream, direction: Direction) -> Result<PeerId, NodeError> {
        let peer = transport::spawn_connection(
            stream,
            direction,
            self.registry.clone(),
            self.clone(),
            self.options.max_frame_bytes,
        )?;
        Ok(peer)
    }

    /// Dispatch one gossip message from `from`. Returns the fork-choice
    /// outcome when the message carried a chain.
    pub fn handle_message(&self, from: PeerId, message: Message) -> Option<ChainOutcome> {
        match message {
            Message::QueryLatest => {
                debug!(peer = %from, "Tip requested");
                self.send(from, &self.response_latest());
                None
            }
            Message::QueryAll => {
                debug!(peer = %from, "Chain requested");
                self.send(from, &self.response_chain());
                None
            }
            Message::ResponseBlockchain(entries) => {
                info!(peer = %from, entries = entries.len(), "Received chain");
                Some(self.receive_chain(entries))
            }
        }
    }

    /// Run fork choice on a received chain and gossip whatever follows.
    pub fn receive_chain(&self, entries: Vec<Entry>) -> ChainOutcome {
        let (outcome, announce) = {
            let mut ledger = self.ledger.write();
            let outcome = on_received_chain(&mut ledger, entries);
            let announce = match &outcome {
                ChainOutcome::Appended(entry) => Some(entry.clone()),
                ChainOutcome::Replaced { .. } => Some(ledger.latest().clone()),
                _ => None,
            };
            (outcome, announce)
        };

        if let Some(entry) = announce {
            self.broadcast(&Message::ResponseBlockchain(vec![entry]));
        } else if outcome == ChainOutcome::RequestFullChain {
            self.broadcast(&Message::QueryAll);
        }
        outcome
    }

    fn response_latest(&self) -> Message {
        Message::ResponseBlockchain(vec![self.latest()])
    }

    fn response_chain(&self) -> Message {
        Message::ResponseBlockchain(self.get_chain())
    }

    /// Encode `message`, refusing anything over the configured frame limit.
    fn encode(&self, message: &Message) -> Result<Frame, FrameError> {
        let frame = message.to_frame()?;
        let size = frame.encoded_len();
        if size > self.options.max_frame_bytes {
            return Err(FrameError::TooLarge {
                size,
                max: self.options.max_frame_bytes,
            });
        }
        Ok(frame)
    }

    fn send(&self, to: PeerId, message: &Message) {
        let frame = match self.encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(peer = %to, entries = entry_count(message), "Reply not sent: {}", e);
                return;
            }
        };
        if let Err(e) = self.registry.send(to, frame) {
            warn!(peer = %to, "Reply not sent: {}", e);
        }
    }

    fn broadcast(&self, message: &Message) {
        match self.encode(message) {
            Ok(frame) => {
                self.registry.broadcast(&frame);
            }
            Err(e) => warn!(entries = entry_count(message), "Broadcast not sent: {}", e),
        }
    }
}

fn entry_count(message: &Message) -> usize {
    match message {
        Message::ResponseBlockchain(entries) => entries.len(),
        Message::QueryLatest | Message::QueryAll => 0,
    }
}

impl FrameHandler for Node {
    fn on_connect(&self, peer: PeerId) {
        if self.options.query_on_connect {
            self.send(peer, &Message::QueryLatest);
        }
    }

    fn on_frame(&self, from: PeerId, frame: Frame) {
        match Message::from_frame(&frame) {
            Ok(message) => {
                self.handle_message(from, message);
            }
            Err(e) => warn!(peer = %from, "Dropping malformed message: {}", e),
        }
    }

    fn on_disconnect(&self, peer: PeerId) {
        info!(%peer, "Peer disconnected");
    }
}
