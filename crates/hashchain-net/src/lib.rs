//! Networking primitives for hashchain gossip
//!
//! This crate provides:
//! - Length-prefixed message framing
//! - The typed gossip [`Message`] set
//! - Peer identity and the registry of live connections
//! - A TCP connection driver that feeds frames to a [`FrameHandler`]

pub mod framing;
pub mod message;
pub mod peer;
pub mod registry;
pub mod transport;

pub use framing::{Frame, FrameCodec, FrameError, FrameType};
pub use message::Message;
pub use peer::{Direction, PeerId, PeerInfo};
pub use registry::{PeerRegistry, RegistryError};
pub use transport::{FrameHandler, TransportError};
