//! Gossip messages
//!
//! The three message kinds map one-to-one onto frame types. Only
//! `ResponseBlockchain` carries a payload: a JSON array of entries.

use crate::framing::{Frame, FrameError, FrameType};
use hashchain_core::Entry;

/// A decoded gossip message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Request the peer's tip
    QueryLatest,
    /// Request the peer's whole chain
    QueryAll,
    /// A tip (one entry) or a whole chain
    ResponseBlockchain(Vec<Entry>),
}

impl Message {
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::QueryLatest => FrameType::QueryLatest,
            Self::QueryAll => FrameType::QueryAll,
            Self::ResponseBlockchain(_) => FrameType::ResponseBlockchain,
        }
    }

    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            Self::QueryLatest | Self::QueryAll => Ok(Frame::empty(self.frame_type())),
            Self::ResponseBlockchain(entries) => {
                let payload = serde_json::to_vec(entries)?;
                Ok(Frame::new(FrameType::ResponseBlockchain, payload))
            }
        }
    }

    /// Decode a frame. Payloads on query frames are ignored.
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.frame_type {
            FrameType::QueryLatest => Ok(Self::QueryLatest),
            FrameType::QueryAll => Ok(Self::QueryAll),
            FrameType::ResponseBlockchain => {
                let entries = serde_json::from_slice(&frame.payload)?;
                Ok(Self::ResponseBlockchain(entries))
            }
        }
    }
}
