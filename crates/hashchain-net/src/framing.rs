//! Message framing for network transport
//!
//! Wire format:
//! - 4 bytes: length (big-endian, includes type byte)
//! - 1 byte: message type
//! - N bytes: payload

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Default maximum frame size (16 MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Framing errors
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },
    #[error("Empty frame")]
    Empty,
    #[error("Unknown message type: {0}")]
    UnknownType(u8),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A framed message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Frame type
    pub frame_type: FrameType,
    /// Payload bytes
    pub payload: Vec<u8>,
}

/// Message types on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Ask a peer for its tip
    QueryLatest = 1,
    /// Ask a peer for its whole chain
    QueryAll = 2,
    /// A tip or a whole chain
    ResponseBlockchain = 3,
}

impl TryFrom<u8> for FrameType {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::QueryLatest),
            2 => Ok(Self::QueryAll),
            3 => Ok(Self::ResponseBlockchain),
            _ => Err(FrameError::UnknownType(value)),
        }
    }
}

/// Codec for length-prefixed frames
pub struct FrameCodec {
    max_frame_bytes: usize,
}

impl FrameCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Create codec with a custom frame size limit
    pub fn with_max_frame_bytes(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    /// An unknown type byte yields `UnknownType` only after the whole frame
    /// has been consumed, so the stream stays aligned and the caller may
    /// keep decoding.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        let length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

        if length > self.max_frame_bytes {
            return Err(FrameError::TooLarge {
                size: length,
                max: self.max_frame_bytes,
            });
        }
        if length == 0 {
            return Err(FrameError::Empty);
        }

        if src.len() < 4 + length {
            src.reserve(4 + length - src.len());
            return Ok(None);
        }

        src.advance(4);
        let type_byte = src.get_u8();
        let payload = src.split_to(length - 1).to_vec();

        let frame_type = FrameType::try_from(type_byte)?;
        Ok(Some(Frame { frame_type, payload }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let length = item.encoded_len();
        if length > self.max_frame_bytes {
            return Err(FrameError::TooLarge {
                size: length,
                max: self.max_frame_bytes,
            });
        }

        dst.reserve(4 + length);
        dst.put_u32(length as u32);
        dst.put_u8(item.frame_type as u8);
        dst.put_slice(&item.payload);

        Ok(())
    }
}

impl Frame {
    /// Create a new frame
    pub fn new(frame_type: FrameType, payload: Vec<u8>) -> Self {
        Self { frame_type, payload }
    }

    /// Create a frame with no payload
    pub fn empty(frame_type: FrameType) -> Self {
        Self::new(frame_type, vec![])
    }

    /// Value of the length prefix: type byte plus payload
    pub fn encoded_len(&self) -> usize {
        1 + self.payload.len()
    }
}
