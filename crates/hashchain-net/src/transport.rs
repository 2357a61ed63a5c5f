//! TCP transport
//!
//! Every connection, inbound or outbound, is driven the same way: it is
//! registered in the [`PeerRegistry`], a writer task drains its outbound
//! queue, and a reader task decodes frames and hands them to a
//! [`FrameHandler`]. When either side fails the peer is removed; there is
//! no reconnection.

use crate::framing::{Frame, FrameCodec, FrameError};
use crate::peer::{Direction, PeerId};
use crate::registry::PeerRegistry;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("Connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Receives decoded frames from every connection.
///
/// Called from the connection tasks; implementations must not block.
pub trait FrameHandler: Send + Sync + 'static {
    /// A connection was registered.
    fn on_connect(&self, _peer: PeerId) {}

    /// A frame arrived from `from`.
    fn on_frame(&self, from: PeerId, frame: Frame);

    /// A connection ended and the peer was removed.
    fn on_disconnect(&self, _peer: PeerId) {}
}

/// Dial a remote node.
pub async fn connect(addr: SocketAddr) -> Result<TcpStream, TransportError> {
    TcpStream::connect(addr)
        .await
        .map_err(|source| TransportError::Connect { addr, source })
}

/// Register `stream` and spawn the task that drives it.
///
/// Reading and writing run side by side in one task. Whichever stops first
/// ends the connection: the writer stops when the peer is removed from the
/// registry or a write fails, the reader on EOF or a framing error. The
/// other half is then dropped, so no frame is dispatched after removal, and
/// [`FrameHandler::on_disconnect`] runs exactly once.
pub fn spawn_connection<H: FrameHandler>(
    stream: TcpStream,
    direction: Direction,
    registry: Arc<PeerRegistry>,
    handler: Arc<H>,
    max_frame_bytes: usize,
) -> Result<PeerId, TransportError> {
    let addr = stream.peer_addr()?;
    stream.set_nodelay(true)?;
    let (reader, writer) = stream.into_split();
    let (peer, rx) = registry.register(addr, direction);

    let conn_registry = registry;
    let conn_handler = handler.clone();
    tokio::spawn(async move {
        let reading = read_loop(
            peer,
            reader,
            FrameCodec::with_max_frame_bytes(max_frame_bytes),
            &conn_registry,
            conn_handler.as_ref(),
        );
        let writing = write_loop(
            peer,
            writer,
            rx,
            FrameCodec::with_max_frame_bytes(max_frame_bytes),
        );
        tokio::select! {
            result = reading => match result {
                Ok(()) => debug!(%peer, "Peer closed connection"),
                Err(e) => warn!(%peer, "Connection error: {}", e),
            },
            result = writing => match result {
                Ok(()) => debug!(%peer, "Outbound queue closed"),
                Err(e) => warn!(%peer, "Write failed: {}", e),
            },
        }
        disconnect(peer, &conn_registry, conn_handler.as_ref());
    });

    handler.on_connect(peer);
    Ok(peer)
}

/// The single teardown path of a connection.
fn disconnect<H: FrameHandler>(peer: PeerId, registry: &PeerRegistry, handler: &H) {
    registry.remove(peer);
    handler.on_disconnect(peer);
}

async fn read_loop<H: FrameHandler>(
    peer: PeerId,
    mut reader: OwnedReadHalf,
    mut codec: FrameCodec,
    registry: &PeerRegistry,
    handler: &H,
) -> Result<(), TransportError> {
    let mut buf = BytesMut::with_capacity(8 * 1024);
    loop {
        loop {
            match codec.decode(&mut buf) {
                Ok(Some(frame)) => {
                    registry.touch(peer);
                    handler.on_frame(peer, frame);
                }
                Ok(None) => break,
                Err(FrameError::UnknownType(t)) => {
                    warn!(%peer, message_type = t, "Ignoring unknown message type");
                }
                Err(e) => return Err(e.into()),
            }
        }

        if reader.read_buf(&mut buf).await? == 0 {
            return Ok(());
        }
    }
}

/// Drain the peer's queue onto the socket. Returns `Ok` once the queue is
/// closed, which happens when the peer is removed from the registry.
async fn write_loop(
    peer: PeerId,
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<Frame>,
    mut codec: FrameCodec,
) -> Result<(), TransportError> {
    let mut buf = BytesMut::new();
    while let Some(frame) = rx.recv().await {
        buf.clear();
        let frame_type = frame.frame_type;
        let size = frame.encoded_len();
        if let Err(e) = codec.encode(frame, &mut buf) {
            warn!(%peer, ?frame_type, size, "Dropping unencodable frame: {}", e);
            continue;
        }
        writer.write_all(&buf).await?;
    }
    writer.shutdown().await?;
    Ok(())
}
