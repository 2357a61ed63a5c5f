//! Multi-node convergence over real TCP connections on loopback.

use bytes::BytesMut;
use clap::Parser;
use hashchain_core::{Entry, SubmitOutcome};
use hashchain_net::{Frame, FrameCodec, FrameType, Message};
use hashchaind::{Config, Server};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio_util::codec::{Decoder, Encoder};

struct TestNode {
    server: Arc<Server>,
    addr: SocketAddr,
}

impl TestNode {
    async fn start(peers: &[SocketAddr]) -> Self {
        let mut args = vec!["hashchaind".to_string(), "--listen".into(), "127.0.0.1:0".into()];
        if !peers.is_empty() {
            let list: Vec<String> = peers.iter().map(|p| p.to_string()).collect();
            args.push("--peers".into());
            args.push(list.join(","));
        }
        let config = Config::parse_from(args);
        let server = Arc::new(Server::bind(config).await.unwrap());
        let addr = server.local_addr().unwrap();

        let running = server.clone();
        tokio::spawn(async move { running.run().await });

        Self { server, addr }
    }

    fn chain(&self) -> Vec<Entry> {
        self.server.node().get_chain()
    }

    fn submit(&self, data: &str) -> Entry {
        match self.server.node().submit_entry(data) {
            SubmitOutcome::Applied(entry) => entry,
            SubmitOutcome::Rejected(reason) => panic!("submit rejected: {reason}"),
        }
    }

    fn peer_count(&self) -> usize {
        self.server.node().list_peers().len()
    }
}

async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn test_joining_node_fetches_longer_chain() {
    let a = TestNode::start(&[]).await;
    a.submit("one");
    a.submit("two");
    a.submit("three");

    let b = TestNode::start(&[a.addr]).await;

    wait_until("b to adopt a's chain", || b.chain() == a.chain()).await;
    assert_eq!(b.chain().len(), 4);
    assert_eq!(b.chain()[3].data, "three");
}

#[tokio::test]
async fn test_new_entries_propagate_across_hops() {
    let a = TestNode::start(&[]).await;
    let b = TestNode::start(&[a.addr]).await;
    let c = TestNode::start(&[b.addr]).await;

    wait_until("a to see b", || a.peer_count() == 1).await;
    wait_until("b to see two peers", || b.peer_count() == 2).await;
    wait_until("c to see b", || c.peer_count() == 1).await;

    let entry = a.submit("hello");
    wait_until("c to receive the entry", || c.chain().len() == 2).await;
    assert_eq!(c.chain()[1], entry);
    assert_eq!(b.chain(), a.chain());

    let entry = c.submit("back");
    wait_until("a to receive the reply", || a.chain().len() == 3).await;
    assert_eq!(a.chain()[2], entry);
}

#[tokio::test]
async fn test_divergent_nodes_converge_on_longest_chain() {
    let a = TestNode::start(&[]).await;
    a.submit("a-1");
    a.submit("a-2");

    let b = TestNode::start(&[]).await;
    for i in 1..=4 {
        b.submit(&format!("b-{i}"));
    }
    let winner = b.chain();

    a.server.node().connect_peer(b.addr).await.unwrap();

    wait_until("a to adopt b's chain", || a.chain() == winner).await;
    assert_eq!(b.chain(), winner);
}

#[tokio::test]
async fn test_wire_protocol_with_raw_client() {
    let node = TestNode::start(&[]).await;
    node.submit("payload");

    let mut stream = TcpStream::connect(node.addr).await.unwrap();
    let mut codec = FrameCodec::new();

    let mut out = BytesMut::new();
    codec
        .encode(Message::QueryAll.to_frame().unwrap(), &mut out)
        .unwrap();
    stream.write_all(&out).await.unwrap();

    // The node first asks us for our tip, then answers our query.
    let mut buf = BytesMut::new();
    let mut chain = None;
    while chain.is_none() {
        while let Some(frame) = codec.decode(&mut buf).unwrap() {
            if let Message::ResponseBlockchain(entries) = Message::from_frame(&frame).unwrap() {
                chain = Some(entries);
            }
        }
        if chain.is_none() {
            let n = tokio::time::timeout(Duration::from_secs(5), stream.read_buf(&mut buf))
                .await
                .unwrap()
                .unwrap();
            assert_ne!(n, 0, "node closed the connection");
        }
    }

    assert_eq!(chain.unwrap(), node.chain());
}

#[tokio::test]
async fn test_malformed_chain_from_peer_is_ignored() {
    let node = TestNode::start(&[]).await;
    let mut stream = TcpStream::connect(node.addr).await.unwrap();
    wait_until("raw client to register", || node.peer_count() == 1).await;

    let mut codec = FrameCodec::new();
    let mut out = BytesMut::new();
    codec
        .encode(Frame::new(FrameType::ResponseBlockchain, b"[{]".to_vec()), &mut out)
        .unwrap();
    let forged = Entry::new(1, "bogus", 0, "forged");
    codec
        .encode(
            Message::ResponseBlockchain(vec![Entry::genesis(), forged]).to_frame().unwrap(),
            &mut out,
        )
        .unwrap();
    stream.write_all(&out).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(node.chain(), vec![Entry::genesis()]);
    assert_eq!(node.peer_count(), 1);
}

#[tokio::test]
async fn test_disconnected_peer_is_removed() {
    let node = TestNode::start(&[]).await;
    let stream = TcpStream::connect(node.addr).await.unwrap();
    wait_until("peer to register", || node.peer_count() == 1).await;

    drop(stream);
    wait_until("peer to be removed", || node.peer_count() == 0).await;
}

#[tokio::test]
async fn test_unreachable_bootstrap_peer_is_skipped() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let node = TestNode::start(&[dead]).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(node.peer_count(), 0);
    assert_eq!(node.submit("still works").index, 1);
}

/// A listener that never accepts, with its backlog full so further dials
/// hang. Returns the listener and the connections holding the backlog.
async fn stalled_listener() -> (TcpListener, Vec<TcpStream>) {
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(0).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut held = Vec::new();
    for _ in 0..16 {
        match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => held.push(stream),
            Ok(Err(e)) => panic!("dial to stalled listener failed: {e}"),
            Err(_) => return (listener, held),
        }
    }
    panic!("backlog of stalled listener never filled");
}

#[tokio::test]
async fn test_hanging_bootstrap_peer_does_not_block_accept() {
    let (stalled, _held) = stalled_listener().await;
    let node = TestNode::start(&[stalled.local_addr().unwrap()]).await;

    let _client = TcpStream::connect(node.addr).await.unwrap();
    wait_until("inbound client to register", || node.peer_count() == 1).await;
    assert_eq!(node.server.node().list_peers()[0].direction, hashchain_net::Direction::Inbound);
}
