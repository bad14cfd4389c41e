//! Test helpers for integration tests
//!
//! [`MockGateway`] hands out channel-backed transports and lets a test play
//! the server side of each connection through a [`MockPeer`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use presence_core::{ElapsedStore, PresenceSpec};
use presence_gateway::protocol::{GatewayMessage, OpCode, EVENT_READY, EVENT_RESUMED};
use presence_gateway::{
    Connector, GatewayConnection, GatewayError, GatewayHandle, GatewayOptions, GatewayResult,
    Inbound, Outbound, Transport, TransportPeer,
};
use serde_json::json;
use tokio::sync::mpsc;

/// Resume endpoint announced in READY
pub const RESUME_URL: &str = "wss://resume.test";

/// Heartbeat interval announced in Hello; long enough to stay out of the way
pub const HEARTBEAT_INTERVAL_MS: u64 = 41_250;

#[derive(Default)]
struct Shared {
    urls: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    refusing: AtomicBool,
}

/// Server side of the in-memory gateway
pub struct MockGateway {
    shared: Arc<Shared>,
    peers: mpsc::UnboundedReceiver<MockPeer>,
}

/// Client-side connector handed to `GatewayConnection`
pub struct MockConnector {
    shared: Arc<Shared>,
    peers: mpsc::UnboundedSender<MockPeer>,
}

impl MockGateway {
    #[must_use]
    pub fn pair() -> (Self, MockConnector) {
        let shared = Arc::new(Shared::default());
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                shared: Arc::clone(&shared),
                peers: rx,
            },
            MockConnector { shared, peers: tx },
        )
    }

    /// Refuse every connection attempt while set
    pub fn set_refusing(&self, refusing: bool) {
        self.shared.refusing.store(refusing, Ordering::SeqCst);
    }

    /// Connection attempts so far, refused ones included
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    /// URLs of every connection attempt, in order
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.shared.urls.lock().clone()
    }

    /// Wait for the client's next accepted connection
    pub async fn accept(&mut self) -> MockPeer {
        self.peers.recv().await.expect("connector dropped")
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &str) -> GatewayResult<Transport> {
        self.shared.attempts.fetch_add(1, Ordering::SeqCst);
        self.shared.urls.lock().push(url.to_string());

        if self.shared.refusing.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("connection refused".to_string()));
        }

        let (transport, peer) = Transport::channel();
        self.peers
            .send(MockPeer { peer })
            .map_err(|_| GatewayError::Transport("gateway gone".to_string()))?;
        Ok(transport)
    }
}

/// One accepted connection, seen from the server
pub struct MockPeer {
    peer: TransportPeer,
}

impl MockPeer {
    pub async fn send(&self, message: GatewayMessage) {
        let text = message.to_json().expect("serializable message");
        self.peer
            .inbound
            .send(Inbound::Message(text))
            .await
            .expect("client hung up");
    }

    pub async fn hello(&self) {
        self.send(GatewayMessage::hello(HEARTBEAT_INTERVAL_MS)).await;
    }

    pub async fn ready(&self, session_id: &str, seq: u64) {
        let data = json!({
            "session_id": session_id,
            "resume_gateway_url": RESUME_URL,
            "user": {"id": "80351110224678912", "username": "tester", "discriminator": "0"}
        });
        self.send(GatewayMessage::dispatch(EVENT_READY, seq, data)).await;
    }

    pub async fn resumed(&self, seq: u64) {
        self.send(GatewayMessage::dispatch(EVENT_RESUMED, seq, json!(null)))
            .await;
    }

    pub async fn dispatch(&self, event: &str, seq: u64) {
        self.send(GatewayMessage::dispatch(event, seq, json!({}))).await;
    }

    /// Close from the server side with `code`
    pub async fn close(&self, code: u16, reason: &str) {
        self.peer
            .inbound
            .send(Inbound::Closed {
                code: Some(code),
                reason: reason.to_string(),
            })
            .await
            .expect("client hung up");
    }

    /// Next outbound frame, close frames included
    pub async fn next_outbound(&mut self) -> Outbound {
        self.peer.outbound.recv().await.expect("client hung up")
    }

    /// Next frame with `op`, skipping heartbeats and close frames
    pub async fn expect_op(&mut self, op: OpCode) -> GatewayMessage {
        loop {
            match self.next_outbound().await {
                Outbound::Text(text) => {
                    let message = GatewayMessage::from_json(&text).expect("valid client frame");
                    if message.op == op {
                        return message;
                    }
                    assert_eq!(
                        message.op,
                        OpCode::Heartbeat,
                        "expected {op}, got {}",
                        message.op
                    );
                }
                Outbound::Close { .. } => {}
            }
        }
    }

    /// Wait for the client to close; returns the close code
    pub async fn expect_close(mut self) -> u16 {
        loop {
            if let Outbound::Close { code, .. } = self.next_outbound().await {
                return code;
            }
        }
    }

    /// Wait for the client to drop the connection without a close frame
    pub async fn expect_abort(mut self) {
        while let Some(frame) = self.peer.outbound.recv().await {
            if let Outbound::Close { code, .. } = frame {
                panic!("expected an abort, got close code {code}");
            }
        }
    }

    /// Complete a fresh handshake: Hello, Identify, READY, first presence.
    ///
    /// Returns the identify frame and the first presence update.
    pub async fn establish(&mut self, session_id: &str, seq: u64) -> (GatewayMessage, GatewayMessage) {
        self.hello().await;
        let identify = self.expect_op(OpCode::Identify).await;
        self.ready(session_id, seq).await;
        let presence = self.expect_op(OpCode::PresenceUpdate).await;
        (identify, presence)
    }
}

/// Options with short, deterministic-ish delays for scenarios
#[must_use]
pub fn test_options(max_attempts: u32) -> GatewayOptions {
    GatewayOptions {
        url: "wss://gateway.test/?v=9&encoding=json".to_string(),
        hello_timeout: Duration::from_secs(10),
        handshake_timeout: Duration::from_secs(10),
        reconnect_base_delay: Duration::from_secs(1),
        reconnect_max_delay: Duration::from_secs(5),
        max_reconnect_attempts: max_attempts,
        ..GatewayOptions::default()
    }
}

/// Build a client wired to a fresh mock gateway
pub fn client(
    options: GatewayOptions,
    store: Arc<dyn ElapsedStore>,
) -> (GatewayConnection, GatewayHandle, MockGateway) {
    let (gateway, connector) = MockGateway::pair();
    let (connection, handle) = GatewayConnection::new(Box::new(connector), options, store);
    (connection, handle, gateway)
}

/// Plain spec used by most scenarios
#[must_use]
pub fn game(name: &str) -> PresenceSpec {
    PresenceSpec::new(name)
}
