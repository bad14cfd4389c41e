//! Channel-backed transport handle

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{GatewayError, GatewayResult};

/// Channel buffer size for frames in either direction
pub const FRAME_BUFFER_SIZE: usize = 100;

/// Maximum time a send may wait on a full outbound queue
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Time the writer gets to flush the close frame before it is aborted
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Frames travelling from the client to the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close { code: u16, reason: String },
}

/// Events travelling from the socket to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete (already inflated) JSON message
    Message(String),
    /// Bytes that could not be decoded
    Malformed(String),
    /// The peer closed the connection
    Closed { code: Option<u16>, reason: String },
    /// The socket failed
    Failed(String),
}

/// Client side of a connection
pub struct Transport {
    outbound: mpsc::Sender<Outbound>,
    inbound: mpsc::Receiver<Inbound>,
    tasks: Vec<JoinHandle<()>>,
}

/// Socket side of a connection
pub struct TransportPeer {
    pub inbound: mpsc::Sender<Inbound>,
    pub outbound: mpsc::Receiver<Outbound>,
}

impl Transport {
    /// Create a connected transport/peer pair
    #[must_use]
    pub fn channel() -> (Self, TransportPeer) {
        let (out_tx, out_rx) = mpsc::channel(FRAME_BUFFER_SIZE);
        let (in_tx, in_rx) = mpsc::channel(FRAME_BUFFER_SIZE);
        (
            Self {
                outbound: out_tx,
                inbound: in_rx,
                tasks: Vec::new(),
            },
            TransportPeer {
                inbound: in_tx,
                outbound: out_rx,
            },
        )
    }

    /// Tie background I/O tasks to this handle; they are aborted with it
    #[must_use]
    pub fn with_tasks(mut self, tasks: Vec<JoinHandle<()>>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Queue a text frame
    ///
    /// # Errors
    /// Fails if the writer is gone or the queue stays full past the send timeout
    pub async fn send(&self, text: String) -> GatewayResult<()> {
        match tokio::time::timeout(SEND_TIMEOUT, self.outbound.send(Outbound::Text(text))).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(GatewayError::Transport("writer closed".to_string())),
            Err(_) => Err(GatewayError::Timeout("outbound queue")),
        }
    }

    /// Next inbound event; `None` once the reader is gone
    pub async fn recv(&mut self) -> Option<Inbound> {
        self.inbound.recv().await
    }

    /// Send a close frame, give the writer a moment to flush it, then tear down
    pub async fn close(mut self, code: u16, reason: &str) {
        let close = Outbound::Close {
            code,
            reason: reason.to_string(),
        };
        if self.outbound.try_send(close).is_err() {
            tracing::debug!(code, "Close frame not queued; aborting transport");
            return;
        }

        let tasks = std::mem::take(&mut self.tasks);
        // The writer drops its receiver once the close frame is flushed
        if tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, self.outbound.closed())
            .await
            .is_err()
        {
            tracing::debug!(code, "Close frame not flushed in time");
        }
        for task in tasks {
            task.abort();
        }
    }

    /// Drop the connection without a close handshake
    pub fn abort(self) {
        drop(self);
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (mut transport, mut peer) = Transport::channel();

        transport.send("hello".to_string()).await.unwrap();
        assert_eq!(
            peer.outbound.recv().await,
            Some(Outbound::Text("hello".to_string()))
        );

        peer.inbound
            .send(Inbound::Message("world".to_string()))
            .await
            .unwrap();
        assert_eq!(
            transport.recv().await,
            Some(Inbound::Message("world".to_string()))
        );
    }

    #[tokio::test]
    async fn test_send_fails_when_peer_gone() {
        let (transport, peer) = Transport::channel();
        drop(peer);
        assert!(matches!(
            transport.send("x".to_string()).await,
            Err(GatewayError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_close_queues_close_frame() {
        let (transport, mut peer) = Transport::channel();

        let closer = tokio::spawn(transport.close(4000, "reconnect"));
        assert_eq!(
            peer.outbound.recv().await,
            Some(Outbound::Close {
                code: 4000,
                reason: "reconnect".to_string()
            })
        );
        drop(peer);
        closer.await.unwrap();
    }
}
