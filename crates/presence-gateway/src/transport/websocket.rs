//! WebSocket transport
//!
//! Splits the socket into a reader task (inflating zlib-stream frames) and
//! a writer task fed by the outbound queue, so a slow write never blocks
//! processing of inbound frames.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::channel::{Inbound, Outbound, Transport};
use super::Connector;
use crate::error::{GatewayError, GatewayResult};
use crate::protocol::ZlibStreamDecoder;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to the real gateway over `ws://` or `wss://`
#[derive(Debug, Clone)]
pub struct WsConnector {
    handshake_timeout: Duration,
}

impl WsConnector {
    #[must_use]
    pub fn new(handshake_timeout: Duration) -> Self {
        Self { handshake_timeout }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> GatewayResult<Transport> {
        let (ws, _response) = tokio::time::timeout(self.handshake_timeout, connect_async(url))
            .await
            .map_err(|_| GatewayError::Timeout("websocket handshake"))??;

        let (sink, stream) = ws.split();
        let (transport, peer) = Transport::channel();

        let reader = tokio::spawn(read_loop(stream, peer.inbound));
        let writer = tokio::spawn(write_loop(sink, peer.outbound));

        tracing::debug!(url = %url, "WebSocket connected");
        Ok(transport.with_tasks(vec![reader, writer]))
    }
}

async fn read_loop(mut stream: SplitStream<WsStream>, tx: mpsc::Sender<Inbound>) {
    let mut decoder = ZlibStreamDecoder::new();

    while let Some(message) = stream.next().await {
        let event = match message {
            Ok(Message::Text(text)) => Inbound::Message(text),
            Ok(Message::Binary(bytes)) => match decoder.push(&bytes) {
                Ok(Some(text)) => Inbound::Message(text),
                Ok(None) => continue,
                Err(e) => Inbound::Malformed(e.to_string()),
            },
            Ok(Message::Close(frame)) => {
                let (code, reason) = frame.map_or((None, String::new()), |f| {
                    (Some(u16::from(f.code)), f.reason.into_owned())
                });
                let _ = tx.send(Inbound::Closed { code, reason }).await;
                return;
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
            Err(e) => {
                let _ = tx.send(Inbound::Failed(e.to_string())).await;
                return;
            }
        };

        if tx.send(event).await.is_err() {
            return;
        }
    }

    let _ = tx
        .send(Inbound::Closed {
            code: None,
            reason: "stream ended".to_string(),
        })
        .await;
}

async fn write_loop(mut sink: SplitSink<WsStream, Message>, mut rx: mpsc::Receiver<Outbound>) {
    while let Some(frame) = rx.recv().await {
        match frame {
            Outbound::Text(text) => {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::warn!(error = %e, "Failed to write frame");
                    break;
                }
            }
            Outbound::Close { code, reason } => {
                let frame = CloseFrame {
                    code: code.into(),
                    reason: reason.into(),
                };
                if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                    tracing::debug!(error = %e, "Failed to write close frame");
                }
                break;
            }
        }
    }

    // Signals `Transport::close` that the queue is drained
    drop(rx);
    let _ = sink.close().await;
}
