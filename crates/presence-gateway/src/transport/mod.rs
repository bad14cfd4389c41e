//! Transport abstraction
//!
//! The connection state machine talks to the socket through a pair of
//! channels. A real connection spawns a reader and a writer task around the
//! WebSocket; tests plug the other end of the channels into a scripted
//! gateway.

mod channel;
mod websocket;

pub use channel::{Inbound, Outbound, Transport, TransportPeer};
pub use websocket::WsConnector;

use crate::error::GatewayResult;
use async_trait::async_trait;

/// Opens transports to a gateway URL
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> GatewayResult<Transport>;
}
