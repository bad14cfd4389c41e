//! # presence-gateway
//!
//! Gateway protocol client that keeps a custom presence displayed: connect,
//! identify or resume, heartbeat, push presence, and survive disconnects.

pub mod build_number;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod transport;

pub use connection::{ConnectionPhase, GatewayConnection, GatewayHandle, GatewayOptions};
pub use error::{BuildNumberError, GatewayError, GatewayResult};
pub use transport::{Connector, Inbound, Outbound, Transport, TransportPeer, WsConnector};
