//! Op code handlers
//!
//! Classifies inbound server frames and builds the outbound handshake and
//! presence frames. The connection state machine decides what to do with
//! them.

mod handshake;
mod presence;

pub use handshake::HandshakeHandler;
pub use presence::PresenceHandler;

use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{
    GatewayMessage, HelloPayload, OpCode, ReadyPayload, EVENT_READY, EVENT_RESUMED,
};

/// A server frame, decoded for the state machine
#[derive(Debug, Clone)]
pub enum ServerEvent {
    Hello(HelloPayload),
    Ready { sequence: Option<u64>, ready: ReadyPayload },
    Resumed { sequence: Option<u64> },
    /// Any other dispatch; only its sequence number matters
    Dispatch { sequence: Option<u64>, event: Option<String> },
    /// Server asks for an immediate heartbeat
    HeartbeatRequest,
    HeartbeatAck,
    Reconnect,
    InvalidSession { resumable: bool },
}

/// Route incoming server messages to typed events
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Classify a raw text frame
    pub fn dispatch(text: &str) -> GatewayResult<ServerEvent> {
        let message = GatewayMessage::from_json(text)
            .map_err(|e| GatewayError::Protocol(format!("Undecodable frame: {e}")))?;
        Self::classify(message)
    }

    pub fn classify(message: GatewayMessage) -> GatewayResult<ServerEvent> {
        match message.op {
            OpCode::Hello => message
                .as_hello()
                .map(ServerEvent::Hello)
                .ok_or_else(|| GatewayError::Protocol("Invalid Hello payload".to_string())),
            OpCode::Dispatch => match message.t.as_deref() {
                Some(EVENT_READY) => {
                    let ready = message.as_ready().ok_or_else(|| {
                        GatewayError::Protocol("Invalid READY payload".to_string())
                    })?;
                    Ok(ServerEvent::Ready {
                        sequence: message.s,
                        ready,
                    })
                }
                Some(EVENT_RESUMED) => Ok(ServerEvent::Resumed {
                    sequence: message.s,
                }),
                _ => Ok(ServerEvent::Dispatch {
                    sequence: message.s,
                    event: message.t,
                }),
            },
            OpCode::Heartbeat => Ok(ServerEvent::HeartbeatRequest),
            OpCode::HeartbeatAck => Ok(ServerEvent::HeartbeatAck),
            OpCode::Reconnect => Ok(ServerEvent::Reconnect),
            OpCode::InvalidSession => Ok(ServerEvent::InvalidSession {
                resumable: message.as_invalid_session().unwrap_or(false),
            }),
            // Identify, Resume and PresenceUpdate only flow client to server
            op => Err(GatewayError::Protocol(format!(
                "Unexpected op code from server: {op}"
            ))),
        }
    }
}
