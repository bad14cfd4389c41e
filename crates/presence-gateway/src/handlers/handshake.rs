//! Handshake frames (op 2 Identify, op 6 Resume)

use presence_core::PresenceUpdatePayload;

use crate::connection::ClientIdentity;
use crate::error::GatewayResult;
use crate::protocol::{ClientState, GatewayMessage, IdentifyPayload, ResumePayload};

/// Builds identify and resume frames
pub struct HandshakeHandler;

impl HandshakeHandler {
    /// Identify frame for a fresh session, carrying the initial presence
    pub fn identify(
        token: String,
        identity: &ClientIdentity,
        presence: Option<PresenceUpdatePayload>,
    ) -> GatewayResult<String> {
        let payload = IdentifyPayload {
            token,
            capabilities: identity.capabilities,
            properties: identity.properties(),
            presence,
            compress: false,
            client_state: ClientState::default(),
        };

        Ok(GatewayMessage::identify(&payload)?.to_json()?)
    }

    /// Resume frame for an existing session
    pub fn resume(token: String, session_id: &str, seq: u64) -> GatewayResult<String> {
        let payload = ResumePayload {
            token,
            session_id: session_id.to_string(),
            seq,
        };

        Ok(GatewayMessage::resume(&payload)?.to_json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::OpCode;
    use presence_core::{PresenceBuilder, PresenceSpec};

    #[test]
    fn test_identify_frame() {
        let identity = ClientIdentity::default();
        let presence = PresenceBuilder::build(&PresenceSpec::new("Game"), None, chrono::Utc::now())
            .unwrap()
            .payload;

        let frame = HandshakeHandler::identify("secret".to_string(), &identity, Some(presence))
            .unwrap();
        let message = GatewayMessage::from_json(&frame).unwrap();
        assert_eq!(message.op, OpCode::Identify);

        let identify = message.as_identify().unwrap();
        assert_eq!(identify.token, "secret");
        assert_eq!(identify.capabilities, identity.capabilities);
        assert!(!identify.compress);
        assert_eq!(identify.properties.client_build_number, identity.build_number);
        assert_eq!(
            identify.presence.and_then(|p| p.activity().map(|a| a.name.clone())),
            Some("Game".to_string())
        );
    }

    #[test]
    fn test_resume_frame() {
        let frame = HandshakeHandler::resume("secret".to_string(), "session-1", 17).unwrap();
        let message = GatewayMessage::from_json(&frame).unwrap();
        assert_eq!(message.op, OpCode::Resume);

        let resume = message.as_resume().unwrap();
        assert_eq!(resume.token, "secret");
        assert_eq!(resume.session_id, "session-1");
        assert_eq!(resume.seq, 17);
    }
}
