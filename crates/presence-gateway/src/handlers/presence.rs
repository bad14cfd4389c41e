//! Presence Update frames (op 3)

use chrono::{DateTime, Utc};
use presence_core::{ElapsedRecord, PresenceBuilder, PresenceSpec, PresenceUpdatePayload};

use crate::error::GatewayResult;
use crate::protocol::GatewayMessage;

/// Builds presence payloads and their frames
pub struct PresenceHandler;

impl PresenceHandler {
    /// Build the payload for `spec`, logging every dropped field.
    ///
    /// Returns `None` when the spec cannot be rendered; the caller keeps
    /// whatever presence is already displayed.
    pub fn build(
        spec: &PresenceSpec,
        elapsed: Option<&ElapsedRecord>,
        now: DateTime<Utc>,
    ) -> Option<PresenceUpdatePayload> {
        match PresenceBuilder::build(spec, elapsed, now) {
            Ok(built) => {
                for warning in &built.warnings {
                    tracing::warn!(activity = %spec.name, "Presence field dropped: {warning}");
                }
                Some(built.payload)
            }
            Err(e) => {
                tracing::error!(error = %e, "Presence rejected, keeping previous presence");
                None
            }
        }
    }

    pub fn frame(payload: &PresenceUpdatePayload) -> GatewayResult<String> {
        Ok(GatewayMessage::presence_update(payload)?.to_json()?)
    }
}
