//! Domain entities
//!
//! The presence model as supplied by configuration, the persisted elapsed
//! record, and the wire-ready activity payloads derived from them.

mod activity;
mod elapsed;
mod presence;

pub use activity::{
    ActivityAssets, ActivityMetadata, ActivityPayload, ActivityTimestamps, PresenceUpdatePayload,
};
pub use elapsed::ElapsedRecord;
pub use presence::{
    ActivityType, Button, ElapsedMode, OnlineStatus, PresenceSpec, PLACEHOLDER_APPLICATION_ID,
};
