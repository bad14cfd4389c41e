//! Wire-ready activity payloads
//!
//! These serialize directly into the `d` field of a presence update and into
//! the `presence` object of an identify.

use serde::{Deserialize, Serialize};

use super::presence::{ActivityType, OnlineStatus};

/// One activity entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPayload {
    pub name: String,

    #[serde(rename = "type")]
    pub activity_type: ActivityType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<ActivityAssets>,

    /// Button labels; the URLs travel in `metadata.button_urls`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ActivityMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<ActivityTimestamps>,
}

/// Image keys and hover texts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityAssets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_text: Option<String>,
}

impl ActivityAssets {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.large_image.is_none()
            && self.large_text.is_none()
            && self.small_image.is_none()
            && self.small_text.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMetadata {
    pub button_urls: Vec<String>,
}

/// Timer anchor in unix milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTimestamps {
    pub start: i64,
}

/// Payload for op 3 (Presence Update)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdatePayload {
    /// Unix millis since idle; always 0 here
    pub since: u64,
    /// Exactly one entry
    pub activities: Vec<ActivityPayload>,
    pub status: OnlineStatus,
    pub afk: bool,
}

impl PresenceUpdatePayload {
    #[must_use]
    pub fn new(activity: ActivityPayload, status: OnlineStatus) -> Self {
        Self {
            since: 0,
            activities: vec![activity],
            status,
            afk: false,
        }
    }

    /// The single activity carried by this payload
    #[must_use]
    pub fn activity(&self) -> Option<&ActivityPayload> {
        self.activities.first()
    }
}
