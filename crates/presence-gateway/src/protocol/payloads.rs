//! Payload definitions
//!
//! Payloads the client sends (identify, resume) and the server payloads it
//! reads (hello, ready).

use presence_core::PresenceUpdatePayload;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    /// Default heartbeat interval (41.25 seconds)
    pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 41_250;

    /// Create a Hello payload with a custom interval
    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }
}

impl Default for HelloPayload {
    fn default() -> Self {
        Self::with_interval(Self::DEFAULT_HEARTBEAT_INTERVAL)
    }
}

/// Payload for op 2 (Identify)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// User token
    pub token: String,

    /// Gateway capability bitmask
    pub capabilities: u64,

    pub properties: IdentifyProperties,

    /// Presence to show as soon as the session is ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<PresenceUpdatePayload>,

    /// Payload compression; transport compression is negotiated in the URL
    pub compress: bool,

    pub client_state: ClientState,
}

/// Client connection properties, mirroring the desktop client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
    pub system_locale: String,
    pub browser_user_agent: String,
    pub browser_version: String,
    pub os_version: String,
    pub referrer: String,
    pub referring_domain: String,
    pub referrer_current: String,
    pub referring_domain_current: String,
    pub release_channel: String,
    pub client_build_number: u64,
    /// Always sent, as null
    pub client_event_source: Option<String>,
    pub design_id: u32,
}

impl IdentifyProperties {
    /// Desktop client properties
    #[must_use]
    pub fn desktop(client_build_number: u64) -> Self {
        Self {
            os: "Windows".to_string(),
            browser: "Discord Client".to_string(),
            device: String::new(),
            system_locale: "en-US".to_string(),
            browser_user_agent: String::new(),
            browser_version: String::new(),
            os_version: String::new(),
            referrer: String::new(),
            referring_domain: String::new(),
            referrer_current: String::new(),
            referring_domain_current: String::new(),
            release_channel: "stable".to_string(),
            client_build_number,
            client_event_source: None,
            design_id: 0,
        }
    }

    /// Set system locale
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.system_locale = locale.into();
        self
    }

    /// Set user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.browser_user_agent = user_agent.into();
        self
    }

    /// Set browser (Electron) version
    #[must_use]
    pub fn with_browser_version(mut self, version: impl Into<String>) -> Self {
        self.browser_version = version.into();
        self
    }

    /// Set OS version
    #[must_use]
    pub fn with_os_version(mut self, version: impl Into<String>) -> Self {
        self.os_version = version.into();
        self
    }
}

/// Cache versions the client claims to hold; a fresh client holds nothing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientState {
    pub guild_versions: Map<String, Value>,
    pub highest_last_message_id: String,
    pub read_state_version: i64,
    pub user_guild_settings_version: i64,
    pub user_settings_version: i64,
    pub private_channels_version: String,
    pub api_code_version: i64,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            guild_versions: Map::new(),
            highest_last_message_id: "0".to_string(),
            read_state_version: 0,
            user_guild_settings_version: -1,
            user_settings_version: -1,
            private_channels_version: "0".to_string(),
            api_code_version: 0,
        }
    }
}

/// Payload for op 6 (Resume)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePayload {
    /// User token
    pub token: String,

    /// Session ID to resume
    pub session_id: String,

    /// Last received sequence number
    pub seq: u64,
}

/// Data of the READY dispatch, reduced to what the client keeps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,

    #[serde(default)]
    pub resume_gateway_url: Option<String>,

    #[serde(default)]
    pub user: Option<ReadyUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
}

impl ReadyUser {
    /// `username`, or `username#1234` for accounts that still carry a tag
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.discriminator.as_deref() {
            None | Some("" | "0") => self.username.clone(),
            Some(tag) => format!("{}#{tag}", self.username),
        }
    }
}
