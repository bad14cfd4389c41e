//! Presence specification - what the user wants displayed

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Application identifier value shipped in the sample configuration.
///
/// Treated the same as an absent identifier.
pub const PLACEHOLDER_APPLICATION_ID: &str = "YOUR_APPLICATION_ID";

/// Activity type shown as the status prefix ("Playing X", "Listening to X", ...)
///
/// Type 4 (custom status) cannot be set through the gateway and is not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ActivityType {
    #[default]
    Playing = 0,
    Streaming = 1,
    Listening = 2,
    Watching = 3,
    Competing = 5,
}

impl ActivityType {
    /// Create an `ActivityType` from its wire value
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Playing),
            1 => Some(Self::Streaming),
            2 => Some(Self::Listening),
            3 => Some(Self::Watching),
            5 => Some(Self::Competing),
            _ => None,
        }
    }

    /// Get the wire value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Playing => "Playing",
            Self::Streaming => "Streaming",
            Self::Listening => "Listening",
            Self::Watching => "Watching",
            Self::Competing => "Competing",
        }
    }
}

impl Serialize for ActivityType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for ActivityType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid activity type: {value}")))
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}

/// Target online status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    #[default]
    Online,
    Idle,
    Dnd,
    /// Appears offline; the rich presence stays visible to friends
    Invisible,
}

impl OnlineStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::Dnd => "dnd",
            Self::Invisible => "invisible",
        }
    }
}

impl fmt::Display for OnlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnlineStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "idle" => Ok(Self::Idle),
            "dnd" => Ok(Self::Dnd),
            "invisible" => Ok(Self::Invisible),
            _ => Err(format!("Invalid status: {s}")),
        }
    }
}

/// How the elapsed timer is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElapsedMode {
    /// Real running time, carried across reconnects and restarts
    #[default]
    Auto,
    /// Fixed duration taken from `custom_elapsed_minutes`
    Custom,
    /// No timer
    None,
}

impl ElapsedMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Custom => "custom",
            Self::None => "none",
        }
    }
}

impl fmt::Display for ElapsedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElapsedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "custom" => Ok(Self::Custom),
            "none" => Ok(Self::None),
            _ => Err(format!("Invalid start time mode: {s}")),
        }
    }
}

/// Clickable button under the activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub url: String,
}

impl Button {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Snapshot of the presence the user wants displayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceSpec {
    /// Activity name ("Playing <name>")
    pub name: String,
    pub activity_type: ActivityType,
    /// Needed for details, state, images and buttons
    pub application_id: Option<String>,
    pub details: Option<String>,
    pub state: Option<String>,
    pub large_image_key: Option<String>,
    pub large_image_text: Option<String>,
    pub small_image_key: Option<String>,
    pub small_image_text: Option<String>,
    pub buttons: Vec<Button>,
    pub elapsed_mode: ElapsedMode,
    /// Only used in `ElapsedMode::Custom`
    pub custom_elapsed_minutes: u64,
    pub status: OnlineStatus,
}

impl PresenceSpec {
    /// Create a spec with only an activity name; everything else defaulted
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activity_type: ActivityType::default(),
            application_id: None,
            details: None,
            state: None,
            large_image_key: None,
            large_image_text: None,
            small_image_key: None,
            small_image_text: None,
            buttons: Vec::new(),
            elapsed_mode: ElapsedMode::default(),
            custom_elapsed_minutes: 0,
            status: OnlineStatus::default(),
        }
    }

    #[must_use]
    pub fn with_application_id(mut self, id: impl Into<String>) -> Self {
        self.application_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    #[must_use]
    pub fn with_button(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.buttons.push(Button::new(label, url));
        self
    }

    #[must_use]
    pub fn with_elapsed_mode(mut self, mode: ElapsedMode) -> Self {
        self.elapsed_mode = mode;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: OnlineStatus) -> Self {
        self.status = status;
        self
    }

    /// Application identifier usable for rich fields, if any.
    ///
    /// Blank values and the sample placeholder count as absent.
    #[must_use]
    pub fn effective_application_id(&self) -> Option<&str> {
        self.application_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != PLACEHOLDER_APPLICATION_ID)
    }
}
