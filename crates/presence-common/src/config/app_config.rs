//! Application configuration structs
//!
//! Loads configuration from a YAML file layered with `PRESENCE_*`
//! environment overrides (nested keys separated by `__`, e.g.
//! `PRESENCE_GATEWAY__URL`).

use presence_core::{ActivityType, Button, ElapsedMode, OnlineStatus, PresenceSpec};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Token value shipped in the sample configuration
pub const PLACEHOLDER_TOKEN: &str = "YOUR_TOKEN";

/// Default gateway endpoint (JSON encoding, zlib-stream transport compression)
pub const DEFAULT_GATEWAY_URL: &str =
    "wss://gateway.discord.gg/?v=9&encoding=json&compress=zlib-stream";

/// Desktop client user agent sent in identify properties
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) discord/1.0.9163 \
     Chrome/124.0.6367.243 Electron/30.2.0 Safari/537.36";

/// Lower bound for the config reload interval
pub const MIN_RELOAD_INTERVAL_SECS: u64 = 15;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct AppConfig {
    /// User token; never logged
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Presence content as written in the file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PresenceConfig {
    #[serde(default = "default_game_name")]
    pub game_name: String,
    /// 0 playing, 1 streaming, 2 listening, 3 watching, 5 competing
    #[serde(default)]
    pub activity_type: u8,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub large_image_key: String,
    #[serde(default)]
    pub large_image_text: String,
    #[serde(default)]
    pub small_image_key: String,
    #[serde(default)]
    pub small_image_text: String,
    #[serde(default)]
    pub buttons: Vec<ButtonConfig>,
    /// auto, custom or none
    #[serde(default = "default_start_time_mode")]
    pub start_time_mode: String,
    #[serde(default)]
    pub custom_elapsed_minutes: u64,
    /// online, idle, dnd or invisible
    #[serde(default = "default_status")]
    pub status: String,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            game_name: default_game_name(),
            activity_type: 0,
            details: String::new(),
            state: String::new(),
            application_id: String::new(),
            large_image_key: String::new(),
            large_image_text: String::new(),
            small_image_key: String::new(),
            small_image_text: String::new(),
            buttons: Vec::new(),
            start_time_mode: default_start_time_mode(),
            custom_elapsed_minutes: 0,
            status: default_status(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ButtonConfig {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
}

/// Gateway endpoint and client identity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub url: String,
    #[serde(default = "default_hello_timeout")]
    pub hello_timeout_secs: u64,
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,
    /// Fixed client build number; discovered at startup when unset
    #[serde(default)]
    pub build_number: Option<u64>,
    #[serde(default = "default_capabilities")]
    pub capabilities: u64,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_browser_version")]
    pub browser_version: String,
    #[serde(default = "default_os_version")]
    pub os_version: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            hello_timeout_secs: default_hello_timeout(),
            handshake_timeout_secs: default_handshake_timeout(),
            build_number: None,
            capabilities: default_capabilities(),
            locale: default_locale(),
            user_agent: default_user_agent(),
            browser_version: default_browser_version(),
            os_version: default_os_version(),
        }
    }
}

/// Backoff settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,
    /// 0 means retry forever
    #[serde(default)]
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: default_base_delay(),
            max_delay_secs: default_max_delay(),
            max_attempts: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_reload_interval")]
    pub config_reload_interval_secs: u64,
    #[serde(default = "default_elapsed_save_interval")]
    pub elapsed_save_interval_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            config_reload_interval_secs: default_reload_interval(),
            elapsed_save_interval_secs: default_elapsed_save_interval(),
        }
    }
}

impl RuntimeConfig {
    /// Reload interval clamped to [`MIN_RELOAD_INTERVAL_SECS`]
    #[must_use]
    pub fn reload_interval_secs(&self) -> u64 {
        self.config_reload_interval_secs.max(MIN_RELOAD_INTERVAL_SECS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub file_line: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file_line: false,
        }
    }
}

/// Elapsed-time storage location
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Relative paths resolve against the config file's directory
    #[serde(default = "default_elapsed_path")]
    pub elapsed_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            elapsed_path: default_elapsed_path(),
        }
    }
}

// Default value functions
fn default_game_name() -> String {
    "Custom Game".to_string()
}

fn default_start_time_mode() -> String {
    "auto".to_string()
}

fn default_status() -> String {
    "online".to_string()
}

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_hello_timeout() -> u64 {
    30
}

fn default_handshake_timeout() -> u64 {
    30
}

fn default_capabilities() -> u64 {
    30717
}

fn default_locale() -> String {
    "zh-CN".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_browser_version() -> String {
    "30.2.0".to_string()
}

fn default_os_version() -> String {
    "10.0.22631".to_string()
}

fn default_base_delay() -> u64 {
    5
}

fn default_max_delay() -> u64 {
    120
}

fn default_reload_interval() -> u64 {
    60
}

fn default_elapsed_save_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_elapsed_path() -> String {
    "elapsed.json".to_string()
}

impl AppConfig {
    /// Load configuration from `path` plus environment overrides
    ///
    /// Strict mode also requires a usable token.
    ///
    /// # Errors
    /// Returns an error if the file is missing, unparsable or invalid
    pub fn load(path: &Path, strict: bool) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix("PRESENCE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate(strict)?;
        Ok(config)
    }

    /// Check value ranges and, in strict mode, the token
    ///
    /// # Errors
    /// Returns the first invalid value found
    pub fn validate(&self, strict: bool) -> Result<(), ConfigError> {
        if strict && !self.has_token() {
            return Err(ConfigError::MissingVar("token"));
        }
        self.presence.to_spec().map(|_| ())?;
        if self.reconnect.base_delay_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "reconnect.base_delay_secs",
                "must be at least 1".to_string(),
            ));
        }
        if self.reconnect.max_delay_secs < self.reconnect.base_delay_secs {
            return Err(ConfigError::InvalidValue(
                "reconnect.max_delay_secs",
                "must not be below base_delay_secs".to_string(),
            ));
        }
        if self.runtime.elapsed_save_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "runtime.elapsed_save_interval_secs",
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a non-placeholder token is set
    #[must_use]
    pub fn has_token(&self) -> bool {
        let token = self.token.trim();
        !token.is_empty() && token != PLACEHOLDER_TOKEN
    }

    /// Elapsed store path resolved against the config file location
    #[must_use]
    pub fn elapsed_path(&self, config_path: &Path) -> PathBuf {
        let path = Path::new(&self.storage.elapsed_path);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        config_path
            .parent()
            .map_or_else(|| path.to_path_buf(), |dir| dir.join(path))
    }
}

impl PresenceConfig {
    /// Convert into the domain presence model
    ///
    /// # Errors
    /// Returns an error for unknown activity types, statuses or modes
    pub fn to_spec(&self) -> Result<PresenceSpec, ConfigError> {
        let activity_type = ActivityType::from_u8(self.activity_type).ok_or_else(|| {
            ConfigError::InvalidValue(
                "presence.activity_type",
                format!("{} (expected 0, 1, 2, 3 or 5)", self.activity_type),
            )
        })?;
        let status: OnlineStatus = self
            .status
            .parse()
            .map_err(|e| ConfigError::InvalidValue("presence.status", e))?;
        let elapsed_mode: ElapsedMode = self
            .start_time_mode
            .parse()
            .map_err(|e| ConfigError::InvalidValue("presence.start_time_mode", e))?;

        Ok(PresenceSpec {
            name: self.game_name.clone(),
            activity_type,
            application_id: optional(&self.application_id),
            details: optional(&self.details),
            state: optional(&self.state),
            large_image_key: optional(&self.large_image_key),
            large_image_text: optional(&self.large_image_text),
            small_image_key: optional(&self.small_image_key),
            small_image_text: optional(&self.small_image_text),
            buttons: self
                .buttons
                .iter()
                .map(|b| Button::new(b.label.clone(), b.url.clone()))
                .collect(),
            elapsed_mode,
            custom_elapsed_minutes: self.custom_elapsed_minutes,
            status,
        })
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Missing required value: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.presence.game_name, "Custom Game");
        assert_eq!(config.gateway.url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.gateway.capabilities, 30717);
        assert_eq!(config.reconnect.base_delay_secs, 5);
        assert_eq!(config.reconnect.max_delay_secs, 120);
        assert_eq!(config.reconnect.max_attempts, 0);
        assert_eq!(config.runtime.config_reload_interval_secs, 60);
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            r#"
token: "abc.def.ghi"
presence:
  game_name: "Elden Ring"
  activity_type: 3
  application_id: 1234567890
  details: "Boss fight"
  buttons:
    - label: "Site"
      url: "https://example.com"
  start_time_mode: custom
  custom_elapsed_minutes: 45
  status: dnd
reconnect:
  max_attempts: 3
"#,
        );

        let config = AppConfig::load(file.path(), true).unwrap();
        assert_eq!(config.token, "abc.def.ghi");
        assert_eq!(config.reconnect.max_attempts, 3);

        let spec = config.presence.to_spec().unwrap();
        assert_eq!(spec.name, "Elden Ring");
        assert_eq!(spec.activity_type, ActivityType::Watching);
        assert_eq!(spec.application_id.as_deref(), Some("1234567890"));
        assert_eq!(spec.buttons.len(), 1);
        assert_eq!(spec.elapsed_mode, ElapsedMode::Custom);
        assert_eq!(spec.custom_elapsed_minutes, 45);
        assert_eq!(spec.status, OnlineStatus::Dnd);
        assert!(spec.state.is_none());
    }

    #[test]
    fn test_strict_mode_requires_token() {
        let file = write_config("token: \"YOUR_TOKEN\"\n");
        assert!(matches!(
            AppConfig::load(file.path(), true),
            Err(ConfigError::MissingVar("token"))
        ));
        assert!(AppConfig::load(file.path(), false).is_ok());
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::load(Path::new("/definitely/not/here.yml"), false);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_invalid_values() {
        let mut presence = PresenceConfig::default();
        presence.activity_type = 4;
        assert!(matches!(
            presence.to_spec(),
            Err(ConfigError::InvalidValue("presence.activity_type", _))
        ));

        let mut presence = PresenceConfig::default();
        presence.status = "offline".to_string();
        assert!(presence.to_spec().is_err());

        let mut presence = PresenceConfig::default();
        presence.start_time_mode = "later".to_string();
        assert!(presence.to_spec().is_err());
    }

    #[test]
    fn test_reload_interval_floor() {
        let runtime = RuntimeConfig {
            config_reload_interval_secs: 5,
            elapsed_save_interval_secs: 60,
        };
        assert_eq!(runtime.reload_interval_secs(), MIN_RELOAD_INTERVAL_SECS);
    }

    #[test]
    fn test_elapsed_path_resolution() {
        let config = AppConfig::default();
        assert_eq!(
            config.elapsed_path(Path::new("/etc/presence/config.yml")),
            PathBuf::from("/etc/presence/elapsed.json")
        );

        let mut config = AppConfig::default();
        config.storage.elapsed_path = "/var/lib/elapsed.json".to_string();
        assert_eq!(
            config.elapsed_path(Path::new("/etc/presence/config.yml")),
            PathBuf::from("/var/lib/elapsed.json")
        );
    }
}
