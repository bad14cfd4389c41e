//! Configuration loading and the file-backed collaborators

mod app_config;
mod credential;
mod watcher;

pub use app_config::{
    AppConfig, ButtonConfig, ConfigError, GatewayConfig, LoggingConfig, PresenceConfig,
    ReconnectConfig, RuntimeConfig, StorageConfig, DEFAULT_GATEWAY_URL, DEFAULT_USER_AGENT,
    MIN_RELOAD_INTERVAL_SECS, PLACEHOLDER_TOKEN,
};
pub use credential::ConfigCredential;
pub use watcher::FileConfigSource;
