//! # presence-common
//!
//! Shared infrastructure: YAML configuration, the file-backed config,
//! credential and elapsed-time collaborators, and telemetry.

pub mod config;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AppConfig, ButtonConfig, ConfigCredential, ConfigError, FileConfigSource, GatewayConfig,
    LoggingConfig, PresenceConfig, ReconnectConfig, RuntimeConfig, StorageConfig,
    DEFAULT_GATEWAY_URL, DEFAULT_USER_AGENT, MIN_RELOAD_INTERVAL_SECS, PLACEHOLDER_TOKEN,
};
pub use storage::JsonFileElapsedStore;
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};
