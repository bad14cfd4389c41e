//! Connection options
//!
//! Everything the state machine needs from configuration, resolved once at
//! startup and passed in by value.

use presence_common::{AppConfig, DEFAULT_GATEWAY_URL, DEFAULT_USER_AGENT};
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::build_number::DEFAULT_BUILD_NUMBER;
use crate::protocol::IdentifyProperties;

/// Capability bitmask sent by the desktop client
pub const DEFAULT_CAPABILITIES: u64 = 30_717;

/// Client identity presented in identify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub build_number: u64,
    pub capabilities: u64,
    pub locale: String,
    pub user_agent: String,
    pub browser_version: String,
    pub os_version: String,
}

impl ClientIdentity {
    /// Identify properties for this identity
    #[must_use]
    pub fn properties(&self) -> IdentifyProperties {
        IdentifyProperties::desktop(self.build_number)
            .with_locale(&self.locale)
            .with_user_agent(&self.user_agent)
            .with_browser_version(&self.browser_version)
            .with_os_version(&self.os_version)
    }
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            build_number: DEFAULT_BUILD_NUMBER,
            capabilities: DEFAULT_CAPABILITIES,
            locale: "zh-CN".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            browser_version: "30.2.0".to_string(),
            os_version: "10.0.22631".to_string(),
        }
    }
}

/// Gateway connection options
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Gateway URL including the query string
    pub url: String,
    pub hello_timeout: Duration,
    pub handshake_timeout: Duration,
    pub identity: ClientIdentity,
    pub reconnect_base_delay: Duration,
    pub reconnect_max_delay: Duration,
    /// 0 means unbounded
    pub max_reconnect_attempts: u32,
    pub elapsed_save_interval: Duration,
    /// Random wait before reconnecting after an invalid session
    pub invalid_session_delay: RangeInclusive<Duration>,
}

impl GatewayOptions {
    /// Resolve options from configuration and a discovered build number
    #[must_use]
    pub fn from_config(config: &AppConfig, build_number: u64) -> Self {
        let gateway = &config.gateway;
        Self {
            url: gateway.url.clone(),
            hello_timeout: Duration::from_secs(gateway.hello_timeout_secs),
            handshake_timeout: Duration::from_secs(gateway.handshake_timeout_secs),
            identity: ClientIdentity {
                build_number,
                capabilities: gateway.capabilities,
                locale: gateway.locale.clone(),
                user_agent: gateway.user_agent.clone(),
                browser_version: gateway.browser_version.clone(),
                os_version: gateway.os_version.clone(),
            },
            reconnect_base_delay: Duration::from_secs(config.reconnect.base_delay_secs),
            reconnect_max_delay: Duration::from_secs(config.reconnect.max_delay_secs),
            max_reconnect_attempts: config.reconnect.max_attempts,
            elapsed_save_interval: Duration::from_secs(
                config.runtime.elapsed_save_interval_secs.max(1),
            ),
            ..Self::default()
        }
    }

    /// URL to connect to when resuming.
    ///
    /// The resume endpoint from READY carries no query, so the one from the
    /// configured URL is appended.
    #[must_use]
    pub fn resume_url(&self, resume_base: &str) -> String {
        let base = resume_base.trim_end_matches('/');
        match self.url.split_once('?') {
            Some((_, query)) if !base.contains('?') => format!("{base}/?{query}"),
            _ => base.to_string(),
        }
    }
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_GATEWAY_URL.to_string(),
            hello_timeout: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(30),
            identity: ClientIdentity::default(),
            reconnect_base_delay: Duration::from_secs(5),
            reconnect_max_delay: Duration::from_secs(120),
            max_reconnect_attempts: 0,
            elapsed_save_interval: Duration::from_secs(60),
            invalid_session_delay: Duration::from_secs(1)..=Duration::from_secs(5),
        }
    }
}
