//! Gateway client error types

use presence_core::CredentialError;
use thiserror::Error;

/// Gateway client error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Socket-level failure; always retried with backoff
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed or unexpected frame for the current phase
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server rejected the credential
    #[error("Credential rejected: {0}")]
    AuthRejected(String),

    /// The server closed with a code that retrying cannot fix
    #[error("Gateway closed with fatal code {code}: {reason}")]
    FatalClose { code: u16, reason: String },

    /// Configured attempt cap reached
    #[error("Gave up after {attempts} failed connection attempts")]
    ReconnectExhausted { attempts: u32 },

    /// A bounded wait expired
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),
}

impl GatewayError {
    /// Whether this error ends the process instead of driving a reconnect
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AuthRejected(_)
                | Self::FatalClose { .. }
                | Self::ReconnectExhausted { .. }
                | Self::Credential(CredentialError::Missing)
        )
    }

    /// Process exit code for a terminal error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthRejected(_) | Self::Credential(_) => 2,
            Self::ReconnectExhausted { .. } => 3,
            _ => 4,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GatewayError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Failures while discovering the client build number
#[derive(Debug, Error)]
pub enum BuildNumberError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("BUILD_NUMBER not found in page")]
    NotFound,
}

/// Gateway result type
pub type GatewayResult<T> = Result<T, GatewayError>;
