//! Collaborator traits (ports) - define what the gateway client needs from outside
//!
//! The gateway client owns the protocol; configuration, credentials and
//! elapsed-time persistence are supplied through these traits so that the
//! client can be driven by synthetic inputs in tests.

use async_trait::async_trait;

use crate::entities::{ElapsedRecord, PresenceSpec};
use crate::error::{CredentialError, StoreError};

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Configuration
// ============================================================================

/// A new configuration snapshot announced by the config collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    pub spec: PresenceSpec,
    /// The bearer credential changed alongside the presence
    pub credential_changed: bool,
}

impl ConfigChange {
    #[must_use]
    pub fn presence(spec: PresenceSpec) -> Self {
        Self {
            spec,
            credential_changed: false,
        }
    }
}

#[async_trait]
pub trait ConfigSource: Send {
    /// Current presence snapshot
    fn snapshot(&self) -> PresenceSpec;

    /// Wait for the next change notification.
    ///
    /// Must be cancel safe. Returns `None` once the source has shut down;
    /// the client then keeps the last snapshot.
    async fn next_change(&mut self) -> Option<ConfigChange>;
}

// ============================================================================
// Credentials
// ============================================================================

#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Opaque bearer credential, fetched on every identify
    async fn credential(&self) -> Result<String, CredentialError>;
}

// ============================================================================
// Elapsed-time storage
// ============================================================================

/// Durable storage for the auto-mode running time.
///
/// Synchronous so that shutdown persistence completes before process exit.
pub trait ElapsedStore: Send + Sync {
    /// Last persisted record, `None` if nothing was ever saved
    fn load(&self) -> StoreResult<Option<ElapsedRecord>>;

    /// Replace the persisted record
    fn save(&self, record: &ElapsedRecord) -> StoreResult<()>;
}
