//! # presence-core
//!
//! Domain layer containing the presence model, the activity payload builder,
//! and the collaborator traits the gateway client is driven by.
//! This crate has zero dependencies on infrastructure (sockets, files, etc.).

pub mod adapters;
pub mod builder;
pub mod entities;
pub mod error;
pub mod traits;

// Re-export commonly used types at crate root
pub use adapters::{ChannelConfigSource, MemoryElapsedStore, StaticCredential};
pub use builder::{BuiltPresence, PresenceBuilder, PresenceWarning};
pub use entities::{
    ActivityAssets, ActivityMetadata, ActivityPayload, ActivityTimestamps, ActivityType, Button,
    ElapsedMode, ElapsedRecord, OnlineStatus, PresenceSpec, PresenceUpdatePayload,
    PLACEHOLDER_APPLICATION_ID,
};
pub use error::{CredentialError, PresenceValidationError, StoreError};
pub use traits::{ConfigChange, ConfigSource, CredentialSource, ElapsedStore, StoreResult};
