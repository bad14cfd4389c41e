//! In-process implementations of the collaborator traits
//!
//! Used by the binary for fixed inputs and by tests to drive the gateway
//! client with synthetic configuration changes and storage.

mod channel_config;
mod memory_store;
mod static_credential;

pub use channel_config::ChannelConfigSource;
pub use memory_store::MemoryElapsedStore;
pub use static_credential::StaticCredential;
