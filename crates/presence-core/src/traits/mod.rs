//! Collaborator traits (ports) consumed by the gateway client

mod collaborators;

pub use collaborators::{
    ConfigChange, ConfigSource, CredentialSource, ElapsedStore, StoreResult,
};
