//! Config source fed through an mpsc channel

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::entities::PresenceSpec;
use crate::traits::{ConfigChange, ConfigSource};

/// Channel buffer size for change notifications
const CHANGE_BUFFER_SIZE: usize = 16;

/// Config source whose changes are pushed by whoever holds the sender
pub struct ChannelConfigSource {
    current: PresenceSpec,
    receiver: mpsc::Receiver<ConfigChange>,
}

impl ChannelConfigSource {
    /// Create a source with an initial snapshot and the sender feeding it
    pub fn new(initial: PresenceSpec) -> (Self, mpsc::Sender<ConfigChange>) {
        let (tx, rx) = mpsc::channel(CHANGE_BUFFER_SIZE);
        (Self::from_receiver(initial, rx), tx)
    }

    /// Wrap an existing receiver
    pub fn from_receiver(initial: PresenceSpec, receiver: mpsc::Receiver<ConfigChange>) -> Self {
        Self {
            current: initial,
            receiver,
        }
    }
}

#[async_trait]
impl ConfigSource for ChannelConfigSource {
    fn snapshot(&self) -> PresenceSpec {
        self.current.clone()
    }

    async fn next_change(&mut self) -> Option<ConfigChange> {
        let change = self.receiver.recv().await?;
        self.current = change.spec.clone();
        Some(change)
    }
}
