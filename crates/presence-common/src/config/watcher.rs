//! Polling config watcher
//!
//! Re-reads the configuration file on an interval and pushes presence
//! changes to the gateway client through the `ConfigSource` trait.

use async_trait::async_trait;
use presence_core::{ConfigChange, ConfigSource, PresenceSpec};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::app_config::{AppConfig, ConfigError};

/// Channel buffer size for change notifications
const CHANGE_BUFFER_SIZE: usize = 8;

/// Config source backed by a file that is polled for modifications
pub struct FileConfigSource {
    current: PresenceSpec,
    receiver: mpsc::Receiver<ConfigChange>,
    poller: JoinHandle<()>,
}

impl FileConfigSource {
    /// Start watching `path`, using `initial` as the already-loaded snapshot
    ///
    /// # Errors
    /// Returns an error if the initial presence section is invalid
    pub fn spawn(path: PathBuf, initial: AppConfig, interval: Duration) -> Result<Self, ConfigError> {
        let current = initial.presence.to_spec()?;
        let (tx, receiver) = mpsc::channel(CHANGE_BUFFER_SIZE);
        let poller = tokio::spawn(poll_loop(path, initial, interval, tx));

        Ok(Self {
            current,
            receiver,
            poller,
        })
    }
}

#[async_trait]
impl ConfigSource for FileConfigSource {
    fn snapshot(&self) -> PresenceSpec {
        self.current.clone()
    }

    async fn next_change(&mut self) -> Option<ConfigChange> {
        let change = self.receiver.recv().await?;
        self.current = change.spec.clone();
        Some(change)
    }
}

impl Drop for FileConfigSource {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

/// Poll until the consumer goes away.
///
/// `interval` applies until the first change; after that the interval from
/// the reloaded file takes over.
async fn poll_loop(
    path: PathBuf,
    mut last: AppConfig,
    mut interval: Duration,
    tx: mpsc::Sender<ConfigChange>,
) {
    loop {
        tokio::time::sleep(interval).await;

        let reloaded = match AppConfig::load(&path, true) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Config reload failed, keeping previous settings");
                continue;
            }
        };

        if reloaded == last {
            continue;
        }

        let next_interval = Duration::from_secs(reloaded.runtime.reload_interval_secs());
        if next_interval != interval {
            tracing::info!(
                interval_secs = next_interval.as_secs(),
                "Config reload interval changed"
            );
            interval = next_interval;
        }

        let Some(change) = diff(&last, &reloaded) else {
            tracing::debug!("Config changed outside the presence section; ignored until restart");
            last = reloaded;
            continue;
        };

        tracing::info!(
            credential_changed = change.credential_changed,
            game = %change.spec.name,
            "Config file changed"
        );
        last = reloaded;

        if tx.send(change).await.is_err() {
            tracing::debug!("Config consumer gone, stopping watcher");
            break;
        }
    }
}

/// Change to report for `new` relative to `old`, if the client cares
fn diff(old: &AppConfig, new: &AppConfig) -> Option<ConfigChange> {
    let credential_changed = old.token != new.token;
    if !credential_changed && old.presence == new.presence {
        return None;
    }
    // `load` already validated the presence section
    let spec = new.presence.to_spec().ok()?;
    Some(ConfigChange {
        spec,
        credential_changed,
    })
}
