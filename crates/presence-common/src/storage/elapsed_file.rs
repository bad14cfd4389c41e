//! JSON file elapsed store

use presence_core::{ElapsedRecord, ElapsedStore, StoreResult};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Stores the elapsed record as a small JSON document.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so a crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct JsonFileElapsedStore {
    path: PathBuf,
}

impl JsonFileElapsedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ElapsedStore for JsonFileElapsedStore {
    fn load(&self) -> StoreResult<Option<ElapsedRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Blocking write on the caller's thread. The document is a few dozen
    /// bytes written once per save interval plus on disconnect, and the
    /// shutdown write must land before the process exits.
    fn save(&self, record: &ElapsedRecord) -> StoreResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let temp = self.temp_path();
        let json = serde_json::to_vec_pretty(record)?;
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;

        tracing::trace!(
            path = %self.path.display(),
            accumulated_seconds = record.accumulated_seconds,
            "Elapsed record saved"
        );
        Ok(())
    }
}
