//! In-memory elapsed store

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::entities::ElapsedRecord;
use crate::error::StoreError;
use crate::traits::{ElapsedStore, StoreResult};

/// Elapsed store kept in memory; counts writes and can simulate failures
#[derive(Debug, Default)]
pub struct MemoryElapsedStore {
    record: Mutex<Option<ElapsedRecord>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryElapsedStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a record, as if saved by a previous run
    #[must_use]
    pub fn with_record(record: ElapsedRecord) -> Self {
        let store = Self::default();
        *store.record.lock() = Some(record);
        store
    }

    /// Currently stored record
    pub fn record(&self) -> Option<ElapsedRecord> {
        *self.record.lock()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl ElapsedStore for MemoryElapsedStore {
    fn load(&self) -> StoreResult<Option<ElapsedRecord>> {
        Ok(*self.record.lock())
    }

    fn save(&self, record: &ElapsedRecord) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Other("simulated write failure".to_string()));
        }
        *self.record.lock() = Some(*record);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
