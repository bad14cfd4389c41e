//! Elapsed time tracker
//!
//! Keeps the auto-mode timer running across reconnects and restarts by
//! persisting the accumulated seconds through an [`ElapsedStore`].
//! The clock is passed in by the caller.

use chrono::{DateTime, Utc};
use presence_core::{ElapsedMode, ElapsedRecord, ElapsedStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ElapsedTimeTracker {
    store: Arc<dyn ElapsedStore>,
    mode: ElapsedMode,
    /// Reference point of the running timer; `None` while paused
    start: Option<DateTime<Utc>>,
    /// Accumulated seconds while the timer is paused
    frozen: u64,
    /// Lowest value the running timer may report: the seed or the last save
    floor: u64,
    shut_down: bool,
}

impl ElapsedTimeTracker {
    pub fn new(store: Arc<dyn ElapsedStore>) -> Self {
        Self {
            store,
            mode: ElapsedMode::default(),
            start: None,
            frozen: 0,
            floor: 0,
            shut_down: false,
        }
    }

    /// Seed the timer from the last persisted record.
    ///
    /// A missing or unreadable record seeds zero.
    pub fn on_startup(&mut self, mode: ElapsedMode, now: DateTime<Utc>) {
        let seed = match self.store.load() {
            Ok(Some(record)) => record.accumulated_seconds,
            Ok(None) => 0,
            Err(e) => {
                warn!(error = %e, "Failed to load elapsed record, starting from zero");
                0
            }
        };

        self.mode = mode;
        self.shut_down = false;
        self.frozen = seed;
        self.floor = seed;
        self.start = None;
        if mode == ElapsedMode::Auto {
            self.resume_from(seed, now);
        }

        info!(mode = %mode, accumulated_seconds = seed, "Elapsed timer initialised");
    }

    #[must_use]
    pub fn mode(&self) -> ElapsedMode {
        self.mode
    }

    /// Seconds accumulated up to `now`.
    ///
    /// Never drops below the seed or the last saved value, even if the wall
    /// clock steps backwards.
    #[must_use]
    pub fn accumulated(&self, now: DateTime<Utc>) -> u64 {
        match self.start {
            Some(start) => u64::try_from((now - start).num_seconds())
                .unwrap_or(0)
                .max(self.floor),
            None => self.frozen,
        }
    }

    /// Record the presence builder should use; only present in auto mode
    #[must_use]
    pub fn current_record(&self, now: DateTime<Utc>) -> Option<ElapsedRecord> {
        (self.mode == ElapsedMode::Auto).then(|| ElapsedRecord::new(self.accumulated(now), now))
    }

    /// Periodic persistence
    pub fn on_tick(&mut self, now: DateTime<Utc>) {
        self.persist(now);
    }

    /// Write the current value; failures are logged and retried next tick
    pub fn persist(&mut self, now: DateTime<Utc>) -> bool {
        let Some(record) = self.current_record(now) else {
            return false;
        };

        match self.store.save(&record) {
            Ok(()) => {
                self.floor = record.accumulated_seconds;
                debug!(accumulated_seconds = record.accumulated_seconds, "Elapsed time saved");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to save elapsed time");
                false
            }
        }
    }

    /// Final persist; later calls are ignored
    pub fn on_shutdown(&mut self, now: DateTime<Utc>) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.persist(now);
    }

    /// Apply a start-time mode change from configuration.
    ///
    /// Leaving auto keeps the accumulated duration, custom back to auto
    /// continues from it, none back to auto starts over.
    pub fn on_mode_change(&mut self, mode: ElapsedMode, now: DateTime<Utc>) {
        let previous = self.mode;
        if previous == mode {
            return;
        }

        match (previous, mode) {
            (ElapsedMode::Auto, _) => {
                self.persist(now);
                self.frozen = self.accumulated(now);
                self.start = None;
                self.mode = mode;
            }
            (ElapsedMode::Custom, ElapsedMode::Auto) => {
                self.mode = mode;
                self.resume_from(self.frozen, now);
                self.persist(now);
            }
            (ElapsedMode::None, ElapsedMode::Auto) => {
                self.mode = mode;
                self.frozen = 0;
                self.floor = 0;
                self.start = Some(now);
                self.persist(now);
            }
            _ => self.mode = mode,
        }

        info!(
            from = %previous,
            to = %mode,
            accumulated_seconds = self.accumulated(now),
            "Elapsed mode changed"
        );
    }

    fn resume_from(&mut self, seconds: u64, now: DateTime<Utc>) {
        self.floor = seconds;
        self.start = Some(ElapsedRecord::new(seconds, now).start_reference(now));
    }
}
