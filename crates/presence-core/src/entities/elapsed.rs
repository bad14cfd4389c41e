//! Elapsed record - persisted running time for auto-timed presences

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Accumulated running time, written periodically and read at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedRecord {
    pub accumulated_seconds: u64,
    pub saved_at: DateTime<Utc>,
}

impl ElapsedRecord {
    #[must_use]
    pub fn new(accumulated_seconds: u64, saved_at: DateTime<Utc>) -> Self {
        Self {
            accumulated_seconds,
            saved_at,
        }
    }

    /// Record for a timer that has not run yet
    #[must_use]
    pub fn zero(now: DateTime<Utc>) -> Self {
        Self::new(0, now)
    }

    /// Point in time the displayed timer counts from: `now - accumulated`
    #[must_use]
    pub fn start_reference(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let seconds = i64::try_from(self.accumulated_seconds).unwrap_or(i64::MAX);
        Duration::try_seconds(seconds)
            .and_then(|elapsed| now.checked_sub_signed(elapsed))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
