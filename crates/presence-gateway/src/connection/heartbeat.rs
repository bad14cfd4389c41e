//! Heartbeat scheduling
//!
//! Tracks when the next heartbeat is due and whether the previous one was
//! acknowledged. The connection loop awaits [`HeartbeatScheduler::wait`]
//! alongside its other event sources and calls [`HeartbeatScheduler::on_due`]
//! when it fires.

use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

/// What the connection should do when a heartbeat comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Send a heartbeat now
    Send,
    /// The previous heartbeat was never acknowledged; drop the transport
    Zombie,
}

/// Heartbeat timer and ACK bookkeeping for one connection
#[derive(Debug, Default)]
pub struct HeartbeatScheduler {
    interval: Option<Duration>,
    next_due: Option<Instant>,
    awaiting_ack: bool,
    last_sent: Option<Instant>,
    latency: Option<Duration>,
}

impl HeartbeatScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start beating at `interval`; the first beat is jittered into `[0, interval)`
    pub fn start(&mut self, interval: Duration) {
        let jitter = rand::thread_rng().gen_range(0.0..1.0);
        self.start_with_first_delay(interval, interval.mul_f64(jitter));
    }

    /// Start beating at `interval` with an explicit first delay
    pub fn start_with_first_delay(&mut self, interval: Duration, first: Duration) {
        self.interval = Some(interval);
        self.next_due = Some(Instant::now() + first);
        self.awaiting_ack = false;
        self.last_sent = None;
        self.latency = None;
    }

    /// Stop; no heartbeat becomes due after this returns
    pub fn cancel(&mut self) {
        self.interval = None;
        self.next_due = None;
        self.awaiting_ack = false;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Resolves when the next heartbeat is due; pending forever when stopped
    pub async fn wait(&self) {
        match self.next_due {
            Some(due) => tokio::time::sleep_until(due).await,
            None => std::future::pending().await,
        }
    }

    /// Decide what to do now that a heartbeat is due.
    ///
    /// A zombie verdict also cancels the scheduler, so it is reported once.
    pub fn on_due(&mut self) -> HeartbeatAction {
        if self.awaiting_ack {
            self.cancel();
            return HeartbeatAction::Zombie;
        }

        let now = Instant::now();
        self.awaiting_ack = true;
        self.last_sent = Some(now);
        self.next_due = self.interval.map(|interval| now + interval);
        HeartbeatAction::Send
    }

    /// Record an acknowledgement
    pub fn on_ack(&mut self) {
        self.awaiting_ack = false;
        if let Some(sent) = self.last_sent {
            self.latency = Some(sent.elapsed());
        }
    }

    /// Round trip of the last acknowledged heartbeat
    #[must_use]
    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }

    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }
}
