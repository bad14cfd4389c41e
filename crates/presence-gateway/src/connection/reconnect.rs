//! Reconnect policy
//!
//! Exponential backoff with full jitter:
//! `delay = random(0, min(max_delay, base * 2^(attempt - 1)))`.
//! Every failed connection counts as an attempt; reaching READY or RESUMED
//! resets the count.

use rand::Rng;
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use super::session::SessionState;
use crate::protocol::CloseCode;

/// Why the last connection ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Socket failed or the connect itself failed
    Transport(String),
    /// Malformed or unexpected frame
    Protocol(String),
    /// No Hello within the hello timeout
    HelloTimeout,
    /// No READY/RESUMED within the handshake timeout
    HandshakeTimeout,
    /// A heartbeat was due while the previous one was still unacknowledged
    Zombie,
    /// The server asked for a reconnect
    ServerReconnect,
    /// The server invalidated the session
    SessionInvalidated { resumable: bool },
    /// The server closed the socket with a non-fatal code
    Closed { code: Option<u16>, reason: String },
    /// The credential source could not be read
    CredentialUnavailable(String),
}

impl DisconnectReason {
    /// The session cannot be resumed after this disconnect
    #[must_use]
    pub fn invalidates_session(&self) -> bool {
        match self {
            Self::SessionInvalidated { resumable } => !resumable,
            Self::Closed { code: Some(code), .. } => {
                CloseCode::from_u16(*code).is_some_and(CloseCode::requires_reidentify)
            }
            _ => false,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Protocol(e) => write!(f, "protocol error: {e}"),
            Self::HelloTimeout => f.write_str("no hello received"),
            Self::HandshakeTimeout => f.write_str("handshake not acknowledged"),
            Self::Zombie => f.write_str("heartbeat not acknowledged"),
            Self::ServerReconnect => f.write_str("server requested reconnect"),
            Self::SessionInvalidated { resumable } => {
                write!(f, "session invalidated (resumable: {resumable})")
            }
            Self::Closed { code: Some(code), reason } => write!(f, "closed with {code}: {reason}"),
            Self::Closed { code: None, reason } => write!(f, "closed: {reason}"),
            Self::CredentialUnavailable(e) => write!(f, "credential unavailable: {e}"),
        }
    }
}

/// Outcome of a failed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    Retry { attempt: u32, delay: Duration },
    GiveUp { attempts: u32 },
}

/// Backoff state for the reconnect loop
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    base_delay: Duration,
    max_delay: Duration,
    /// 0 means unbounded
    max_attempts: u32,
    failures: u32,
}

impl ReconnectPolicy {
    #[must_use]
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_delay: max_delay.max(base_delay),
            max_attempts,
            failures: 0,
        }
    }

    /// Upper bound of the jittered delay for a 1-based attempt number
    #[must_use]
    pub fn ceiling_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Jittered delay before a 1-based attempt number
    #[must_use]
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let ceiling = u64::try_from(self.ceiling_for(attempt).as_millis()).unwrap_or(u64::MAX);
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=ceiling))
    }

    /// Register a failed connection and decide what happens next
    pub fn on_failure(&mut self) -> ReconnectDecision {
        self.failures = self.failures.saturating_add(1);

        if self.max_attempts > 0 && self.failures >= self.max_attempts {
            return ReconnectDecision::GiveUp {
                attempts: self.failures,
            };
        }

        ReconnectDecision::Retry {
            attempt: self.failures,
            delay: self.next_delay(self.failures),
        }
    }

    /// Forget past failures after a successful handshake
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Consecutive failed connections so far
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Whether the next handshake should be a resume
    #[must_use]
    pub fn should_resume(session: &SessionState, last_reason: Option<&DisconnectReason>) -> bool {
        session.can_resume() && !last_reason.is_some_and(DisconnectReason::invalidates_session)
    }
}

/// Uniformly random delay in `range`, used after an invalid session
#[must_use]
pub fn random_delay(range: &RangeInclusive<Duration>) -> Duration {
    let (low, high) = (*range.start(), *range.end());
    if high <= low {
        return low;
    }
    rand::thread_rng().gen_range(low..=high)
}
