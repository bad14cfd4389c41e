//! Connection management
//!
//! The gateway state machine and the pieces it owns: session state,
//! heartbeat scheduling, reconnect policy and the elapsed-time tracker.

mod client;
mod elapsed;
mod heartbeat;
mod options;
mod reconnect;
mod session;

pub use client::{ConnectionPhase, GatewayConnection, GatewayHandle};
pub use elapsed::ElapsedTimeTracker;
pub use heartbeat::{HeartbeatAction, HeartbeatScheduler};
pub use options::{ClientIdentity, GatewayOptions, DEFAULT_CAPABILITIES};
pub use reconnect::{random_delay, DisconnectReason, ReconnectDecision, ReconnectPolicy};
pub use session::SessionState;
