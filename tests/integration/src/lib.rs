//! Integration test utilities for the presence gateway client
//!
//! Provides an in-memory gateway that the client connects to through the
//! regular `Connector` seam, so scenarios run without a network.

pub mod helpers;

pub use helpers::*;
