//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (pick request / response-stream deadlines for the route)
//!     → forwarder enforces them with Tokio timers, restarted on body activity
//!     → expiry maps to 504 Gateway Timeout
//! ```
//!
//! # Design Decisions
//! - Single forwarding attempt; no retries or circuit breaking
//! - Dropping a timed-out future or body releases the backend connection

pub mod timeouts;

pub use timeouts::{idle_timeout, ActivityBody, IgnorePatterns, TimeoutPolicy};
