//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route files
//!     → config::loader (parse, validate)
//!     → table.rs (ordered RouteTable)
//!     → RouteStore::replace (atomic swap)
//!
//! Incoming request path
//!     → router.rs (scan active snapshot)
//!     → Return: matched RouteConfig or no match
//! ```
//!
//! # Design Decisions
//! - Tables are rebuilt in full on reload, never patched
//! - Deterministic: same table and path always match the same route
//! - First match wins (table order, not longest prefix)

pub mod router;
pub mod table;

pub use router::RouteResolver;
pub use table::{RouteStore, RouteTable};
