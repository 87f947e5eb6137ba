//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (route loads, reloads, proxy errors)
//!     → tower-http TraceLayer spans (one per request)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//! ```

pub mod logging;

pub use logging::{init_logging, install_panic_hook};
