//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Route panics through the log instead of bare stderr
//!
//! # Design Decisions
//! - Level comes from `RUST_LOG`, defaulting to info for this crate and tower-http
//! - A panic in one request is logged and the process keeps serving

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "route_proxy=info,tower_http=info";

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Log panics as errors, including their location.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());

        match info.location() {
            Some(location) => tracing::error!(
                panic = %payload,
                file = location.file(),
                line = location.line(),
                "Uncaught panic"
            ),
            None => tracing::error!(panic = %payload, "Uncaught panic"),
        }
    }));
}
