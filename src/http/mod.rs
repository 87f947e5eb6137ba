//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tracing, panic recovery)
//!     → dispatch.rs (reserved pages, route lookup, 404)
//!     → forward.rs (policies, timeouts, upstream call)
//!         → request.rs (path rewrite, outbound request)
//!         → response.rs (failure mapping)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::RequestDispatcher;
pub use forward::ProxyForwarder;
pub use response::ProxyFailure;
pub use server::HttpServer;
