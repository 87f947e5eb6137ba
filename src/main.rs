//! route-proxy
//!
//! An HTTP reverse proxy whose routes live as JSON files in a directory and
//! are reloaded while the process runs.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────┐
//!                              │                     ROUTE PROXY                      │
//!                              │                                                      │
//!     Client Request           │  ┌─────────┐    ┌──────────┐    ┌──────────────┐     │
//!     ─────────────────────────┼─▶│  http   │───▶│ dispatch │───▶│   routing    │     │
//!                              │  │ server  │    │ reserved │    │ first prefix │     │
//!                              │  └─────────┘    │  pages   │    └──────┬───────┘     │
//!                              │                 └──────────┘           │             │
//!                              │                                        ▼             │
//!     Client Response          │  ┌─────────┐    ┌──────────┐    ┌──────────────┐     │
//!     ◀────────────────────────┼──│response │◀───│ forward  │◀───│   security   │     │
//!                              │  │ mapping │    │ timeouts │    │ cors/headers │     │
//!                              │  └─────────┘    └────┬─────┘    └──────────────┘     │
//!                              │                      │                               │
//!                              │                      └───────────────────────────────┼──▶ Backend
//!                              │                                                      │
//!                              │  ┌────────────────────────────────────────────────┐  │
//!                              │  │              Cross-Cutting Concerns            │  │
//!                              │  │  ┌──────────────┐ ┌──────────────┐ ┌────────┐  │  │
//!                              │  │  │ config       │ │ observa-     │ │ life-  │  │  │
//!                              │  │  │ load + watch │ │ bility       │ │ cycle  │  │  │
//!                              │  │  └──────────────┘ └──────────────┘ └────────┘  │  │
//!                              │  └────────────────────────────────────────────────┘  │
//!                              └──────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use route_proxy::config::load_all;
use route_proxy::lifecycle::shutdown_signal;
use route_proxy::observability::{init_logging, install_panic_hook};
use route_proxy::{ConfigWatcher, HttpServer, ProxyConfig, RouteStore, RouteTable, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    install_panic_hook();

    let config = ProxyConfig::parse();

    tracing::info!(
        bind_address = %config.bind_address(),
        routes_dir = %config.routes_dir.display(),
        views_dir = %config.views_dir.display(),
        "Configuration loaded"
    );

    let table = match load_all(&config.routes_dir).await {
        Ok(table) => table,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load routes, starting with an empty table");
            RouteTable::new()
        }
    };
    let store = Arc::new(RouteStore::new(table));
    let shutdown = Shutdown::new();

    let watcher = match ConfigWatcher::new(&config.routes_dir, store.clone()).run(shutdown.subscribe()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::error!(error = %e, "Failed to start route watcher, hot reload disabled");
            None
        }
    };

    let listener = TcpListener::bind(config.bind_address()).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, "Reverse proxy server running");
    tracing::info!(path = %config.routes_dir.display(), "Watching for route configuration changes");

    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, store);

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    server.run(listener, server_shutdown).await?;

    if let Some(handle) = watcher {
        handle.join().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
