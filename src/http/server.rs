//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (tracing, panic recovery)
//! - Serve on a bound listener until shutdown

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::http::dispatch::RequestDispatcher;
use crate::http::forward::ProxyForwarder;
use crate::pages::ViewRenderer;
use crate::routing::{RouteResolver, RouteStore};
use crate::security::PolicySet;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: RequestDispatcher,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server that resolves requests against `store`.
    pub fn new(config: ProxyConfig, store: Arc<RouteStore>) -> Self {
        let dispatcher = RequestDispatcher::new(
            RouteResolver::new(store),
            ProxyForwarder::new(PolicySet::default()),
            Arc::new(ViewRenderer::new(&config.views_dir)),
        );

        let router = Self::build_router(AppState { dispatcher });
        Self { router, config }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CatchPanicLayer::new()),
            )
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server until the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.dispatcher.dispatch(request).await
}
