//! Top-level request dispatch.
//!
//! Order is fixed: reserved paths first, then the route table, then the
//! not-found page. A configured route can never shadow a reserved path.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde_json::{Map, Value};

use crate::http::forward::ProxyForwarder;
use crate::http::request::request_target;
use crate::pages::templates::{escape_html, DOCUMENTATION_VIEW, INDEX_VIEW, NOT_FOUND_VIEW};
use crate::pages::{HealthStatus, TemplateRenderer};
use crate::routing::{RouteResolver, RouteTable};

pub const ROOT_PATH: &str = "/";
pub const HEALTH_PATH: &str = "/health";
pub const DOCUMENTATION_PATH: &str = "/documentation";

/// Routes each inbound request to a page, a backend, or the 404 page.
#[derive(Clone)]
pub struct RequestDispatcher {
    resolver: RouteResolver,
    forwarder: ProxyForwarder,
    renderer: Arc<dyn TemplateRenderer>,
}

impl RequestDispatcher {
    pub fn new(
        resolver: RouteResolver,
        forwarder: ProxyForwarder,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            resolver,
            forwarder,
            renderer,
        }
    }

    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        match request.uri().path() {
            ROOT_PATH => return self.index_page(),
            HEALTH_PATH => return HealthStatus::current().into_response(),
            DOCUMENTATION_PATH => return self.page(DOCUMENTATION_VIEW, Map::new()),
            _ => {}
        }

        let path = request_target(request.uri()).to_string();
        match self.resolver.resolve(&path) {
            Some(route) => self.forwarder.forward(request, &route).await,
            None => {
                tracing::debug!(path = %path, "No route matched");
                self.not_found()
            }
        }
    }

    fn index_page(&self) -> Response {
        let store = self.resolver.store();
        let table = store.snapshot();

        let mut data = Map::new();
        data.insert("route_count".into(), Value::from(table.len()));
        data.insert("generation".into(), Value::from(store.generation()));
        data.insert("routes_html".into(), Value::from(route_rows(&table)));

        self.page(INDEX_VIEW, data)
    }

    fn page(&self, view: &str, data: Map<String, Value>) -> Response {
        match self.renderer.render(view, &data) {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                tracing::error!(view = view, error = %e, "Error rendering template");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }

    fn not_found(&self) -> Response {
        match self.renderer.render(NOT_FOUND_VIEW, &Map::new()) {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Error rendering 404 page");
                (StatusCode::NOT_FOUND, "Not Found").into_response()
            }
        }
    }
}

fn route_rows(table: &RouteTable) -> String {
    table
        .iter()
        .map(|route| {
            format!(
                "<tr><td><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&route.url_context),
                escape_html(&route.backend),
                escape_html(route.remove_prefix.as_deref().unwrap_or("-")),
                escape_html(route.add_prefix.as_deref().unwrap_or("-")),
                route
                    .timeout
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
