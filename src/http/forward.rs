//! Request forwarding to route backends.
//!
//! # Responsibilities
//! - Rewrite the request target and apply route policies
//! - Send the request upstream with the route's timeout policy
//! - Relay the backend response, streaming the body
//! - Map upstream failures to gateway responses
//!
//! # Design Decisions
//! - One attempt per request; no retries
//! - The outbound deadline is an idle deadline: each request body frame
//!   restarts it, so a slow but active upload is not cut off
//! - The status line is committed only after the first body frame arrives,
//!   so a stalled backend body can still be answered with a 504
//! - After that, a stall longer than the timeout aborts the stream

use std::fmt::Display;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, Response};
use axum::response::IntoResponse;
use axum::BoxError;
use futures_util::future;
use futures_util::stream::{self, StreamExt};
use http_body_util::{BodyExt, BodyStream, StreamBody};
use hyper::body::{Body as HttpBody, Incoming};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tokio::sync::watch;
use tower_http::timeout::TimeoutBody;

use crate::config::RouteConfig;
use crate::http::request::{outbound_request, request_target, rewrite_path};
use crate::http::response::{classify_upstream_error, ProxyFailure};
use crate::resilience::{idle_timeout, ActivityBody};
use crate::security::{merge_policy_headers, PolicyOutcome, PolicySet};

/// Forwards matched requests to their route's backend.
#[derive(Clone)]
pub struct ProxyForwarder {
    client: Client<HttpConnector, Body>,
    policies: PolicySet,
}

impl ProxyForwarder {
    pub fn new(policies: PolicySet) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, policies }
    }

    /// Forward `request` according to `route`.
    pub async fn forward(&self, request: Request<Body>, route: &RouteConfig) -> Response<Body> {
        let (parts, body) = request.into_parts();
        let path = request_target(&parts.uri).to_string();
        let target = rewrite_path(
            &path,
            route.remove_prefix.as_deref(),
            route.add_prefix.as_deref(),
        );

        let mut policy_headers = HeaderMap::new();
        if let PolicyOutcome::Respond(status) = self.policies.apply(route, &parts, &mut policy_headers) {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = status;
            *response.headers_mut() = policy_headers;
            return response;
        }

        let timeouts = route.timeout_policy(&path);
        let (body, deadline) = match timeouts.request {
            Some(limit) => {
                let (body, activity) = ActivityBody::wrap(body);
                (body, Some((limit, activity)))
            }
            None => (body, None),
        };

        let method = parts.method.clone();
        let outbound = match outbound_request(parts, body, route, &target) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(error = %e, backend = %route.backend, "Error creating proxy request");
                return with_policy(ProxyFailure::Internal.into_response(), &policy_headers);
            }
        };

        let upstream = match self.send(outbound, deadline, &route.backend).await {
            Ok(response) => response,
            Err(failure) => return with_policy(failure.into_response(), &policy_headers),
        };

        if route.log {
            tracing::info!(
                method = %method,
                path = %path,
                backend = %route.backend,
                target = %target,
                "Proxied request"
            );
        }

        let response = match relay(upstream, timeouts.response, &route.backend).await {
            Ok(response) => response,
            Err(failure) => failure.into_response(),
        };
        with_policy(response, &policy_headers)
    }

    async fn send(
        &self,
        request: Request<Body>,
        deadline: Option<(Duration, watch::Receiver<()>)>,
        backend: &str,
    ) -> Result<Response<Incoming>, ProxyFailure> {
        let pending = self.client.request(request);

        let result = match deadline {
            Some((limit, activity)) => match idle_timeout(limit, activity, pending).await {
                Some(result) => result,
                None => {
                    tracing::warn!(backend = %backend, timeout_ms = limit.as_millis() as u64, "Upstream request timed out");
                    return Err(ProxyFailure::RequestTimeout);
                }
            },
            None => pending.await,
        };

        result.map_err(|e| {
            let failure = classify_upstream_error(&e);
            tracing::error!(backend = %backend, error = %e, status = %failure.status(), "Proxy request error");
            failure
        })
    }
}

impl Default for ProxyForwarder {
    fn default() -> Self {
        Self::new(PolicySet::default())
    }
}

/// Turn the backend response into the client response.
async fn relay<B>(
    response: Response<B>,
    timeout: Option<Duration>,
    backend: &str,
) -> Result<Response<Body>, ProxyFailure>
where
    B: HttpBody<Data = Bytes> + Send + Unpin + 'static,
    B::Error: Into<BoxError> + Display,
{
    let (parts, mut body) = response.into_parts();

    let Some(limit) = timeout else {
        return Ok(Response::from_parts(parts, Body::new(body)));
    };

    let first = match tokio::time::timeout(limit, body.frame()).await {
        Err(_) => {
            tracing::warn!(backend = %backend, timeout_ms = limit.as_millis() as u64, "Upstream response timed out");
            return Err(ProxyFailure::ResponseTimeout);
        }
        Ok(None) => return Ok(Response::from_parts(parts, Body::empty())),
        Ok(Some(Err(e))) => {
            tracing::error!(backend = %backend, error = %e, "Upstream response error");
            return Err(ProxyFailure::BadGateway);
        }
        Ok(Some(Ok(frame))) => frame,
    };

    // Re-emit the first frame as-is, data or trailers.
    let rest = BodyStream::new(TimeoutBody::new(limit, body));
    let frames = stream::once(future::ready(Ok::<_, BoxError>(first))).chain(rest);

    Ok(Response::from_parts(parts, Body::new(StreamBody::new(frames))))
}

fn with_policy(mut response: Response<Body>, policy_headers: &HeaderMap) -> Response<Body> {
    merge_policy_headers(response.headers_mut(), policy_headers);
    response
}
