//! Timeout enforcement.
//!
//! # Responsibilities
//! - Decide which deadlines apply to a proxied request
//! - Compile `ignoreTimeout` patterns once, at route load time
//!
//! # Design Decisions
//! - Two independent deadlines: outbound request (connect, request body,
//!   response head) and response stream (time between body frames)
//! - Both are idle deadlines: any request or response frame restarts them
//! - `ignoreTimeout` only lifts the outbound request deadline; the response
//!   stream deadline applies whenever a timeout is configured
//! - A timeout of zero means "no timeout"
//! - Timed-out requests return 504 Gateway Timeout

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::{Body, Bytes};
use hyper::body::{Body as HttpBody, Frame, SizeHint};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tokio::sync::watch;

/// Compiled `ignoreTimeout` patterns, in declaration order.
#[derive(Clone, Default)]
pub struct IgnorePatterns(Vec<Regex>);

impl IgnorePatterns {
    /// Compile every pattern, failing on the first invalid one.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Returns true if any pattern matches anywhere in `path`.
    pub fn matches(&self, path: &str) -> bool {
        self.0.iter().any(|re| re.is_match(path))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The source text of each pattern.
    pub fn as_strs(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(Regex::as_str)
    }
}

impl fmt::Debug for IgnorePatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_strs()).finish()
    }
}

impl<'de> Deserialize<'de> for IgnorePatterns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        IgnorePatterns::new(&raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for IgnorePatterns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.as_strs())
    }
}

/// Deadlines applied to a single proxied request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeoutPolicy {
    /// Deadline for connecting and receiving the response head.
    pub request: Option<Duration>,
    /// Maximum wait for each response body frame.
    pub response: Option<Duration>,
}

impl TimeoutPolicy {
    /// Build the policy for a request to `path`.
    pub fn for_request(timeout_ms: Option<u64>, ignore: &IgnorePatterns, path: &str) -> Self {
        let timeout = match timeout_ms {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => return Self::default(),
        };

        let request = if ignore.matches(path) {
            None
        } else {
            Some(timeout)
        };

        Self {
            request,
            response: Some(timeout),
        }
    }
}

/// Request body that reports every frame it yields to the outbound deadline.
pub struct ActivityBody {
    inner: Body,
    activity: watch::Sender<()>,
}

impl ActivityBody {
    /// Wrap `body`. The receiver sees one change per frame and closes once
    /// the body is finished or dropped.
    pub fn wrap(body: Body) -> (Body, watch::Receiver<()>) {
        let (activity, rx) = watch::channel(());
        (Body::new(ActivityBody { inner: body, activity }), rx)
    }
}

impl HttpBody for ActivityBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, axum::Error>>> {
        let polled = Pin::new(&mut self.inner).poll_frame(cx);
        if let Poll::Ready(Some(Ok(_))) = &polled {
            self.activity.send_replace(());
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Drive `future` until it completes, or until `limit` passes with no
/// completion and no activity. Returns `None` on timeout.
///
/// The deadline restarts on every activity signal and once more when the
/// activity source closes.
pub async fn idle_timeout<F: Future>(
    limit: Duration,
    mut activity: watch::Receiver<()>,
    future: F,
) -> Option<F::Output> {
    tokio::pin!(future);
    let mut watching = true;

    loop {
        tokio::select! {
            biased;
            output = &mut future => return Some(output),
            changed = activity.changed(), if watching => {
                if changed.is_err() {
                    watching = false;
                }
            }
            _ = tokio::time::sleep(limit) => return None,
        }
    }
}
