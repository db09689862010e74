//! `x-request-id` generation, capture, and the per-request span.

use std::convert::Infallible;
use std::fmt;

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, HeaderName, Request},
    middleware::Next,
    response::Response,
};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    request_id::{MakeRequestId, RequestId as HeaderRequestId},
    trace::TraceLayer,
};
use tracing::field::Empty;

/// Placeholder used when a request reached a handler without an id.
pub const UNKNOWN_REQUEST_ID: &str = "n/a";

pub fn header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

/// The id of the request being served. Extracting it never fails: requests that
/// bypassed [`capture_request_id`] get [`UNKNOWN_REQUEST_ID`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId(UNKNOWN_REQUEST_ID.to_string())))
    }
}

/// Generates a nanoid for requests that arrive without `x-request-id`.
#[derive(Clone, Default)]
pub struct MakeNanoId;

impl MakeRequestId for MakeNanoId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<HeaderRequestId> {
        let id = nanoid::nanoid!();
        Some(HeaderRequestId::new(id.parse().ok()?))
    }
}

/// Copies the `x-request-id` header into request extensions and the `http_request` span.
pub async fn capture_request_id(mut req: Request<Body>, next: Next) -> Response {
    let rid = req
        .headers()
        .get(header())
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| UNKNOWN_REQUEST_ID.to_string(), str::to_owned);

    tracing::Span::current().record("request_id", tracing::field::display(&rid));
    req.extensions_mut().insert(RequestId(rid));

    next.run(req).await
}

/// Span per request; `request_id` is filled in by [`capture_request_id`].
#[allow(clippy::type_complexity)]
pub fn http_trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl Fn(&Request<Body>) -> tracing::Span + Clone,
> {
    TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = Empty,
        )
    })
}
