//! Request/response logging middleware.
//!
//! # Data Flow
//! ```text
//! request
//!     → filters (any `false` → pass through, no record)
//!     → resolve request id (when enabled)
//!     → request group: time, method, path, query, params, route,
//!       client-ip, referer, host, [request-id], [user-agent], [header]
//!     → request body wrapped in CaptureBody
//!     → inner service
//!     → response body wrapped in LoggedBody
//!     → body finished / failed / dropped
//!     → request group += length, [body]
//!     → response group: time, status, latency, [header], length, [body]
//!     → LogSink
//! ```
//!
//! # Design Decisions
//! - The record is emitted once the response body is done, so response
//!   length and body are final; a drop without end-of-stream still emits
//! - Filtering only suppresses the record, never the request
//! - Inner service errors propagate unchanged and produce no record

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{FromRequestParts, MatchedPath, RawPathParams};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Request, Response, StatusCode};
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use http_body::{Body as HttpBody, Frame, SizeHint};
use tower::{Layer, Service};

use crate::http::body::{Capture, CaptureBody};
use crate::http::request::{client_ip, resolve_request_id, set_response_request_id, RequestId};
use crate::observability::options::LogConfig;
use crate::observability::record::{AttrGroup, LogRecord};
use crate::observability::sink::{LogSink, TracingSink};

/// Layer that emits one structured record per request.
#[derive(Clone)]
pub struct RequestLogLayer {
    config: Arc<LogConfig>,
    sink: Arc<dyn LogSink>,
}

impl RequestLogLayer {
    /// Default options, records go to `tracing`.
    pub fn new() -> Self {
        Self::with_config(LogConfig::default())
    }

    pub fn with_config(config: LogConfig) -> Self {
        Self {
            config: Arc::new(config),
            sink: Arc::new(TracingSink),
        }
    }

    /// Send records to `sink` instead of `tracing`.
    pub fn sink(self, sink: impl LogSink) -> Self {
        self.shared_sink(Arc::new(sink))
    }

    pub fn shared_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }
}

impl Default for RequestLogLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService {
            inner,
            config: self.config.clone(),
            sink: self.sink.clone(),
        }
    }
}

/// Service produced by [`RequestLogLayer`].
#[derive(Clone)]
pub struct RequestLogService<S> {
    inner: S,
    config: Arc<LogConfig>,
    sink: Arc<dyn LogSink>,
}

impl<S> Service<Request<Body>> for RequestLogService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        if !self.config.should_log(&req) {
            return Box::pin(self.inner.call(req));
        }

        let started = Utc::now();
        let start = Instant::now();
        let request_id = self
            .config
            .log_request_id()
            .then(|| resolve_request_id(&mut req, self.config.request_id_generator()));

        let config = self.config.clone();
        let sink = self.sink.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            let params = path_params(&mut parts).await;
            let request = request_group(&parts, params, started, request_id.as_ref(), &config);

            let request_capture = Capture::new(config.log_request_body());
            let body = Body::new(CaptureBody::new(body, request_capture.clone()));

            let response = inner.call(Request::from_parts(parts, body)).await?;

            let (mut parts, body) = response.into_parts();
            if let Some(id) = &request_id {
                set_response_request_id(&mut parts.headers, id);
            }
            let response_header = config
                .log_response_header()
                .then(|| header_group(&parts.headers));

            let pending = PendingRecord {
                config,
                sink,
                start,
                request,
                request_capture,
                status: parts.status,
                response_header,
            };
            let capture = Capture::new(pending.config.log_response_body());
            let body = LoggedBody::new(body, capture, pending);

            Ok(Response::from_parts(parts, Body::new(body)))
        })
    }
}

async fn path_params(parts: &mut Parts) -> AttrGroup {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(params) => {
            let mut group = AttrGroup::new();
            for (key, value) in params.iter() {
                group.push(key, value);
            }
            group
        }
        Err(_) => AttrGroup::new(),
    }
}

fn request_group(
    parts: &Parts,
    params: AttrGroup,
    started: DateTime<Utc>,
    request_id: Option<&RequestId>,
    config: &LogConfig,
) -> AttrGroup {
    let route = parts
        .extensions
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_default();
    let host = header_str(&parts.headers, header::HOST)
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()))
        .unwrap_or_default();

    let mut group = AttrGroup::with_capacity(14);
    group.push("time", started);
    group.push("method", parts.method.as_str());
    group.push("path", parts.uri.path());
    group.push("query", parts.uri.query().unwrap_or_default());
    group.push("params", params);
    group.push("route", route);
    group.push("client-ip", client_ip(parts));
    group.push("referer", header_str(&parts.headers, header::REFERER).unwrap_or_default());
    group.push("host", host);

    if let Some(id) = request_id {
        group.push("request-id", id.as_str());
    }
    if config.log_user_agent() {
        group.push(
            "user-agent",
            header_str(&parts.headers, header::USER_AGENT).unwrap_or_default(),
        );
    }
    if config.log_request_header() {
        group.push("header", header_group(&parts.headers));
    }
    group
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// One entry per header name, all values in arrival order.
fn header_group(headers: &HeaderMap) -> AttrGroup {
    let mut group = AttrGroup::with_capacity(headers.keys_len());
    for name in headers.keys() {
        let values: Vec<String> = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();
        group.push(name.as_str(), values);
    }
    group
}

/// Everything known about a request once its handler has answered.
struct PendingRecord {
    config: Arc<LogConfig>,
    sink: Arc<dyn LogSink>,
    start: Instant,
    request: AttrGroup,
    request_capture: Capture,
    status: StatusCode,
    response_header: Option<AttrGroup>,
}

impl PendingRecord {
    fn emit(self, response_capture: &Capture) {
        let latency = self.start.elapsed();
        let finished = Utc::now();

        let mut request = self.request;
        request.push("length", self.request_capture.bytes());
        if self.config.log_request_body() {
            request.push("body", self.request_capture.contents_lossy());
        }

        let mut response = AttrGroup::with_capacity(6);
        response.push("time", finished);
        response.push("status", self.status.as_u16());
        response.push("latency", latency);
        if let Some(header) = self.response_header {
            response.push("header", header);
        }
        response.push("length", response_capture.bytes());
        if self.config.log_response_body() {
            response.push("body", response_capture.contents_lossy());
        }

        self.sink
            .log(LogRecord::new(self.config.level(), request, response));
    }
}

/// Response body that emits the pending record when it completes.
struct LoggedBody {
    inner: CaptureBody<Body>,
    pending: Option<PendingRecord>,
}

impl LoggedBody {
    fn new(body: Body, capture: Capture, pending: PendingRecord) -> Self {
        Self {
            inner: CaptureBody::new(body, capture),
            pending: Some(pending),
        }
    }

    fn finish(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.emit(self.inner.capture());
        }
    }
}

impl HttpBody for LoggedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) | Poll::Ready(Some(Err(_))) => this.finish(),
            Poll::Ready(Some(Ok(_))) if this.inner.is_end_stream() => this.finish(),
            _ => {}
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

impl Drop for LoggedBody {
    fn drop(&mut self) {
        self.finish();
    }
}
