//! Request identity.
//!
//! # Responsibilities
//! - Reuse the caller's `X-Request-ID` or generate a new one (UUID v4)
//! - Write the id back onto the request headers for downstream handlers
//! - Store the id in request extensions as [`RequestId`]
//! - Echo the id on the response
//! - Resolve the client address the way a proxy-aware server sees it
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A present, non-empty header wins; the layer never rewrites it
//! - Generation sits behind [`MakeRequestId`] so callers can swap formats

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};
use uuid::Uuid;

/// Header carrying the request identifier.
pub const X_REQUEST_ID: &str = "x-request-id";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Identifier of one request/response cycle.
///
/// Keeps the header bytes exactly as received so the echo matches the
/// caller's value even when it is not visible ASCII. The string form is a
/// lossy UTF-8 rendering used for logs and handlers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId {
    id: String,
    header: Option<HeaderValue>,
}

impl RequestId {
    /// `header` is `None` when `id` is not a valid header value.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let header = HeaderValue::from_str(&id).ok();
        Self { id, header }
    }

    pub fn from_header(value: &HeaderValue) -> Self {
        Self {
            id: String::from_utf8_lossy(value.as_bytes()).into_owned(),
            header: Some(value.clone()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn header_value(&self) -> Option<&HeaderValue> {
        self.header.as_ref()
    }

    pub fn into_inner(self) -> String {
        self.id
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Produces fresh request identifiers.
pub trait MakeRequestId: Send + Sync + 'static {
    fn make_request_id(&self) -> String;
}

/// Random UUID v4 in hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

impl<F> MakeRequestId for F
where
    F: Fn() -> String + Send + Sync + 'static,
{
    fn make_request_id(&self) -> String {
        self()
    }
}

/// Raw `x-request-id` value, `None` when missing or empty.
pub fn request_id_header(headers: &HeaderMap) -> Option<&HeaderValue> {
    headers.get(X_REQUEST_ID).filter(|value| !value.is_empty())
}

/// Read access to the request id from anything that carries one.
///
/// Header lookups only see visible-ASCII values; the [`RequestId`]
/// extension carries the lossy form of anything else.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for HeaderMap {
    fn request_id(&self) -> Option<&str> {
        self.get(X_REQUEST_ID)?
            .to_str()
            .ok()
            .filter(|id| !id.is_empty())
    }
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.extensions()
            .get::<RequestId>()
            .map(RequestId::as_str)
            .or_else(|| self.headers().request_id())
    }
}

impl RequestIdExt for Parts {
    fn request_id(&self) -> Option<&str> {
        self.extensions
            .get::<RequestId>()
            .map(RequestId::as_str)
            .or_else(|| self.headers.request_id())
    }
}

impl<B> RequestIdExt for Response<B> {
    fn request_id(&self) -> Option<&str> {
        self.headers().request_id()
    }
}

/// Resolves the id for `req`, generating one when the header is missing.
///
/// On return the request header and the [`RequestId`] extension both hold
/// the resolved value. Calling this again on the same request is a no-op.
pub fn resolve_request_id<B>(req: &mut Request<B>, generator: &dyn MakeRequestId) -> RequestId {
    if let Some(id) = request_id_header(req.headers()).map(RequestId::from_header) {
        req.extensions_mut().insert(id.clone());
        return id;
    }

    let id = RequestId::new(generator.make_request_id());
    match id.header_value() {
        Some(value) => {
            req.headers_mut()
                .insert(HeaderName::from_static(X_REQUEST_ID), value.clone());
        }
        None => {
            tracing::warn!(request_id = %id, "Generated request id is not a valid header value");
        }
    }
    req.extensions_mut().insert(id.clone());
    id
}

/// Sets `x-request-id` on an outgoing header map.
pub fn set_response_request_id(headers: &mut HeaderMap, id: &RequestId) {
    if let Some(value) = id.header_value() {
        headers.insert(HeaderName::from_static(X_REQUEST_ID), value.clone());
    }
}

/// Best-effort client address: `X-Forwarded-For`, `X-Real-IP`, then the peer.
pub fn client_ip(parts: &Parts) -> String {
    let forwarded = parts
        .headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = parts
        .headers
        .get(X_REAL_IP)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

/// Layer that tags every request with an id and echoes it on the response.
#[derive(Clone)]
pub struct RequestIdLayer {
    generator: Arc<dyn MakeRequestId>,
}

impl RequestIdLayer {
    pub fn new() -> Self {
        Self::with_generator(MakeRequestUuid)
    }

    pub fn with_generator(generator: impl MakeRequestId) -> Self {
        Self {
            generator: Arc::new(generator),
        }
    }
}

impl Default for RequestIdLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService {
            inner,
            generator: self.generator.clone(),
        }
    }
}

/// Service produced by [`RequestIdLayer`].
#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
    generator: Arc<dyn MakeRequestId>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestIdService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    ResBody: 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let id = resolve_request_id(&mut req, self.generator.as_ref());
        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.await?;
            set_response_request_id(response.headers_mut(), &id);
            Ok(response)
        })
    }
}
