//! Request identity and structured request/response logging for axum.
//!
//! Two tower layers:
//!
//! - [`RequestIdLayer`] reuses or generates `X-Request-ID`, exposes it to
//!   handlers as a [`RequestId`] extension and echoes it on the response.
//! - [`RequestLogLayer`] emits one [`LogRecord`] per request with a
//!   `request` and a `response` attribute group, optionally including
//!   headers and captured bodies.
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use request_log::{LogConfig, RequestIdLayer, RequestLogLayer};
//!
//! let config = LogConfig::builder()
//!     .log_request_body(true)
//!     .filter(|req| req.uri().path() != "/health")
//!     .build();
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .layer(RequestLogLayer::with_config(config))
//!     .layer(RequestIdLayer::new());
//! ```

pub mod config;
pub mod http;
pub mod observability;

pub use config::AppConfig;
pub use http::{
    Capture, CaptureBody, HttpServer, RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID,
};
pub use observability::{
    AttrGroup, AttrValue, LogConfig, LogRecord, LogSink, RequestLogLayer, TracingSink,
};
