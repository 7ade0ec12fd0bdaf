//! HTTP plumbing.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → request.rs (resolve / generate X-Request-ID, client address)
//!     → body.rs (count and optionally mirror request body bytes)
//!     → handler
//!     → body.rs (count and optionally mirror response body bytes)
//!     → request.rs (echo X-Request-ID on the response)
//! ```
//!
//! server.rs wires everything into a small demo application.

pub mod body;
pub mod request;
pub mod server;

pub use body::{Capture, CaptureBody};
pub use request::{
    client_ip, request_id_header, resolve_request_id, MakeRequestId, MakeRequestUuid, RequestId,
    RequestIdExt, RequestIdLayer, RequestIdService, X_REQUEST_ID,
};
pub use server::HttpServer;
