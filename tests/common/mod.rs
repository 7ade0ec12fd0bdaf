//! Shared utilities for integration tests.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use request_log::{LogRecord, LogSink, RequestLogLayer};
use serde_json::{json, Value};

/// Sink that keeps every record in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

#[allow(dead_code)]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn single(&self) -> LogRecord {
        let records = self.records();
        assert_eq!(records.len(), 1, "expected exactly one record");
        records.into_iter().next().unwrap()
    }

    /// Records are emitted when the server drops the response body, which
    /// can trail the client reading it.
    pub async fn wait_for(&self, count: usize) -> Vec<LogRecord> {
        for _ in 0..100 {
            if self.len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.records()
    }
}

impl LogSink for MemorySink {
    fn log(&self, record: LogRecord) {
        self.records.lock().unwrap().push(record);
    }
}

/// Router with the handlers used across the log tests, wrapped in `layer`.
#[allow(dead_code)]
pub fn slog_router(layer: RequestLogLayer) -> Router {
    Router::new()
        .route("/slog/{id}", get(|| async { Json(json!({ "message": "slog" })) }))
        .route(
            "/slog",
            post(|Json(_payload): Json<Value>| async { Json(json!({ "message": "slog" })) }),
        )
        .route(
            "/stream",
            get(|| async {
                let chunks: Vec<Result<Bytes, Infallible>> = vec![
                    Ok(Bytes::from_static(b"one,")),
                    Ok(Bytes::from_static(b"two,")),
                    Ok(Bytes::from_static(b"three")),
                ];
                Body::from_stream(futures_util::stream::iter(chunks))
            }),
        )
        .route("/ignore-body", post(|| async { "ignored" }))
        .layer(layer)
}

/// Request carrying the peer address the server would have seen.
#[allow(dead_code)]
pub fn request(method: Method, uri: &str, body: Body) -> Request<Body> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "localhost")
        .header("referer", "http://localhost:8080")
        .body(body)
        .unwrap();
    let peer: SocketAddr = "127.0.0.1:443".parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(peer));
    req
}
