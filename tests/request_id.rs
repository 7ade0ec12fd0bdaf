//! Request ID propagation through the standalone layer.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::routing::get;
use axum::{Extension, Router};
use http_body_util::BodyExt;
use request_log::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
use tower::ServiceExt;

fn app(layer: RequestIdLayer) -> Router {
    Router::new()
        .route(
            "/",
            get(|Extension(id): Extension<RequestId>| async move { id.into_inner() }),
        )
        .layer(layer)
}

async fn call(app: Router, req: Request<Body>) -> (Option<String>, String) {
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let header = response.request_id().map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (header, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn missing_header_gets_a_fresh_id() {
    let req = Request::get("/").body(Body::empty()).unwrap();
    let (header, seen_by_handler) = call(app(RequestIdLayer::new()), req).await;

    let header = header.unwrap();
    assert!(!header.is_empty());
    assert_eq!(header, seen_by_handler);
}

#[tokio::test]
async fn incoming_id_is_echoed() {
    let req = Request::get("/")
        .header(X_REQUEST_ID, "chenmingyong")
        .body(Body::empty())
        .unwrap();
    let (header, seen_by_handler) = call(app(RequestIdLayer::new()), req).await;

    assert_eq!(header.as_deref(), Some("chenmingyong"));
    assert_eq!(seen_by_handler, "chenmingyong");
}

#[tokio::test]
async fn empty_incoming_id_is_replaced() {
    let req = Request::get("/")
        .header(X_REQUEST_ID, "")
        .body(Body::empty())
        .unwrap();
    let (header, _) = call(app(RequestIdLayer::new()), req).await;

    assert!(!header.unwrap().is_empty());
}

#[tokio::test]
async fn custom_generator_is_used() {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    let layer =
        RequestIdLayer::with_generator(|| format!("req-{}", NEXT.fetch_add(1, Ordering::SeqCst)));
    let app = app(layer);

    let first = Request::get("/").body(Body::empty()).unwrap();
    let second = Request::get("/").body(Body::empty()).unwrap();
    let (first, _) = call(app.clone(), first).await;
    let (second, _) = call(app, second).await;

    assert_eq!(first.as_deref(), Some("req-1"));
    assert_eq!(second.as_deref(), Some("req-2"));
}

#[tokio::test]
async fn fresh_ids_differ_between_requests() {
    let app = app(RequestIdLayer::new());
    let (a, _) = call(app.clone(), Request::get("/").body(Body::empty()).unwrap()).await;
    let (b, _) = call(app, Request::get("/").body(Body::empty()).unwrap()).await;

    assert_ne!(a, b);
}

#[tokio::test]
async fn non_ascii_incoming_id_is_echoed_byte_for_byte() {
    let raw = HeaderValue::from_bytes("chénmingyong".as_bytes()).unwrap();
    let mut req = Request::get("/").body(Body::empty()).unwrap();
    req.headers_mut().insert(X_REQUEST_ID, raw.clone());

    let response = app(RequestIdLayer::new()).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(X_REQUEST_ID), Some(&raw));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap(), "chénmingyong");
}
