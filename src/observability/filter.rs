//! Request filters.
//!
//! A filter decides whether a request gets a log record: `true` keeps it,
//! `false` suppresses it. Filtering only affects logging; the request is
//! always handled.

use std::collections::HashSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};

/// Predicate evaluated before a request is logged.
pub type Filter = Arc<dyn Fn(&Request<Body>) -> bool + Send + Sync>;

/// Skip requests whose path equals one of `paths`.
pub fn ignore_paths<I, P>(paths: I) -> Filter
where
    I: IntoIterator<Item = P>,
    P: Into<String>,
{
    let paths: HashSet<String> = paths.into_iter().map(Into::into).collect();
    Arc::new(move |req: &Request<Body>| !paths.contains(req.uri().path()))
}

/// Skip requests whose path starts with one of `prefixes`.
pub fn ignore_path_prefixes<I, P>(prefixes: I) -> Filter
where
    I: IntoIterator<Item = P>,
    P: Into<String>,
{
    let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
    Arc::new(move |req: &Request<Body>| {
        let path = req.uri().path();
        !prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    })
}

/// Log only requests using one of `methods`.
pub fn only_methods<I>(methods: I) -> Filter
where
    I: IntoIterator<Item = Method>,
{
    let methods: Vec<Method> = methods.into_iter().collect();
    Arc::new(move |req: &Request<Body>| methods.contains(req.method()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn ignore_paths_is_exact() {
        let filter = ignore_paths(["/health", "/metrics"]);
        assert!(!filter(&request(Method::GET, "/health")));
        assert!(!filter(&request(Method::GET, "/metrics?x=1")));
        assert!(filter(&request(Method::GET, "/health/deep")));
        assert!(filter(&request(Method::GET, "/slog/1")));
    }

    #[test]
    fn ignore_prefixes() {
        let filter = ignore_path_prefixes(["/assets/"]);
        assert!(!filter(&request(Method::GET, "/assets/app.js")));
        assert!(filter(&request(Method::GET, "/api/assets")));
    }

    #[test]
    fn method_allow_list() {
        let filter = only_methods([Method::POST, Method::PUT]);
        assert!(filter(&request(Method::POST, "/slog")));
        assert!(!filter(&request(Method::GET, "/slog/1")));
    }
}
