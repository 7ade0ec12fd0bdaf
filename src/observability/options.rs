//! Request logger options.
//!
//! [`LogConfig`] is built once when the layer is registered and shared
//! read-only by every request. Defaults: level `INFO`, request id logged,
//! every other toggle off, no filters.

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use tracing::Level;

use crate::http::request::{MakeRequestId, MakeRequestUuid};
use crate::observability::filter::Filter;

/// Verbosity toggles and filters for the request logger.
#[derive(Clone)]
pub struct LogConfig {
    level: Level,
    log_request_id: bool,
    log_user_agent: bool,
    log_request_header: bool,
    log_request_body: bool,
    log_response_header: bool,
    log_response_body: bool,
    filters: Vec<Filter>,
    generator: Arc<dyn MakeRequestId>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_request_id: true,
            log_user_agent: false,
            log_request_header: false,
            log_request_body: false,
            log_response_header: false,
            log_response_body: false,
            filters: Vec::new(),
            generator: Arc::new(MakeRequestUuid),
        }
    }
}

impl fmt::Debug for LogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogConfig")
            .field("level", &self.level)
            .field("log_request_id", &self.log_request_id)
            .field("log_user_agent", &self.log_user_agent)
            .field("log_request_header", &self.log_request_header)
            .field("log_request_body", &self.log_request_body)
            .field("log_response_header", &self.log_response_header)
            .field("log_response_body", &self.log_response_body)
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl LogConfig {
    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn log_request_id(&self) -> bool {
        self.log_request_id
    }

    pub fn log_user_agent(&self) -> bool {
        self.log_user_agent
    }

    pub fn log_request_header(&self) -> bool {
        self.log_request_header
    }

    pub fn log_request_body(&self) -> bool {
        self.log_request_body
    }

    pub fn log_response_header(&self) -> bool {
        self.log_response_header
    }

    pub fn log_response_body(&self) -> bool {
        self.log_response_body
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn request_id_generator(&self) -> &dyn MakeRequestId {
        self.generator.as_ref()
    }

    /// True when every filter accepts the request.
    pub fn should_log(&self, req: &Request<Body>) -> bool {
        self.filters.iter().all(|filter| filter(req))
    }
}

/// Applies option setters in order on top of the defaults.
#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    pub fn level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    pub fn log_request_id(mut self, enabled: bool) -> Self {
        self.config.log_request_id = enabled;
        self
    }

    pub fn log_user_agent(mut self, enabled: bool) -> Self {
        self.config.log_user_agent = enabled;
        self
    }

    pub fn log_request_header(mut self, enabled: bool) -> Self {
        self.config.log_request_header = enabled;
        self
    }

    pub fn log_request_body(mut self, enabled: bool) -> Self {
        self.config.log_request_body = enabled;
        self
    }

    pub fn log_response_header(mut self, enabled: bool) -> Self {
        self.config.log_response_header = enabled;
        self
    }

    pub fn log_response_body(mut self, enabled: bool) -> Self {
        self.config.log_response_body = enabled;
        self
    }

    /// Append one filter.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Request<Body>) -> bool + Send + Sync + 'static,
    {
        self.config.filters.push(Arc::new(filter));
        self
    }

    /// Replace the filter list.
    pub fn filters(mut self, filters: Vec<Filter>) -> Self {
        self.config.filters = filters;
        self
    }

    pub fn request_id_generator(mut self, generator: impl MakeRequestId) -> Self {
        self.config.generator = Arc::new(generator);
        self
    }

    pub fn build(self) -> LogConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::filter::ignore_paths;

    #[test]
    fn defaults() {
        let config = LogConfig::default();
        assert_eq!(config.level(), Level::INFO);
        assert!(config.log_request_id());
        assert!(!config.log_user_agent());
        assert!(!config.log_request_header());
        assert!(!config.log_request_body());
        assert!(!config.log_response_header());
        assert!(!config.log_response_body());
        assert!(config.filters().is_empty());
    }

    #[test]
    fn setters_apply_in_order() {
        let config = LogConfig::builder()
            .level(Level::DEBUG)
            .log_request_body(true)
            .log_request_body(false)
            .log_response_body(true)
            .log_request_id(false)
            .build();

        assert_eq!(config.level(), Level::DEBUG);
        assert!(!config.log_request_body());
        assert!(config.log_response_body());
        assert!(!config.log_request_id());
    }

    #[test]
    fn filters_replace_then_append() {
        let config = LogConfig::builder()
            .filter(|_| false)
            .filters(vec![ignore_paths(["/health"])])
            .filter(|req| req.method() != axum::http::Method::DELETE)
            .build();
        assert_eq!(config.filters().len(), 2);

        let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let other = Request::builder().uri("/slog/1").body(Body::empty()).unwrap();
        assert!(!config.should_log(&health));
        assert!(config.should_log(&other));
    }

    #[test]
    fn no_filters_logs_everything() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert!(LogConfig::default().should_log(&req));
    }

    #[test]
    fn custom_generator() {
        let config = LogConfig::builder()
            .request_id_generator(|| "static-id".to_string())
            .build();
        assert_eq!(config.request_id_generator().make_request_id(), "static-id");
    }
}
