//! Configuration schema definitions.
//!
//! This module defines the configuration file structure for the demo
//! server. All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::observability::filter::ignore_paths;
use crate::observability::options::LogConfig;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Request size and time limits.
    pub limits: LimitsConfig,

    /// Process-wide subscriber settings.
    pub logging: LoggingConfig,

    /// Request logger toggles.
    pub request_log: RequestLogConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Limits applied in front of the request logger.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted request body; also caps what the logger buffers.
    pub max_body_bytes: usize,

    /// Handler timeout.
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Subscriber configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Request logger settings as they appear on disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestLogConfig {
    /// Level of the emitted record.
    pub level: String,
    pub log_request_id: bool,
    pub log_user_agent: bool,
    pub log_request_header: bool,
    pub log_request_body: bool,
    pub log_response_header: bool,
    pub log_response_body: bool,

    /// Exact paths that never get a record (e.g. "/health").
    pub skip_paths: Vec<String>,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_request_id: true,
            log_user_agent: false,
            log_request_header: false,
            log_request_body: false,
            log_response_header: false,
            log_response_body: false,
            skip_paths: Vec::new(),
        }
    }
}

impl RequestLogConfig {
    /// Build the middleware options. An unparsable level falls back to INFO.
    pub fn to_log_config(&self) -> LogConfig {
        let level = self.level.parse::<Level>().unwrap_or(Level::INFO);
        let mut builder = LogConfig::builder()
            .level(level)
            .log_request_id(self.log_request_id)
            .log_user_agent(self.log_user_agent)
            .log_request_header(self.log_request_header)
            .log_request_body(self.log_request_body)
            .log_response_header(self.log_response_header)
            .log_response_body(self.log_response_body);
        if !self.skip_paths.is_empty() {
            builder = builder.filters(vec![ignore_paths(self.skip_paths.iter().cloned())]);
        }
        builder.build()
    }
}
