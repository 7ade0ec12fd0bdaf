//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! RequestLogLayer (request_log.rs)
//!     → filters (filter.rs) decide whether a record is built
//!     → options.rs toggles decide which attributes are captured
//!     → record.rs (request / response attribute groups)
//!     → sink.rs (LogSink; default TracingSink)
//!     → logging.rs subscriber (stdout, JSON or pretty)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every record
//! - Capturing bodies is opt-in; byte counts are always recorded

pub mod filter;
pub mod logging;
pub mod options;
pub mod record;
pub mod request_log;
pub mod sink;

pub use filter::Filter;
pub use options::{LogConfig, LogConfigBuilder};
pub use record::{Attr, AttrGroup, AttrValue, LogRecord};
pub use request_log::{RequestLogLayer, RequestLogService};
pub use sink::{LogSink, TracingSink};
