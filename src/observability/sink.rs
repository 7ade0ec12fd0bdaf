//! Log sinks.
//!
//! # Responsibilities
//! - Define the seam between the request logger and whatever stores logs
//! - Provide the process-wide default sink backed by `tracing`
//!
//! # Design Decisions
//! - Sinks receive owned records; nothing is retained by the logger
//! - The default sink emits `request` and `response` as two fields, each
//!   holding its group serialized to a JSON string. `tracing` field names
//!   are static, so the groups cannot be spread into nested fields; under
//!   the JSON formatter they show up as escaped strings and need a second
//!   decode. Callers that want real nesting plug in their own [`LogSink`]
//!   and serialize the [`LogRecord`] directly.

use tracing::Level;

use crate::observability::record::LogRecord;

/// Target used for records emitted by [`TracingSink`].
pub const TRACING_TARGET: &str = "request_log";

/// Destination for request log records.
pub trait LogSink: Send + Sync + 'static {
    fn log(&self, record: LogRecord);
}

impl<F> LogSink for F
where
    F: Fn(LogRecord) + Send + Sync + 'static,
{
    fn log(&self, record: LogRecord) {
        self(record)
    }
}

/// Emits records as `tracing` events through the global dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! emit {
    ($level:expr, $message:ident, $request:ident, $response:ident) => {
        tracing::event!(
            target: TRACING_TARGET,
            $level,
            request = %$request,
            response = %$response,
            "{}",
            $message
        )
    };
}

impl LogSink for TracingSink {
    fn log(&self, record: LogRecord) {
        let request = serde_json::to_string(&record.request).unwrap_or_default();
        let response = serde_json::to_string(&record.response).unwrap_or_default();
        let message = record.message;

        match record.level {
            Level::ERROR => emit!(Level::ERROR, message, request, response),
            Level::WARN => emit!(Level::WARN, message, request, response),
            Level::INFO => emit!(Level::INFO, message, request, response),
            Level::DEBUG => emit!(Level::DEBUG, message, request, response),
            _ => emit!(Level::TRACE, message, request, response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::record::AttrGroup;
    use std::sync::{Arc, Mutex};

    #[test]
    fn closures_are_sinks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            move |record: LogRecord| seen.lock().unwrap().push(record.level)
        };

        sink.log(LogRecord::new(Level::WARN, AttrGroup::new(), AttrGroup::new()));
        let shared: Arc<dyn LogSink> = Arc::new(sink);
        shared.log(LogRecord::new(Level::INFO, AttrGroup::new(), AttrGroup::new()));

        assert_eq!(*seen.lock().unwrap(), vec![Level::WARN, Level::INFO]);
    }

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn captured_events(records: Vec<LogRecord>) -> Vec<serde_json::Value> {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            for record in records {
                TracingSink.log(record);
            }
        });

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn tracing_sink_emits_groups_under_request_log_target() {
        let mut request = AttrGroup::new();
        request.push("method", "GET");
        request.push("path", "/slog/1");
        let mut response = AttrGroup::new();
        response.push("status", 200u16);

        let events = captured_events(vec![LogRecord::new(Level::INFO, request, response)]);
        assert_eq!(events.len(), 1);
        let event = &events[0];

        assert_eq!(event["target"], TRACING_TARGET);
        assert_eq!(event["level"], "INFO");
        assert_eq!(event["fields"]["message"], "HTTP");

        let request: serde_json::Value =
            serde_json::from_str(event["fields"]["request"].as_str().unwrap()).unwrap();
        assert_eq!(request, serde_json::json!({ "method": "GET", "path": "/slog/1" }));
        let response: serde_json::Value =
            serde_json::from_str(event["fields"]["response"].as_str().unwrap()).unwrap();
        assert_eq!(response, serde_json::json!({ "status": 200 }));
    }

    #[test]
    fn tracing_sink_maps_every_level() {
        let levels = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE];
        let records = levels
            .iter()
            .map(|level| LogRecord::new(*level, AttrGroup::new(), AttrGroup::new()))
            .collect();

        let events = captured_events(records);
        let seen: Vec<&str> = events
            .iter()
            .map(|event| event["level"].as_str().unwrap())
            .collect();
        assert_eq!(seen, vec!["ERROR", "WARN", "INFO", "DEBUG", "TRACE"]);
    }
}
