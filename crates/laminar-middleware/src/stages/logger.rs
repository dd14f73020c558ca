//! Access-log middleware.
//!
//! Logs one structured line per request after the rest of the chain has
//! returned, using what the [`ResponseWriter`] observed:
//!
//! - `method`, `path` - from the request
//! - `status` - first status written (200 if none)
//! - `size` - body bytes accepted by the sink
//! - `duration_ms` - time spent in the downstream chain
//! - `request_id` - when a [`RequestId`] is in the context
//!
//! Register it below [`RequestIdMiddleware`](super::RequestIdMiddleware) so
//! the request ID is available.

use std::time::{Duration, Instant};

use tracing::Level;

use super::request_id::RequestId;
use crate::context::Context;
use crate::middleware::{Middleware, Next};
use crate::response::ResponseWriter;
use crate::types::Request;

/// One access-log record.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestLog {
    /// The HTTP method.
    pub method: String,
    /// The request path.
    pub path: String,
    /// The observed response status.
    pub status: u16,
    /// Body bytes written.
    pub size: usize,
    /// Time spent in the downstream chain, in milliseconds.
    pub duration_ms: f64,
    /// The request ID, if one was assigned.
    pub request_id: Option<String>,
}

impl RequestLog {
    fn capture(
        ctx: &Context,
        method: String,
        path: String,
        writer: &ResponseWriter<'_>,
        elapsed: Duration,
    ) -> Self {
        Self {
            method,
            path,
            status: writer.status().as_u16(),
            size: writer.size(),
            duration_ms: elapsed.as_secs_f64() * 1000.0,
            request_id: ctx.value::<RequestId>().map(ToString::to_string),
        }
    }

    /// Returns the level a record is logged at: `WARN` for 5xx, `INFO` otherwise.
    pub fn level(&self) -> Level {
        if self.status >= 500 {
            Level::WARN
        } else {
            Level::INFO
        }
    }

    fn emit(&self) {
        let request_id = self.request_id.as_deref().unwrap_or("-");
        if self.level() == Level::WARN {
            tracing::warn!(
                method = %self.method,
                path = %self.path,
                status = self.status,
                size = self.size,
                duration_ms = self.duration_ms,
                request_id,
                "request completed"
            );
        } else {
            tracing::info!(
                method = %self.method,
                path = %self.path,
                status = self.status,
                size = self.size,
                duration_ms = self.duration_ms,
                request_id,
                "request completed"
            );
        }
    }
}

/// Middleware that logs every request once the chain below it returns.
#[derive(Debug, Clone, Default)]
pub struct LoggerMiddleware {
    _private: (),
}

impl LoggerMiddleware {
    /// Creates a logger middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Middleware for LoggerMiddleware {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn handle(
        &self,
        ctx: Context,
        writer: &mut ResponseWriter<'_>,
        request: &mut Request,
        next: Next<'_>,
    ) {
        let start = Instant::now();
        let method = request.method().to_string();
        let path = request.uri().path().to_string();

        next.run(ctx.clone(), writer, request);

        RequestLog::capture(&ctx, method, path, writer, start.elapsed()).emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{ResponseBuffer, ResponseSink};
    use bytes::Bytes;
    use http::StatusCode;

    fn request(method: &str, uri: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    #[test]
    fn test_capture_reads_writer_and_context() {
        let mut buffer = ResponseBuffer::new();
        let mut writer = ResponseWriter::new(&mut buffer);
        writer.write_header(StatusCode::CREATED);
        writer.write(b"12345").unwrap();

        let id = RequestId::new();
        let ctx = Context::background().with_value(id);
        let log = RequestLog::capture(
            &ctx,
            "POST".to_string(),
            "/items".to_string(),
            &writer,
            Duration::from_millis(3),
        );

        assert_eq!(log.method, "POST");
        assert_eq!(log.path, "/items");
        assert_eq!(log.status, 201);
        assert_eq!(log.size, 5);
        assert!((log.duration_ms - 3.0).abs() < 1e-9);
        assert_eq!(log.request_id, Some(id.to_string()));
        assert_eq!(log.level(), Level::INFO);
    }

    #[test]
    fn test_capture_defaults_to_ok() {
        let mut buffer = ResponseBuffer::new();
        let writer = ResponseWriter::new(&mut buffer);

        let log = RequestLog::capture(
            &Context::background(),
            "GET".to_string(),
            "/".to_string(),
            &writer,
            Duration::ZERO,
        );

        assert_eq!(log.status, 200);
        assert_eq!(log.size, 0);
        assert!(log.request_id.is_none());
    }

    #[test]
    fn test_server_errors_log_at_warn() {
        let log = RequestLog {
            method: "GET".to_string(),
            path: "/".to_string(),
            status: 503,
            size: 0,
            duration_ms: 0.0,
            request_id: None,
        };
        assert_eq!(log.level(), Level::WARN);
    }

    #[test]
    fn test_logger_passes_response_through() {
        let mut buffer = ResponseBuffer::new();
        let mut writer = ResponseWriter::new(&mut buffer);
        let mut req = request("GET", "/hello?x=1");

        let downstream = crate::Stack::from_middleware(vec![std::sync::Arc::new(
            crate::MiddlewareFn::new("teapot", |_ctx, writer, _request, _next| {
                writer.write_header(StatusCode::IM_A_TEAPOT);
            }),
        ) as crate::BoxedMiddleware]);
        LoggerMiddleware::new().handle(
            Context::background(),
            &mut writer,
            &mut req,
            Next::new(downstream.chain()),
        );
        drop(writer);

        assert_eq!(buffer.status(), Some(StatusCode::IM_A_TEAPOT));
    }
}
