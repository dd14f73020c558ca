//! Panic recovery middleware.
//!
//! Without this stage a panic in any unit unwinds out of
//! [`Stack::serve`](crate::Stack::serve). Registered near the top of a stack,
//! it catches panics raised below it, logs them, and writes a
//! `500 Internal Server Error` if nothing was written yet. Anything already
//! written stays as is.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use http::StatusCode;

use crate::context::Context;
use crate::middleware::{Middleware, Next};
use crate::response::{ResponseSink, ResponseWriter};
use crate::types::Request;

const DEFAULT_BODY: &str = "Internal Server Error";

/// Middleware that turns downstream panics into a 500 response.
#[derive(Debug, Clone)]
pub struct RecoveryMiddleware {
    body: String,
}

impl RecoveryMiddleware {
    /// Creates a recovery middleware with the default response body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the body written with the 500 status.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

impl Default for RecoveryMiddleware {
    fn default() -> Self {
        Self {
            body: DEFAULT_BODY.to_string(),
        }
    }
}

/// Extracts the message of a panic payload, if it is a string.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl Middleware for RecoveryMiddleware {
    fn name(&self) -> &'static str {
        "recovery"
    }

    fn handle(
        &self,
        ctx: Context,
        writer: &mut ResponseWriter<'_>,
        request: &mut Request,
        next: Next<'_>,
    ) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            next.run(ctx, writer, request);
        }));

        let Err(payload) = outcome else {
            return;
        };

        tracing::error!(
            panic = panic_message(payload.as_ref()),
            method = %request.method(),
            path = request.uri().path(),
            already_written = writer.written(),
            "recovered from panic in middleware chain"
        );

        if !writer.written() {
            writer.write_header(StatusCode::INTERNAL_SERVER_ERROR);
            if let Err(error) = writer.write(self.body.as_bytes()) {
                tracing::debug!(%error, "failed to write recovery body");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseBuffer;
    use crate::Stack;
    use bytes::Bytes;

    fn request() -> Request {
        http::Request::builder()
            .uri("/boom")
            .body(Bytes::new())
            .unwrap()
    }

    #[test]
    fn test_panic_becomes_500() {
        let mut stack = Stack::new();
        stack.register(RecoveryMiddleware::new());
        stack.register_fn("boom", |_ctx, _writer, _request, _next| {
            panic!("kaboom");
        });

        let mut buffer = ResponseBuffer::new();
        stack.serve(&mut buffer, &mut request());

        assert_eq!(buffer.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(buffer.body(), DEFAULT_BODY.as_bytes());
    }

    #[test]
    fn test_partial_response_is_kept() {
        let mut stack = Stack::new();
        stack.register(RecoveryMiddleware::new().body("oops"));
        stack.register_fn("half", |_ctx, writer, _request, _next| {
            writer.write_header(StatusCode::ACCEPTED);
            writer.write(b"partial").unwrap();
            panic!("after writing");
        });

        let mut buffer = ResponseBuffer::new();
        stack.serve(&mut buffer, &mut request());

        assert_eq!(buffer.status(), Some(StatusCode::ACCEPTED));
        assert_eq!(buffer.body(), b"partial");
    }

    #[test]
    fn test_no_panic_passes_through() {
        let mut stack = Stack::new();
        stack.register(RecoveryMiddleware::new());
        stack.register_fn("ok", |_ctx, writer, _request, _next| {
            writer.write(b"fine").unwrap();
        });

        let mut buffer = ResponseBuffer::new();
        stack.serve(&mut buffer, &mut request());

        assert_eq!(buffer.status(), Some(StatusCode::OK));
        assert_eq!(buffer.body(), b"fine");
    }

    #[test]
    fn test_panic_without_recovery_propagates() {
        let mut stack = Stack::new();
        stack.register_fn("boom", |_ctx, _writer, _request, _next| {
            panic!("unhandled");
        });

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            stack.serve(&mut ResponseBuffer::new(), &mut request());
        }));

        let payload = result.unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "unhandled");
    }

    #[test]
    fn test_panic_message_formats() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(42_u8);

        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
