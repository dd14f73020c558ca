//! Request ID middleware.
//!
//! Generates or extracts a unique ID for each request, stores it in the
//! [`Context`] for the units below, and echoes it back in the
//! `x-request-id` response header.
//!
//! ## Request ID Sources
//!
//! 1. **X-Request-ID header**: used when the middleware trusts incoming IDs
//!    and the header holds a valid UUID
//! 2. **Generated UUID v7**: otherwise
//!
//! UUID v7 values are time-ordered, so sorting log lines by request ID
//! roughly sorts them by arrival.

use std::fmt;

use http::HeaderValue;
use uuid::Uuid;

use crate::context::Context;
use crate::middleware::{Middleware, Next};
use crate::response::{ResponseSink, ResponseWriter};
use crate::types::Request;

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Unique identifier of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered request ID (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Middleware that generates or extracts request IDs.
///
/// # Behavior
///
/// 1. If trusted, read `x-request-id` from the request
/// 2. Otherwise (or if it is not a UUID) generate a UUID v7
/// 3. Store the [`RequestId`] in the context passed to `next`
/// 4. Set `x-request-id` on the response right before its status is sent
///
/// # Example
///
/// ```
/// use laminar_middleware::stages::RequestIdMiddleware;
/// use laminar_middleware::Stack;
///
/// let mut stack = Stack::new();
/// stack.register(RequestIdMiddleware::trust_incoming());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    /// Whether to reuse a valid incoming `x-request-id`.
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Creates a middleware that always generates a fresh ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a middleware that reuses valid incoming `x-request-id` values.
    ///
    /// Use this behind a proxy or gateway that already assigns request IDs.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    fn extract_request_id(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }

        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(RequestId::from_uuid)
    }
}

fn header_value(id: RequestId) -> Option<HeaderValue> {
    HeaderValue::from_str(&id.to_string()).ok()
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn handle(
        &self,
        ctx: Context,
        writer: &mut ResponseWriter<'_>,
        request: &mut Request,
        next: Next<'_>,
    ) {
        let request_id = self
            .extract_request_id(request)
            .unwrap_or_else(RequestId::new);

        writer.before(move |headers, _status| {
            if let Some(value) = header_value(request_id) {
                headers.insert(REQUEST_ID_HEADER, value);
            }
        });

        next.run(ctx.with_value(request_id), writer, request);

        // Nothing was written, so the headers are still pending.
        if !writer.written() {
            if let Some(value) = header_value(request_id) {
                writer.headers_mut().insert(REQUEST_ID_HEADER, value);
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
    use std::sync::{Arc, Mutex};

    fn request_with_id(request_id: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/test");
        if let Some(id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Bytes::new()).unwrap()
    }

    /// Serves through `middleware` followed by a unit that captures the
    /// context's request ID and writes a body.
    fn serve(middleware: RequestIdMiddleware, request_id: Option<&str>) -> (ResponseBuffer, Option<RequestId>) {
        let seen = Arc::new(Mutex::new(None));
        let capture = seen.clone();

        let mut stack = Stack::new();
        stack.register(middleware);
        stack.register_fn("capture", move |ctx, writer, _request, _next| {
            *capture.lock().unwrap() = ctx.value::<RequestId>().copied();
            writer.write(b"ok").unwrap();
        });

        let mut buffer = ResponseBuffer::new();
        stack.serve(&mut buffer, &mut request_with_id(request_id));
        let id = *seen.lock().unwrap();
        (buffer, id)
    }

    #[test]
    fn test_generates_request_id_when_missing() {
        let (buffer, id) = serve(RequestIdMiddleware::new(), None);

        let id = id.expect("request id in context");
        assert_eq!(id.as_uuid().get_version_num(), 7);
        assert_eq!(
            buffer.headers().get(REQUEST_ID_HEADER).unwrap(),
            id.to_string().as_str()
        );
    }

    #[test]
    fn test_ignores_incoming_id_when_not_trusted() {
        let incoming = "12345678-1234-7234-1234-123456789abc";
        let (buffer, id) = serve(RequestIdMiddleware::new(), Some(incoming));

        assert_ne!(id.unwrap().to_string(), incoming);
        assert_ne!(buffer.headers().get(REQUEST_ID_HEADER).unwrap(), incoming);
    }

    #[test]
    fn test_uses_incoming_id_when_trusted() {
        let incoming = "12345678-1234-7234-1234-123456789abc";
        let (buffer, id) = serve(RequestIdMiddleware::trust_incoming(), Some(incoming));

        assert_eq!(id.unwrap().to_string(), incoming);
        assert_eq!(buffer.headers().get(REQUEST_ID_HEADER).unwrap(), incoming);
    }

    #[test]
    fn test_invalid_incoming_id_is_replaced() {
        let (_buffer, id) = serve(RequestIdMiddleware::trust_incoming(), Some("not-a-uuid"));
        assert_eq!(id.unwrap().as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_header_set_when_nothing_written() {
        let mut stack = Stack::new();
        stack.register(RequestIdMiddleware::new());

        let mut buffer = ResponseBuffer::new();
        stack.serve(&mut buffer, &mut request_with_id(None));

        assert!(buffer.status().is_none());
        let response = buffer.into_response();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }
}
