//! Response sinks and the observing writer handed to middleware.
//!
//! A [`ResponseSink`] is the raw response-writing capability provided by the
//! host. During a [`Stack::serve`](crate::Stack::serve) call the sink is
//! wrapped in a [`ResponseWriter`], which forwards every call unchanged while
//! recording the status code and the number of body bytes written. Every
//! unit in the chain shares the same writer, so a unit can inspect on its way
//! back up what the units below it produced.
//!
//! [`ResponseBuffer`] is an in-memory sink. The host server collects each
//! response into one, and tests use it to inspect what the chain wrote.

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;

/// The raw response-writing interface of the host HTTP stack.
pub trait ResponseSink {
    /// Returns the response headers that will be sent with the status line.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Sends the status line (and the headers collected so far).
    fn write_header(&mut self, status: StatusCode);

    /// Writes body bytes, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// A callback run once, right before the first status reaches the sink.
type BeforeHook = Box<dyn FnOnce(&mut HeaderMap, StatusCode)>;

/// Observing wrapper around a [`ResponseSink`].
///
/// # Behavior
///
/// - `write_header(C)` records `C` if no status was recorded yet, then
///   forwards `C` to the sink. Later calls are still forwarded but do not
///   change the observed status.
/// - `write(B)` first performs an implicit `write_header(200)` when no
///   status was recorded, then forwards `B` and adds the accepted byte
///   count to [`size`](Self::size).
/// - Sink errors are returned unchanged.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use laminar_middleware::{ResponseBuffer, ResponseSink, ResponseWriter};
///
/// let mut buffer = ResponseBuffer::new();
/// let mut writer = ResponseWriter::new(&mut buffer);
///
/// writer.write_header(StatusCode::BAD_REQUEST);
/// writer.write(b"nope!").unwrap();
///
/// assert_eq!(writer.status(), StatusCode::BAD_REQUEST);
/// assert_eq!(writer.size(), 5);
/// ```
pub struct ResponseWriter<'a> {
    sink: &'a mut dyn ResponseSink,
    status: Option<StatusCode>,
    size: usize,
    before: Vec<BeforeHook>,
}

impl<'a> ResponseWriter<'a> {
    /// Wraps a raw sink for the duration of one request.
    pub fn new(sink: &'a mut dyn ResponseSink) -> Self {
        Self {
            sink,
            status: None,
            size: 0,
            before: Vec::new(),
        }
    }

    /// Returns the observed status, or `200 OK` if none was written yet.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Returns `true` once a status has been written, explicitly or implicitly.
    pub fn written(&self) -> bool {
        self.status.is_some()
    }

    /// Returns the number of body bytes accepted by the sink so far.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Registers a hook that runs right before the status is first sent.
    ///
    /// Hooks may still edit headers at that point. They run newest first,
    /// and never run if the response was already written when the next
    /// status write happens.
    pub fn before<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut HeaderMap, StatusCode) + 'static,
    {
        self.before.push(Box::new(hook));
    }
}

impl ResponseSink for ResponseWriter<'_> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.sink.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
            let hooks = std::mem::take(&mut self.before);
            for hook in hooks.into_iter().rev() {
                hook(self.sink.headers_mut(), status);
            }
        }
        self.sink.write_header(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.write_header(StatusCode::OK);
        }
        let written = self.sink.write(buf)?;
        self.size += written;
        Ok(written)
    }
}

impl fmt::Debug for ResponseWriter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseWriter")
            .field("status", &self.status)
            .field("size", &self.size)
            .field("before_hooks", &self.before.len())
            .finish_non_exhaustive()
    }
}

/// In-memory [`ResponseSink`].
///
/// The first status written wins; later status writes are ignored, as an
/// HTTP connection cannot send a second status line. Headers are
/// snapshotted when the status is written.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    status: Option<StatusCode>,
    headers: HeaderMap,
    sent_headers: Option<HeaderMap>,
    body: BytesMut,
}

impl ResponseBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status that was sent, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the headers as sent with the status line, or the pending
    /// headers if no status was sent.
    pub fn headers(&self) -> &HeaderMap {
        self.sent_headers.as_ref().unwrap_or(&self.headers)
    }

    /// Returns the body bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Converts the buffer into an HTTP response.
    ///
    /// A buffer that never saw a status becomes `200 OK`, matching what an
    /// HTTP server sends when a handler returns without writing.
    pub fn into_response(self) -> http::Response<Full<Bytes>> {
        let headers = self.sent_headers.unwrap_or(self.headers);
        let mut response = http::Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = headers;
        response
    }
}

impl ResponseSink for ResponseBuffer {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.status.is_some() {
            tracing::debug!(
                ignored = status.as_u16(),
                "superfluous status write on buffered response"
            );
            return;
        }
        self.status = Some(status);
        self.sent_headers = Some(self.headers.clone());
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    /// A sink that records every call so forwarding can be checked.
    #[derive(Default)]
    struct CallLog {
        headers: HeaderMap,
        calls: Vec<String>,
        fail_writes: bool,
    }

    impl ResponseSink for CallLog {
        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.headers
        }

        fn write_header(&mut self, status: StatusCode) {
            self.calls.push(format!("status:{}", status.as_u16()));
        }

        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"));
            }
            self.calls.push(format!("body:{}", String::from_utf8_lossy(buf)));
            Ok(buf.len())
        }
    }

    #[test]
    fn test_writer_defaults() {
        let mut sink = CallLog::default();
        let writer = ResponseWriter::new(&mut sink);

        assert_eq!(writer.status(), StatusCode::OK);
        assert_eq!(writer.size(), 0);
        assert!(!writer.written());
    }

    #[test]
    fn test_status_then_body() {
        let mut sink = CallLog::default();
        let mut writer = ResponseWriter::new(&mut sink);

        writer.write_header(StatusCode::BAD_REQUEST);
        writer.write(b"hello").unwrap();

        assert_eq!(writer.status(), StatusCode::BAD_REQUEST);
        assert_eq!(writer.size(), 5);
        assert!(writer.written());
        drop(writer);
        assert_eq!(sink.calls, vec!["status:400", "body:hello"]);
    }

    #[test]
    fn test_body_implies_ok_status() {
        let mut sink = CallLog::default();
        let mut writer = ResponseWriter::new(&mut sink);

        writer.write(b"foo").unwrap();
        writer.write(b"bar").unwrap();

        assert_eq!(writer.status(), StatusCode::OK);
        assert_eq!(writer.size(), 6);
        drop(writer);
        assert_eq!(sink.calls, vec!["status:200", "body:foo", "body:bar"]);
    }

    #[test]
    fn test_first_status_is_observed_but_all_are_forwarded() {
        let mut sink = CallLog::default();
        let mut writer = ResponseWriter::new(&mut sink);

        writer.write_header(StatusCode::CREATED);
        writer.write_header(StatusCode::NOT_FOUND);

        assert_eq!(writer.status(), StatusCode::CREATED);
        drop(writer);
        assert_eq!(sink.calls, vec!["status:201", "status:404"]);
    }

    #[test]
    fn test_sink_error_propagates() {
        let mut sink = CallLog {
            fail_writes: true,
            ..CallLog::default()
        };
        let mut writer = ResponseWriter::new(&mut sink);

        let err = writer.write(b"data").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(writer.size(), 0);
        assert!(writer.written());
    }

    #[test]
    fn test_before_hooks_run_newest_first_once() {
        let mut sink = CallLog::default();
        let mut writer = ResponseWriter::new(&mut sink);

        writer.before(|headers, _| {
            headers.insert("x-order", HeaderValue::from_static("first"));
        });
        writer.before(|headers, status| {
            headers.insert("x-order", HeaderValue::from_static("second"));
            headers.insert(
                "x-status",
                HeaderValue::from_str(status.as_str()).unwrap(),
            );
        });

        writer.write(b"x").unwrap();
        writer.write_header(StatusCode::ACCEPTED);
        drop(writer);

        // Registered first, so it ran last and overwrote the header.
        assert_eq!(sink.headers.get("x-order").unwrap(), "first");
        assert_eq!(sink.headers.get("x-status").unwrap(), "200");
    }

    #[test]
    fn test_buffer_first_status_wins() {
        let mut buffer = ResponseBuffer::new();
        buffer.write_header(StatusCode::BAD_REQUEST);
        buffer.write_header(StatusCode::OK);
        buffer.write(b"bad").unwrap();

        assert_eq!(buffer.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(buffer.body(), b"bad");
    }

    #[test]
    fn test_buffer_snapshots_headers() {
        let mut buffer = ResponseBuffer::new();
        buffer
            .headers_mut()
            .insert("content-type", HeaderValue::from_static("text/plain"));
        buffer.write(b"hi").unwrap();
        buffer
            .headers_mut()
            .insert("x-late", HeaderValue::from_static("ignored"));

        let response = buffer.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("content-type").unwrap(), "text/plain");
        assert!(response.headers().get("x-late").is_none());
    }

    #[test]
    fn test_empty_buffer_into_response() {
        let buffer = ResponseBuffer::new();
        assert!(buffer.status().is_none());

        let response = buffer.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
