//! HTTP host for a middleware [`Stack`].
//!
//! Each connection is served by hyper's HTTP/1.1 implementation on tokio.
//! For every request the server:
//!
//! 1. buffers the body, bounded by `max_body_bytes`
//! 2. runs `Stack::serve` on the blocking pool into a [`ResponseBuffer`]
//! 3. converts the buffer into the hyper response
//!
//! Steps 1 and 2 share a single `request_timeout` deadline.
//!
//! | Failure                         | Response |
//! |---------------------------------|----------|
//! | body read error                 | 400      |
//! | body slower than the timeout    | 408      |
//! | body over the limit             | 413      |
//! | panic inside the stack          | 500      |
//! | stack slower than the timeout   | 504      |

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use laminar_middleware::stages::panic_message;
use laminar_middleware::{ResponseBuffer, Stack};
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Response type produced by the server.
pub type HttpResponse = Response<Full<Bytes>>;

/// Serves a [`Stack`] over HTTP/1.1.
///
/// ```rust,no_run
/// use laminar_middleware::{Request, ResponseSink, Stack};
/// use laminar_server::{Server, ServerConfig};
///
/// # async fn demo() -> Result<(), laminar_server::ServerError> {
/// let mut stack = Stack::new();
/// stack.register_handler_fn(|sink: &mut dyn ResponseSink, _req: &mut Request| {
///     let _ = sink.write(b"hello");
/// });
///
/// let config = ServerConfig::builder().http_addr("127.0.0.1:3000").build();
/// Server::new(stack, config).run().await
/// # }
/// ```
pub struct Server {
    stack: Arc<Stack>,
    config: ServerConfig,
}

impl Server {
    /// Creates a server for `stack`.
    pub fn new(stack: impl Into<Arc<Stack>>, config: ServerConfig) -> Self {
        Self {
            stack: stack.into(),
            config,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the stack being served.
    #[must_use]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Binds and serves until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Binds a listener at the configured address.
    ///
    /// Hostnames are resolved and each resolved address is tried in turn.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let invalid = |source: io::Error| ServerError::InvalidAddress {
            addr: self.config.http_addr().to_string(),
            source,
        };

        let addrs = tokio::net::lookup_host(self.config.bind_addr())
            .await
            .map_err(invalid)?;

        let mut last_error = None;
        for addr in addrs {
            match TcpListener::bind(addr).await {
                Ok(listener) => return Ok(listener),
                Err(source) => last_error = Some(ServerError::Bind { addr, source }),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            invalid(io::Error::new(
                io::ErrorKind::InvalidInput,
                "address resolved to nothing",
            ))
        }))
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// fires, then waits up to the shutdown timeout for them to finish.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "listening on {local_addr}");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            if let Err(error) = server.handle_connection(stream, remote_addr, shutdown).await {
                                tracing::debug!(%remote_addr, %error, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(error) => tracing::error!(%error, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            timeout_ms = timeout.as_millis(),
            "draining connections"
        );

        tokio::select! {
            () = tracker.wait_for_shutdown() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(timeout) => tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            ),
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |request: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(request).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => return result,
            () = shutdown.recv() => {
                tracing::debug!(%remote_addr, "finishing connection for shutdown");
                conn.as_mut().graceful_shutdown();
            }
        }

        conn.await
    }

    /// Serves one request through the stack.
    ///
    /// Never fails: every failure is mapped to an error response.
    pub async fn handle<B>(&self, request: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let timeout = self.config.request_timeout();
        let deadline = tokio::time::Instant::now() + timeout;
        let (parts, body) = request.into_parts();

        let collected = tokio::time::timeout_at(
            deadline,
            Limited::new(body, self.config.max_body_bytes()).collect(),
        )
        .await;

        let body = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(error)) if error.is::<LengthLimitError>() => {
                tracing::warn!(limit = self.config.max_body_bytes(), "request body too large");
                return error_response(StatusCode::PAYLOAD_TOO_LARGE);
            }
            Ok(Err(error)) => {
                tracing::warn!(%error, "failed to read request body");
                return error_response(StatusCode::BAD_REQUEST);
            }
            Err(_) => {
                tracing::warn!("request body timed out");
                return error_response(StatusCode::REQUEST_TIMEOUT);
            }
        };

        let mut request = Request::from_parts(parts, body);
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let stack = Arc::clone(&self.stack);
        let task = tokio::task::spawn_blocking(move || {
            let mut buffer = ResponseBuffer::new();
            stack.serve(&mut buffer, &mut request);
            buffer.into_response()
        });

        match tokio::time::timeout_at(deadline, task).await {
            Ok(Ok(response)) => response,
            Ok(Err(error)) if error.is_panic() => {
                let payload = error.into_panic();
                tracing::error!(
                    %method,
                    %path,
                    panic = panic_message(payload.as_ref()),
                    "stack panicked while serving request"
                );
                error_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Ok(Err(error)) => {
                tracing::error!(%method, %path, %error, "serve task failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Err(_) => {
                tracing::warn!(%method, %path, timeout_ms = timeout.as_millis(), "request timed out");
                error_response(StatusCode::GATEWAY_TIMEOUT)
            }
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("stack", &self.stack)
            .finish()
    }
}

fn error_response(status: StatusCode) -> HttpResponse {
    let reason = status.canonical_reason().unwrap_or("Error");
    let mut response = Response::new(Full::new(Bytes::from(reason)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
