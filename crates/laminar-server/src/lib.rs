//! # Laminar Server
//!
//! Hosts a [`laminar_middleware::Stack`] over HTTP/1.1 with hyper and tokio.
//!
//! - [`run`] binds an address and serves until SIGTERM/SIGINT
//! - [`Server`] gives control over the listener and shutdown
//! - [`ShutdownSignal`] triggers graceful shutdown programmatically
//!
//! Units in a stack are synchronous, so each request runs on tokio's blocking
//! pool and its response is buffered before it is sent.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use laminar_middleware::{Request, ResponseSink, Stack};
//! use laminar_server::{Server, ServerConfig, ShutdownSignal};
//!
//! # async fn demo() -> Result<(), laminar_server::ServerError> {
//! let mut stack = Stack::new();
//! stack.register_handler_fn(|sink: &mut dyn ResponseSink, _req: &mut Request| {
//!     let _ = sink.write(b"hello");
//! });
//!
//! let config = ServerConfig::builder()
//!     .http_addr("127.0.0.1:3000")
//!     .shutdown_timeout(Duration::from_secs(5))
//!     .build();
//!
//! let shutdown = ShutdownSignal::new();
//! Server::new(stack, config).run_with_shutdown(shutdown).await
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/laminar-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
mod run;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::ServerError;
pub use run::{run, run_with_config};
pub use server::{HttpResponse, Server};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
