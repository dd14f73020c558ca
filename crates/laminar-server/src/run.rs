//! One-call process entry point.

use std::sync::Arc;

use laminar_middleware::Stack;

use crate::config::ServerConfig;
use crate::server::Server;

/// Serves `stack` on `address` until SIGTERM or SIGINT.
///
/// An address that does not resolve or cannot be bound is fatal: the error is
/// logged and the process exits with status 1.
///
/// ```rust,no_run
/// use laminar_middleware::{Request, ResponseSink, Stack};
///
/// #[tokio::main]
/// async fn main() {
///     let mut stack = Stack::new();
///     stack.register_handler_fn(|sink: &mut dyn ResponseSink, _req: &mut Request| {
///         let _ = sink.write(b"hello");
///     });
///     laminar_server::run(stack, "127.0.0.1:3000").await;
/// }
/// ```
pub async fn run(stack: impl Into<Arc<Stack>>, address: &str) {
    let config = ServerConfig::builder().http_addr(address).build();
    run_with_config(stack, config).await;
}

/// Like [`run`], with every server setting supplied.
pub async fn run_with_config(stack: impl Into<Arc<Stack>>, config: ServerConfig) {
    if let Err(error) = Server::new(stack, config).run().await {
        tracing::error!(%error, "server failed");
        std::process::exit(1);
    }
}
