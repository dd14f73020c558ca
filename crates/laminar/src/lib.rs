//! # Laminar
//!
//! Appendable middleware stacks for HTTP services.
//!
//! A [`Stack`](middleware::Stack) is an ordered chain of units. Every request
//! travels down the chain in registration order and back up in reverse, so
//! each unit can act both before and after the units registered after it.
//!
//! ## Crates
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | [`middleware`]| the chain, handler adapters, built-in stages          |
//! | [`server`]    | hyper/tokio host, graceful shutdown, [`run`](server::run) |
//! | [`config`]    | layered TOML/JSON/env configuration                   |
//! | [`telemetry`] | `tracing` subscriber setup                            |
//!
//! ## Example
//!
//! ```rust,no_run
//! use laminar::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut stack = Stack::new();
//!     stack
//!         .register(RecoveryMiddleware::new())
//!         .register(LoggerMiddleware::new())
//!         .register_handler_fn(|sink: &mut dyn ResponseSink, _req: &mut Request| {
//!             let _ = sink.write(b"hello");
//!         });
//!
//!     laminar::server::run(stack, "127.0.0.1:3000").await;
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/laminar/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the chain and its stages
pub use laminar_middleware as middleware;

// Re-export the host server
pub use laminar_server as server;

// Re-export configuration
pub use laminar_config as config;

// Re-export logging setup
pub use laminar_telemetry as telemetry;

/// Builds the host server settings described by a configuration file.
pub fn server_config(section: &config::ServerSection) -> server::ServerConfig {
    server::ServerConfig::builder()
        .http_addr(section.http_addr.clone())
        .shutdown_timeout(section.shutdown_timeout())
        .request_timeout(section.request_timeout())
        .max_body_bytes(section.max_body_bytes)
        .build()
}

/// Prelude module for convenient imports.
///
/// ```rust
/// use laminar::prelude::*;
///
/// let stack = Stack::new();
/// assert!(stack.is_empty());
/// ```
pub mod prelude {
    pub use laminar_middleware::{
        BoxedMiddleware, Context, ContextHandler, Handler, Middleware, Next, Request,
        ResponseBuffer, ResponseSink, ResponseWriter, Stack,
    };

    // Built-in stages
    pub use laminar_middleware::stages::{
        LoggerMiddleware, RecoveryMiddleware, RequestId, RequestIdMiddleware,
    };

    pub use laminar_server::{Server, ServerConfig, ShutdownSignal};

    pub use laminar_config::{ConfigLoader, LaminarConfig};

    pub use laminar_telemetry::{init_logging, LogConfig};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_server_config_from_section() {
        let mut section = config::ServerSection::default();
        section.http_addr = "127.0.0.1:9000".to_string();
        section.request_timeout_ms = 250;
        section.max_body_bytes = 64;

        let config = server_config(&section);
        assert_eq!(config.http_addr(), "127.0.0.1:9000");
        assert_eq!(config.request_timeout(), Duration::from_millis(250));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_body_bytes(), 64);
    }

    #[test]
    fn test_prelude_builds_a_stack() {
        use crate::prelude::*;

        let mut stack = Stack::new();
        stack
            .register(RecoveryMiddleware::new())
            .register(RequestIdMiddleware::new())
            .register(LoggerMiddleware::new());
        assert_eq!(
            stack.middleware_names(),
            vec!["recovery", "request_id", "logger"]
        );
    }
}
