//! Logging setup for Laminar services.
//!
//! Every Laminar crate logs through [`tracing`] macros. This crate installs
//! the global subscriber that turns those events into output:
//!
//! - **JSON** lines for production log shippers
//! - **Pretty** multi-line output for local development
//! - **Compact** single-line output for terminals and CI
//!
//! # Example
//!
//! ```no_run
//! use laminar_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(addr = "127.0.0.1:3000", "listening");
//! # Ok::<(), laminar_telemetry::TelemetryError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/laminar-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
