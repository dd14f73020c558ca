//! Layered configuration for Laminar services.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides, optionally from a `.env` file
//! - Strict parsing (unknown fields are errors)
//! - Validation before use
//!
//! # Example
//!
//! ```no_run
//! use laminar_config::ConfigLoader;
//!
//! # fn main() -> Result<(), laminar_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("laminar.toml")?
//!     .with_env_prefix("LAMINAR")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:3000"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! max_body_bytes = 2097152
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! include_location = false
//! thread_ids = false
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every key above can be overridden as `PREFIX__SECTION__KEY`, e.g.
//! `LAMINAR__SERVER__HTTP_ADDR=0.0.0.0:9000` or `LAMINAR__LOGGING__LEVEL=debug`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::LaminarConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingSection, ServerSection};
