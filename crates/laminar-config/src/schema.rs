//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with defaults,
//! so a file only needs to name what it changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Server configuration section.
///
/// # Example
///
/// ```
/// use laminar_config::ServerSection;
///
/// let server: ServerSection = toml::from_str(r#"http_addr = "127.0.0.1:3000""#).unwrap();
/// assert_eq!(server.http_addr, "127.0.0.1:3000");
/// assert_eq!(server.shutdown_timeout_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Largest accepted request body in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl ServerSection {
    /// Returns the shutdown timeout as a [`Duration`].
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Returns the request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines (production).
    #[default]
    Json,
    /// Multi-line human-readable output (development).
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

impl From<LogFormat> for laminar_telemetry::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,

    /// Include thread IDs in logs.
    #[serde(default)]
    pub thread_ids: bool,
}

impl LoggingSection {
    /// Converts this section into the logging setup it describes.
    pub fn to_log_config(&self) -> laminar_telemetry::LogConfig {
        laminar_telemetry::LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format.into(),
            span_events: false,
            file_line_info: self.include_location,
            thread_ids: self.thread_ids,
            include_target: true,
            respect_env: true,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
            thread_ids: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_section_default() {
        let server = ServerSection::default();
        assert_eq!(server.http_addr, "0.0.0.0:3000");
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(server.request_timeout(), Duration::from_secs(30));
        assert_eq!(server.max_body_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_server_section_partial() {
        let toml = r#"
            http_addr = "127.0.0.1:3000"
            request_timeout_ms = 250
        "#;
        let server: ServerSection = toml::from_str(toml).unwrap();
        assert_eq!(server.request_timeout(), Duration::from_millis(250));
        // Defaults applied
        assert_eq!(server.shutdown_timeout_secs, 30);
    }

    #[test]
    fn test_server_section_unknown_field_rejected() {
        let toml = r#"
            http_addr = "127.0.0.1:3000"
            http2_enabled = true
        "#;
        let result: Result<ServerSection, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""compact""#).unwrap();
        assert_eq!(format, LogFormat::Compact);
        assert!(serde_json::from_str::<LogFormat>(r#""xml""#).is_err());
    }

    #[test]
    fn test_to_log_config() {
        let section = LoggingSection {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            ..LoggingSection::default()
        };
        let config = section.to_log_config();

        assert!(config.enabled);
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, laminar_telemetry::LogFormat::Pretty);
        assert!(config.file_line_info);
        assert!(!config.thread_ids);
    }
}
