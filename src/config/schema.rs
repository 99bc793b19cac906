//! Configuration schema definitions.
//!
//! Every section is `#[serde(default)]`, so a user file only needs the keys
//! it changes; anything missing falls back to the built-in defaults.

use crate::link::{PortSpec, RetryPolicy, DEFAULT_MAX_ROUNDS};
use crate::port::{TransportParams, DEFAULT_BAUD_RATE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial link configuration
    pub serial: SerialConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Serial link configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Primary port: a device path, "auto", or "none"
    pub port: Option<String>,
    /// Alternate port, tried after the primary in every round
    pub altport: Option<String>,
    /// Baud rate the device firmware uses
    pub baud_rate: u32,
    /// Read timeout in milliseconds
    pub timeout_ms: u64,
    /// Mirror all serial traffic to stdout (incoming) and stderr (outgoing)
    #[serde(alias = "dumpSerial")]
    pub dump_serial: bool,
    /// Rounds over the candidate ports before giving up
    pub max_rounds: u32,
    /// Delay between failed rounds in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: Some("auto".to_string()),
            altport: Some("none".to_string()),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: 100,
            dump_serial: false,
            max_rounds: DEFAULT_MAX_ROUNDS,
            retry_delay_ms: 1000,
        }
    }
}

impl SerialConfig {
    /// Primary and alternate slots, in trial order.
    pub fn port_specs(&self) -> [PortSpec; 2] {
        [
            PortSpec::parse(self.port.as_deref()),
            PortSpec::parse(self.altport.as_deref()),
        ]
    }

    /// Get the read timeout as Duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn transport_params(&self) -> TransportParams {
        TransportParams::new(self.baud_rate, self.read_timeout())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_rounds, Duration::from_millis(self.retry_delay_ms))
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
    /// Also append logs to this file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            file: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    Pretty,
    /// Compact format
    #[default]
    Compact,
}
