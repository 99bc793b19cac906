//! Serial Link Library
//!
//! Acquires a serial link to a microcontroller whose port name may be
//! unknown or unstable, and optionally mirrors the link's traffic for
//! diagnostics.
//!
//! # Modules
//!
//! - `port`: link trait, transport primitive, real and mock ports
//! - `detect`: USB auto-detection of compatible boards
//! - `link`: candidate specs, bounded-retry acquisition, diagnostic tee
//! - `config`: configuration management with TOML support
//! - `logging`: tracing subscriber setup
//! - `text`: device text normalisation
//! - `error`: application error type

pub mod config;
pub mod detect;
pub mod error;
pub mod link;
pub mod logging;
pub mod port;
pub mod text;

// Re-export commonly used types for convenience
pub use detect::{DetectedPort, DetectionError, PortDetector, UsbPortDetector};
pub use link::{
    acquire_from_config, Acquired, AttemptFailure, AttemptLog, AttemptRecord, CancellationToken,
    DiagnosticSinks, LinkAcquirer, LinkError, PortSpec, RetryPolicy, TeeLink,
};
pub use port::{
    MockPortOpener, MockSerialPort, PortError, PortOpener, SerialLinkPort, SyncSerialPort,
    SystemPortOpener, TransportParams,
};

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult, SerialConfig};
pub use error::AppError;
