//! Port-specific error types.
//!
//! Kept separate from acquisition errors so a single failed open can be
//! recorded, classified and retried without the caller seeing it.

use std::io;
use thiserror::Error;

/// Errors that can occur while opening or using a serial port.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port does not exist on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// The process is not allowed to open the port.
    #[error("Permission denied opening {0}")]
    PermissionDenied(String),

    /// Another process holds the port.
    #[error("Serial port busy: {0}")]
    Busy(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Port configuration was rejected.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Classify an error returned by `serialport` while opening `port_name`.
    pub fn from_open_error(port_name: &str, err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => Self::not_found(port_name),
            serialport::ErrorKind::InvalidInput => Self::config(err.to_string()),
            serialport::ErrorKind::Io(io::ErrorKind::NotFound) => Self::not_found(port_name),
            serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
                Self::PermissionDenied(port_name.to_string())
            }
            _ if looks_busy(&err) => Self::Busy(port_name.to_string()),
            _ => Self::Serial(err),
        }
    }
}

// serialport flattens the OS error into a description, so EBUSY is only
// recoverable from the message text.
fn looks_busy(err: &serialport::Error) -> bool {
    let busy = io::Error::from_raw_os_error(busy_errno()).to_string();
    let text = err.to_string();
    text.contains(&busy) || text.to_lowercase().contains("busy")
}

#[cfg(unix)]
fn busy_errno() -> i32 {
    libc::EBUSY
}

#[cfg(not(unix))]
fn busy_errno() -> i32 {
    // ERROR_ACCESS_DENIED is what Windows reports for a COM port held elsewhere.
    5
}
