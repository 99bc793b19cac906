//! Core traits for serial link abstraction.
//!
//! `SerialLinkPort` is the single read/write capability every link exposes,
//! whether it is a real port, a mock, or a diagnostic wrapper around either.
//! `PortOpener` is the transport primitive the acquirer opens ports through.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Baud rate the device firmware is built with.
pub const DEFAULT_BAUD_RATE: u32 = 57600;

/// Default bound on a single blocking read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Transport parameters for one acquisition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportParams {
    /// Baud rate (bits per second). Must match the device.
    pub baud_rate: u32,

    /// Upper bound for each blocking read.
    pub read_timeout: Duration,
}

impl Default for TransportParams {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl TransportParams {
    pub fn new(baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            baud_rate,
            read_timeout,
        }
    }

    /// Reject parameters no port could be opened with.
    pub fn validate(&self) -> Result<(), PortError> {
        if self.baud_rate == 0 {
            return Err(PortError::config("baud rate must be a positive integer"));
        }
        Ok(())
    }
}

/// Trait for serial link I/O operations.
///
/// Dropping the value closes the underlying handle.
pub trait SerialLinkPort: Send + std::fmt::Debug {
    /// Write bytes to the link.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the link into the provided buffer.
    ///
    /// Blocks for at most the read timeout the link was opened with.
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Discard any unread data in the receive buffer.
    fn clear_input(&mut self) -> Result<(), PortError>;

    /// Discard any unsent data in the transmit buffer.
    fn clear_output(&mut self) -> Result<(), PortError>;

    /// Clear both input and output buffers.
    ///
    /// The output side is cleared even when clearing input fails; the first
    /// error is returned.
    fn clear_buffers(&mut self) -> Result<(), PortError> {
        let input = self.clear_input();
        let output = self.clear_output();
        input.and(output)
    }

}

impl<P: SerialLinkPort + ?Sized> SerialLinkPort for Box<P> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        (**self).write_bytes(data)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        (**self).read_bytes(buffer)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn clear_input(&mut self) -> Result<(), PortError> {
        (**self).clear_input()
    }

    fn clear_output(&mut self) -> Result<(), PortError> {
        (**self).clear_output()
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        (**self).clear_buffers()
    }
}

/// Opens transports by name.
///
/// A failed open must not leave a handle behind.
pub trait PortOpener {
    fn open(
        &self,
        port_name: &str,
        params: &TransportParams,
    ) -> Result<Box<dyn SerialLinkPort>, PortError>;
}

impl<O: PortOpener + ?Sized> PortOpener for &O {
    fn open(
        &self,
        port_name: &str,
        params: &TransportParams,
    ) -> Result<Box<dyn SerialLinkPort>, PortError> {
        (**self).open(port_name, params)
    }
}
