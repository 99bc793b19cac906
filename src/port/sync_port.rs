//! Synchronous serial port implementation.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own
//! `SerialLinkPort` trait so the acquirer and the tee never touch
//! `serialport` directly.

use super::error::PortError;
use super::traits::{PortOpener, SerialLinkPort, TransportParams};
use std::io::{Read, Write};
use tracing::trace;

/// Synchronous serial port implementation wrapping `serialport::SerialPort`.
pub struct SyncSerialPort {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The port name/path for identification.
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port, 8N1 without flow control.
    ///
    /// # Example
    /// ```no_run
    /// use serial_link::port::{SyncSerialPort, TransportParams};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyACM0", &TransportParams::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, params: &TransportParams) -> Result<Self, PortError> {
        params.validate()?;

        let port = serialport::new(port_name, params.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .flow_control(serialport::FlowControl::None)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(params.read_timeout)
            .open()
            .map_err(|e| PortError::from_open_error(port_name, e))?;

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }
}

impl SerialLinkPort for SyncSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write(data).map_err(PortError::Io)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                Err(PortError::timeout(self.port.timeout()))
            }
            Err(e) => Err(PortError::Io(e)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn clear_input(&mut self) -> Result<(), PortError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(PortError::Serial)
    }

    fn clear_output(&mut self) -> Result<(), PortError> {
        self.port
            .clear(serialport::ClearBuffer::Output)
            .map_err(PortError::Serial)
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate())
            .finish()
    }
}

/// Opens real ports through the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPortOpener;

impl PortOpener for SystemPortOpener {
    fn open(
        &self,
        port_name: &str,
        params: &TransportParams,
    ) -> Result<Box<dyn SerialLinkPort>, PortError> {
        trace!(port = port_name, baud = params.baud_rate, "opening serial port");
        let port = SyncSerialPort::open(port_name, params)?;
        Ok(Box::new(port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_not_found_error() {
        let params = TransportParams::default();
        let result = SyncSerialPort::open("/dev/nonexistent_port_12345", &params);

        match result {
            Err(PortError::NotFound(name)) => assert!(name.contains("nonexistent")),
            Err(e) => panic!("Expected NotFound error, got: {:?}", e),
            Ok(_) => panic!("Expected NotFound error, port opened"),
        }
    }

    #[test]
    fn test_invalid_params_rejected_before_open() {
        let params = TransportParams::new(0, std::time::Duration::ZERO);
        let result = SystemPortOpener.open("/dev/nonexistent_port_12345", &params);
        assert!(matches!(result, Err(PortError::Config(_))));
    }
}
