//! Port-detection collaborator.
//!
//! The acquirer resolves `PortSpec::Auto` candidates through a
//! [`PortDetector`]. Finding nothing is a normal outcome (`Ok(None)`); an
//! `Err` means enumeration itself broke.

pub mod usb;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use usb::{BoardProfile, UsbPortDetector, KNOWN_BOARDS};

/// A compatible device found by a detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedPort {
    /// System path of the port (e.g. "/dev/ttyACM0", "COM5").
    pub port_name: String,

    /// Board family, when the detector could tell.
    pub device_type: Option<String>,
}

impl DetectedPort {
    pub fn new(port_name: impl Into<String>, device_type: Option<String>) -> Self {
        Self {
            port_name: port_name.into(),
            device_type,
        }
    }
}

/// Errors raised by the detector itself, as opposed to "nothing found".
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The operating system refused to enumerate ports.
    #[error("Port enumeration failed: {0}")]
    Enumeration(#[from] serialport::Error),

    /// Any other detector-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Finds a single compatible device.
pub trait PortDetector {
    fn detect(&self) -> Result<Option<DetectedPort>, DetectionError>;
}

impl<D: PortDetector + ?Sized> PortDetector for &D {
    fn detect(&self) -> Result<Option<DetectedPort>, DetectionError> {
        (**self).detect()
    }
}

impl<D: PortDetector + ?Sized> PortDetector for Box<D> {
    fn detect(&self) -> Result<Option<DetectedPort>, DetectionError> {
        (**self).detect()
    }
}

/// A detector that always reports the same answer.
///
/// Useful when the port is known out of band, and in tests.
#[derive(Debug, Clone, Default)]
pub struct FixedDetector(pub Option<DetectedPort>);

impl PortDetector for FixedDetector {
    fn detect(&self) -> Result<Option<DetectedPort>, DetectionError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_detector() {
        let none = FixedDetector::default();
        assert_eq!(none.detect().unwrap(), None);

        let some = FixedDetector(Some(DetectedPort::new("COM7", Some("Leonardo".into()))));
        let found = some.detect().unwrap().unwrap();
        assert_eq!(found.port_name, "COM7");
        assert_eq!(found.device_type.as_deref(), Some("Leonardo"));
    }

    #[test]
    fn test_detection_error_display() {
        let err = DetectionError::Other("udev unavailable".into());
        assert_eq!(err.to_string(), "udev unavailable");
    }
}
