//! USB VID/PID based detection.
//!
//! Enumerates serial ports and picks the first USB port belonging to a known
//! microcontroller board.

use super::{DetectedPort, DetectionError, PortDetector};
use serialport::{SerialPortInfo, SerialPortType};
use tracing::{debug, trace};

/// A board family recognised by its USB identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardProfile {
    /// USB Vendor ID.
    pub vid: u16,

    /// USB Product ID; `None` matches every product of the vendor.
    pub pid: Option<u16>,

    /// Reported device type.
    pub device_type: &'static str,
}

impl BoardProfile {
    pub const fn new(vid: u16, pid: Option<u16>, device_type: &'static str) -> Self {
        Self {
            vid,
            pid,
            device_type,
        }
    }

    pub fn matches(&self, vid: u16, pid: u16) -> bool {
        self.vid == vid && self.pid.map_or(true, |p| p == pid)
    }
}

/// Boards checked by default, most specific first.
pub const KNOWN_BOARDS: &[BoardProfile] = &[
    BoardProfile::new(0x2341, Some(0x0010), "arduino-mega"),
    BoardProfile::new(0x2341, Some(0x0042), "arduino-mega"),
    BoardProfile::new(0x2341, Some(0x0043), "arduino-uno"),
    BoardProfile::new(0x2341, Some(0x0001), "arduino-uno"),
    BoardProfile::new(0x2341, Some(0x8036), "arduino-leonardo"),
    BoardProfile::new(0x2341, Some(0x0036), "arduino-leonardo"),
    BoardProfile::new(0x2A03, Some(0x8036), "arduino-leonardo"),
    BoardProfile::new(0x2341, None, "arduino"),
    BoardProfile::new(0x2A03, None, "arduino"),
    BoardProfile::new(0x1D50, Some(0x607D), "spark-core"),
    BoardProfile::new(0x2B04, Some(0xC006), "photon"),
    BoardProfile::new(0x2B04, Some(0xC008), "p1"),
    BoardProfile::new(0x239A, None, "adafruit"),
    BoardProfile::new(0x1B4F, None, "sparkfun"),
    BoardProfile::new(0x0403, Some(0x6001), "ftdi"),
    BoardProfile::new(0x1A86, Some(0x7523), "ch340"),
];

/// Detector backed by `serialport::available_ports`.
#[derive(Debug, Clone)]
pub struct UsbPortDetector {
    profiles: Vec<BoardProfile>,
}

impl UsbPortDetector {
    /// Create a detector for the default board list.
    pub fn new() -> Self {
        Self {
            profiles: KNOWN_BOARDS.to_vec(),
        }
    }

    /// Replace the board list.
    pub fn with_profiles(profiles: impl Into<Vec<BoardProfile>>) -> Self {
        Self {
            profiles: profiles.into(),
        }
    }

    pub fn profiles(&self) -> &[BoardProfile] {
        &self.profiles
    }

    /// Look up the profile for a VID/PID pair.
    pub fn profile_for(&self, vid: u16, pid: u16) -> Option<&BoardProfile> {
        self.profiles.iter().find(|p| p.matches(vid, pid))
    }

    /// Pick the first compatible port from an enumeration result.
    ///
    /// Ports are visited in enumeration order; for each port the profile
    /// list is consulted in order.
    pub fn select(&self, ports: &[SerialPortInfo]) -> Option<DetectedPort> {
        ports.iter().find_map(|info| match &info.port_type {
            SerialPortType::UsbPort(usb) => {
                let profile = self.profile_for(usb.vid, usb.pid)?;
                debug!(
                    port = %info.port_name,
                    vid = format_args!("{:04x}", usb.vid),
                    pid = format_args!("{:04x}", usb.pid),
                    device = profile.device_type,
                    "matched board profile"
                );
                Some(DetectedPort::new(
                    info.port_name.clone(),
                    Some(profile.device_type.to_string()),
                ))
            }
            _ => {
                trace!(port = %info.port_name, "skipping non-USB port");
                None
            }
        })
    }
}

impl Default for UsbPortDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PortDetector for UsbPortDetector {
    fn detect(&self) -> Result<Option<DetectedPort>, DetectionError> {
        let ports = serialport::available_ports()?;
        trace!(count = ports.len(), "enumerated serial ports");
        Ok(self.select(&ports))
    }
}
