//! Shared test utilities for serial-link integration tests.
//!
//! - Capturing diagnostic sinks
//! - Mock opener setups
//! - Mockall-generated port detectors

#![allow(dead_code)]

use mockall::mock;
use parking_lot::Mutex;
use serial_link::detect::{DetectedPort, DetectionError, PortDetector};
use serial_link::link::{DiagnosticSinks, RetryPolicy};
use serial_link::port::{MockOpenFailure, MockPortOpener, MockSerialPort};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Detector {}

    impl PortDetector for Detector {
        fn detect(&self) -> Result<Option<DetectedPort>, DetectionError>;
    }
}

/// A detector mock that reports `port_name` on every call.
pub fn detector_finding(port_name: &'static str) -> MockDetector {
    let mut detector = MockDetector::new();
    detector
        .expect_detect()
        .returning(move || Ok(Some(DetectedPort::new(port_name, Some("arduino-uno".into())))));
    detector
}

/// A detector mock that never finds anything.
pub fn detector_finding_nothing() -> MockDetector {
    let mut detector = MockDetector::new();
    detector.expect_detect().returning(|| Ok(None));
    detector
}

/// A detector mock that must not be consulted.
pub fn detector_never_called() -> MockDetector {
    let mut detector = MockDetector::new();
    detector.expect_detect().never();
    detector
}

/// Retry policy short enough for tests.
pub fn fast_policy(max_rounds: u32) -> RetryPolicy {
    RetryPolicy::new(max_rounds, Duration::from_millis(5))
}

/// An opener with one good port and one port that never opens.
pub fn good_and_bad(good: &str, bad: &str) -> (MockPortOpener, MockSerialPort) {
    let opener = MockPortOpener::new();
    let port = opener.add_port(MockSerialPort::new(good));
    opener.fail_always(bad, MockOpenFailure::NotFound);
    (opener, port)
}

/// An in-memory sink that can be inspected after being handed out.
#[derive(Clone, Default)]
pub struct CaptureSink(Arc<Mutex<Vec<u8>>>);

impl CaptureSink {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().clone()
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sinks capturing incoming and outgoing traffic separately.
pub fn capture_sinks() -> (DiagnosticSinks, CaptureSink, CaptureSink) {
    let incoming = CaptureSink::default();
    let outgoing = CaptureSink::default();
    let sinks = DiagnosticSinks::new(incoming.clone(), outgoing.clone());
    (sinks, incoming, outgoing)
}
