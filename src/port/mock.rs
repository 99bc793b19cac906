//! Mock transports for testing.
//!
//! `MockSerialPort` simulates a device without hardware: bytes queued with
//! `enqueue_read` come back from reads, writes are logged, and buffer clears
//! are counted. `MockPortOpener` hands out mock ports by name and can be told
//! to fail specific names a number of times, so retry behaviour can be
//! exercised deterministically.

use super::error::PortError;
use super::traits::{PortOpener, SerialLinkPort, TransportParams};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Inner state of the mock port, shared between clones.
#[derive(Debug, Default)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Bytes written but not yet "transmitted".
    unsent: Vec<u8>,
    /// Log of all writes to the port.
    write_log: Vec<Vec<u8>>,
    /// Whether the next operation should time out.
    should_timeout: bool,
    /// Timeout reported when a read finds nothing queued.
    timeout: Duration,
    input_clears: usize,
    output_clears: usize,
    fail_input_clear: bool,
    fail_output_clear: bool,
}

/// Mock serial port implementation for testing.
///
/// Clones share state, so a test can keep one clone for inspection while
/// another is handed to the code under test.
///
/// # Example
/// ```
/// use serial_link::port::{MockSerialPort, SerialLinkPort};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"T:20.5");
///
/// let mut buffer = [0u8; 16];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"T:20.5");
///
/// port.write_bytes(b"s").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"s".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_millis(100),
                ..Default::default()
            })),
        }
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Pretend `data` is sitting untransmitted in the output buffer.
    pub fn enqueue_unsent(&mut self, data: &[u8]) {
        self.state.lock().unsent.extend_from_slice(data);
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Set whether the next read/write operation should time out.
    pub fn set_should_timeout(&mut self, should_timeout: bool) {
        self.state.lock().should_timeout = should_timeout;
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Get the number of bytes waiting in the output buffer.
    pub fn unsent_bytes(&self) -> usize {
        self.state.lock().unsent.len()
    }

    /// Make buffer clears fail on the chosen sides until reset.
    pub fn set_failing_clears(&mut self, input: bool, output: bool) {
        let mut state = self.state.lock();
        state.fail_input_clear = input;
        state.fail_output_clear = output;
    }

    /// How many times the input and output buffers were successfully cleared.
    pub fn clear_counts(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.input_clears, state.output_clears)
    }

    /// Whether both buffers were cleared at least once.
    pub fn was_cleared(&self) -> bool {
        let (input, output) = self.clear_counts();
        input > 0 && output > 0
    }
}

impl SerialLinkPort for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(state.timeout));
        }

        state.write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.should_timeout {
            state.should_timeout = false;
            return Err(PortError::timeout(state.timeout));
        }

        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.pop_front() {
                Some(queued) => {
                    *byte = queued;
                    bytes_read += 1;
                }
                None => break,
            }
        }

        // A real port with nothing to deliver times out.
        if bytes_read == 0 && !buffer.is_empty() {
            return Err(PortError::timeout(state.timeout));
        }
        Ok(bytes_read)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn clear_input(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.fail_input_clear {
            return Err(clear_failure("input"));
        }
        state.read_queue.clear();
        state.input_clears += 1;
        Ok(())
    }

    fn clear_output(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.fail_output_clear {
            return Err(clear_failure("output"));
        }
        state.unsent.clear();
        state.output_clears += 1;
        Ok(())
    }
}

fn clear_failure(side: &str) -> PortError {
    PortError::Io(std::io::Error::other(format!(
        "{side} buffer could not be cleared"
    )))
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// How a mocked open should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOpenFailure {
    NotFound,
    PermissionDenied,
    Busy,
}

impl MockOpenFailure {
    fn to_error(self, port_name: &str) -> PortError {
        match self {
            Self::NotFound => PortError::not_found(port_name),
            Self::PermissionDenied => PortError::PermissionDenied(port_name.to_string()),
            Self::Busy => PortError::Busy(port_name.to_string()),
        }
    }
}

#[derive(Debug, Default)]
struct OpenerState {
    ports: HashMap<String, MockSerialPort>,
    /// Remaining forced failures per port name.
    failures: HashMap<String, (usize, MockOpenFailure)>,
    /// Every name `open` was called with, in order.
    attempts: Vec<String>,
}

/// A `PortOpener` serving `MockSerialPort`s.
///
/// Names that were never registered fail with `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct MockPortOpener {
    state: Arc<Mutex<OpenerState>>,
    live_handles: Arc<AtomicUsize>,
}

impl MockPortOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a port that opens successfully. Returns a clone for inspection.
    pub fn add_port(&self, port: MockSerialPort) -> MockSerialPort {
        let handle = port.clone();
        self.state.lock().ports.insert(port.name.clone(), port);
        handle
    }

    /// Make `port_name` fail with `failure` on every open.
    pub fn fail_always(&self, port_name: impl Into<String>, failure: MockOpenFailure) {
        self.fail_times(port_name, usize::MAX, failure);
    }

    /// Make the next `times` opens of `port_name` fail with `failure`.
    pub fn fail_times(&self, port_name: impl Into<String>, times: usize, failure: MockOpenFailure) {
        self.state
            .lock()
            .failures
            .insert(port_name.into(), (times, failure));
    }

    /// Port names `open` was called with, in call order.
    pub fn attempts(&self) -> Vec<String> {
        self.state.lock().attempts.clone()
    }

    /// Number of handles handed out and not yet dropped.
    pub fn live_handles(&self) -> usize {
        self.live_handles.load(Ordering::SeqCst)
    }
}

impl PortOpener for MockPortOpener {
    fn open(
        &self,
        port_name: &str,
        params: &TransportParams,
    ) -> Result<Box<dyn SerialLinkPort>, PortError> {
        params.validate()?;

        let mut state = self.state.lock();
        state.attempts.push(port_name.to_string());

        if let Some((remaining, failure)) = state.failures.get_mut(port_name) {
            if *remaining > 0 {
                if *remaining != usize::MAX {
                    *remaining -= 1;
                }
                return Err(failure.to_error(port_name));
            }
        }

        let port = state
            .ports
            .get(port_name)
            .cloned()
            .ok_or_else(|| PortError::not_found(port_name))?;

        Ok(Box::new(OpenedMock::new(port, Arc::clone(&self.live_handles))))
    }
}

/// A mock handle that counts itself as open until dropped.
#[derive(Debug)]
struct OpenedMock {
    port: MockSerialPort,
    live: Arc<AtomicUsize>,
}

impl OpenedMock {
    fn new(port: MockSerialPort, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self { port, live }
    }
}

impl Drop for OpenedMock {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SerialLinkPort for OpenedMock {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.port.write_bytes(data)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port.read_bytes(buffer)
    }

    fn name(&self) -> &str {
        self.port.name()
    }

    fn clear_input(&mut self) -> Result<(), PortError> {
        self.port.clear_input()
    }

    fn clear_output(&mut self) -> Result<(), PortError> {
        self.port.clear_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello");

        let mut buffer = [0u8; 10];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"Hello");
    }

    #[test]
    fn test_partial_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello, World!");

        let mut buffer = [0u8; 5];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"Hello");
        assert_eq!(port.available_bytes(), 8);
    }

    #[test]
    fn test_empty_read_times_out() {
        let mut port = MockSerialPort::new("MOCK0");
        let mut buffer = [0u8; 10];
        assert!(matches!(
            port.read_bytes(&mut buffer),
            Err(PortError::Timeout(_))
        ));
    }

    #[test]
    fn test_write_logging() {
        let mut port = MockSerialPort::new("MOCK0");
        port.write_bytes(b"Test1").unwrap();
        port.write_bytes(b"Test2").unwrap();

        let log = port.get_write_log();
        assert_eq!(log, vec![b"Test1".to_vec(), b"Test2".to_vec()]);
    }

    #[test]
    fn test_clear_buffers() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"stale");
        port.enqueue_unsent(b"pending");

        port.clear_buffers().unwrap();
        assert!(port.was_cleared());
        assert_eq!(port.available_bytes(), 0);
        assert_eq!(port.unsent_bytes(), 0);
        assert_eq!(port.clear_counts(), (1, 1));
    }

    #[test]
    fn test_clear_buffers_clears_output_when_input_fails() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"stale");
        port.enqueue_unsent(b"pending");
        port.set_failing_clears(true, false);

        assert!(matches!(port.clear_buffers(), Err(PortError::Io(_))));
        assert_eq!(port.clear_counts(), (0, 1));
        assert_eq!(port.available_bytes(), 5);
        assert_eq!(port.unsent_bytes(), 0);
        assert!(!port.was_cleared());
    }

    #[test]
    fn test_should_timeout_applies_once() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_should_timeout(true);

        assert!(matches!(port.write_bytes(b"x"), Err(PortError::Timeout(_))));
        assert_eq!(port.write_bytes(b"x").unwrap(), 1);
    }

    #[test]
    fn test_opener_unknown_port_not_found() {
        let opener = MockPortOpener::new();
        let result = opener.open("COM9", &TransportParams::default());
        assert!(matches!(result, Err(PortError::NotFound(_))));
        assert_eq!(opener.attempts(), vec!["COM9".to_string()]);
    }

    #[test]
    fn test_opener_fail_times_then_succeed() {
        let opener = MockPortOpener::new();
        opener.add_port(MockSerialPort::new("COM4"));
        opener.fail_times("COM4", 2, MockOpenFailure::Busy);

        let params = TransportParams::default();
        assert!(matches!(opener.open("COM4", &params), Err(PortError::Busy(_))));
        assert!(matches!(opener.open("COM4", &params), Err(PortError::Busy(_))));
        let port = opener.open("COM4", &params).unwrap();
        assert_eq!(port.name(), "COM4");
    }

    #[test]
    fn test_opener_tracks_live_handles() {
        let opener = MockPortOpener::new();
        opener.add_port(MockSerialPort::new("COM4"));

        let port = opener.open("COM4", &TransportParams::default()).unwrap();
        assert_eq!(opener.live_handles(), 1);
        drop(port);
        assert_eq!(opener.live_handles(), 0);
    }
}
