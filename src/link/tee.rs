//! Diagnostic tee over a serial link.
//!
//! `TeeLink` owns a link and copies every byte read from it to an
//! "incoming" sink and every byte accepted by it to an "outgoing" sink. The
//! data and results seen by the caller are exactly those of the wrapped
//! link; a sink that fails is logged and otherwise ignored.

use crate::port::{PortError, SerialLinkPort};
use std::fmt;
use std::io::{self, Write};
use tracing::warn;

/// The two destinations observed traffic is copied to.
pub struct DiagnosticSinks {
    pub incoming: Box<dyn Write + Send>,
    pub outgoing: Box<dyn Write + Send>,
}

impl DiagnosticSinks {
    pub fn new(
        incoming: impl Write + Send + 'static,
        outgoing: impl Write + Send + 'static,
    ) -> Self {
        Self {
            incoming: Box::new(incoming),
            outgoing: Box::new(outgoing),
        }
    }

    /// Incoming traffic to stdout, outgoing traffic to stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl fmt::Debug for DiagnosticSinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticSinks").finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug)]
enum Direction {
    Incoming,
    Outgoing,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        })
    }
}

/// A link that mirrors its traffic to [`DiagnosticSinks`].
pub struct TeeLink<P> {
    inner: P,
    sinks: DiagnosticSinks,
}

impl<P: SerialLinkPort> TeeLink<P> {
    pub fn new(inner: P, sinks: DiagnosticSinks) -> Self {
        Self { inner, sinks }
    }

    /// Unwrap the link. Already-forwarded bytes stay in the sinks.
    pub fn into_inner(self) -> P {
        self.inner
    }

    fn forward(&mut self, direction: Direction, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let sink = match direction {
            Direction::Incoming => &mut self.sinks.incoming,
            Direction::Outgoing => &mut self.sinks.outgoing,
        };
        if let Err(e) = sink.write_all(data).and_then(|()| sink.flush()) {
            warn!(
                port = %self.inner.name(),
                %direction,
                error = %e,
                "diagnostic sink write failed"
            );
        }
    }
}

impl<P: SerialLinkPort> SerialLinkPort for TeeLink<P> {
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let n = self.inner.read_bytes(buffer)?;
        self.forward(Direction::Incoming, &buffer[..n]);
        Ok(n)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let n = self.inner.write_bytes(data)?;
        self.forward(Direction::Outgoing, &data[..n.min(data.len())]);
        Ok(n)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn clear_input(&mut self) -> Result<(), PortError> {
        self.inner.clear_input()
    }

    fn clear_output(&mut self) -> Result<(), PortError> {
        self.inner.clear_output()
    }
}

impl<P: SerialLinkPort> fmt::Debug for TeeLink<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeeLink").field("inner", &self.inner).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockSerialPort;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().clone()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_read_forwards_to_incoming_only() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"T:19.8");
        let (incoming, outgoing) = (SharedBuf::default(), SharedBuf::default());
        let sinks = DiagnosticSinks::new(incoming.clone(), outgoing.clone());
        let mut tee = TeeLink::new(port, sinks);

        let mut buf = [0u8; 32];
        let n = tee.read_bytes(&mut buf).unwrap();

        assert_eq!(&buf[..n], b"T:19.8");
        assert_eq!(incoming.contents(), b"T:19.8");
        assert!(outgoing.contents().is_empty());
    }

    #[test]
    fn test_write_forwards_to_outgoing_only() {
        let port = MockSerialPort::new("MOCK0");
        let probe = port.clone();
        let (incoming, outgoing) = (SharedBuf::default(), SharedBuf::default());
        let sinks = DiagnosticSinks::new(incoming.clone(), outgoing.clone());
        let mut tee = TeeLink::new(port, sinks);

        assert_eq!(tee.write_bytes(b"j{mode:b}").unwrap(), 9);

        assert_eq!(probe.get_write_log(), vec![b"j{mode:b}".to_vec()]);
        assert_eq!(outgoing.contents(), b"j{mode:b}");
        assert!(incoming.contents().is_empty());
    }

    #[test]
    fn test_read_error_passes_through_without_forwarding() {
        let port = MockSerialPort::new("MOCK0");
        let incoming = SharedBuf::default();
        let mut tee = TeeLink::new(port, DiagnosticSinks::new(incoming.clone(), io::sink()));

        let mut buf = [0u8; 8];
        assert!(matches!(tee.read_bytes(&mut buf), Err(PortError::Timeout(_))));
        assert!(incoming.contents().is_empty());
    }

    #[test]
    fn test_write_error_passes_through_without_forwarding() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_should_timeout(true);
        let probe = port.clone();
        let outgoing = SharedBuf::default();
        let mut tee = TeeLink::new(port, DiagnosticSinks::new(io::sink(), outgoing.clone()));

        assert!(matches!(tee.write_bytes(b"s"), Err(PortError::Timeout(_))));
        assert!(outgoing.contents().is_empty());
        assert!(probe.get_write_log().is_empty());
    }

    #[test]
    fn test_broken_sinks_do_not_affect_link() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"ok");
        let probe = port.clone();
        let mut tee = TeeLink::new(port, DiagnosticSinks::new(BrokenSink, BrokenSink));

        let mut buf = [0u8; 8];
        assert_eq!(tee.read_bytes(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ok");
        assert_eq!(tee.write_bytes(b"ping").unwrap(), 4);
        assert_eq!(probe.get_write_log(), vec![b"ping".to_vec()]);
    }

    #[test]
    fn test_into_inner_returns_link() {
        let sinks = DiagnosticSinks::new(io::sink(), io::sink());
        let tee = TeeLink::new(MockSerialPort::new("MOCK7"), sinks);
        assert_eq!(tee.name(), "MOCK7");
        assert_eq!(tee.into_inner().name(), "MOCK7");
    }
}
