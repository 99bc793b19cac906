//! Port abstraction layer for serial communication.
//!
//! Provides the link trait, the transport primitive used to open ports, and
//! real and mock implementations of both.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockOpenFailure, MockPortOpener, MockSerialPort};
pub use sync_port::{SyncSerialPort, SystemPortOpener};
pub use traits::*;
