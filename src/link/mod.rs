//! Serial link acquisition and diagnostic interception.
//!
//! [`LinkAcquirer`] turns a primary/alternate pair of [`PortSpec`]s into an
//! open link; [`TeeLink`] optionally mirrors that link's traffic.

pub mod acquirer;
pub mod attempt;
pub mod cancel;
pub mod error;
pub mod spec;
pub mod tee;

pub use acquirer::{Acquired, LinkAcquirer, RetryPolicy, DEFAULT_MAX_ROUNDS, DEFAULT_RETRY_DELAY};
pub use attempt::{AttemptFailure, AttemptLog, AttemptRecord};
pub use cancel::CancellationToken;
pub use error::LinkError;
pub use spec::PortSpec;
pub use tee::{DiagnosticSinks, TeeLink};

use crate::config::SerialConfig;
use crate::detect::PortDetector;
use crate::port::{PortOpener, SerialLinkPort};

/// Acquire a link as described by `config`, wrapping it in a tee writing to
/// `sinks` when `dump_serial` is set.
pub fn acquire_from_config<O, D>(
    config: &SerialConfig,
    opener: O,
    detector: D,
    cancel: CancellationToken,
    sinks: impl FnOnce() -> DiagnosticSinks,
) -> Result<Box<dyn SerialLinkPort>, LinkError>
where
    O: PortOpener,
    D: PortDetector,
{
    let acquired = LinkAcquirer::new(opener, detector)
        .with_policy(config.retry_policy())
        .with_cancellation(cancel)
        .acquire(&config.port_specs(), &config.transport_params())?;

    if config.dump_serial {
        Ok(Box::new(TeeLink::new(acquired.link, sinks())))
    } else {
        Ok(acquired.link)
    }
}
