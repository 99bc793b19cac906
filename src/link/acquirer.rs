//! Bounded-retry serial link acquisition.
//!
//! Each round walks the candidate list in order and stops at the first port
//! that opens. A failed round is recorded and followed by a fixed delay;
//! after the last round the caller gets every round's attempt log.

use super::attempt::{AttemptFailure, AttemptLog, AttemptRecord};
use super::cancel::CancellationToken;
use super::error::LinkError;
use super::spec::PortSpec;
use crate::detect::PortDetector;
use crate::port::{PortError, PortOpener, SerialLinkPort, TransportParams};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default number of rounds before giving up.
pub const DEFAULT_MAX_ROUNDS: u32 = 10;

/// Default delay between failed rounds.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_rounds: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_rounds: u32, retry_delay: Duration) -> Self {
        Self {
            max_rounds,
            retry_delay,
        }
    }
}

/// A successfully opened link and where it came from.
#[derive(Debug)]
pub struct Acquired {
    pub link: Box<dyn SerialLinkPort>,
    /// The candidate that produced the link.
    pub spec: PortSpec,
    pub port_name: String,
    /// Board type, when the port came from auto-detection.
    pub device_type: Option<String>,
    /// 1-based round the link was opened in.
    pub round: u32,
    /// Failures earlier in the winning round.
    pub attempts: AttemptLog,
}

/// Opens a serial link from an ordered list of candidates.
pub struct LinkAcquirer<O, D> {
    opener: O,
    detector: D,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

enum RoundOutcome {
    Opened(Acquired),
    Failed(AttemptLog),
}

impl<O: PortOpener, D: PortDetector> LinkAcquirer<O, D> {
    pub fn new(opener: O, detector: D) -> Self {
        Self {
            opener,
            detector,
            policy: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Observe `token` at the top of each round and during the retry delay.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Open the first working candidate, retrying per the policy.
    ///
    /// On success both buffers of the link have been cleared. A failure to
    /// clear is logged; the link is still returned.
    pub fn acquire(
        &self,
        candidates: &[PortSpec],
        params: &TransportParams,
    ) -> Result<Acquired, LinkError> {
        params.validate().map_err(LinkError::InvalidParams)?;

        info!(
            candidates = %render_candidates(candidates),
            baud = params.baud_rate,
            "Opening serial port"
        );

        let mut history = Vec::new();
        for round in 1..=self.policy.max_rounds {
            if self.cancel.is_cancelled() {
                return Err(self.cancelled(round - 1, history));
            }

            match self.run_round(round, candidates, params) {
                RoundOutcome::Opened(mut acquired) => {
                    if let Err(e) = acquired.link.clear_buffers() {
                        warn!(
                            port = %acquired.port_name,
                            error = %e,
                            "could not discard stale serial data"
                        );
                    }
                    info!(
                        port = %acquired.port_name,
                        round,
                        device = acquired.device_type.as_deref().unwrap_or("unknown"),
                        "Serial port opened"
                    );
                    return Ok(acquired);
                }
                RoundOutcome::Failed(log) => {
                    warn!(
                        round,
                        max_rounds = self.policy.max_rounds,
                        "no candidate port opened:\n{log}"
                    );
                    history.push(log);
                }
            }

            if round < self.policy.max_rounds {
                if self.cancel.is_cancelled() {
                    return Err(self.cancelled(round, history));
                }
                if !self.cancel.sleep(self.policy.retry_delay) {
                    return Err(self.cancelled(round, history));
                }
            }
        }

        let err = LinkError::AcquisitionExhausted {
            rounds: self.policy.max_rounds,
            history,
        };
        error!("{err}");
        Err(err)
    }

    fn run_round(
        &self,
        round: u32,
        candidates: &[PortSpec],
        params: &TransportParams,
    ) -> RoundOutcome {
        let mut log = AttemptLog::new();

        for spec in candidates {
            let (port_name, device_type) = match spec {
                PortSpec::None => continue,
                PortSpec::Explicit(name) => (name.clone(), None),
                PortSpec::Auto => match self.detector.detect() {
                    Ok(Some(found)) => {
                        debug!(round, port = %found.port_name, "auto-detected port");
                        (found.port_name, found.device_type)
                    }
                    Ok(None) => {
                        debug!(round, "auto-detection found no compatible device");
                        log.push(AttemptRecord {
                            spec: spec.clone(),
                            resolved_name: None,
                            failure: AttemptFailure::PortResolutionFailed,
                        });
                        continue;
                    }
                    Err(e) => {
                        debug!(round, error = %e, "port detector failed");
                        log.push(AttemptRecord {
                            spec: spec.clone(),
                            resolved_name: None,
                            failure: AttemptFailure::DetectionUnavailable(e.to_string()),
                        });
                        continue;
                    }
                },
            };

            debug!(round, port = %port_name, "trying serial port");
            match self.opener.open(&port_name, params) {
                Ok(link) => {
                    return RoundOutcome::Opened(Acquired {
                        link,
                        spec: spec.clone(),
                        port_name,
                        device_type,
                        round,
                        attempts: log,
                    });
                }
                Err(e) => {
                    debug!(round, port = %port_name, error = %e, "open failed");
                    log.push(open_failure(spec, port_name, e));
                }
            }
        }

        RoundOutcome::Failed(log)
    }

    fn cancelled(&self, rounds_attempted: u32, history: Vec<AttemptLog>) -> LinkError {
        info!(rounds_attempted, "serial port acquisition cancelled");
        LinkError::Cancelled {
            rounds_attempted,
            history,
        }
    }
}

fn open_failure(spec: &PortSpec, port_name: String, err: PortError) -> AttemptRecord {
    AttemptRecord {
        spec: spec.clone(),
        resolved_name: Some(port_name),
        failure: AttemptFailure::PortOpenFailed(err),
    }
}

fn render_candidates(candidates: &[PortSpec]) -> String {
    candidates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
