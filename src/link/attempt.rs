//! Per-candidate attempt records.
//!
//! One [`AttemptLog`] is built per round. Failure kinds stay distinct so
//! callers can tell "no device" from "permission denied", while `Display`
//! renders the flat text operators see.

use super::spec::PortSpec;
use crate::port::PortError;
use std::fmt;

/// Why a single candidate did not produce a link.
#[derive(Debug)]
pub enum AttemptFailure {
    /// Auto-detection found no compatible device.
    PortResolutionFailed,
    /// The detector itself failed; treated as "no device" for the slot.
    DetectionUnavailable(String),
    /// The transport could not be opened.
    PortOpenFailed(PortError),
}

impl AttemptFailure {
    /// Short machine-friendly kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PortResolutionFailed => "port_resolution_failed",
            Self::DetectionUnavailable(_) => "detection_unavailable",
            Self::PortOpenFailed(_) => "port_open_failed",
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortResolutionFailed => f.write_str("no compatible device found"),
            Self::DetectionUnavailable(reason) => {
                write!(f, "no compatible device found (detection failed: {reason})")
            }
            Self::PortOpenFailed(err) => write!(f, "{err}"),
        }
    }
}

/// One failed candidate.
#[derive(Debug)]
pub struct AttemptRecord {
    /// The slot as configured.
    pub spec: PortSpec,
    /// The port name that was tried, if resolution got that far.
    pub resolved_name: Option<String>,
    pub failure: AttemptFailure,
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resolved_name {
            Some(name) if matches!(&self.spec, PortSpec::Explicit(n) if n == name) => {
                write!(f, "{name}: {}", self.failure)
            }
            Some(name) => write!(f, "{} ({name}): {}", self.spec, self.failure),
            None => write!(f, "{}: {}", self.spec, self.failure),
        }
    }
}

/// The failed candidates of one round, in the order they were tried.
#[derive(Debug, Default)]
pub struct AttemptLog {
    records: Vec<AttemptRecord>,
}

impl AttemptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: AttemptRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[AttemptRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttemptRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a AttemptLog {
    type Item = &'a AttemptRecord;
    type IntoIter = std::slice::Iter<'a, AttemptRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl fmt::Display for AttemptLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.records.is_empty() {
            return f.write_str("no candidate ports configured");
        }
        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{record}")?;
        }
        Ok(())
    }
}
