//! Acquisition errors surfaced to callers.

use super::attempt::AttemptLog;
use crate::port::PortError;
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    /// Every round failed. `history` holds one log per round, oldest first.
    #[error("Could not open a serial link after {rounds} round(s):\n{}", render_last(.history))]
    AcquisitionExhausted {
        rounds: u32,
        history: Vec<AttemptLog>,
    },

    /// Cancellation was observed before a link was opened.
    #[error("Serial link acquisition cancelled after {rounds_attempted} round(s)")]
    Cancelled {
        rounds_attempted: u32,
        history: Vec<AttemptLog>,
    },

    /// The transport parameters can never work.
    #[error("Invalid transport parameters: {0}")]
    InvalidParams(#[source] PortError),
}

impl LinkError {
    /// The attempt log of the final round, if any round ran.
    pub fn last_attempts(&self) -> Option<&AttemptLog> {
        match self {
            Self::AcquisitionExhausted { history, .. } | Self::Cancelled { history, .. } => {
                history.last()
            }
            Self::InvalidParams(_) => None,
        }
    }

    /// All per-round logs, oldest first.
    pub fn history(&self) -> &[AttemptLog] {
        match self {
            Self::AcquisitionExhausted { history, .. } | Self::Cancelled { history, .. } => {
                history
            }
            Self::InvalidParams(_) => &[],
        }
    }

    /// Multi-line report covering every round.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let history = self.history();
        if history.len() > 1 {
            out.push_str("\nAll rounds:");
            for (i, log) in history.iter().enumerate() {
                let _ = write!(out, "\n  round {}:", i + 1);
                for line in log.to_string().lines() {
                    let _ = write!(out, "\n    {line}");
                }
            }
        }
        out
    }
}

fn render_last(history: &[AttemptLog]) -> String {
    history
        .last()
        .map(ToString::to_string)
        .unwrap_or_else(|| "no rounds attempted".to_string())
}
