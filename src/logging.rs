//! Subscriber setup for the binary.
//!
//! Logs go to stderr (and optionally a file) so stdout stays free for
//! dumped serial traffic.

use crate::config::{LogFormat, LoggingConfig};
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {message}")]
    Filter { filter: String, message: String },

    #[error("Failed to open log file: {0}")]
    File(#[from] io::Error),

    #[error("Failed to install log subscriber: {0}")]
    Install(String),
}

/// Build the filter: `RUST_LOG` wins over the configured level.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| LoggingError::Filter {
        filter: level.to_string(),
        message: e.to_string(),
    })
}

fn build_writer(config: &LoggingConfig) -> Result<BoxMakeWriter, LoggingError> {
    match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Ok(BoxMakeWriter::new(io::stderr.and(Mutex::new(file))))
        }
        None => Ok(BoxMakeWriter::new(io::stderr)),
    }
}

/// Install the global subscriber described by `config`.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(&config.level)?)
        .with_writer(build_writer(config)?)
        .with_ansi(config.file.is_none())
        .with_target(false);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed.map_err(|e| LoggingError::Install(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_levels() {
        for level in ["trace", "debug", "info", "warn", "error", "serial_link=debug"] {
            assert!(build_filter(level).is_ok(), "{level}");
        }
    }

    #[test]
    fn test_build_writer_opens_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            file: Some(dir.path().join("link.log")),
            ..Default::default()
        };
        assert!(build_writer(&config).is_ok());
        assert!(dir.path().join("link.log").exists());
    }

    #[test]
    fn test_file_writer_appends_events() {
        use std::io::Write;
        use tracing_subscriber::fmt::MakeWriter;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("link.log");
        std::fs::write(&path, "earlier\n").unwrap();

        let file = OpenOptions::new().append(true).open(&path).unwrap();
        let writer = Mutex::new(file);
        writer.make_writer().write_all(b"opened COM3\n").unwrap();

        let logged = std::fs::read_to_string(&path).unwrap();
        assert_eq!(logged, "earlier\nopened COM3\n");
    }
}
