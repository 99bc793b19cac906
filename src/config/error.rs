//! Errors raised while loading or persisting the link configuration.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file is missing.
    #[error("Config file {0} does not exist")]
    NotFound(PathBuf),

    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file is not valid TOML for serial-link: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot encode configuration as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Cannot write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `[serial]` key that is unknown or would not load with its new value.
    #[error("Cannot set serial.{key}: {message}")]
    InvalidSetting { key: String, message: String },

    /// A `SERIAL_LINK_*` override whose value does not parse.
    #[error("Environment override {var} is invalid: {message}")]
    InvalidEnv { var: String, message: String },

    /// `set` was asked to persist a value but no config location is known.
    #[error("No config file to store settings in; pass --config or set SERIAL_LINK_CONFIG")]
    NoConfigPath,
}

impl ConfigError {
    pub fn invalid_setting(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn invalid_env(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnv {
            var: var.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_setting_names_the_key() {
        let err = ConfigError::invalid_setting("baud_rate", "expected an integer");
        assert_eq!(
            err.to_string(),
            "Cannot set serial.baud_rate: expected an integer"
        );
    }

    #[test]
    fn test_invalid_env_names_the_variable() {
        let err = ConfigError::invalid_env("SERIAL_LINK_SERIAL_BAUD_RATE", "not a number");
        assert!(err.to_string().contains("SERIAL_LINK_SERIAL_BAUD_RATE"));
    }
}
