//! Configuration for serial-link.
//!
//! TOML-based configuration with built-in defaults and environment variable
//! overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_LINK_CONFIG` environment variable (explicit path)
//! 2. `./config.toml` (current directory)
//! 3. `config.toml` in the per-user config directory
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `SERIAL_LINK_<SECTION>_<KEY>`, e.g.
//! `SERIAL_LINK_SERIAL_PORT=/dev/ttyACM0` or
//! `SERIAL_LINK_SERIAL_DUMP_SERIAL=true`. `SERIAL_LINK_LOG_LEVEL` sets the
//! log level.
//!
//! # Example
//!
//! ```toml
//! [serial]
//! port = "auto"
//! altport = "/dev/ttyUSB0"
//! baud_rate = 57600
//! dump_serial = false
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, set_serial_value_in,
    ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig};
