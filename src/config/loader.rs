//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_LINK";

/// Config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_LINK_CONFIG";

/// Application name used for the per-user config directory
const APP_NAME: &str = "serial-link";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIAL_LINK_CONFIG` environment variable (explicit path)
    /// 2. `./config.toml` (current directory)
    /// 3. `config.toml` in the per-user config directory
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override any file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => {
                debug!("no configuration file found, using defaults");
                Config::default()
            }
        };

        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    ///
    /// Keys missing from the file keep their defaults.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> ConfigResult<Self> {
        let mut config = Config::default();
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: None,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }

    /// Persist one `[serial]` setting into the loader's config file and
    /// reload.
    ///
    /// The file is created if it does not exist yet. Only the given key is
    /// written; other keys in the file are left as they are.
    pub fn set_serial_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let path = self
            .config_path
            .clone()
            .or_else(get_default_config_path)
            .ok_or(ConfigError::NoConfigPath)?;

        set_serial_value_in(&path, key, value)?;
        self.config = load_from_file(&path)?;
        apply_env_overrides(&mut self.config)?;
        self.config_path = Some(path);
        Ok(())
    }
}

/// Write a single `[serial]` key into the TOML file at `path`.
pub fn set_serial_value_in(path: &Path, key: &str, value: &str) -> ConfigResult<()> {
    if !is_known_serial_key(key) {
        return Err(ConfigError::invalid_setting(key, "unknown serial setting"));
    }

    let mut table: toml::Table = if path.exists() {
        let content = read_file(path)?;
        content.parse()?
    } else {
        info!(path = %path.display(), "config file does not exist yet, creating it");
        toml::Table::new()
    };

    let serial = table
        .entry("serial")
        .or_insert_with(|| toml::Value::Table(toml::Table::new()))
        .as_table_mut()
        .ok_or_else(|| ConfigError::invalid_setting("serial", "expected a table"))?;
    let value = match key {
        "port" | "altport" => toml::Value::String(value.to_string()),
        _ => parse_scalar(value),
    };
    serial.insert(key.to_string(), value);

    // Refuse to write a file that no longer loads.
    let _: Config = toml::Value::Table(table.clone())
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::invalid_setting(key, e.to_string()))?;

    ensure_parent(path)?;
    let content = toml::to_string_pretty(&table)?;
    std::fs::write(path, content).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), key, "persisted serial setting");
    Ok(())
}

fn is_known_serial_key(key: &str) -> bool {
    matches!(
        key,
        "port"
            | "altport"
            | "baud_rate"
            | "timeout_ms"
            | "dump_serial"
            | "dumpSerial"
            | "max_rounds"
            | "retry_delay_ms"
    )
}

fn parse_scalar(value: &str) -> toml::Value {
    if let Ok(b) = value.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(i) = value.parse::<i64>() {
        toml::Value::Integer(i)
    } else {
        toml::Value::String(value.to_string())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Per-user config directory
    get_default_config_path().filter(|p| p.exists())
}

/// Get the default config directory for creating new config files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

fn read_file(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = read_file(path)?;
    let config = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

fn ensure_parent(path: &Path) -> ConfigResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: path.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    ensure_parent(path)?;

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

fn env_var(suffix: &str) -> Option<(String, String)> {
    let name = format!("{}_{}", ENV_PREFIX, suffix);
    std::env::var(&name).ok().map(|val| (name, val))
}

fn parse_env<T: std::str::FromStr>(name: &str, val: &str, what: &str) -> ConfigResult<T> {
    val.trim()
        .parse()
        .map_err(|_| ConfigError::invalid_env(name, format!("Invalid {}", what)))
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SERIAL_LINK_<SECTION>_<KEY>`
/// For example:
/// - `SERIAL_LINK_SERIAL_PORT=/dev/ttyACM0`
/// - `SERIAL_LINK_SERIAL_BAUD_RATE=115200`
/// - `SERIAL_LINK_LOG_LEVEL=debug`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some((_, val)) = env_var("SERIAL_PORT") {
        config.serial.port = Some(val);
    }
    if let Some((_, val)) = env_var("SERIAL_ALTPORT") {
        config.serial.altport = Some(val);
    }
    if let Some((name, val)) = env_var("SERIAL_BAUD_RATE") {
        config.serial.baud_rate = parse_env(&name, &val, "baud rate")?;
    }
    if let Some((name, val)) = env_var("SERIAL_TIMEOUT_MS") {
        config.serial.timeout_ms = parse_env(&name, &val, "timeout")?;
    }
    if let Some((_, val)) = env_var("SERIAL_DUMP_SERIAL") {
        config.serial.dump_serial = val.eq_ignore_ascii_case("true") || val == "1";
    }
    if let Some((name, val)) = env_var("SERIAL_MAX_ROUNDS") {
        config.serial.max_rounds = parse_env(&name, &val, "round count")?;
    }
    if let Some((name, val)) = env_var("SERIAL_RETRY_DELAY_MS") {
        config.serial.retry_delay_ms = parse_env(&name, &val, "retry delay")?;
    }

    if let Some((_, val)) = env_var("LOG_LEVEL") {
        config.logging.level = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults().unwrap();
        assert_eq!(loader.config().serial.baud_rate, 57600);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("SERIAL_LINK_SERIAL_PORT", "COM99");
        env::set_var("SERIAL_LINK_SERIAL_BAUD_RATE", "115200");
        env::set_var("SERIAL_LINK_SERIAL_DUMP_SERIAL", "1");

        let loader = ConfigLoader::with_defaults().unwrap();
        assert_eq!(loader.config().serial.port.as_deref(), Some("COM99"));
        assert_eq!(loader.config().serial.baud_rate, 115200);
        assert!(loader.config().serial.dump_serial);

        env::remove_var("SERIAL_LINK_SERIAL_PORT");
        env::remove_var("SERIAL_LINK_SERIAL_BAUD_RATE");
        env::remove_var("SERIAL_LINK_SERIAL_DUMP_SERIAL");
    }

    #[test]
    #[serial]
    fn test_env_override_rejects_garbage() {
        env::set_var("SERIAL_LINK_SERIAL_BAUD_RATE", "fast");
        let result = ConfigLoader::with_defaults();
        env::remove_var("SERIAL_LINK_SERIAL_BAUD_RATE");

        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_scalar("true"), toml::Value::Boolean(true));
        assert_eq!(parse_scalar("57600"), toml::Value::Integer(57600));
        assert_eq!(
            parse_scalar("/dev/ttyACM0"),
            toml::Value::String("/dev/ttyACM0".into())
        );
    }
}
