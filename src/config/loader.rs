//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "CD22_BRIDGE";

/// Config file name
const CONFIG_FILE_NAME: &str = "cd22-bridge.toml";

/// Directory name under the platform config dir
const APP_DIR_NAME: &str = "cd22-bridge";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "CD22_BRIDGE_CONFIG";

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
    /// 1. `CD22_BRIDGE_CONFIG` environment variable (explicit path)
    /// 2. `./cd22-bridge.toml` (current directory)
    /// 3. `~/.config/cd22-bridge/cd22-bridge.toml` (XDG on Linux/macOS)
    /// 4. `%APPDATA%\cd22-bridge\cd22-bridge.toml` (Windows)
    /// 5. Built-in defaults (no file required)
    ///
    /// Environment variables override file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path()?;

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };
        apply_env_overrides(&mut config, env_var)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path. The file must exist.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config, env_var)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
///
/// An explicit `CD22_BRIDGE_CONFIG` that points nowhere is an error rather
/// than a silent fallback to defaults.
pub fn resolve_config_path() -> ConfigResult<Option<PathBuf>> {
    if let Some(path) = env_var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        return if path.exists() {
            Ok(Some(path))
        } else {
            Err(ConfigError::NotFound(path))
        };
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Ok(Some(cwd_config));
    }

    Ok(default_config_path().filter(|p| p.exists()))
}

/// Default location for a per-user config file.
pub fn default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env_var("APPDATA").map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        env_var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env_var("HOME").map(|h| PathBuf::from(h).join(".config")))
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `CD22_BRIDGE_<SECTION>_<KEY>` overrides, e.g.
/// `CD22_BRIDGE_SERIAL_PORT=/dev/ttyS1` or `CD22_BRIDGE_SERIAL_BAUD_RATE=38400`.
pub(crate) fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConfigResult<()> {
    let key = |suffix: &str| format!("{ENV_PREFIX}_{suffix}");

    if let Some(val) = lookup(&key("SERVER_LISTEN")) {
        config.server.listen = val;
    }
    if let Some(val) = lookup(&key("SERVER_STATIC_DIR")) {
        config.server.static_dir = PathBuf::from(val);
    }

    if let Some(val) = lookup(&key("SERIAL_PORT")) {
        config.serial.port = val;
    }
    if let Some(val) = parse_env(&lookup, &key("SERIAL_BAUD_RATE"), "invalid baud rate")? {
        config.serial.baud_rate = val;
    }
    if let Some(val) = lookup(&key("SERIAL_PARITY")) {
        config.serial.parity = match val.to_ascii_lowercase().as_str() {
            "none" => crate::port::Parity::None,
            "odd" => crate::port::Parity::Odd,
            "even" => crate::port::Parity::Even,
            _ => {
                return Err(ConfigError::env_parse(
                    key("SERIAL_PARITY"),
                    "expected none, odd or even",
                ))
            }
        };
    }
    if let Some(val) = parse_env(&lookup, &key("SERIAL_READ_TIMEOUT_MS"), "invalid timeout")? {
        config.serial.read_timeout_ms = val;
    }
    if let Some(val) = parse_env(
        &lookup,
        &key("SERIAL_TRANSACTION_TIMEOUT_MS"),
        "invalid timeout",
    )? {
        config.serial.transaction_timeout_ms = val;
    }

    if let Some(val) = lookup(&key("LOGGING_LEVEL")) {
        config.logging.level = val;
    }
    if let Some(val) = lookup(&key("LOGGING_FORMAT")) {
        config.logging.format = val
            .parse()
            .map_err(|msg: String| ConfigError::env_parse(key("LOGGING_FORMAT"), msg))?;
    }

    Ok(())
}

fn parse_env<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    message: &str,
) -> ConfigResult<Option<T>> {
    lookup(var)
        .map(|val| {
            val.trim()
                .parse()
                .map_err(|_| ConfigError::env_parse(var, message))
        })
        .transpose()
}
