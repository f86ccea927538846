//! Configuration schema definitions.
//!
//! Every section uses `#[serde(default)]`, so a config file only needs the
//! keys it changes.

use crate::device::DeviceConfig;
use crate::port::Parity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::error::{ConfigError, ConfigResult};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Serial link to the controller
    pub serial: SerialConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the bridge cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.listen.trim().is_empty() {
            return Err(ConfigError::validation("server.listen", "must not be empty"));
        }
        if self.serial.port.trim().is_empty() {
            return Err(ConfigError::validation("serial.port", "must not be empty"));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::validation(
                "serial.baud_rate",
                "must be greater than zero",
            ));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.read_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.serial.transaction_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.transaction_timeout_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub listen: String,
    /// Directory holding `index.html` and `main.js`
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:80".to_string(),
            static_dir: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    /// Address to bind. A bare `:PORT` means all interfaces.
    pub fn bind_address(&self) -> String {
        let listen = self.listen.trim();
        match listen.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => listen.to_string(),
        }
    }
}

/// Serial link configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial port name or path
    pub port: String,
    /// Bit rate configured on the controller
    pub baud_rate: u32,
    pub parity: Parity,
    /// Longest a single blocking read may wait
    pub read_timeout_ms: u64,
    /// Budget for one request/reply exchange
    pub transaction_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            parity: Parity::None,
            read_timeout_ms: 50,
            transaction_timeout_ms: 50,
        }
    }
}

impl SerialConfig {
    pub fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            baud_rate: self.baud_rate,
            parity: self.parity,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            transaction_timeout: Duration::from_millis(self.transaction_timeout_ms),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset, e.g. "info" or "cd22_bridge=debug"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Multi-line human readable format
    #[default]
    Pretty,
    /// Single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address_accepts_bare_port() {
        let mut server = ServerConfig::default();
        assert_eq!(server.bind_address(), "0.0.0.0:80");

        server.listen = ":8080".to_string();
        assert_eq!(server.bind_address(), "0.0.0.0:8080");

        server.listen = "127.0.0.1:9000".to_string();
        assert_eq!(server.bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.listen, "0.0.0.0:80");
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_device_config_conversion() {
        let serial = SerialConfig {
            baud_rate: 38400,
            parity: Parity::Even,
            read_timeout_ms: 20,
            transaction_timeout_ms: 80,
            ..SerialConfig::default()
        };
        let device = serial.device_config();
        assert_eq!(device.baud_rate, 38400);
        assert_eq!(device.parity, Parity::Even);
        assert_eq!(device.read_timeout, Duration::from_millis(20));
        assert_eq!(device.transaction_timeout, Duration::from_millis(80));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [serial]
            port = "COM4"
            baud_rate = 115200
            parity = "odd"

            [logging]
            format = "json"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.port, "COM4");
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.serial.parity, Parity::Odd);
        assert_eq!(config.logging.format, LogFormat::Json);
        // Defaults should still work
        assert_eq!(config.serial.transaction_timeout_ms, 50);
        assert_eq!(config.server.static_dir, PathBuf::from("static"));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.serial.baud_rate = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for 'serial.baud_rate': must be greater than zero"
        );

        let mut config = Config::default();
        config.serial.port = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.serial.transaction_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
