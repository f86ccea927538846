//! Configuration for the bridge.
//!
//! TOML file plus environment overrides.
//!
//! # Configuration Resolution
//!
//! 1. `CD22_BRIDGE_CONFIG` environment variable (explicit path, must exist)
//! 2. `./cd22-bridge.toml` (current directory)
//! 3. `~/.config/cd22-bridge/cd22-bridge.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\cd22-bridge\cd22-bridge.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Pattern: `CD22_BRIDGE_<SECTION>_<KEY>`, for example
//! `CD22_BRIDGE_SERIAL_PORT=/dev/ttyUSB1` or `CD22_BRIDGE_SERVER_LISTEN=127.0.0.1:8080`.
//!
//! # Example
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:80"
//! static_dir = "static"
//!
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//! parity = "none"
//! read_timeout_ms = 50
//! transaction_timeout_ms = 50
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig, ServerConfig};
