//! CD22 serial bridge.
//!
//! Talks to a CD22 class controller over a serial link using fixed 6-byte
//! STX/ETX frames with an XOR block check, and exposes it over HTTP.
//!
//! # Modules
//!
//! - `protocol`: frame codec, opcodes and device error codes
//! - `port`: serial port abstraction, real and mock
//! - `device`: the `Cd22` handle and its transaction engine
//! - `service`: async facade over the blocking device
//! - `config`: TOML configuration with environment overrides
//! - `logging`: tracing subscriber setup
//! - `rest_api` / `error`: HTTP front end (when `rest-api` feature is enabled)

pub mod config;
pub mod device;
pub mod logging;
pub mod port;
pub mod protocol;
pub mod service;

#[cfg(feature = "rest-api")]
pub mod error;

#[cfg(feature = "rest-api")]
pub mod rest_api;

// Re-export commonly used types for convenience
pub use device::{Cd22, DeviceConfig, DeviceError, ErrorClass};
pub use port::{MockSerialPort, PortError, SerialPortAdapter, SimulatedCd22, SyncSerialPort};
pub use protocol::{DeviceErrorCode, FrameError, Opcode, ResponseType};
pub use service::{DeviceService, ServiceError, ServiceResult};

#[cfg(feature = "rest-api")]
pub use error::{AppError, AppResult};

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
