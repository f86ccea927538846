//! Port abstraction layer for serial communication.
//!
//! Provides the `SerialPortAdapter` trait, a `serialport`-backed
//! implementation and a mock for tests.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockSerialPort, SimulatedCd22};
pub use sync_port::SyncSerialPort;
pub use traits::{Parity, PortConfiguration, SerialPortAdapter};
