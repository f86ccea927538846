//! Core traits for serial port abstraction.
//!
//! Defines the `SerialPortAdapter` trait that lets the transaction engine run
//! against real hardware or against [`super::MockSerialPort`].

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Line settings for the controller link.
///
/// The CD22 always talks 8 data bits, 1 stop bit, no flow control; only the
/// bit rate and parity are selectable on the device.
#[derive(Debug, Clone)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Parity checking mode.
    pub parity: Parity,

    /// How long a single blocking read may wait.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            parity: Parity::None,
            timeout: Duration::from_millis(50),
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Trait for serial port I/O operations.
///
/// Both calls may transfer fewer bytes than requested. A channel that had
/// nothing to transfer before its timeout returns an `Io` error of kind
/// `TimedOut` (see [`PortError::is_transient`]).
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Set the per-call read/write timeout for this port.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Discard any bytes received but not yet read.
    fn clear_input(&mut self) -> Result<(), PortError>;
}
