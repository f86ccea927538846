//! CD22 device handle and transaction engine.
//!
//! A [`Cd22`] owns the serial channel for the life of the process. Every
//! exchange goes through [`Cd22::send`]: the channel lock is held for the whole
//! write + read + decode cycle, and a single deadline taken after the lock is
//! acquired bounds both I/O phases together. Nothing here retries; a WRITE
//! re-sent after a lost reply is not idempotent on the device.

mod error;
mod transfer;

pub use error::{DeviceError, ErrorClass};

use crate::port::{Parity, PortConfiguration, SerialPortAdapter, SyncSerialPort};
use crate::protocol::{build_frame, parse_response, Frame, Opcode, FRAME_LEN};
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Link and timing settings for a [`Cd22`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub baud_rate: u32,
    pub parity: Parity,
    /// Upper bound for a single blocking read on the channel.
    pub read_timeout: Duration,
    /// Budget for one complete transaction, write and read together.
    pub transaction_timeout: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            parity: Parity::None,
            read_timeout: Duration::from_millis(50),
            transaction_timeout: Duration::from_millis(50),
        }
    }
}

impl DeviceConfig {
    /// Channel timeout actually applied: never longer than a transaction.
    pub fn channel_timeout(&self) -> Duration {
        self.read_timeout.min(self.transaction_timeout)
    }
}

struct Channel {
    port: Box<dyn SerialPortAdapter>,
    /// Set after a failed transaction; a late reply may still be in flight.
    stale_input: bool,
}

/// Handle to one controller on one serial channel.
pub struct Cd22 {
    channel: Mutex<Channel>,
    port_name: String,
    config: DeviceConfig,
}

impl Cd22 {
    /// Open `port_name` and take ownership of it.
    pub fn open(port_name: &str, config: DeviceConfig) -> Result<Self, DeviceError> {
        let port_config = PortConfiguration {
            baud_rate: config.baud_rate,
            parity: config.parity,
            timeout: config.channel_timeout(),
        };
        let port = SyncSerialPort::open(port_name, &port_config).map_err(DeviceError::Open)?;
        info!(
            port = port_name,
            baud_rate = config.baud_rate,
            parity = ?config.parity,
            "serial port opened"
        );
        Self::with_port(port, config)
    }

    /// Wrap an already open channel.
    pub fn with_port(
        mut port: impl SerialPortAdapter + 'static,
        config: DeviceConfig,
    ) -> Result<Self, DeviceError> {
        port.set_timeout(config.channel_timeout())
            .map_err(DeviceError::Open)?;
        Ok(Self {
            port_name: port.name().to_string(),
            channel: Mutex::new(Channel {
                port: Box::new(port),
                stale_input: false,
            }),
            config,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Run one transaction: send `opcode` with `value`, return the ACK value.
    pub fn send(&self, opcode: Opcode, value: u16) -> Result<u16, DeviceError> {
        let mut channel = self.channel.lock();
        self.transact(&mut channel, opcode, value)
    }

    /// Execute a command code.
    pub fn command(&self, code: u16) -> Result<u16, DeviceError> {
        self.send(Opcode::Command, code)
    }

    /// Read the register at `addr`.
    pub fn read(&self, addr: u16) -> Result<u16, DeviceError> {
        self.send(Opcode::Read, addr)
    }

    /// Write `data` to the register at `addr`.
    ///
    /// The controller writes to the address seated by the most recent READ,
    /// so this reads `addr` first and then writes, both under one lock
    /// acquisition. Each half gets its own deadline. Returns the value the
    /// controller acknowledged for the write.
    pub fn write_at(&self, addr: u16, data: u16) -> Result<u16, DeviceError> {
        let mut channel = self.channel.lock();
        self.transact(&mut channel, Opcode::Read, addr)?;
        self.transact(&mut channel, Opcode::Write, data)
    }

    fn transact(
        &self,
        channel: &mut Channel,
        opcode: Opcode,
        value: u16,
    ) -> Result<u16, DeviceError> {
        if channel.stale_input {
            if let Err(e) = channel.port.clear_input() {
                warn!(port = %self.port_name, error = %e, "failed to discard stale input");
            }
            channel.stale_input = false;
        }

        let deadline = Instant::now() + self.config.transaction_timeout;
        let request = build_frame(opcode, value);
        debug!(port = %self.port_name, %opcode, value, frame = %hex(&request), "tx");

        let result = exchange(&self.port_name, channel.port.as_mut(), &request, deadline);
        match &result {
            Ok(value) => debug!(port = %self.port_name, %opcode, value, "ack"),
            Err(e) => {
                channel.stale_input = true;
                warn!(port = %self.port_name, %opcode, error = %e, "transaction failed");
            }
        }
        result
    }
}

impl std::fmt::Debug for Cd22 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cd22")
            .field("port_name", &self.port_name)
            .field("config", &self.config)
            .finish()
    }
}

fn exchange(
    port_name: &str,
    port: &mut dyn SerialPortAdapter,
    request: &Frame,
    deadline: Instant,
) -> Result<u16, DeviceError> {
    transfer::write_all(port, request, deadline)?;

    let mut reply = [0u8; FRAME_LEN];
    transfer::read_exact(port, &mut reply, deadline)?;
    debug!(port = %port_name, frame = %hex(&reply), "rx");

    Ok(parse_response(&reply)?)
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
