//! Mock serial port implementation for testing.
//!
//! `MockSerialPort` simulates a byte channel without hardware. Clones share
//! state, so a test can keep one handle for inspection after moving another
//! into a [`crate::device::Cd22`]. Besides a scripted read queue it can cap
//! the bytes moved per call, inject I/O errors, add per-call latency and
//! answer complete request frames through a responder such as
//! [`SimulatedCd22`].

use super::error::PortError;
use super::traits::SerialPortAdapter;
use crate::protocol::{
    build_response, calculate_bcc, DeviceErrorCode, Frame, Opcode, ResponseType, ETX, FRAME_LEN,
    STX,
};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Produces the reply bytes for one complete request frame.
type Responder = Box<dyn FnMut(&Frame) -> Vec<u8> + Send>;

#[derive(Default)]
struct MockPortState {
    /// Bytes returned by subsequent reads.
    read_queue: VecDeque<u8>,
    /// Every byte accepted by a write, in order.
    written: Vec<u8>,
    /// Byte count accepted by each individual write call.
    write_calls: Vec<usize>,
    /// Bytes of a request frame not yet handed to the responder.
    pending: Vec<u8>,
    responder: Option<Responder>,
    max_write_chunk: Option<usize>,
    max_read_chunk: Option<usize>,
    write_failures: VecDeque<io::ErrorKind>,
    read_failures: VecDeque<io::ErrorKind>,
    latency: Duration,
    timeout: Duration,
    input_clears: usize,
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use cd22_bridge::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(&[0x02, 0x06, 0x12, 0x34, 0x03, 0x20]);
///
/// let mut buffer = [0u8; 6];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(n, 6);
///
/// port.write_bytes(&[0x02, 0x52, 0x00, 0x10, 0x03, 0x42]).unwrap();
/// assert_eq!(port.written(), vec![0x02, 0x52, 0x00, 0x10, 0x03, 0x42]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_millis(50),
                ..Default::default()
            })),
        }
    }

    /// Create a mock port answered by a [`SimulatedCd22`].
    pub fn with_device(name: impl Into<String>, device: SimulatedCd22) -> Self {
        let mut port = Self::new(name);
        port.set_responder(device.into_responder());
        port
    }

    fn lock(&self) -> MutexGuard<'_, MockPortState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append bytes to the read queue.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.lock().read_queue.extend(data);
    }

    /// Answer every complete request frame with `responder`'s output.
    pub fn set_responder(&mut self, responder: impl FnMut(&Frame) -> Vec<u8> + Send + 'static) {
        self.lock().responder = Some(Box::new(responder));
    }

    /// Accept at most `n` bytes per write call.
    pub fn set_max_write_chunk(&mut self, n: usize) {
        self.lock().max_write_chunk = Some(n);
    }

    /// Return at most `n` bytes per read call.
    pub fn set_max_read_chunk(&mut self, n: usize) {
        self.lock().max_read_chunk = Some(n);
    }

    /// Sleep this long at the start of every read and write call.
    pub fn set_latency(&mut self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Fail the next write call with an I/O error of `kind`.
    pub fn fail_next_write(&mut self, kind: io::ErrorKind) {
        self.lock().write_failures.push_back(kind);
    }

    /// Fail the next read call with an I/O error of `kind`.
    pub fn fail_next_read(&mut self, kind: io::ErrorKind) {
        self.lock().read_failures.push_back(kind);
    }

    /// Every byte written so far, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Number of bytes accepted by each write call.
    pub fn write_calls(&self) -> Vec<usize> {
        self.lock().write_calls.clone()
    }

    /// Current channel timeout.
    pub fn timeout(&self) -> Duration {
        self.lock().timeout
    }

    /// Number of times the input buffer has been discarded.
    pub fn input_clears(&self) -> usize {
        self.lock().input_clears
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.lock().read_queue.len()
    }

    fn pause(&self) {
        let latency = self.lock().latency;
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        self.pause();
        let mut state = self.lock();

        if let Some(kind) = state.write_failures.pop_front() {
            return Err(PortError::Io(io::Error::new(kind, "injected write failure")));
        }

        let n = state.max_write_chunk.map_or(data.len(), |max| max.min(data.len()));
        let accepted = &data[..n];
        state.written.extend_from_slice(accepted);
        state.write_calls.push(n);

        if state.responder.is_some() {
            state.pending.extend_from_slice(accepted);
            while state.pending.len() >= FRAME_LEN {
                let mut frame = [0u8; FRAME_LEN];
                frame.copy_from_slice(&state.pending[..FRAME_LEN]);
                state.pending.drain(..FRAME_LEN);
                let reply = state.responder.as_mut().map(|r| r(&frame)).unwrap_or_default();
                state.read_queue.extend(reply);
            }
        }

        Ok(n)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.pause();
        let mut state = self.lock();

        if let Some(kind) = state.read_failures.pop_front() {
            return Err(PortError::Io(io::Error::new(kind, "injected read failure")));
        }

        if state.read_queue.is_empty() {
            // Behave like a real port: block for the channel timeout, then
            // report that nothing arrived.
            let timeout = state.timeout;
            drop(state);
            std::thread::sleep(timeout);
            return Err(PortError::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                "no data available",
            )));
        }

        let limit = state.max_read_chunk.unwrap_or(buffer.len()).min(buffer.len());
        let mut bytes_read = 0;
        for byte in buffer.iter_mut().take(limit) {
            match state.read_queue.pop_front() {
                Some(b) => {
                    *byte = b;
                    bytes_read += 1;
                }
                None => break,
            }
        }
        Ok(bytes_read)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.lock().timeout = timeout;
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), PortError> {
        let mut state = self.lock();
        state.read_queue.clear();
        state.input_clears += 1;
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// A register-map model of a CD22 controller.
///
/// READ seats the address and returns the register, WRITE stores into the
/// seated address, COMMAND returns the value configured for the code. Values
/// above a register's limit are refused with `OutOfRange`.
#[derive(Debug, Clone, Default)]
pub struct SimulatedCd22 {
    registers: HashMap<u16, u16>,
    limits: HashMap<u16, u16>,
    commands: HashMap<u16, u16>,
    seated: Option<u16>,
}

impl SimulatedCd22 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_register(mut self, addr: u16, value: u16) -> Self {
        self.registers.insert(addr, value);
        self
    }

    pub fn with_limit(mut self, addr: u16, max: u16) -> Self {
        self.limits.insert(addr, max);
        self
    }

    pub fn with_command(mut self, code: u16, result: u16) -> Self {
        self.commands.insert(code, result);
        self
    }

    /// Process one request frame and produce the reply frame.
    pub fn handle(&mut self, frame: &Frame) -> Frame {
        if frame[0] != STX || frame[4] != ETX {
            return nak(DeviceErrorCode::InvalidCommand);
        }
        if calculate_bcc(&frame[1..4]) != frame[5] {
            return nak(DeviceErrorCode::InvalidBcc);
        }

        let value = u16::from_be_bytes([frame[2], frame[3]]);
        match Opcode::try_from(frame[1]) {
            Ok(Opcode::Read) => {
                self.seated = Some(value);
                ack(self.registers.get(&value).copied().unwrap_or(0))
            }
            Ok(Opcode::Write) => {
                let Some(addr) = self.seated else {
                    return nak(DeviceErrorCode::InvalidAddress);
                };
                if self.limits.get(&addr).is_some_and(|max| value > *max) {
                    return nak(DeviceErrorCode::OutOfRange);
                }
                self.registers.insert(addr, value);
                ack(value)
            }
            Ok(Opcode::Command) => match self.commands.get(&value) {
                Some(result) => ack(*result),
                None => nak(DeviceErrorCode::InvalidCommand),
            },
            Err(_) => nak(DeviceErrorCode::InvalidCommand),
        }
    }

    fn into_responder(mut self) -> impl FnMut(&Frame) -> Vec<u8> + Send + 'static {
        move |frame| self.handle(frame).to_vec()
    }
}

fn ack(value: u16) -> Frame {
    build_response(ResponseType::Ack, value.to_be_bytes())
}

fn nak(code: DeviceErrorCode) -> Frame {
    build_response(ResponseType::Nak, [code.code(), 0x00])
}
