//! Service layer between the async front end and the blocking device.
//!
//! ```text
//! REST API ──> DeviceService ──spawn_blocking──> Cd22 (Mutex<channel>)
//! ```
//!
//! The transaction engine blocks on serial I/O, so every call is moved onto
//! tokio's blocking pool. Concurrent requests queue on the device lock, not
//! on the async workers.

use crate::device::{Cd22, DeviceError};
use std::sync::Arc;

// ========== Error Types ==========

/// Service-level failures.
#[derive(Debug)]
pub enum ServiceError {
    /// The transaction reached the device and failed.
    Device(DeviceError),
    /// The blocking task panicked or was cancelled.
    Join(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device(e) => write!(f, "{e}"),
            Self::Join(msg) => write!(f, "device task failed: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Device(e) => Some(e),
            Self::Join(_) => None,
        }
    }
}

impl From<DeviceError> for ServiceError {
    fn from(err: DeviceError) -> Self {
        Self::Device(err)
    }
}

/// Convenient Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

// ========== Service Implementation ==========

/// Async facade over a shared [`Cd22`].
#[derive(Clone, Debug)]
pub struct DeviceService {
    device: Arc<Cd22>,
}

impl DeviceService {
    pub fn new(device: Cd22) -> Self {
        Self {
            device: Arc::new(device),
        }
    }

    /// Execute a command code and return the device's result.
    pub async fn command(&self, code: u16) -> ServiceResult<u16> {
        self.run(move |dev| dev.command(code)).await
    }

    /// Read the register at `addr`.
    pub async fn read(&self, addr: u16) -> ServiceResult<u16> {
        self.run(move |dev| dev.read(addr)).await
    }

    /// Write `data` to the register at `addr`.
    pub async fn write(&self, addr: u16, data: u16) -> ServiceResult<u16> {
        self.run(move |dev| dev.write_at(addr, data)).await
    }

    async fn run<F>(&self, op: F) -> ServiceResult<u16>
    where
        F: FnOnce(&Cd22) -> Result<u16, DeviceError> + Send + 'static,
    {
        let device = Arc::clone(&self.device);
        tokio::task::spawn_blocking(move || op(&device))
            .await
            .map_err(|e| ServiceError::Join(e.to_string()))?
            .map_err(ServiceError::Device)
    }
}
