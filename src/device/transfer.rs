//! Deadline-bound transfer loops.
//!
//! Both loops check the deadline *before* each channel call, so an expired
//! deadline never issues one more write or read.

use super::error::DeviceError;
use crate::port::SerialPortAdapter;
use std::time::Instant;

/// Write all of `data`, accumulating partial writes.
pub(super) fn write_all(
    port: &mut dyn SerialPortAdapter,
    data: &[u8],
    deadline: Instant,
) -> Result<(), DeviceError> {
    let mut transferred = 0;
    while transferred < data.len() {
        if Instant::now() >= deadline {
            return Err(DeviceError::WriteTimeout {
                transferred,
                expected: data.len(),
            });
        }
        match port.write_bytes(&data[transferred..]) {
            Ok(n) => transferred += n,
            Err(e) if e.is_transient() => {}
            Err(e) => return Err(DeviceError::WriteFailed(e)),
        }
    }
    Ok(())
}

/// Fill `buf` completely, accumulating short reads.
pub(super) fn read_exact(
    port: &mut dyn SerialPortAdapter,
    buf: &mut [u8],
    deadline: Instant,
) -> Result<(), DeviceError> {
    let mut transferred = 0;
    while transferred < buf.len() {
        if Instant::now() >= deadline {
            return Err(DeviceError::ReadTimeout {
                transferred,
                expected: buf.len(),
            });
        }
        match port.read_bytes(&mut buf[transferred..]) {
            Ok(n) => transferred += n,
            Err(e) if e.is_transient() => {}
            Err(e) => return Err(DeviceError::ReadFailed(e)),
        }
    }
    Ok(())
}
