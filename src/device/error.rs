//! Transaction errors.

use crate::port::PortError;
use crate::protocol::FrameError;
use thiserror::Error;

/// Why a transaction with the controller failed.
///
/// The display text of every variant stands on its own; the HTTP layer hands
/// it to the client unchanged.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The serial channel could not be opened or configured.
    #[error("failed to open serial port: {0}")]
    Open(#[source] PortError),

    #[error("write timeout after {transferred}/{expected} bytes")]
    WriteTimeout { transferred: usize, expected: usize },

    #[error("read timeout after {transferred}/{expected} bytes")]
    ReadTimeout { transferred: usize, expected: usize },

    #[error("write failed: {0}")]
    WriteFailed(#[source] PortError),

    #[error("read failed: {0}")]
    ReadFailed(#[source] PortError),

    /// The reply arrived but was rejected, including a device NAK.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Coarse classification of a [`DeviceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Channel failure or deadline expiry.
    Transport,
    /// Missing STX/ETX or wrong length; the link is out of step.
    Framing,
    /// BCC mismatch.
    Checksum,
    /// Unrecognised response type.
    Protocol,
    /// Well-formed NAK from the controller.
    Device,
}

impl DeviceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Open(_)
            | Self::WriteTimeout { .. }
            | Self::ReadTimeout { .. }
            | Self::WriteFailed(_)
            | Self::ReadFailed(_) => ErrorClass::Transport,
            Self::Frame(FrameError::InvalidLength(_) | FrameError::MissingMarkers) => {
                ErrorClass::Framing
            }
            Self::Frame(FrameError::ChecksumMismatch { .. }) => ErrorClass::Checksum,
            Self::Frame(FrameError::InvalidResponseType(_)) => ErrorClass::Protocol,
            Self::Frame(FrameError::Device(_)) => ErrorClass::Device,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::WriteTimeout { .. } | Self::ReadTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::DeviceErrorCode;
    use std::io;

    #[test]
    fn test_timeout_display() {
        let err = DeviceError::ReadTimeout {
            transferred: 2,
            expected: 6,
        };
        assert_eq!(err.to_string(), "read timeout after 2/6 bytes");
        assert!(err.is_timeout());
        assert_eq!(err.class(), ErrorClass::Transport);
    }

    #[test]
    fn test_transport_failure_display() {
        let err = DeviceError::WriteFailed(PortError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "cable pulled",
        )));
        assert_eq!(err.to_string(), "write failed: I/O error: cable pulled");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_frame_errors_pass_through() {
        let err = DeviceError::from(FrameError::Device(DeviceErrorCode::OutOfRange));
        assert_eq!(
            err.to_string(),
            "device error: invalid setting value (out-of-range specified)"
        );
        assert_eq!(err.class(), ErrorClass::Device);

        let err = DeviceError::from(FrameError::ChecksumMismatch {
            expected: 1,
            actual: 2,
        });
        assert_eq!(err.class(), ErrorClass::Checksum);
        assert_eq!(
            DeviceError::from(FrameError::MissingMarkers).class(),
            ErrorClass::Framing
        );
        assert_eq!(
            DeviceError::from(FrameError::InvalidResponseType(0x43)).class(),
            ErrorClass::Protocol
        );
    }
}
