//! Codec errors and the device error code table.

use thiserror::Error;

/// Error code reported by the controller in a NAK reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceErrorCode {
    InvalidAddress,
    InvalidBcc,
    InvalidCommand,
    InvalidParameter,
    OutOfRange,
    /// A code outside the documented table.
    Unknown(u8),
}

impl DeviceErrorCode {
    /// Raw byte as it appears on the wire.
    pub fn code(self) -> u8 {
        match self {
            Self::InvalidAddress => 0x02,
            Self::InvalidBcc => 0x04,
            Self::InvalidCommand => 0x05,
            Self::InvalidParameter => 0x06,
            Self::OutOfRange => 0x07,
            Self::Unknown(code) => code,
        }
    }
}

impl From<u8> for DeviceErrorCode {
    fn from(code: u8) -> Self {
        match code {
            0x02 => Self::InvalidAddress,
            0x04 => Self::InvalidBcc,
            0x05 => Self::InvalidCommand,
            0x06 => Self::InvalidParameter,
            0x07 => Self::OutOfRange,
            other => Self::Unknown(other),
        }
    }
}

impl std::fmt::Display for DeviceErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAddress => write!(f, "invalid address"),
            Self::InvalidBcc => write!(f, "invalid BCC value"),
            Self::InvalidCommand => write!(f, "invalid command"),
            Self::InvalidParameter => {
                write!(f, "invalid setting value (parameter specification invalid)")
            }
            Self::OutOfRange => write!(f, "invalid setting value (out-of-range specified)"),
            Self::Unknown(code) => write!(f, "unknown error code {code:02X}"),
        }
    }
}

/// Human-readable description of a raw device error code.
pub fn describe(code: u8) -> String {
    DeviceErrorCode::from(code).to_string()
}

/// Reasons a response frame is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("invalid response length: expected 6 bytes, got {0}")]
    InvalidLength(usize),

    #[error("framing error: missing STX/ETX")]
    MissingMarkers,

    #[error("checksum mismatch: expected {expected:02X}, got {actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("invalid response type: {0:02X}")]
    InvalidResponseType(u8),

    /// Well-formed NAK.
    #[error("device error: {0}")]
    Device(DeviceErrorCode),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(describe(0x02), "invalid address");
        assert_eq!(describe(0x04), "invalid BCC value");
        assert_eq!(describe(0x05), "invalid command");
        assert_eq!(
            describe(0x06),
            "invalid setting value (parameter specification invalid)"
        );
        assert_eq!(
            describe(0x07),
            "invalid setting value (out-of-range specified)"
        );
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(describe(0x09), "unknown error code 09");
        assert_eq!(describe(0xAB), "unknown error code AB");
        assert_eq!(describe(0x00), "unknown error code 00");
    }

    #[test]
    fn test_code_roundtrip() {
        for byte in 0..=u8::MAX {
            assert_eq!(DeviceErrorCode::from(byte).code(), byte);
        }
    }

    #[test]
    fn test_frame_error_display() {
        let err = FrameError::ChecksumMismatch {
            expected: 0x26,
            actual: 0x27,
        };
        assert_eq!(err.to_string(), "checksum mismatch: expected 26, got 27");

        let err = FrameError::Device(DeviceErrorCode::InvalidCommand);
        assert_eq!(err.to_string(), "device error: invalid command");

        let err = FrameError::InvalidLength(4);
        assert_eq!(
            err.to_string(),
            "invalid response length: expected 6 bytes, got 4"
        );
    }
}
