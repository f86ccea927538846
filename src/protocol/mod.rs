//! CD22 wire protocol.
//!
//! Every exchange is a fixed 6-byte frame in both directions:
//!
//! ```text
//! [STX, CMD|TYPE, DATA_HI, DATA_LO, ETX, BCC]
//! ```
//!
//! `BCC` is the XOR of bytes 1..=3. Requests carry an [`Opcode`], replies a
//! [`ResponseType`]. A NAK reply carries a [`DeviceErrorCode`] in `DATA_HI`.

pub mod codec;
pub mod error;

pub use codec::{build_frame, build_response, calculate_bcc, parse_response, Frame};
pub use error::{describe, DeviceErrorCode, FrameError};

/// Start-of-text marker.
pub const STX: u8 = 0x02;
/// End-of-text marker.
pub const ETX: u8 = 0x03;
/// Frame length, requests and replies alike.
pub const FRAME_LEN: usize = 6;

/// Request opcodes understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// `'C'`: execute a command code.
    Command = 0x43,
    /// `'W'`: write data to the address seated by the last READ.
    Write = 0x57,
    /// `'R'`: read the register at an address.
    Read = 0x52,
}

impl Opcode {
    pub const ALL: [Opcode; 3] = [Opcode::Command, Opcode::Write, Opcode::Read];

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command => write!(f, "COMMAND"),
            Self::Write => write!(f, "WRITE"),
            Self::Read => write!(f, "READ"),
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x43 => Ok(Self::Command),
            0x57 => Ok(Self::Write),
            0x52 => Ok(Self::Read),
            other => Err(other),
        }
    }
}

/// Reply type carried in byte 1 of a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResponseType {
    Ack = 0x06,
    Nak = 0x15,
}

impl ResponseType {
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ResponseType {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x06 => Ok(Self::Ack),
            0x15 => Ok(Self::Nak),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_bytes() {
        assert_eq!(Opcode::Command.as_byte(), b'C');
        assert_eq!(Opcode::Write.as_byte(), b'W');
        assert_eq!(Opcode::Read.as_byte(), b'R');
        for op in Opcode::ALL {
            assert_eq!(Opcode::try_from(op.as_byte()), Ok(op));
        }
        assert_eq!(Opcode::try_from(0x06), Err(0x06));
    }

    #[test]
    fn test_response_type_from_byte() {
        assert_eq!(ResponseType::try_from(0x06), Ok(ResponseType::Ack));
        assert_eq!(ResponseType::try_from(0x15), Ok(ResponseType::Nak));
        assert_eq!(ResponseType::try_from(0x43), Err(0x43));
    }
}
