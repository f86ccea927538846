//! Frame construction and response validation.
//!
//! All functions here are pure; the transaction engine in [`crate::device`]
//! does the I/O.

use super::error::{DeviceErrorCode, FrameError};
use super::{Opcode, ResponseType, ETX, FRAME_LEN, STX};

/// One frame on the wire.
pub type Frame = [u8; FRAME_LEN];

/// Build a request frame carrying `value` big-endian.
pub fn build_frame(opcode: Opcode, value: u16) -> Frame {
    let [hi, lo] = value.to_be_bytes();
    let cmd = opcode.as_byte();
    [STX, cmd, hi, lo, ETX, calculate_bcc(&[cmd, hi, lo])]
}

/// Build a well-formed reply frame, as the controller would send it.
pub fn build_response(kind: ResponseType, data: [u8; 2]) -> Frame {
    let ty = kind.as_byte();
    [STX, ty, data[0], data[1], ETX, calculate_bcc(&[ty, data[0], data[1]])]
}

/// XOR of every byte in `bytes`.
pub fn calculate_bcc(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |bcc, b| bcc ^ b)
}

/// Validate a reply frame and decode its 16-bit value.
///
/// Checks run in a fixed order: length, STX/ETX markers, checksum, then the
/// response type. A NAK decodes to [`FrameError::Device`].
pub fn parse_response(bytes: &[u8]) -> Result<u16, FrameError> {
    let frame: &Frame = bytes
        .try_into()
        .map_err(|_| FrameError::InvalidLength(bytes.len()))?;

    if frame[0] != STX || frame[4] != ETX {
        return Err(FrameError::MissingMarkers);
    }

    let expected = calculate_bcc(&frame[1..4]);
    let actual = frame[5];
    if expected != actual {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }

    match ResponseType::try_from(frame[1]) {
        Ok(ResponseType::Ack) => Ok(u16::from_be_bytes([frame[2], frame[3]])),
        Ok(ResponseType::Nak) => Err(FrameError::Device(DeviceErrorCode::from(frame[2]))),
        Err(other) => Err(FrameError::InvalidResponseType(other)),
    }
}
