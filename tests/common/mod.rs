//! Shared test utilities.

#![allow(dead_code)]

use cd22_bridge::port::{MockSerialPort, SimulatedCd22};
use cd22_bridge::protocol::{calculate_bcc, Opcode, ETX, FRAME_LEN, STX};
use cd22_bridge::{Cd22, DeviceConfig};
use std::time::Duration;

/// Device config with a generous deadline for tests that are not about timing.
pub fn relaxed_config() -> DeviceConfig {
    DeviceConfig {
        read_timeout: Duration::from_millis(10),
        transaction_timeout: Duration::from_millis(2000),
        ..DeviceConfig::default()
    }
}

/// A `Cd22` answered by a simulated controller, plus a handle on the mock port.
pub fn simulated_device(device: SimulatedCd22) -> (Cd22, MockSerialPort) {
    let port = MockSerialPort::with_device("SIM0", device);
    let cd22 = Cd22::with_port(port.clone(), relaxed_config()).expect("mock port accepts timeout");
    (cd22, port)
}

/// Split a captured request stream into frames, asserting each one is intact.
pub fn assert_well_formed_frames(stream: &[u8]) -> Vec<(Opcode, u16)> {
    assert_eq!(
        stream.len() % FRAME_LEN,
        0,
        "stream length {} is not a whole number of frames",
        stream.len()
    );
    stream
        .chunks(FRAME_LEN)
        .enumerate()
        .map(|(i, frame)| {
            assert_eq!(frame[0], STX, "frame {i}: bad STX in {frame:02X?}");
            assert_eq!(frame[4], ETX, "frame {i}: bad ETX in {frame:02X?}");
            assert_eq!(
                calculate_bcc(&frame[1..4]),
                frame[5],
                "frame {i}: bad BCC in {frame:02X?}"
            );
            let opcode = Opcode::try_from(frame[1])
                .unwrap_or_else(|b| panic!("frame {i}: unknown opcode {b:02X}"));
            (opcode, u16::from_be_bytes([frame[2], frame[3]]))
        })
        .collect()
}
