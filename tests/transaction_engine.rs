//! Transaction engine behaviour across threads and failure paths.

mod common;

use cd22_bridge::port::{MockSerialPort, SimulatedCd22};
use cd22_bridge::protocol::{build_response, FrameError, Opcode, ResponseType};
use cd22_bridge::{Cd22, DeviceConfig, DeviceError};
use common::{assert_well_formed_frames, relaxed_config, simulated_device};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const THREADS: u16 = 4;
const OPS_PER_THREAD: u16 = 10;

#[test]
fn concurrent_reads_never_interleave_frames() {
    let mut device = SimulatedCd22::new();
    for t in 0..THREADS {
        device = device.with_register(0x100 + t, 1000 + t);
    }
    let (cd22, mut port) = simulated_device(device);
    // One byte per write call and a pause on every call give other threads
    // every chance to cut in mid-frame.
    port.set_max_write_chunk(1);
    port.set_latency(Duration::from_micros(200));

    let cd22 = Arc::new(cd22);
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let cd22 = Arc::clone(&cd22);
            thread::spawn(move || {
                for _ in 0..OPS_PER_THREAD {
                    assert_eq!(cd22.read(0x100 + t).unwrap(), 1000 + t);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let frames = assert_well_formed_frames(&port.written());
    assert_eq!(frames.len(), usize::from(THREADS * OPS_PER_THREAD));
    assert!(frames.iter().all(|(op, _)| *op == Opcode::Read));
}

#[test]
fn concurrent_writes_keep_read_write_pairs_together() {
    let (cd22, mut port) = simulated_device(SimulatedCd22::new());
    port.set_max_write_chunk(2);
    port.set_latency(Duration::from_micros(100));

    let cd22 = Arc::new(cd22);
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let cd22 = Arc::clone(&cd22);
            thread::spawn(move || {
                for i in 0..OPS_PER_THREAD {
                    let data = (t << 8) | i;
                    assert_eq!(cd22.write_at(0x200 + t, data).unwrap(), data);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let frames = assert_well_formed_frames(&port.written());
    assert_eq!(frames.len(), usize::from(2 * THREADS * OPS_PER_THREAD));
    for pair in frames.chunks(2) {
        let (read_op, addr) = pair[0];
        let (write_op, data) = pair[1];
        assert_eq!(read_op, Opcode::Read);
        assert_eq!(write_op, Opcode::Write);
        // The data was tagged with its thread, which also chose the address.
        assert_eq!(addr - 0x200, data >> 8, "write landed on a foreign address");
    }

    for t in 0..THREADS {
        assert_eq!(cd22.read(0x200 + t).unwrap(), (t << 8) | (OPS_PER_THREAD - 1));
    }
}

#[test]
fn silent_device_times_out_without_retry() {
    let mut port = MockSerialPort::new("SILENT");
    port.set_responder(|_| Vec::new());
    let config = DeviceConfig {
        read_timeout: Duration::from_millis(10),
        transaction_timeout: Duration::from_millis(100),
        ..DeviceConfig::default()
    };
    let cd22 = Cd22::with_port(port.clone(), config).unwrap();

    let started = Instant::now();
    let err = cd22.command(0xB001).unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(
        err,
        DeviceError::ReadTimeout {
            transferred: 0,
            expected: 6
        }
    ));
    assert!(err.is_timeout());
    assert!(elapsed >= Duration::from_millis(100), "gave up early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1000), "overran: {elapsed:?}");
    assert_eq!(port.written().len(), 6, "request must be sent exactly once");
}

#[test]
fn leftover_bytes_are_discarded_before_next_transaction() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut port = MockSerialPort::new("NOISY");
    port.set_responder(move |_| {
        let reply = build_response(ResponseType::Ack, 42u16.to_be_bytes());
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            // Line noise ahead of the first reply.
            let mut noisy = vec![0xAA, 0xAA];
            noisy.extend_from_slice(&reply);
            noisy
        } else {
            reply.to_vec()
        }
    });
    let cd22 = Cd22::with_port(port.clone(), relaxed_config()).unwrap();

    assert!(matches!(
        cd22.read(1),
        Err(DeviceError::Frame(FrameError::MissingMarkers))
    ));
    assert_eq!(port.available_bytes(), 2);

    assert_eq!(cd22.read(1).unwrap(), 42);
    assert_eq!(port.input_clears(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_read_half_skips_write() {
    let (cd22, port) = simulated_device(SimulatedCd22::new());
    assert!(matches!(cd22.command(0x9999), Err(DeviceError::Frame(FrameError::Device(_)))));

    let mut port_for_failure = port.clone();
    port_for_failure.fail_next_write(std::io::ErrorKind::BrokenPipe);
    let before = port.written().len();
    assert!(matches!(
        cd22.write_at(0x10, 5),
        Err(DeviceError::WriteFailed(_))
    ));
    assert_eq!(port.written().len(), before, "nothing should reach the wire");

    assert_eq!(cd22.write_at(0x10, 5).unwrap(), 5);
    assert_eq!(cd22.read(0x10).unwrap(), 5);
}
