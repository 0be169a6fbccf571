// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Capture files on disk through the engine to JSON Lines.

use chrono::DateTime;
use grb::payload::{mps_hi, mps_lo, xrs};
use grb::{IngestConfig, Ingestor, CADU_LEN, RHCP_VCID};
use grb_capture::{
    CaptureFormat, CaptureReader, JsonLinesSink, ReplayConfig, Replayer, SyntheticStream,
    UdpFrameReceiver,
};
use std::io::Write;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tempfile::TempDir;

fn synthetic_frames(seconds: usize) -> Vec<Vec<u8>> {
    let epoch = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let mut stream = SyntheticStream::new(0x81, RHCP_VCID, epoch);
    let mut frames = Vec::new();
    for _ in 0..seconds {
        frames.extend(stream.next_second().unwrap());
    }
    frames
}

/// Decode every frame of `reader` and return the JSON lines written.
fn decode(reader: CaptureReader) -> Vec<serde_json::Value> {
    let mut ingestor = Ingestor::new(IngestConfig::default()).unwrap();
    let mut sink = JsonLinesSink::new(Vec::new());
    for frame in reader {
        ingestor.process_frame(&frame.unwrap()).unwrap();
        sink.write_all(&ingestor.drain_all()).unwrap();
    }
    let out = String::from_utf8(sink.into_inner()).unwrap();
    out.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn apid_counts(records: &[serde_json::Value]) -> [usize; 3] {
    let count = |apid: u16| {
        records
            .iter()
            .filter(|r| r["apid"] == serde_json::json!(apid))
            .count()
    };
    [count(xrs::APID), count(mps_lo::APID), count(mps_hi::APID)]
}

#[test]
fn test_raw_capture_to_json_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stream.cadu");
    let frames = synthetic_frames(3);
    std::fs::write(&path, frames.concat()).unwrap();

    let reader = CaptureReader::open(&path, None).unwrap();
    assert_eq!(reader.format(), CaptureFormat::Raw);
    let records = decode(reader);

    assert_eq!(records.len(), 9);
    assert_eq!(apid_counts(&records), [3, 3, 3]);

    let first = &records[0];
    assert_eq!(first["kind"], "x_ray");
    assert_eq!(first["envelope"]["seconds"], 1_700_000_000 - 946_728_000);
    assert!(first["timestamp"]
        .as_str()
        .unwrap()
        .starts_with("2023-11-14T22:13:20"));
    assert!(first["fields"]["irradiance_xrsb1"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_hex_csv_capture() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("packets.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    for frame in synthetic_frames(2) {
        let line: Vec<String> = frame.iter().map(|b| format!("{:02x}", b)).collect();
        writeln!(file, "{}", line.join(",")).unwrap();
    }
    drop(file);

    let records = decode(CaptureReader::open(&path, None).unwrap());
    assert_eq!(apid_counts(&records), [2, 2, 2]);
}

#[test]
fn test_pcap_capture_both_byte_orders() {
    let frames = synthetic_frames(1);
    for big_endian in [false, true] {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("GOESR.pcap");
        std::fs::write(&path, pcap_file(&frames, big_endian)).unwrap();

        let records = decode(CaptureReader::open(&path, None).unwrap());
        assert_eq!(apid_counts(&records), [1, 1, 1], "big_endian={}", big_endian);
    }
}

#[test]
fn test_unknown_extension_needs_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("capture.dat");
    std::fs::write(&path, vec![0u8; CADU_LEN]).unwrap();

    assert!(CaptureReader::open(&path, None).is_err());
    let reader = CaptureReader::open(&path, Some(CaptureFormat::Raw)).unwrap();
    assert_eq!(reader.count(), 1);
}

#[test]
fn test_replay_to_receiver() {
    let mut receiver =
        UdpFrameReceiver::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0), None, Ipv4Addr::UNSPECIFIED)
            .unwrap();
    receiver.set_timeout(Some(Duration::from_secs(2))).unwrap();
    let target = receiver.local_addr().unwrap();

    let mut replayer = Replayer::new(ReplayConfig::new(target)).unwrap();
    replayer.send(&[0u8; 100]).unwrap();
    let frames = synthetic_frames(1);
    for frame in &frames {
        replayer.send(frame).unwrap();
    }

    let mut ingestor = Ingestor::new(IngestConfig::default()).unwrap();
    for _ in 0..frames.len() {
        let frame = receiver.recv_frame().unwrap().expect("frame before timeout");
        ingestor.process_frame(&frame).unwrap();
    }
    assert_eq!(receiver.received(), frames.len() as u64);
    assert_eq!(receiver.skipped(), 1);
    assert_eq!(ingestor.drain_all().len(), 3);
}

/// Minimal Ethernet/IPv4/UDP pcap around `frames`, plus one unrelated
/// short datagram.
fn pcap_file(frames: &[Vec<u8>], big_endian: bool) -> Vec<u8> {
    let u32b = |v: u32| {
        if big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    };
    let u16b = |v: u16| {
        if big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    };

    let mut file = Vec::new();
    file.extend_from_slice(&u32b(0xa1b2_c3d4));
    file.extend_from_slice(&u16b(2));
    file.extend_from_slice(&u16b(4));
    file.extend_from_slice(&[0; 8]);
    file.extend_from_slice(&u32b(65535));
    file.extend_from_slice(&u32b(1));

    let mut payloads: Vec<&[u8]> = vec![b"not a frame"];
    payloads.extend(frames.iter().map(Vec::as_slice));
    for (i, payload) in payloads.into_iter().enumerate() {
        let packet = ethernet_udp(payload);
        file.extend_from_slice(&u32b(1_700_000_000 + i as u32));
        file.extend_from_slice(&u32b(0));
        file.extend_from_slice(&u32b(packet.len() as u32));
        file.extend_from_slice(&u32b(packet.len() as u32));
        file.extend_from_slice(&packet);
    }
    file
}

fn ethernet_udp(payload: &[u8]) -> Vec<u8> {
    let udp_len = 8 + payload.len() as u16;
    let mut pkt = vec![0x01, 0x00, 0x5e, 0x01, 0x02, 0x03, 0x02, 0, 0, 0, 0, 1, 0x08, 0x00];
    pkt.extend_from_slice(&[0x45, 0]);
    pkt.extend_from_slice(&(20 + udp_len).to_be_bytes());
    pkt.extend_from_slice(&[0, 0, 0x40, 0, 64, 17, 0, 0]);
    pkt.extend_from_slice(&[10, 0, 0, 1, 239, 1, 2, 3]);
    pkt.extend_from_slice(&40000u16.to_be_bytes());
    pkt.extend_from_slice(&50020u16.to_be_bytes());
    pkt.extend_from_slice(&udp_len.to_be_bytes());
    pkt.extend_from_slice(&[0, 0]);
    pkt.extend_from_slice(payload);
    pkt
}
