// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// End-to-end reassembly: CADU streams built with FrameMux, fed through the
// Ingestor, checked at the decoded-record level.

use grb::bitfield::Value;
use grb::frame::{FrameError, NO_HEADER};
use grb::packet::{GenericEnvelope, ENVELOPE_LEN};
use grb::payload::{mps_hi, mps_lo, xrs};
use grb::{
    ErrorClass, FrameMux, FrameOutcome, FrameRejection, IngestConfig, IngestError, Ingestor,
    LinkFrame, SequenceFlags, SpacePacketBuilder, CADU_LEN, RHCP_VCID,
};

const SCID: u8 = 0x81;

fn envelope(sequence: u32) -> Vec<u8> {
    GenericEnvelope {
        compression_algorithm: 0,
        seconds: 700_000_000,
        microseconds: 500_000,
        reserved: [0; 8],
        data_unit_sequence_count: sequence,
    }
    .encode()
    .unwrap()
    .to_vec()
}

/// Envelope followed by `body`.
fn user_data(body: &[u8]) -> Vec<u8> {
    let mut user = envelope(1);
    user.extend_from_slice(body);
    user
}

fn packet(apid: u16, flags: SequenceFlags, seq: u16, user: &[u8]) -> Vec<u8> {
    SpacePacketBuilder::new(apid)
        .sequence_flags(flags)
        .sequence_count(seq)
        .build(user)
        .unwrap()
}

fn unsegmented(apid: u16, seq: u16, body: &[u8]) -> Vec<u8> {
    packet(apid, SequenceFlags::Unsegmented, seq, &user_data(body))
}

/// All frames carrying `packet`, starting in a fresh zone.
fn frames(mux: &mut FrameMux, packet: &[u8]) -> Vec<Vec<u8>> {
    let mut out = mux.push_packet(packet).unwrap();
    out.extend(mux.flush().unwrap());
    out
}

fn single_frame(mux: &mut FrameMux, packet: &[u8]) -> Vec<u8> {
    let mut out = frames(mux, packet);
    assert_eq!(out.len(), 1);
    out.remove(0)
}

fn ingestor() -> Ingestor {
    Ingestor::new(IngestConfig::default()).unwrap()
}

fn feed(ingestor: &mut Ingestor, frames: &[Vec<u8>]) {
    for frame in frames {
        ingestor.process_frame(frame).unwrap();
    }
}

#[test]
fn test_unsegmented_packet_in_one_frame() {
    let mut body = vec![0u8; xrs::RECORD_LEN];
    body[9..13].copy_from_slice(&3.5e-6f32.to_le_bytes());

    let mut mux = FrameMux::new(SCID, RHCP_VCID);
    let frame = single_frame(&mut mux, &unsegmented(xrs::APID, 9, &body));

    let mut ing = ingestor();
    assert_eq!(ing.process_frame(&frame).unwrap(), FrameOutcome::Accepted);

    let records = ing.complete(xrs::APID);
    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(rec.sequence_count, 9);
    assert_eq!(rec.segments, 1);
    assert_eq!(rec.envelope.seconds, 700_000_000);
    assert_eq!(rec.fields.get("irradiance_xrsb1"), Some(&Value::F32(3.5e-6)));
    let timestamp = rec.timestamp.unwrap();
    assert_eq!(timestamp.timestamp(), 946_728_000 + 700_000_000);
    assert_eq!(timestamp.timestamp_subsec_micros(), 500_000);
    assert_eq!(ing.stats().packets_completed, 1);
}

#[test]
fn test_out_of_order_segments_finalize_on_middle() {
    // XRS record split over three segments: 100 (first), 101, 102 (last)
    let mut body = vec![0u8; xrs::RECORD_LEN];
    body[9..13].copy_from_slice(&1.0f32.to_le_bytes());
    body[126..134].copy_from_slice(&77u64.to_le_bytes());
    body[209..217].copy_from_slice(&12345.0f64.to_le_bytes());
    let user = user_data(&body);
    let (a, rest) = user.split_at(ENVELOPE_LEN + 100);
    let (b, c) = rest.split_at(100);

    let k = 1000;
    let mut mux = FrameMux::new(SCID, RHCP_VCID).starting_at(k);
    let frame_k = single_frame(&mut mux, &packet(xrs::APID, SequenceFlags::First, 100, a));
    let frame_k1 = single_frame(
        &mut mux,
        &packet(xrs::APID, SequenceFlags::Continuation, 101, b),
    );
    mux.skip(3);
    let frame_k5 = single_frame(&mut mux, &packet(xrs::APID, SequenceFlags::Last, 102, c));
    assert_eq!(LinkFrame::parse(&frame_k5).unwrap().frame_count, k + 5);

    let mut ing = ingestor();
    ing.process_frame(&frame_k).unwrap();
    ing.process_frame(&frame_k5).unwrap();
    assert_eq!(ing.pending_segments(xrs::APID), 2);
    assert!(ing.complete(xrs::APID).is_empty());

    ing.process_frame(&frame_k1).unwrap();
    assert_eq!(ing.pending_segments(xrs::APID), 0);

    let records = ing.complete(xrs::APID);
    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(rec.sequence_count, 100);
    assert_eq!(rec.segments, 3);
    assert_eq!(rec.fields.get("irradiance_xrsa1"), Some(&Value::F32(0.0)));
    assert_eq!(rec.fields.get("irradiance_xrsb1"), Some(&Value::F32(1.0)));
    assert_eq!(rec.fields.get("sps_int_time"), Some(&Value::U64(77)));
    assert_eq!(rec.fields.get("time"), Some(&Value::F64(12345.0)));
}

#[test]
fn test_segments_wait_on_gap() {
    let user = user_data(&[0u8; xrs::RECORD_LEN]);
    let (a, c) = user.split_at(150);

    let mut mux = FrameMux::new(SCID, RHCP_VCID);
    let first = single_frame(&mut mux, &packet(xrs::APID, SequenceFlags::First, 5, a));
    let last = single_frame(&mut mux, &packet(xrs::APID, SequenceFlags::Last, 7, c));

    let mut ing = ingestor();
    feed(&mut ing, &[first, last]);
    assert_eq!(ing.pending_segments(xrs::APID), 2);
    assert!(ing.complete(xrs::APID).is_empty());
}

#[test]
fn test_packet_spanning_two_frames() {
    let mut body = vec![0u8; mps_lo::RECORD_LEN];
    body[3880] = 4; // n_blocks
    let pkt = unsegmented(mps_lo::APID, 1, &body);

    let mut mux = FrameMux::new(SCID, RHCP_VCID);
    let stream = frames(&mut mux, &pkt);
    assert_eq!(stream.len(), 2);
    assert_eq!(LinkFrame::parse(&stream[1]).unwrap().first_header_pointer, NO_HEADER);

    let mut ing = ingestor();
    ing.process_frame(&stream[0]).unwrap();
    assert_eq!(ing.pending_continuations(), 1);
    ing.process_frame(&stream[1]).unwrap();
    assert_eq!(ing.pending_continuations(), 0);

    let records = ing.complete(mps_lo::APID);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fields.get("n_blocks"), Some(&Value::U8(4)));
    assert_eq!(ing.stats().continuations_started, 1);
    assert_eq!(ing.stats().continuations_resolved, 1);
}

#[test]
fn test_packet_spanning_four_frames_any_order() {
    // padded MPS-LO body: 14 + 21 + 7000 + 4 bytes over four zones
    let mut body = vec![0u8; 7000];
    body[3880] = 9; // n_blocks
    let pkt = unsegmented(mps_lo::APID, 42, &body);

    for order in [[0, 1, 2, 3], [0, 3, 2, 1], [3, 2, 1, 0], [1, 3, 0, 2]] {
        let mut mux = FrameMux::new(SCID, RHCP_VCID).starting_at(500);
        let stream = frames(&mut mux, &pkt);
        assert_eq!(stream.len(), 4);
        for frame in &stream[1..] {
            assert_eq!(LinkFrame::parse(frame).unwrap().first_header_pointer, NO_HEADER);
        }

        let mut ing = ingestor();
        for (fed, &i) in order.iter().enumerate() {
            ing.process_frame(&stream[i]).unwrap();
            if fed < 3 {
                assert!(ing.complete(mps_lo::APID).is_empty(), "order {:?}", order);
            }
        }

        let records = ing.complete(mps_lo::APID);
        assert_eq!(records.len(), 1, "order {:?}", order);
        assert_eq!(records[0].sequence_count, 42);
        assert_eq!(records[0].fields.get("n_blocks"), Some(&Value::U8(9)));
        assert_eq!(ing.pending_continuations(), 0);
        assert_eq!(ing.stats().continuations_started, 1);
        assert_eq!(ing.stats().continuations_resolved, 1);
    }
}

#[test]
fn test_continuation_frame_arriving_first() {
    let pkt = unsegmented(mps_lo::APID, 1, &[0u8; mps_lo::RECORD_LEN]);
    let mut mux = FrameMux::new(SCID, RHCP_VCID);
    let stream = frames(&mut mux, &pkt);

    let mut ing = ingestor();
    ing.process_frame(&stream[1]).unwrap();
    assert!(ing.complete(mps_lo::APID).is_empty());
    ing.process_frame(&stream[0]).unwrap();
    assert_eq!(ing.complete(mps_lo::APID).len(), 1);
}

#[test]
fn test_continuation_then_next_header_in_same_frame() {
    let a = unsegmented(mps_lo::APID, 1, &[0u8; mps_lo::RECORD_LEN]);
    let b = unsegmented(mps_hi::APID, 2, &[0u8; mps_hi::RECORD_LEN]);

    let mut mux = FrameMux::new(SCID, RHCP_VCID);
    let mut stream = mux.push_packet(&a).unwrap();
    stream.extend(mux.push_packet(&b).unwrap());
    stream.extend(mux.flush().unwrap());
    assert_eq!(stream.len(), 3);

    let second = LinkFrame::parse(&stream[1]).unwrap();
    let a_tail = a.len() - grb::frame::PACKET_ZONE_LEN;
    assert_eq!(usize::from(second.first_header_pointer), a_tail);

    let mut ing = ingestor();
    feed(&mut ing, &stream);
    assert_eq!(ing.complete(mps_lo::APID).len(), 1);
    assert_eq!(ing.complete(mps_hi::APID).len(), 1);
    assert_eq!(ing.pending_continuations(), 0);
}

#[test]
fn test_continuation_conflict_is_protocol_error() {
    let pkt = unsegmented(mps_lo::APID, 1, &[0u8; mps_lo::RECORD_LEN]);
    let mut mux = FrameMux::new(SCID, RHCP_VCID);
    let stream = frames(&mut mux, &pkt);

    // a header pointer where only continuation bytes belong
    let mut tampered = LinkFrame::parse(&stream[1]).unwrap();
    tampered.first_header_pointer = 100;
    let tampered = tampered.encode().unwrap();

    let mut ing = ingestor();
    ing.process_frame(&stream[0]).unwrap();
    let err = ing.process_frame(&tampered).unwrap_err();
    assert!(matches!(
        err,
        IngestError::ContinuationConflict {
            pointer: 100,
            expected: 1942,
            ..
        }
    ));
    assert_eq!(err.class(), ErrorClass::Protocol);
    assert_eq!(ing.pending_continuations(), 0);
    assert!(ing.complete(mps_lo::APID).is_empty());
    assert_eq!(ing.stats().protocol_errors, 1);

    // the engine keeps working
    let next = single_frame(&mut mux, &unsegmented(xrs::APID, 3, &[0u8; xrs::RECORD_LEN]));
    ing.process_frame(&next).unwrap();
    assert_eq!(ing.complete(xrs::APID).len(), 1);
}

#[test]
fn test_corrupt_sync_not_stored() {
    let pkt = unsegmented(mps_lo::APID, 1, &[0u8; mps_lo::RECORD_LEN]);
    let mut mux = FrameMux::new(SCID, RHCP_VCID);
    let stream = frames(&mut mux, &pkt);

    let mut corrupted = stream[1].clone();
    corrupted[1] ^= 0xFF;

    let mut ing = ingestor();
    ing.process_frame(&stream[0]).unwrap();
    assert_eq!(
        ing.process_frame(&corrupted).unwrap(),
        FrameOutcome::Rejected(FrameRejection::Sync)
    );
    assert_eq!(ing.pending_continuations(), 1);
    assert_eq!(ing.stats().rejected(FrameRejection::Sync), 1);

    // the genuine frame still completes the packet
    ing.process_frame(&stream[1]).unwrap();
    assert_eq!(ing.complete(mps_lo::APID).len(), 1);
}

#[test]
fn test_frame_count_wraparound() {
    let pkt = unsegmented(mps_lo::APID, 1, &[0u8; mps_lo::RECORD_LEN]);
    let mut mux = FrameMux::new(SCID, RHCP_VCID).starting_at(0xFF_FFFF);
    let stream = frames(&mut mux, &pkt);
    assert_eq!(LinkFrame::parse(&stream[1]).unwrap().frame_count, 0);

    let mut ing = ingestor();
    feed(&mut ing, &stream);
    assert_eq!(ing.complete(mps_lo::APID).len(), 1);
}

#[test]
fn test_sequence_count_wraparound() {
    let user = user_data(&[0u8; xrs::RECORD_LEN]);
    let (a, c) = user.split_at(100);

    let mut mux = FrameMux::new(SCID, RHCP_VCID);
    let last = single_frame(&mut mux, &packet(xrs::APID, SequenceFlags::Last, 0, c));
    let first = single_frame(&mut mux, &packet(xrs::APID, SequenceFlags::First, 16383, a));

    let mut ing = ingestor();
    feed(&mut ing, &[last, first]);
    let records = ing.complete(xrs::APID);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sequence_count, 16383);
}

#[test]
fn test_filtered_frames_and_packets() {
    let mut ing = ingestor();

    let mut other_vc = FrameMux::new(SCID, 6);
    let frame = single_frame(&mut other_vc, &unsegmented(xrs::APID, 1, &[0; xrs::RECORD_LEN]));
    assert_eq!(ing.process_frame(&frame).unwrap(), FrameOutcome::OtherChannel(6));

    let mut mux = FrameMux::new(SCID, RHCP_VCID);
    let unmonitored = single_frame(&mut mux, &unsegmented(0x100, 1, &[0; 64]));
    ing.process_frame(&unmonitored).unwrap();

    let variant = SpacePacketBuilder::new(xrs::APID)
        .payload_variant(0b00001)
        .build(&user_data(&[0; xrs::RECORD_LEN]))
        .unwrap();
    let variant = single_frame(&mut mux, &variant);
    ing.process_frame(&variant).unwrap();
    assert_eq!(ing.process_frame(&variant).unwrap(), FrameOutcome::Duplicate);

    let stats = ing.stats();
    assert_eq!(stats.frames_received, 4);
    assert_eq!(stats.frames_other_channel, 1);
    assert_eq!(stats.frames_duplicate, 1);
    assert_eq!(stats.packets_ignored, 2);
    assert!(ing.drain_all().is_empty());
}

#[test]
fn test_header_cut_by_zone_end_is_counted_and_dropped() {
    let pkt = unsegmented(xrs::APID, 1, &[0u8; xrs::RECORD_LEN]);
    let at = grb::frame::PACKET_ZONE_LEN - 10;

    let mut frame = LinkFrame::new(SCID, RHCP_VCID, 3);
    frame.first_header_pointer = at as u16;
    frame.packet_zone[at..].copy_from_slice(&pkt[..10]);
    let raw = frame.encode().unwrap();

    let mut ing = ingestor();
    assert_eq!(ing.process_frame(&raw).unwrap(), FrameOutcome::Accepted);
    assert_eq!(ing.stats().headers_truncated, 1);
    assert_eq!(ing.pending_continuations(), 0);
    assert!(ing.drain_all().is_empty());
}

#[test]
fn test_wrong_length_is_error() {
    let mut ing = ingestor();
    let err = ing.process_frame(&[0u8; 100]).unwrap_err();
    assert!(matches!(
        err,
        IngestError::Frame(FrameError::Length {
            expected: CADU_LEN,
            actual: 100
        })
    ));
    assert_eq!(err.class(), ErrorClass::Invariant);
}

#[test]
fn test_short_payload_is_protocol_error() {
    let mut mux = FrameMux::new(SCID, RHCP_VCID);
    let frame = single_frame(&mut mux, &unsegmented(xrs::APID, 1, &[0; 10]));
    let err = ingestor().process_frame(&frame).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Protocol);
}

#[test]
fn test_crc_enforcement() {
    let mut pkt = unsegmented(xrs::APID, 1, &[0; xrs::RECORD_LEN]);
    pkt[40] ^= 0x01;
    let mut mux = FrameMux::new(SCID, RHCP_VCID);
    let frame = single_frame(&mut mux, &pkt);

    let mut lenient = ingestor();
    lenient.process_frame(&frame).unwrap();
    assert_eq!(lenient.complete(xrs::APID).len(), 1);

    let mut strict = Ingestor::new(IngestConfig::default().validate_crc(true)).unwrap();
    strict.process_frame(&frame).unwrap();
    assert!(strict.complete(xrs::APID).is_empty());
    assert_eq!(strict.stats().crc_failures, 1);
}

#[test]
fn test_drain() {
    let mut mux = FrameMux::new(SCID, RHCP_VCID);
    let mut ing = ingestor();
    for seq in 0..3 {
        let frame = single_frame(&mut mux, &unsegmented(xrs::APID, seq, &[0; xrs::RECORD_LEN]));
        ing.process_frame(&frame).unwrap();
    }
    let drained = ing.drain_complete(xrs::APID);
    assert_eq!(
        drained.iter().map(|r| r.sequence_count).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(ing.complete(xrs::APID).is_empty());
}

#[test]
fn test_unknown_apid_without_decoder_rejected_at_startup() {
    let config = IngestConfig::default().apids([xrs::APID, 0x123]);
    let err = Ingestor::new(config).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Invariant);
}
