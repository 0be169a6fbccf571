// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Synthetic GRB stream for replay and soak tests.

use crate::error::CaptureError;
use chrono::{DateTime, Utc};
use grb::packet::{GenericEnvelope, J2000_UNIX_SECONDS};
use grb::payload::{mps_hi, mps_lo, xrs};
use grb::{FrameMux, SequenceFlags, SpacePacketBuilder};

/// Segment size used to split MPS-LO records.
const MPS_LO_SEGMENT: usize = 1024;

/// Generates one XRS, MPS-LO and MPS-HI record per second of instrument time.
///
/// Every packet starts a fresh packet zone, so each header is the first
/// header of its frame.
#[derive(Debug)]
pub struct SyntheticStream {
    mux: FrameMux,
    epoch: DateTime<Utc>,
    second: u32,
    sequence: [u16; 3],
}

impl SyntheticStream {
    pub fn new(spacecraft_id: u8, virtual_channel: u8, epoch: DateTime<Utc>) -> Self {
        Self {
            mux: FrameMux::new(spacecraft_id, virtual_channel),
            epoch,
            second: 0,
            sequence: [0; 3],
        }
    }

    /// Frames carrying the next second of records.
    pub fn next_second(&mut self) -> Result<Vec<Vec<u8>>, CaptureError> {
        let base = u32::try_from(self.epoch.timestamp() - J2000_UNIX_SECONDS).unwrap_or(0);
        let envelope = GenericEnvelope {
            compression_algorithm: 0,
            seconds: base.wrapping_add(self.second),
            microseconds: 0,
            reserved: [0; 8],
            data_unit_sequence_count: self.second,
        };
        self.second = self.second.wrapping_add(1);

        let mut frames = Vec::new();

        let mut body = vec![0u8; xrs::RECORD_LEN];
        // irradiance_xrsb1
        let flux = 1.0e-6f32 * (1.0 + (self.second % 60) as f32 / 60.0);
        body[9..13].copy_from_slice(&flux.to_le_bytes());
        let packet = SpacePacketBuilder::new(xrs::APID)
            .sequence_count(self.bump(0))
            .build_generic(&envelope, &body)?;
        self.push(&packet, &mut frames)?;

        let mut user = envelope.encode()?.to_vec();
        user.extend_from_slice(&[0u8; mps_lo::RECORD_LEN]);
        let chunks: Vec<&[u8]> = user.chunks(MPS_LO_SEGMENT).collect();
        for (i, chunk) in chunks.iter().enumerate() {
            let flags = match i {
                0 => SequenceFlags::First,
                n if n + 1 == chunks.len() => SequenceFlags::Last,
                _ => SequenceFlags::Continuation,
            };
            let packet = SpacePacketBuilder::new(mps_lo::APID)
                .sequence_flags(flags)
                .sequence_count(self.bump(1))
                .build(chunk)?;
            self.push(&packet, &mut frames)?;
        }

        let packet = SpacePacketBuilder::new(mps_hi::APID)
            .sequence_count(self.bump(2))
            .build_generic(&envelope, &[0u8; mps_hi::RECORD_LEN])?;
        self.push(&packet, &mut frames)?;
        Ok(frames)
    }

    fn push(&mut self, packet: &[u8], frames: &mut Vec<Vec<u8>>) -> Result<(), CaptureError> {
        frames.extend(self.mux.push_packet(packet)?);
        frames.extend(self.mux.flush()?);
        Ok(())
    }

    fn bump(&mut self, stream: usize) -> u16 {
        let seq = self.sequence[stream];
        self.sequence[stream] = (seq + 1) % (1 << 14);
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grb::{IngestConfig, Ingestor, RHCP_VCID};

    #[test]
    fn test_every_record_decodes() {
        let epoch = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut stream = SyntheticStream::new(0x81, RHCP_VCID, epoch);
        let mut ingestor = Ingestor::new(IngestConfig::default()).unwrap();
        for _ in 0..5 {
            for frame in stream.next_second().unwrap() {
                ingestor.process_frame(&frame).unwrap();
            }
        }
        assert_eq!(ingestor.complete(xrs::APID).len(), 5);
        assert_eq!(ingestor.complete(mps_lo::APID).len(), 5);
        assert_eq!(ingestor.complete(mps_hi::APID).len(), 5);

        let first = &ingestor.complete(xrs::APID)[0];
        assert_eq!(first.timestamp.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(ingestor.complete(mps_lo::APID)[0].segments, 4);
    }
}
