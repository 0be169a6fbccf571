// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! M_PDU multiplexer: packs Space Packets into CADUs (sender side).
//!
//! Packets are laid back to back across consecutive packet zones. Each
//! emitted frame points at the first header that starts in its zone, or
//! carries [`NO_HEADER`] when the zone holds only continuation bytes.

use super::{fecf, FrameError, LinkFrame, NO_HEADER, PACKET_ZONE_LEN};
use crate::sequence::Rollover;

/// Byte used to pad the unused tail of a flushed zone.
pub const IDLE_FILL: u8 = 0x55;

/// Builds a CADU stream for one virtual channel.
#[derive(Debug)]
pub struct FrameMux {
    spacecraft_id: u8,
    virtual_channel: u8,
    frame_count: u32,
    zone: Vec<u8>,
    first_header: Option<usize>,
}

impl FrameMux {
    pub fn new(spacecraft_id: u8, virtual_channel: u8) -> Self {
        Self {
            spacecraft_id,
            virtual_channel,
            frame_count: 0,
            zone: Vec::with_capacity(PACKET_ZONE_LEN),
            first_header: None,
        }
    }

    /// Start counting frames at `frame_count` (wrapped to 24 bits).
    pub fn starting_at(mut self, frame_count: u32) -> Self {
        self.frame_count = frame_count % Rollover::FRAME_COUNT.modulus();
        self
    }

    /// Frame count the next emitted frame will carry.
    pub fn next_frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Skip `n` frame counts, as if those frames were lost on the link.
    pub fn skip(&mut self, n: u32) {
        self.frame_count = Rollover::FRAME_COUNT.add(self.frame_count, n);
    }

    /// Append one complete packet. Returns every frame completed by it.
    pub fn push_packet(&mut self, packet: &[u8]) -> Result<Vec<Vec<u8>>, FrameError> {
        let mut frames = Vec::new();
        if self.first_header.is_none() && self.zone.len() < PACKET_ZONE_LEN {
            self.first_header = Some(self.zone.len());
        }

        let mut rest = packet;
        while !rest.is_empty() {
            let room = PACKET_ZONE_LEN - self.zone.len();
            let (now, later) = rest.split_at(room.min(rest.len()));
            self.zone.extend_from_slice(now);
            rest = later;
            if self.zone.len() == PACKET_ZONE_LEN {
                frames.push(self.emit()?);
            }
        }
        Ok(frames)
    }

    /// Pad the current zone with idle fill and emit it, if it holds anything.
    pub fn flush(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        if self.zone.is_empty() {
            return Ok(None);
        }
        self.zone.resize(PACKET_ZONE_LEN, IDLE_FILL);
        self.emit().map(Some)
    }

    fn emit(&mut self) -> Result<Vec<u8>, FrameError> {
        let mut frame = LinkFrame::new(self.spacecraft_id, self.virtual_channel, self.frame_count);
        frame.first_header_pointer = self.first_header.take().map_or(NO_HEADER, |at| at as u16);
        frame.packet_zone = std::mem::replace(&mut self.zone, Vec::with_capacity(PACKET_ZONE_LEN));

        let mut raw = frame.encode()?;
        fecf::seal(&mut raw);
        self.frame_count = Rollover::FRAME_COUNT.next(self.frame_count);
        Ok(raw)
    }
}
