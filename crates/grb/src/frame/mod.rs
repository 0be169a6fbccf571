// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Link frame (CADU) decoding.
//!
//! # CADU layout (2048 bytes)
//!
//! ```text
//! +----------+------------------------------------------+--------+------------------+------+
//! | sync (4) | primary header (6)                       | M_PDU  | packet zone      | FECF |
//! |1ACFFC1D  | ver:2 scid:8 vcid:6 count:24 signaling:8 | hdr(2) | (2034)           | (2)  |
//! +----------+------------------------------------------+--------+------------------+------+
//!
//! signaling: replay:1 count_usage:1 spare:2 count_cycle:4
//! M_PDU hdr: spare:5 first_header_pointer:11   (0x7FF = no header starts here)
//! ```

mod fecf;
mod mux;
mod validate;

pub use fecf::{crc16, verify as verify_fecf};
pub use mux::FrameMux;
pub use validate::{FrameRejection, FrameValidation};

use crate::bitfield::{self, BitString, CodecError, Field, Record, Scalar, Value};
use thiserror::Error;

/// Total CADU length in bytes.
pub const CADU_LEN: usize = 2048;
/// Attached sync marker length.
pub const SYNC_LEN: usize = 4;
/// Packet zone length in bytes.
pub const PACKET_ZONE_LEN: usize = 2034;
/// Frame error control field length.
pub const FECF_LEN: usize = 2;
/// Attached sync marker.
pub const SYNC_MARKER: u32 = 0x1ACF_FC1D;
/// First-header-pointer value meaning "no packet header starts in this zone".
pub const NO_HEADER: u16 = 0x7FF;
/// Right-hand circular polarization virtual channel.
pub const RHCP_VCID: u8 = 0b00_0101;
/// Largest virtual channel frame count.
pub const MAX_FRAME_COUNT: u32 = (1 << 24) - 1;

const SIGNALING: &[Field] = &[
    Field::int("replay_flag", 0, 1),
    Field::int("count_usage_flag", 1, 1),
    Field::bits("reserved_spare", 2, 2),
    Field::int("count_cycle", 4, 4),
];

const PRIMARY_HEADER: &[Field] = &[
    Field::int("version", 0, 2),
    Field::int("spacecraft_id", 2, 8),
    Field::int("virtual_channel_id", 10, 6),
    Field::int("frame_count", 16, 24),
    Field::group("signaling", 40, 8, SIGNALING),
];

const MPDU_HEADER: &[Field] = &[
    Field::bits("reserved_spare", 0, 5),
    Field::int("first_header_pointer", 5, 11),
];

const DATA_FIELD: &[Field] = &[
    Field::group("mpdu_header", 0, 16, MPDU_HEADER),
    Field::bits("packet_zone", 16, PACKET_ZONE_LEN * 8),
];

/// Bit layout of a full CADU.
pub const CADU_LAYOUT: &[Field] = &[
    Field::bit_scalar("sync", 0, Scalar::U32),
    Field::group("primary_header", 32, 48, PRIMARY_HEADER),
    Field::group("data_field", 80, 16 + PACKET_ZONE_LEN * 8, DATA_FIELD),
    Field::int("fecf", (CADU_LEN - FECF_LEN) * 8, 16),
];

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("CADU is {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// A decoded CADU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFrame {
    pub sync: u32,
    pub version: u8,
    pub spacecraft_id: u8,
    pub virtual_channel: u8,
    /// Virtual channel frame count, `0..=MAX_FRAME_COUNT`.
    pub frame_count: u32,
    pub replay: bool,
    pub count_usage: bool,
    /// Signaling-field reserved spare (2 bits).
    pub signaling_spare: u8,
    pub count_cycle: u8,
    /// M_PDU header reserved spare (5 bits).
    pub mpdu_spare: u8,
    pub first_header_pointer: u16,
    pub packet_zone: Vec<u8>,
    pub fecf: u16,
}

impl LinkFrame {
    /// A clean frame on `virtual_channel` with an empty (zeroed) packet zone
    /// and no header pointer.
    pub fn new(spacecraft_id: u8, virtual_channel: u8, frame_count: u32) -> Self {
        Self {
            sync: SYNC_MARKER,
            version: 0b01,
            spacecraft_id,
            virtual_channel,
            frame_count,
            replay: false,
            count_usage: true,
            signaling_spare: 0,
            count_cycle: 0,
            mpdu_spare: 0,
            first_header_pointer: NO_HEADER,
            packet_zone: vec![0; PACKET_ZONE_LEN],
            fecf: 0,
        }
    }

    /// Decode the fields of `raw` without validating their values.
    ///
    /// Only the total length is checked; anything else that is wrong with
    /// the frame is left to [`FrameValidation::check`].
    pub fn parse(raw: &[u8]) -> Result<Self, FrameError> {
        if raw.len() != CADU_LEN {
            return Err(FrameError::Length {
                expected: CADU_LEN,
                actual: raw.len(),
            });
        }
        let rec = bitfield::decode_bits(raw, CADU_LAYOUT)?;
        Self::from_record(&rec)
    }

    /// Decode and validate. Frames failing validation are logged and
    /// yield `Ok(None)`; a wrong length is an error.
    pub fn decode(raw: &[u8], validation: &FrameValidation) -> Result<Option<Self>, FrameError> {
        let frame = Self::parse(raw)?;
        match validation.check(&frame, raw) {
            Ok(()) => Ok(Some(frame)),
            Err(reason) => {
                log::debug!(
                    "[frame] dropping vc {} count {}: {}",
                    frame.virtual_channel,
                    frame.frame_count,
                    reason
                );
                Ok(None)
            }
        }
    }

    /// Re-encode to a full CADU. The stored `fecf` is written as-is.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        if self.packet_zone.len() != PACKET_ZONE_LEN {
            return Err(FrameError::Length {
                expected: PACKET_ZONE_LEN,
                actual: self.packet_zone.len(),
            });
        }
        Ok(bitfield::encode_bits(&self.to_record(), CADU_LAYOUT)?)
    }

    /// Byte offset of the first packet header in the zone, if any.
    pub fn first_header_offset(&self) -> Option<usize> {
        (self.first_header_pointer != NO_HEADER).then_some(usize::from(self.first_header_pointer))
    }

    fn from_record(rec: &Record) -> Result<Self, FrameError> {
        let zone = rec.bits("data_field.packet_zone")?;
        Ok(Self {
            sync: rec.uint("sync")? as u32,
            version: rec.uint("primary_header.version")? as u8,
            spacecraft_id: rec.uint("primary_header.spacecraft_id")? as u8,
            virtual_channel: rec.uint("primary_header.virtual_channel_id")? as u8,
            frame_count: rec.uint("primary_header.frame_count")? as u32,
            replay: rec.uint("primary_header.signaling.replay_flag")? != 0,
            count_usage: rec.uint("primary_header.signaling.count_usage_flag")? != 0,
            signaling_spare: rec.uint("primary_header.signaling.reserved_spare")? as u8,
            count_cycle: rec.uint("primary_header.signaling.count_cycle")? as u8,
            mpdu_spare: rec.uint("data_field.mpdu_header.reserved_spare")? as u8,
            first_header_pointer: rec.uint("data_field.mpdu_header.first_header_pointer")? as u16,
            packet_zone: zone.as_bytes().to_vec(),
            fecf: rec.uint("fecf")? as u16,
        })
    }

    fn to_record(&self) -> Record {
        let spare = |value: u8, width: usize| {
            let s = format!("{value:0width$b}");
            Value::Bits(BitString::from_binary_str(&s[s.len() - width..]).unwrap_or_default())
        };

        let signaling = Record::new()
            .with("replay_flag", Value::Int(self.replay.into()))
            .with("count_usage_flag", Value::Int(self.count_usage.into()))
            .with("reserved_spare", spare(self.signaling_spare, 2))
            .with("count_cycle", Value::Int(self.count_cycle.into()));
        let primary = Record::new()
            .with("version", Value::Int(self.version.into()))
            .with("spacecraft_id", Value::Int(self.spacecraft_id.into()))
            .with("virtual_channel_id", Value::Int(self.virtual_channel.into()))
            .with("frame_count", Value::Int(self.frame_count.into()))
            .with("signaling", Value::Record(signaling));
        let mpdu = Record::new()
            .with("reserved_spare", spare(self.mpdu_spare, 5))
            .with(
                "first_header_pointer",
                Value::Int(self.first_header_pointer.into()),
            );
        let data = Record::new()
            .with("mpdu_header", Value::Record(mpdu))
            .with(
                "packet_zone",
                Value::Bits(BitString::from_bytes(&self.packet_zone)),
            );

        Record::new()
            .with("sync", Value::U32(self.sync))
            .with("primary_header", Value::Record(primary))
            .with("data_field", Value::Record(data))
            .with("fecf", Value::Int(self.fecf.into()))
    }
}
