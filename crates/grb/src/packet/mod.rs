// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Space Packet headers and slicing.
//!
//! # Packet layout
//!
//! ```text
//! +---------------------------+------------------------------+----------------+---------+
//! | primary header (6)        | secondary header (8)         | user data      | CRC (4) |
//! | ver:3 type:1 sh:1 apid:11 | days:16 ms:32                | (variable)     |         |
//! | flags:2 count:14 len:16   | grb_ver:5 variant:5 asm:2    |                |         |
//! |                           | env:4                        |                |         |
//! +---------------------------+------------------------------+----------------+---------+
//!
//! len = bytes after the primary header - 1
//! ```
//!
//! A packet that starts near the end of a packet zone is sliced with the
//! bytes available; the rest is appended from following frames with
//! [`PacketSlice::append_remaining`].

mod builder;
mod envelope;

pub use builder::SpacePacketBuilder;
pub use envelope::{GenericEnvelope, ENVELOPE_LEN, J2000_UNIX_SECONDS};

use crate::bitfield::{self, CodecError, Field, Record, Value};
use serde::Serialize;
use thiserror::Error;

/// Primary header length in bytes.
pub const PRIMARY_HEADER_LEN: usize = 6;
/// Secondary header length in bytes.
pub const SECONDARY_HEADER_LEN: usize = 8;
/// Both headers.
pub const HEADER_LEN: usize = PRIMARY_HEADER_LEN + SECONDARY_HEADER_LEN;
/// CRC trailer length in bytes.
pub const CRC_LEN: usize = 4;
/// Largest user data field in bytes, CRC included.
pub const USER_DATA_MAX_LEN: usize = 16376;
/// Payload variant tag of a generic packet.
pub const GENERIC_VARIANT: u8 = 0b00000;
/// Supported GRB version.
pub const GRB_VERSION: u8 = 0b00000;

const PRIMARY: &[Field] = &[
    Field::int("version", 0, 3),
    Field::int("packet_type", 3, 1),
    Field::int("secondary_header_flag", 4, 1),
    Field::int("apid", 5, 11),
    Field::int("sequence_flags", 16, 2),
    Field::int("sequence_count", 18, 14),
    Field::int("data_length", 32, 16),
];

const SECONDARY: &[Field] = &[
    Field::int("days", 0, 16),
    Field::int("milliseconds", 16, 32),
    Field::int("grb_version", 48, 5),
    Field::int("payload_variant", 53, 5),
    Field::int("assembler_id", 58, 2),
    Field::int("system_environment", 60, 4),
];

/// Bit layout of both packet headers.
pub const HEADER_LAYOUT: &[Field] = &[
    Field::group("primary", 0, 48, PRIMARY),
    Field::group("secondary", 48, 64, SECONDARY),
];

#[derive(Debug, Error, PartialEq)]
pub enum PacketError {
    #[error("packet header truncated: {available} of {} bytes available", HEADER_LEN)]
    TruncatedHeader { available: usize },

    #[error("invalid {field} value {value}")]
    InvalidHeader { field: &'static str, value: u64 },

    #[error("unsupported payload variant {0:#07b}")]
    UnsupportedVariant(u8),

    #[error("invalid sequence flags {0:#04b}")]
    InvalidSequenceFlag(u8),

    #[error("payload of {bytes} bytes exceeds the {}-byte user data field", USER_DATA_MAX_LEN)]
    PayloadTooLarge { bytes: usize },

    #[error("append of {offered} bytes overflows the {remaining} bytes still expected")]
    AppendOverflow { offered: usize, remaining: usize },

    #[error("generic envelope needs {} bytes, got {0}", ENVELOPE_LEN)]
    EnvelopeTooShort(usize),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Position of a packet within a segmented group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceFlags {
    /// `00`: middle segment.
    Continuation,
    /// `01`: first segment.
    First,
    /// `10`: last segment.
    Last,
    /// `11`: whole packet.
    Unsegmented,
}

impl TryFrom<u8> for SequenceFlags {
    type Error = PacketError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            0b00 => Ok(Self::Continuation),
            0b01 => Ok(Self::First),
            0b10 => Ok(Self::Last),
            0b11 => Ok(Self::Unsegmented),
            other => Err(PacketError::InvalidSequenceFlag(other)),
        }
    }
}

impl From<SequenceFlags> for u8 {
    fn from(flags: SequenceFlags) -> u8 {
        match flags {
            SequenceFlags::Continuation => 0b00,
            SequenceFlags::First => 0b01,
            SequenceFlags::Last => 0b10,
            SequenceFlags::Unsegmented => 0b11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrimaryHeader {
    pub version: u8,
    pub packet_type: u8,
    pub secondary_header: bool,
    pub apid: u16,
    pub sequence_flags: SequenceFlags,
    pub sequence_count: u16,
    pub data_length: u16,
}

impl PrimaryHeader {
    /// Read just the primary header, without validating it. Used to filter
    /// on APID before committing to a full slice.
    pub fn peek(bytes: &[u8]) -> Option<Self> {
        let raw = bytes.get(..PRIMARY_HEADER_LEN)?;
        let rec = bitfield::decode_bits(raw, PRIMARY).ok()?;
        Self::from_record(&rec).ok()
    }

    fn from_record(rec: &Record) -> Result<Self, PacketError> {
        Ok(Self {
            version: rec.uint("version")? as u8,
            packet_type: rec.uint("packet_type")? as u8,
            secondary_header: rec.uint("secondary_header_flag")? != 0,
            apid: rec.uint("apid")? as u16,
            sequence_flags: SequenceFlags::try_from(rec.uint("sequence_flags")? as u8)?,
            sequence_count: rec.uint("sequence_count")? as u16,
            data_length: rec.uint("data_length")? as u16,
        })
    }

    fn to_record(self) -> Record {
        Record::new()
            .with("version", Value::Int(self.version.into()))
            .with("packet_type", Value::Int(self.packet_type.into()))
            .with("secondary_header_flag", Value::Int(self.secondary_header.into()))
            .with("apid", Value::Int(self.apid.into()))
            .with("sequence_flags", Value::Int(u8::from(self.sequence_flags).into()))
            .with("sequence_count", Value::Int(self.sequence_count.into()))
            .with("data_length", Value::Int(self.data_length.into()))
    }

    /// User data bytes (CRC included) announced by `data_length`.
    pub fn user_data_len(&self) -> usize {
        (usize::from(self.data_length) + 1).saturating_sub(SECONDARY_HEADER_LEN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SecondaryHeader {
    pub days: u16,
    pub milliseconds: u32,
    pub grb_version: u8,
    pub payload_variant: u8,
    pub assembler_id: u8,
    pub system_environment: u8,
}

impl SecondaryHeader {
    fn from_record(rec: &Record) -> Result<Self, PacketError> {
        Ok(Self {
            days: rec.uint("days")? as u16,
            milliseconds: rec.uint("milliseconds")? as u32,
            grb_version: rec.uint("grb_version")? as u8,
            payload_variant: rec.uint("payload_variant")? as u8,
            assembler_id: rec.uint("assembler_id")? as u8,
            system_environment: rec.uint("system_environment")? as u8,
        })
    }

    fn to_record(self) -> Record {
        Record::new()
            .with("days", Value::Int(self.days.into()))
            .with("milliseconds", Value::Int(self.milliseconds.into()))
            .with("grb_version", Value::Int(self.grb_version.into()))
            .with("payload_variant", Value::Int(self.payload_variant.into()))
            .with("assembler_id", Value::Int(self.assembler_id.into()))
            .with("system_environment", Value::Int(self.system_environment.into()))
    }
}

/// Encode both headers.
pub(crate) fn encode_headers(
    primary: PrimaryHeader,
    secondary: SecondaryHeader,
) -> Result<[u8; HEADER_LEN], PacketError> {
    let rec = Record::new()
        .with("primary", Value::Record(primary.to_record()))
        .with("secondary", Value::Record(secondary.to_record()));
    let bytes = bitfield::encode_bits(&rec, HEADER_LAYOUT)?;
    let mut out = [0u8; HEADER_LEN];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// A Space Packet, possibly still waiting for bytes from later frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketSlice {
    pub primary: PrimaryHeader,
    pub secondary: SecondaryHeader,
    header: [u8; HEADER_LEN],
    /// User data received so far; excludes the CRC once complete.
    data: Vec<u8>,
    crc: Option<u32>,
    remaining: usize,
}

impl PacketSlice {
    /// Slice a packet starting at the beginning of `zone_tail`.
    ///
    /// `zone_tail` is the packet zone from the header pointer onward; any
    /// bytes past the end of this packet are ignored.
    pub fn from_zone(zone_tail: &[u8]) -> Result<Self, PacketError> {
        if zone_tail.len() < HEADER_LEN {
            return Err(PacketError::TruncatedHeader {
                available: zone_tail.len(),
            });
        }
        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&zone_tail[..HEADER_LEN]);

        let rec = bitfield::decode_bits(&header, HEADER_LAYOUT)?;
        let primary = PrimaryHeader::from_record(
            rec.get_path("primary")
                .and_then(Value::as_record)
                .ok_or_else(|| CodecError::MissingField("primary".into()))?,
        )?;
        let secondary = SecondaryHeader::from_record(
            rec.get_path("secondary")
                .and_then(Value::as_record)
                .ok_or_else(|| CodecError::MissingField("secondary".into()))?,
        )?;
        validate(&primary, &secondary)?;

        let expected = primary.user_data_len();
        let body = &zone_tail[HEADER_LEN..];
        let take = expected.min(body.len());

        let mut slice = Self {
            primary,
            secondary,
            header,
            data: Vec::with_capacity(expected),
            crc: None,
            remaining: expected,
        };
        slice.append_remaining(&body[..take])?;
        Ok(slice)
    }

    /// Append continuation bytes from a later frame.
    pub fn append_remaining(&mut self, bytes: &[u8]) -> Result<(), PacketError> {
        if bytes.len() > self.remaining {
            return Err(PacketError::AppendOverflow {
                offered: bytes.len(),
                remaining: self.remaining,
            });
        }
        self.data.extend_from_slice(bytes);
        self.remaining -= bytes.len();
        if self.remaining == 0 && self.crc.is_none() {
            let at = self.data.len() - CRC_LEN;
            let mut trailer = [0u8; CRC_LEN];
            trailer.copy_from_slice(&self.data[at..]);
            self.data.truncate(at);
            self.crc = Some(u32::from_be_bytes(trailer));
        }
        Ok(())
    }

    pub fn apid(&self) -> u16 {
        self.primary.apid
    }

    pub fn sequence_count(&self) -> u16 {
        self.primary.sequence_count
    }

    pub fn sequence_flags(&self) -> SequenceFlags {
        self.primary.sequence_flags
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Bytes still expected from following frames.
    pub fn remaining_len(&self) -> usize {
        self.remaining
    }

    /// Bits still expected from following frames.
    pub fn remaining_bits(&self) -> usize {
        self.remaining * 8
    }

    /// User data received so far (CRC excluded once complete).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// CRC trailer, present once the packet is complete.
    pub fn crc(&self) -> Option<u32> {
        self.crc
    }

    /// CRC-32 over both headers and the user data, excluding the trailer.
    pub fn computed_crc(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.header);
        hasher.update(&self.data);
        hasher.finalize()
    }

    /// Check the trailer. `None` while the packet is incomplete.
    pub fn verify_crc(&self) -> Option<bool> {
        self.crc.map(|crc| crc == self.computed_crc())
    }
}

fn validate(primary: &PrimaryHeader, secondary: &SecondaryHeader) -> Result<(), PacketError> {
    let invalid = |field, value: u8| PacketError::InvalidHeader {
        field,
        value: value.into(),
    };
    if primary.version != 0 {
        return Err(invalid("version", primary.version));
    }
    if primary.packet_type != 0 {
        return Err(invalid("packet_type", primary.packet_type));
    }
    if !primary.secondary_header {
        return Err(invalid("secondary_header_flag", 0));
    }
    if secondary.grb_version != GRB_VERSION {
        return Err(invalid("grb_version", secondary.grb_version));
    }
    if secondary.payload_variant != GENERIC_VARIANT {
        return Err(PacketError::UnsupportedVariant(secondary.payload_variant));
    }

    let user = usize::from(primary.data_length) + 1;
    if user > USER_DATA_MAX_LEN + SECONDARY_HEADER_LEN {
        return Err(PacketError::PayloadTooLarge {
            bytes: user - SECONDARY_HEADER_LEN,
        });
    }
    if user < SECONDARY_HEADER_LEN + CRC_LEN {
        return Err(PacketError::InvalidHeader {
            field: "data_length",
            value: primary.data_length.into(),
        });
    }
    Ok(())
}
