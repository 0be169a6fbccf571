// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Instrument payload decoders and the APID registry.
//!
//! A reassembled packet's user data is a [`GenericEnvelope`] followed by an
//! instrument record. The registry maps each monitored APID to the decoder
//! for that record; the set of APIDs the engine accepts must be covered by
//! the registry before ingestion starts (see [`DecoderRegistry::require`]).

pub mod mps_hi;
pub mod mps_lo;
pub mod xrs;

use crate::bitfield::{self, CodecError, Endian, Field, Record};
use crate::packet::{GenericEnvelope, PacketError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("no decoder registered for APID {0:#05x}")]
    NoDecoder(u16),

    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Instrument stream carried by an APID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// EXIS XRS solar X-ray irradiance.
    XRay,
    /// SEISS MPS-LO low energy protons/electrons.
    ProtonLow,
    /// SEISS MPS-HI medium/high energy protons/electrons.
    ProtonMedHigh,
}

impl PayloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PayloadKind::XRay => "xrs",
            PayloadKind::ProtonLow => "mps_lo",
            PayloadKind::ProtonMedHigh => "mps_hi",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decodes the instrument record of one APID.
pub trait PayloadDecoder: Send + Sync + fmt::Debug {
    fn apid(&self) -> u16;
    fn kind(&self) -> PayloadKind;
    /// Decode the bytes following the generic envelope.
    fn decode(&self, body: &[u8]) -> Result<Record, CodecError>;
}

/// Decoder backed by a static byte layout.
#[derive(Debug, Clone, Copy)]
pub struct LayoutDecoder {
    apid: u16,
    kind: PayloadKind,
    layout: &'static [Field],
    endian: Endian,
}

impl LayoutDecoder {
    pub const fn new(
        apid: u16,
        kind: PayloadKind,
        layout: &'static [Field],
        endian: Endian,
    ) -> Self {
        Self {
            apid,
            kind,
            layout,
            endian,
        }
    }

    pub const fn xrs() -> Self {
        Self::new(xrs::APID, PayloadKind::XRay, xrs::LAYOUT, Endian::Little)
    }

    pub const fn mps_lo() -> Self {
        Self::new(mps_lo::APID, PayloadKind::ProtonLow, mps_lo::LAYOUT, Endian::Little)
    }

    pub const fn mps_hi() -> Self {
        Self::new(mps_hi::APID, PayloadKind::ProtonMedHigh, mps_hi::LAYOUT, Endian::Little)
    }

    pub fn record_len(&self) -> usize {
        bitfield::layout_len(self.layout)
    }
}

impl PayloadDecoder for LayoutDecoder {
    fn apid(&self) -> u16 {
        self.apid
    }

    fn kind(&self) -> PayloadKind {
        self.kind
    }

    fn decode(&self, body: &[u8]) -> Result<Record, CodecError> {
        bitfield::decode_bytes(body, self.layout, self.endian)
    }
}

/// A fully reassembled and decoded packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedPacket {
    pub apid: u16,
    pub kind: PayloadKind,
    /// Sequence count of the first segment.
    pub sequence_count: u16,
    /// Number of segments stitched together (1 when unsegmented).
    pub segments: usize,
    pub envelope: GenericEnvelope,
    pub timestamp: Option<DateTime<Utc>>,
    pub fields: Record,
}

/// APID to decoder map.
#[derive(Debug, Default)]
pub struct DecoderRegistry {
    decoders: BTreeMap<u16, Box<dyn PayloadDecoder>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the XRS, MPS-LO and MPS-HI decoders.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(LayoutDecoder::xrs());
        registry.register(LayoutDecoder::mps_lo());
        registry.register(LayoutDecoder::mps_hi());
        registry
    }

    /// Add a decoder, replacing any previous one for the same APID.
    pub fn register<D: PayloadDecoder + 'static>(&mut self, decoder: D) -> Option<Box<dyn PayloadDecoder>> {
        self.decoders.insert(decoder.apid(), Box::new(decoder))
    }

    pub fn get(&self, apid: u16) -> Option<&dyn PayloadDecoder> {
        self.decoders.get(&apid).map(|d| d.as_ref())
    }

    pub fn contains(&self, apid: u16) -> bool {
        self.decoders.contains_key(&apid)
    }

    pub fn apids(&self) -> impl Iterator<Item = u16> + '_ {
        self.decoders.keys().copied()
    }

    /// Fail on the first APID in `apids` without a decoder.
    pub fn require(&self, apids: &[u16]) -> Result<(), PayloadError> {
        match apids.iter().find(|a| !self.contains(**a)) {
            Some(&missing) => Err(PayloadError::NoDecoder(missing)),
            None => Ok(()),
        }
    }

    /// Split the envelope off `user_data` and decode the instrument record.
    pub fn decode(
        &self,
        apid: u16,
        sequence_count: u16,
        segments: usize,
        user_data: &[u8],
    ) -> Result<DecodedPacket, PayloadError> {
        let decoder = self.get(apid).ok_or(PayloadError::NoDecoder(apid))?;
        let (envelope, body) = GenericEnvelope::split(user_data)?;
        let fields = decoder.decode(body)?;
        Ok(DecodedPacket {
            apid,
            kind: decoder.kind(),
            sequence_count,
            segments,
            envelope,
            timestamp: envelope.timestamp(),
            fields,
        })
    }
}
