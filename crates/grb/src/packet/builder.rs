// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Space Packet construction (sender side).

use super::{
    encode_headers, GenericEnvelope, PacketError, PrimaryHeader, SecondaryHeader, SequenceFlags,
    CRC_LEN, GENERIC_VARIANT, GRB_VERSION, HEADER_LEN, SECONDARY_HEADER_LEN, USER_DATA_MAX_LEN,
};

/// Builds one Space Packet with valid headers and CRC trailer.
///
/// ```
/// use grb::packet::{PacketSlice, SequenceFlags, SpacePacketBuilder};
///
/// let bytes = SpacePacketBuilder::new(0x421)
///     .sequence_flags(SequenceFlags::First)
///     .sequence_count(100)
///     .build(&[1, 2, 3])
///     .unwrap();
///
/// let slice = PacketSlice::from_zone(&bytes).unwrap();
/// assert_eq!(slice.sequence_count(), 100);
/// assert_eq!(slice.verify_crc(), Some(true));
/// ```
#[derive(Debug, Clone)]
pub struct SpacePacketBuilder {
    apid: u16,
    flags: SequenceFlags,
    sequence_count: u16,
    days: u16,
    milliseconds: u32,
    payload_variant: u8,
    assembler_id: u8,
    system_environment: u8,
}

impl SpacePacketBuilder {
    pub fn new(apid: u16) -> Self {
        Self {
            apid,
            flags: SequenceFlags::Unsegmented,
            sequence_count: 0,
            days: 0,
            milliseconds: 0,
            payload_variant: GENERIC_VARIANT,
            assembler_id: 0,
            system_environment: 0,
        }
    }

    pub fn sequence_flags(mut self, flags: SequenceFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn sequence_count(mut self, count: u16) -> Self {
        self.sequence_count = count;
        self
    }

    /// Secondary header time code.
    pub fn time(mut self, days: u16, milliseconds: u32) -> Self {
        self.days = days;
        self.milliseconds = milliseconds;
        self
    }

    pub fn payload_variant(mut self, variant: u8) -> Self {
        self.payload_variant = variant;
        self
    }

    pub fn assembler_id(mut self, id: u8) -> Self {
        self.assembler_id = id;
        self
    }

    pub fn system_environment(mut self, env: u8) -> Self {
        self.system_environment = env;
        self
    }

    /// Build a packet carrying `user_data` (CRC appended here).
    pub fn build(&self, user_data: &[u8]) -> Result<Vec<u8>, PacketError> {
        let user_len = user_data.len() + CRC_LEN;
        if user_len > USER_DATA_MAX_LEN {
            return Err(PacketError::PayloadTooLarge { bytes: user_len });
        }

        let primary = PrimaryHeader {
            version: 0,
            packet_type: 0,
            secondary_header: true,
            apid: self.apid,
            sequence_flags: self.flags,
            sequence_count: self.sequence_count,
            data_length: (SECONDARY_HEADER_LEN + user_len - 1) as u16,
        };
        let secondary = SecondaryHeader {
            days: self.days,
            milliseconds: self.milliseconds,
            grb_version: GRB_VERSION,
            payload_variant: self.payload_variant,
            assembler_id: self.assembler_id,
            system_environment: self.system_environment,
        };
        let header = encode_headers(primary, secondary)?;

        let mut out = Vec::with_capacity(HEADER_LEN + user_len);
        out.extend_from_slice(&header);
        out.extend_from_slice(user_data);
        let crc = crc32fast::hash(&out);
        out.extend_from_slice(&crc.to_be_bytes());
        Ok(out)
    }

    /// Build a packet whose user data is `envelope` followed by `body`.
    pub fn build_generic(
        &self,
        envelope: &GenericEnvelope,
        body: &[u8],
    ) -> Result<Vec<u8>, PacketError> {
        let mut user = Vec::with_capacity(super::ENVELOPE_LEN + body.len());
        user.extend_from_slice(&envelope.encode()?);
        user.extend_from_slice(body);
        self.build(&user)
    }
}
