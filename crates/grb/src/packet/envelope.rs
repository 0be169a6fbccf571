// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generic data envelope that prefixes every reassembled payload.
//!
//! ```text
//! +-------------+-----------+--------------+--------------+----------------+
//! | compression | seconds   | microseconds | reserved (8) | data unit seq  |
//! | u8          | u32       | u32          |              | u32            |
//! +-------------+-----------+--------------+--------------+----------------+
//! ```
//!
//! Times count from J2000 (2000-01-01T12:00:00Z). All fields big-endian.

use super::PacketError;
use crate::bitfield::{self, BitString, Field, Record, Value};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Envelope length in bytes.
pub const ENVELOPE_LEN: usize = 21;
/// J2000 as a Unix timestamp.
pub const J2000_UNIX_SECONDS: i64 = 946_728_000;

const LAYOUT: &[Field] = &[
    Field::int("compression_algorithm", 0, 8),
    Field::int("seconds", 8, 32),
    Field::int("microseconds", 40, 32),
    Field::bits("reserved", 72, 64),
    Field::int("data_unit_sequence_count", 136, 32),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenericEnvelope {
    pub compression_algorithm: u8,
    /// Seconds since J2000.
    pub seconds: u32,
    pub microseconds: u32,
    pub reserved: [u8; 8],
    pub data_unit_sequence_count: u32,
}

impl GenericEnvelope {
    /// Split `data` into its envelope and the instrument body that follows.
    pub fn split(data: &[u8]) -> Result<(Self, &[u8]), PacketError> {
        if data.len() < ENVELOPE_LEN {
            return Err(PacketError::EnvelopeTooShort(data.len()));
        }
        let (head, body) = data.split_at(ENVELOPE_LEN);
        let rec = bitfield::decode_bits(head, LAYOUT)?;

        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(rec.bits("reserved")?.as_bytes());

        let envelope = Self {
            compression_algorithm: rec.uint("compression_algorithm")? as u8,
            seconds: rec.uint("seconds")? as u32,
            microseconds: rec.uint("microseconds")? as u32,
            reserved,
            data_unit_sequence_count: rec.uint("data_unit_sequence_count")? as u32,
        };
        Ok((envelope, body))
    }

    pub fn encode(&self) -> Result<[u8; ENVELOPE_LEN], PacketError> {
        let rec = Record::new()
            .with("compression_algorithm", Value::Int(self.compression_algorithm.into()))
            .with("seconds", Value::Int(self.seconds.into()))
            .with("microseconds", Value::Int(self.microseconds.into()))
            .with("reserved", Value::Bits(BitString::from_bytes(&self.reserved)))
            .with(
                "data_unit_sequence_count",
                Value::Int(self.data_unit_sequence_count.into()),
            );
        let bytes = bitfield::encode_bits(&rec, LAYOUT)?;
        let mut out = [0u8; ENVELOPE_LEN];
        out.copy_from_slice(&bytes);
        Ok(out)
    }

    /// Absolute time of the data unit. `None` if out of range.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let micros = u64::from(self.microseconds);
        let secs = J2000_UNIX_SECONDS + i64::from(self.seconds) + (micros / 1_000_000) as i64;
        let nanos = (micros % 1_000_000) as u32 * 1_000;
        DateTime::from_timestamp(secs, nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_fields() {
        let mut data = vec![0x01];
        data.extend_from_slice(&86_400u32.to_be_bytes());
        data.extend_from_slice(&250_000u32.to_be_bytes());
        data.extend_from_slice(&[0; 8]);
        data.extend_from_slice(&77u32.to_be_bytes());
        data.extend_from_slice(&[0xAB, 0xCD]);

        let (env, body) = GenericEnvelope::split(&data).unwrap();
        assert_eq!(env.compression_algorithm, 1);
        assert_eq!(env.seconds, 86_400);
        assert_eq!(env.microseconds, 250_000);
        assert_eq!(env.data_unit_sequence_count, 77);
        assert_eq!(body, &[0xAB, 0xCD]);
        assert_eq!(env.encode().unwrap().as_slice(), &data[..ENVELOPE_LEN]);
    }

    #[test]
    fn test_timestamp_from_j2000() {
        let env = GenericEnvelope {
            compression_algorithm: 0,
            seconds: 86_400,
            microseconds: 1_500_000,
            reserved: [0; 8],
            data_unit_sequence_count: 0,
        };
        let ts = env.timestamp().unwrap();
        assert_eq!(ts.to_rfc3339(), "2000-01-02T12:00:01.500+00:00");
    }

    #[test]
    fn test_too_short() {
        assert_eq!(
            GenericEnvelope::split(&[0; 20]).unwrap_err(),
            PacketError::EnvelopeTooShort(20)
        );
    }
}
