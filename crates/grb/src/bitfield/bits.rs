// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MSB-first bit access over byte buffers.
//!
//! Bit 0 is the most significant bit of byte 0, matching CCSDS field
//! numbering. All readers assume the caller already checked bounds against
//! the layout.

use serde::{Serialize, Serializer};
use std::fmt;

/// Read `width` bits (at most 64) starting at bit `offset` as an unsigned
/// integer.
pub(crate) fn read_uint(data: &[u8], offset: usize, width: usize) -> u64 {
    debug_assert!(width <= 64);
    debug_assert!(offset + width <= data.len() * 8);

    let end = offset + width;
    let mut bit = offset;
    let mut value = 0u64;
    while bit < end {
        let in_byte = bit % 8;
        let take = (8 - in_byte).min(end - bit);
        let shift = 8 - in_byte - take;
        let chunk = (data[bit / 8] >> shift) & low_mask(take);
        value = (value << take) | u64::from(chunk);
        bit += take;
    }
    value
}

/// Write the low `width` bits of `value` at bit `offset`.
pub(crate) fn write_uint(data: &mut [u8], offset: usize, width: usize, value: u64) {
    debug_assert!(width <= 64);
    debug_assert!(offset + width <= data.len() * 8);

    let end = offset + width;
    let mut bit = offset;
    while bit < end {
        let in_byte = bit % 8;
        let take = (8 - in_byte).min(end - bit);
        let shift = 8 - in_byte - take;
        let after = end - bit - take;
        let chunk = ((value >> after) as u8) & low_mask(take);
        let mask = low_mask(take) << shift;
        let idx = bit / 8;
        data[idx] = (data[idx] & !mask) | (chunk << shift);
        bit += take;
    }
}

/// True if `value` is representable in `width` bits.
pub(crate) fn fits(value: u64, width: usize) -> bool {
    width >= 64 || value >> width == 0
}

#[inline]
fn low_mask(bits: usize) -> u8 {
    ((1u16 << bits) - 1) as u8
}

/// A literal bit sequence.
///
/// Used for opaque fields (flags, reserved spares) and for anything that must
/// re-encode exactly. Bits are packed MSB-first; trailing bits of the last
/// byte are always zero.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct BitString {
    bytes: Vec<u8>,
    len: usize,
}

impl BitString {
    /// Wrap whole bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            len: bytes.len() * 8,
        }
    }

    /// Build from a string of `'0'`/`'1'` characters. Other characters are
    /// rejected.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let mut out = Self {
            bytes: vec![0; s.len().div_ceil(8)],
            len: s.len(),
        };
        for (i, c) in s.chars().enumerate() {
            match c {
                '0' => {}
                '1' => out.bytes[i / 8] |= 0x80 >> (i % 8),
                _ => return None,
            }
        }
        Some(out)
    }

    /// Copy `len` bits starting at bit `offset` of `data`.
    pub(crate) fn from_range(data: &[u8], offset: usize, len: usize) -> Self {
        if offset % 8 == 0 && len % 8 == 0 {
            let start = offset / 8;
            return Self::from_bytes(&data[start..start + len / 8]);
        }
        let mut bytes = vec![0u8; len.div_ceil(8)];
        for i in 0..len {
            let src = offset + i;
            if data[src / 8] & (0x80 >> (src % 8)) != 0 {
                bytes[i / 8] |= 0x80 >> (i % 8);
            }
        }
        Self { bytes, len }
    }

    /// Copy these bits into `data` at bit `offset`.
    pub(crate) fn write_into(&self, data: &mut [u8], offset: usize) {
        if offset % 8 == 0 && self.len % 8 == 0 {
            let start = offset / 8;
            data[start..start + self.bytes.len()].copy_from_slice(&self.bytes);
            return;
        }
        for i in 0..self.len {
            let dst = offset + i;
            let mask = 0x80 >> (dst % 8);
            if self.bit(i) {
                data[dst / 8] |= mask;
            } else {
                data[dst / 8] &= !mask;
            }
        }
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit at position `i` (0 = first / most significant).
    pub fn bit(&self, i: usize) -> bool {
        self.bytes[i / 8] & (0x80 >> (i % 8)) != 0
    }

    /// Packed bytes, MSB-first, zero-padded to a byte boundary.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Interpret the bits as an unsigned integer, if they fit in 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        (self.len <= 64).then(|| read_uint(&self.bytes, 0, self.len))
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            f.write_str(if self.bit(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len <= 64 {
            write!(f, "BitString({self})")
        } else {
            write!(f, "BitString({} bits)", self.len)
        }
    }
}

impl Serialize for BitString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_uint_unaligned() {
        // 0001_1010 1100_1111
        let data = [0x1A, 0xCF];
        assert_eq!(read_uint(&data, 0, 2), 0b00);
        assert_eq!(read_uint(&data, 2, 8), 0b0110_1011);
        assert_eq!(read_uint(&data, 5, 11), 0b010_1100_1111);
        assert_eq!(read_uint(&data, 0, 16), 0x1ACF);
    }

    #[test]
    fn test_read_uint_full_width() {
        let data = [0xFF; 9];
        assert_eq!(read_uint(&data, 3, 64), u64::MAX);
    }

    #[test]
    fn test_write_uint_preserves_neighbours() {
        let mut data = [0xFF, 0xFF];
        write_uint(&mut data, 5, 6, 0);
        assert_eq!(data, [0b1111_1000, 0b0001_1111]);
        write_uint(&mut data, 5, 6, 0b10_1010);
        assert_eq!(read_uint(&data, 5, 6), 0b10_1010);
        assert_eq!(read_uint(&data, 0, 5), 0b1_1111);
        assert_eq!(read_uint(&data, 11, 5), 0b1_1111);
    }

    #[test]
    fn test_fits() {
        assert!(fits(0x7FF, 11));
        assert!(!fits(0x800, 11));
        assert!(fits(u64::MAX, 64));
    }

    #[test]
    fn test_bitstring_display_and_parse() {
        let bits = BitString::from_range(&[0b0011_0000], 1, 4);
        assert_eq!(bits.to_string(), "0110");
        assert_eq!(BitString::from_binary_str("0110"), Some(bits.clone()));
        assert_eq!(bits.to_u64(), Some(6));
        assert!(BitString::from_binary_str("01x").is_none());
    }

    #[test]
    fn test_bitstring_write_unaligned() {
        let bits = BitString::from_binary_str("101").unwrap();
        let mut data = [0u8; 1];
        bits.write_into(&mut data, 3);
        assert_eq!(data[0], 0b0001_0100);
    }
}
