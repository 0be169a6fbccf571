// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Frame Error Control Field (CRC-16/CCITT-FALSE).
//!
//! Covers the transfer frame from the primary header up to, but not
//! including, the FECF itself. The attached sync marker is not covered.
//!
//! | Parameter | Value |
//! |-----------|-------|
//! | Polynomial | 0x1021 |
//! | Init | 0xFFFF |
//! | RefIn / RefOut | false |
//! | XorOut | 0x0000 |

use super::{CADU_LEN, FECF_LEN, SYNC_LEN};

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

const TABLE: [u16; 256] = {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;
        while j < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// CRC-16/CCITT-FALSE of `data`.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(INIT, |crc, &byte| {
        (crc << 8) ^ TABLE[usize::from((crc >> 8) as u8 ^ byte)]
    })
}

/// FECF over the covered region of a full CADU.
#[must_use]
pub fn compute(cadu: &[u8]) -> u16 {
    debug_assert_eq!(cadu.len(), CADU_LEN);
    crc16(&cadu[SYNC_LEN..CADU_LEN - FECF_LEN])
}

/// True if the trailing FECF of `cadu` matches its contents.
#[must_use]
pub fn verify(cadu: &[u8]) -> bool {
    if cadu.len() != CADU_LEN {
        return false;
    }
    let stored = u16::from_be_bytes([cadu[CADU_LEN - 2], cadu[CADU_LEN - 1]]);
    compute(cadu) == stored
}

/// Overwrite the trailing FECF of `cadu` with the computed value.
pub fn seal(cadu: &mut [u8]) {
    let crc = compute(cadu);
    cadu[CADU_LEN - FECF_LEN..].copy_from_slice(&crc.to_be_bytes());
}
