// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use grb::packet::{GenericEnvelope, PacketSlice};
use grb::{DecoderRegistry, LinkFrame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz frame parser
    let _ = LinkFrame::parse(data);

    // Fuzz packet header slicer, feeding the input again as continuation
    if let Ok(mut slice) = PacketSlice::from_zone(data) {
        let take = slice.remaining_len().min(data.len());
        let _ = slice.append_remaining(&data[..take]);
        let _ = slice.verify_crc();
    }

    // Fuzz envelope and payload decoders
    let _ = GenericEnvelope::split(data);
    let registry = DecoderRegistry::standard();
    for apid in registry.apids().collect::<Vec<_>>() {
        let _ = registry.decode(apid, 0, 1, data);
    }
});
