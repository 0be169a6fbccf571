// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use grb::frame::SYNC_MARKER;
use grb::{ErrorClass, IngestConfig, Ingestor, CADU_LEN, RHCP_VCID};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut ingestor) = Ingestor::new(IngestConfig::default().capacities(8, 4, 8)) else {
        return;
    };

    for chunk in data.chunks_exact(CADU_LEN) {
        let mut frame = chunk.to_vec();
        // Get past validation so the packet zone is exercised
        frame[..4].copy_from_slice(&SYNC_MARKER.to_be_bytes());
        frame[5] = (frame[5] & 0xC0) | RHCP_VCID;
        frame[9] &= 0x7F;

        if let Err(e) = ingestor.process_frame(&frame) {
            assert_eq!(e.class(), ErrorClass::Protocol, "{}", e);
        }
    }
    let _ = ingestor.drain_all();
});
