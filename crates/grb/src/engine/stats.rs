// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ingestion counters.

use crate::frame::FrameRejection;
use serde::Serialize;
use std::collections::BTreeMap;

/// Running totals for one [`Ingestor`](super::Ingestor).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestStats {
    /// Frames handed to `process_frame`.
    pub frames_received: u64,
    /// Frames stored for reassembly.
    pub frames_accepted: u64,
    /// Frames dropped by validation, per reason.
    pub frames_rejected: BTreeMap<FrameRejection, u64>,
    /// Frames on a virtual channel other than the configured one.
    pub frames_other_channel: u64,
    /// Frames whose count was already stored.
    pub frames_duplicate: u64,
    /// Packets skipped: unmonitored APID or non-generic payload.
    pub packets_ignored: u64,
    /// Headers cut off by the end of a packet zone.
    pub headers_truncated: u64,
    /// Packets that needed bytes from later frames.
    pub continuations_started: u64,
    /// Of those, packets completed.
    pub continuations_resolved: u64,
    /// Pending continuations lost to eviction or key collision.
    pub continuations_dropped: u64,
    /// Segments parked waiting for the rest of their run.
    pub segments_stored: u64,
    /// Segments lost to eviction or duplicate sequence counts.
    pub segments_dropped: u64,
    /// Packets decoded and delivered.
    pub packets_completed: u64,
    /// Packets dropped on CRC mismatch.
    pub crc_failures: u64,
    /// Records aborted by a protocol violation.
    pub protocol_errors: u64,
}

impl IngestStats {
    pub(crate) fn reject(&mut self, reason: FrameRejection) {
        *self.frames_rejected.entry(reason).or_insert(0) += 1;
    }

    /// Frames dropped by validation, all reasons.
    pub fn frames_rejected_total(&self) -> u64 {
        self.frames_rejected.values().sum()
    }

    pub fn rejected(&self, reason: FrameRejection) -> u64 {
        self.frames_rejected.get(&reason).copied().unwrap_or(0)
    }
}
