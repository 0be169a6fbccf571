// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field validation for decoded link frames.

use super::{fecf, LinkFrame, SYNC_MARKER};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a structurally sound frame was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameRejection {
    /// Attached sync marker is not `0x1ACFFC1D`.
    Sync,
    /// Replay flag set.
    Replay,
    /// Neither the signaling-field spare nor the M_PDU spare is zero.
    ReservedSpare,
    /// Frame-count usage flag differs from the configured expectation.
    CountUsage,
    /// FECF mismatch.
    Fecf,
}

impl FrameRejection {
    pub const ALL: [FrameRejection; 5] = [
        FrameRejection::Sync,
        FrameRejection::Replay,
        FrameRejection::ReservedSpare,
        FrameRejection::CountUsage,
        FrameRejection::Fecf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FrameRejection::Sync => "sync",
            FrameRejection::Replay => "replay",
            FrameRejection::ReservedSpare => "reserved_spare",
            FrameRejection::CountUsage => "count_usage",
            FrameRejection::Fecf => "fecf",
        }
    }
}

impl fmt::Display for FrameRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which optional frame checks to apply.
///
/// Sync, replay and reserved-spare checks always run. Live GRB streams do
/// not reliably set the frame-count usage flag, so that check is off unless
/// an expected value is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameValidation {
    /// Expected frame-count usage flag, or `None` to skip the check.
    pub count_usage_flag: Option<bool>,
    /// Verify the FECF.
    pub check_fecf: bool,
}

impl FrameValidation {
    /// Run all enabled checks against `frame`, decoded from `raw`.
    pub fn check(&self, frame: &LinkFrame, raw: &[u8]) -> Result<(), FrameRejection> {
        if frame.sync != SYNC_MARKER {
            return Err(FrameRejection::Sync);
        }
        if frame.replay {
            return Err(FrameRejection::Replay);
        }
        if frame.signaling_spare != 0 && frame.mpdu_spare != 0 {
            return Err(FrameRejection::ReservedSpare);
        }
        if let Some(expected) = self.count_usage_flag {
            if frame.count_usage != expected {
                return Err(FrameRejection::CountUsage);
            }
        }
        if self.check_fecf && !fecf::verify(raw) {
            return Err(FrameRejection::Fecf);
        }
        Ok(())
    }
}
