// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Capture error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid hex: {source}")]
    InvalidHex {
        line: usize,
        #[source]
        source: hex::FromHexError,
    },

    #[error("frame {index}: expected 2048 bytes, got {actual}")]
    FrameLength { index: usize, actual: usize },

    #[error("not a pcap file (magic {0:#010x})")]
    PcapMagic(u32),

    #[error("pcap file truncated inside {0}")]
    PcapTruncated(&'static str),

    #[error("pcap record of {0} bytes exceeds the snapshot limit")]
    PcapRecordTooLarge(u32),

    #[error("unsupported pcap link type {0}")]
    UnsupportedLinkType(u32),

    #[error("cannot infer capture format of {}", .0.display())]
    UnknownFormat(PathBuf),

    #[error(transparent)]
    Frame(#[from] grb::frame::FrameError),

    #[error(transparent)]
    Packet(#[from] grb::packet::PacketError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CaptureError {
    /// Whether the input can still be read past this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            CaptureError::InvalidHex { .. } | CaptureError::FrameLength { .. }
        )
    }
}
