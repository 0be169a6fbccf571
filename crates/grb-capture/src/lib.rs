// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! GRB capture, live reception and replay.
//!
//! Feeds the [`grb`] reassembly engine from capture files or a UDP socket and
//! writes decoded records as JSON Lines.
//!
//! # Quick Start
//!
//! ```bash
//! # Decode a capture to JSON Lines
//! grb-decode --input packets.csv --output records.jsonl
//!
//! # Listen on the GRB multicast feed
//! grb-decode --listen 0.0.0.0:50020 --group 239.1.2.3
//!
//! # Replay a capture at 2000 frames/s
//! grb-replay --input GOESR.pcap --target 127.0.0.1:50020 --rate 2000
//!
//! # Write the default engine configuration
//! grb-decode gen-config > grb.toml
//! ```
//!
//! # Capture Formats
//!
//! | Format | Extensions | Notes |
//! |--------|------------|-------|
//! | Hex CSV | `.csv`, `.hex` | one frame per line |
//! | Raw | `.bin`, `.cadu`, `.raw` | concatenated 2048-byte frames |
//! | Pcap | `.pcap`, `.cap` | Ethernet / IPv4 / UDP, 2048-byte payloads |

pub mod error;
pub mod listen;
pub mod pcap;
pub mod replay;
pub mod sink;
pub mod source;
pub mod synthetic;

pub use error::CaptureError;
pub use listen::{UdpFrameReceiver, DEFAULT_PORT};
pub use pcap::PcapReader;
pub use replay::{FrameRate, ReplayConfig, ReplayStats, Replayer};
pub use sink::JsonLinesSink;
pub use source::{CaptureFormat, CaptureReader, HexCsvReader, RawReader};
pub use synthetic::SyntheticStream;
