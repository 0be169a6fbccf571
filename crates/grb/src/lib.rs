// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! GOES-R Rebroadcast (GRB) link decoding.
//!
//! Turns a stream of 2048-byte CADUs into decoded space weather records:
//!
//! ```text
//! CADU (AOS transfer frame) -> M_PDU packet zone -> Space Packet
//!        -> segment run -> generic envelope -> instrument record
//! ```
//!
//! Supported instrument streams:
//!
//! | APID  | Instrument | Record |
//! |-------|------------|--------|
//! | 0x383 | EXIS XRS   | X-ray irradiance |
//! | 0x410 | SEISS MPS-LO | low energy particle fluxes |
//! | 0x421 | SEISS MPS-HI | medium/high energy particle fluxes |
//!
//! # Quick Start
//!
//! ```
//! use grb::{FrameMux, IngestConfig, Ingestor, SpacePacketBuilder, RHCP_VCID};
//! use grb::packet::GenericEnvelope;
//! use grb::payload::xrs;
//!
//! let envelope = GenericEnvelope {
//!     compression_algorithm: 0,
//!     seconds: 700_000_000,
//!     microseconds: 0,
//!     reserved: [0; 8],
//!     data_unit_sequence_count: 1,
//! };
//! let packet = SpacePacketBuilder::new(xrs::APID)
//!     .build_generic(&envelope, &[0u8; xrs::RECORD_LEN])
//!     .unwrap();
//!
//! let mut mux = FrameMux::new(0x81, RHCP_VCID);
//! let mut frames = mux.push_packet(&packet).unwrap();
//! frames.extend(mux.flush().unwrap());
//!
//! let mut ingestor = Ingestor::new(IngestConfig::default()).unwrap();
//! for frame in &frames {
//!     ingestor.process_frame(frame).unwrap();
//! }
//! assert_eq!(ingestor.complete(xrs::APID).len(), 1);
//! ```

pub mod bitfield;
pub mod config;
pub mod engine;
pub mod frame;
pub mod packet;
pub mod payload;
pub mod sequence;
pub mod store;

pub use config::{ConfigError, IngestConfig};
pub use engine::{ErrorClass, FrameOutcome, IngestError, IngestStats, Ingestor};
pub use frame::{FrameMux, FrameRejection, FrameValidation, LinkFrame, CADU_LEN, RHCP_VCID};
pub use packet::{PacketSlice, SequenceFlags, SpacePacketBuilder};
pub use payload::{DecodedPacket, DecoderRegistry, PayloadKind};
pub use sequence::Rollover;
pub use store::SequenceStore;
