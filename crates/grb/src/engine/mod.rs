// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Frame-to-record reassembly.
//!
//! The [`Ingestor`] takes raw CADUs in arrival order and produces decoded
//! instrument records per APID. Two levels of reassembly happen:
//!
//! ```text
//!  CADU k        CADU k+1       CADU k+2
//! [hdr|pkt A...][...A...      ][..A|hdr pkt B]     <- continuation across frames
//!
//!  pkt seq 100 (First)  seq 101 (Continuation)  seq 102 (Last)
//!        \____________________ | ____________________/
//!                      one decoded record            <- segment runs per APID
//! ```
//!
//! Continuations wait in a store keyed by the frame count they need next;
//! segments wait in a per-APID store keyed by sequence count. Both stores
//! are bounded, so anything that never completes is eventually evicted.
//!
//! Processing is synchronous and single-threaded: one `process_frame` call
//! runs every continuation and segment step it triggers before returning.

mod segments;
mod stats;

pub use stats::IngestStats;

use crate::bitfield::CodecError;
use crate::config::{ConfigError, IngestConfig};
use crate::frame::{FrameError, FrameRejection, LinkFrame, NO_HEADER, PACKET_ZONE_LEN};
use crate::packet::{PacketError, PacketSlice, PrimaryHeader, SequenceFlags};
use crate::payload::{DecodedPacket, DecoderRegistry, PayloadError};
use crate::sequence::Rollover;
use crate::store::{Enqueued, SequenceStore, StoreError};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// How an error should be treated by the driving loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input. The affected record is lost; keep feeding frames.
    Protocol,
    /// Broken internal contract. Stop and report.
    Invariant,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(
        "continuation frame {frame_count} has header pointer {pointer:#05x} \
         but {expected} continuation bytes were expected"
    )]
    ContinuationConflict {
        frame_count: u32,
        pointer: u16,
        expected: usize,
    },

    #[error("segment {sequence_count} of APID {apid:#05x} finalized with {remaining} bytes missing")]
    IncompleteSegment {
        apid: u16,
        sequence_count: u16,
        remaining: usize,
    },

    #[error("packet for unmonitored APID {0:#05x} reached reassembly")]
    UnmonitoredApid(u16),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl IngestError {
    pub fn class(&self) -> ErrorClass {
        match self {
            IngestError::Frame(FrameError::Codec(e))
            | IngestError::Packet(PacketError::Codec(e))
            | IngestError::Payload(PayloadError::Codec(e)) => match e {
                CodecError::Truncated { .. } => ErrorClass::Protocol,
                _ => ErrorClass::Invariant,
            },
            IngestError::Frame(FrameError::Length { .. }) => ErrorClass::Invariant,
            IngestError::ContinuationConflict { .. }
            | IngestError::Payload(PayloadError::Packet(_)) => ErrorClass::Protocol,
            IngestError::Packet(PacketError::AppendOverflow { .. }) => ErrorClass::Invariant,
            IngestError::Packet(_) => ErrorClass::Protocol,
            IngestError::Payload(PayloadError::NoDecoder(_))
            | IngestError::IncompleteSegment { .. }
            | IngestError::UnmonitoredApid(_)
            | IngestError::Store(_)
            | IngestError::Config(_) => ErrorClass::Invariant,
        }
    }
}

/// What happened to one input frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Stored and processed.
    Accepted,
    /// Failed validation.
    Rejected(FrameRejection),
    /// Valid, but for another virtual channel.
    OtherChannel(u8),
    /// Frame count already stored.
    Duplicate,
}

/// Reassembly state of one APID.
#[derive(Debug)]
struct PacketStream {
    segmented: SequenceStore<PacketSlice>,
    complete: Vec<DecodedPacket>,
}

/// CADU stream reassembler.
#[derive(Debug)]
pub struct Ingestor {
    config: IngestConfig,
    registry: DecoderRegistry,
    cadus: SequenceStore<Arc<LinkFrame>>,
    requests: SequenceStore<PacketSlice>,
    streams: BTreeMap<u16, PacketStream>,
    stats: IngestStats,
}

impl Ingestor {
    /// Ingestor with the standard instrument decoders.
    pub fn new(config: IngestConfig) -> Result<Self, IngestError> {
        Self::with_registry(config, DecoderRegistry::standard())
    }

    /// Ingestor with a custom decoder set. Every configured APID must have a
    /// decoder.
    pub fn with_registry(
        config: IngestConfig,
        registry: DecoderRegistry,
    ) -> Result<Self, IngestError> {
        config.validate()?;
        registry.require(&config.apids)?;

        let mut streams = BTreeMap::new();
        for &apid in &config.apids {
            streams.insert(
                apid,
                PacketStream {
                    segmented: SequenceStore::new(
                        Rollover::SEQUENCE_COUNT,
                        config.segment_capacity,
                    )?,
                    complete: Vec::new(),
                },
            );
        }

        Ok(Self {
            cadus: SequenceStore::new(Rollover::FRAME_COUNT, config.frame_capacity)?,
            requests: SequenceStore::new(Rollover::FRAME_COUNT, config.request_capacity)?,
            streams,
            registry,
            config,
            stats: IngestStats::default(),
        })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Decoded records for `apid`, oldest first.
    pub fn complete(&self, apid: u16) -> &[DecodedPacket] {
        self.streams
            .get(&apid)
            .map_or(&[][..], |s| s.complete.as_slice())
    }

    /// Take the decoded records for `apid`.
    pub fn drain_complete(&mut self, apid: u16) -> Vec<DecodedPacket> {
        self.streams
            .get_mut(&apid)
            .map(|s| std::mem::take(&mut s.complete))
            .unwrap_or_default()
    }

    /// Take every decoded record, grouped by APID in ascending order.
    pub fn drain_all(&mut self) -> Vec<DecodedPacket> {
        self.streams
            .values_mut()
            .flat_map(|s| std::mem::take(&mut s.complete))
            .collect()
    }

    /// Packets waiting on a frame that has not arrived.
    pub fn pending_continuations(&self) -> usize {
        self.requests.len()
    }

    /// Segments of `apid` waiting for the rest of their run.
    pub fn pending_segments(&self, apid: u16) -> usize {
        self.streams.get(&apid).map_or(0, |s| s.segmented.len())
    }

    /// Process one raw CADU.
    ///
    /// A wrong-length frame is an error. Frames that fail validation, sit on
    /// another virtual channel or repeat a stored frame count are reported
    /// through the returned [`FrameOutcome`] and otherwise ignored.
    ///
    /// Errors abort only the record they concern; the ingestor stays usable
    /// unless [`IngestError::class`] says otherwise.
    pub fn process_frame(&mut self, raw: &[u8]) -> Result<FrameOutcome, IngestError> {
        self.stats.frames_received += 1;

        let frame = LinkFrame::parse(raw)?;
        if let Err(reason) = self.config.frames.check(&frame, raw) {
            log::debug!(
                "[ingest] frame {} rejected: {}",
                frame.frame_count,
                reason
            );
            self.stats.reject(reason);
            return Ok(FrameOutcome::Rejected(reason));
        }
        if frame.virtual_channel != self.config.virtual_channel {
            log::trace!(
                "[ingest] frame {} on vc {} skipped",
                frame.frame_count,
                frame.virtual_channel
            );
            self.stats.frames_other_channel += 1;
            return Ok(FrameOutcome::OtherChannel(frame.virtual_channel));
        }

        let frame = Arc::new(frame);
        match self.cadus.enqueue(frame.frame_count, Arc::clone(&frame)) {
            Enqueued::Duplicate(_) => {
                log::debug!("[ingest] duplicate frame {}", frame.frame_count);
                self.stats.frames_duplicate += 1;
                return Ok(FrameOutcome::Duplicate);
            }
            Enqueued::Inserted { evicted } => {
                for (count, _) in evicted {
                    log::trace!("[ingest] frame {count} aged out");
                }
            }
        }
        self.stats.frames_accepted += 1;

        // Older requests first: this frame may be the one they wait for.
        let pending = self.resolve_pending();
        let own = self.follow_first_header(&frame);

        match (pending, own) {
            (Err(first), Err(second)) => {
                self.count_error(&first);
                self.count_error(&second);
                log::warn!(
                    "[ingest] frame {}: also failed: {}",
                    frame.frame_count,
                    second
                );
                Err(first)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => {
                self.count_error(&e);
                Err(e)
            }
            (Ok(()), Ok(())) => Ok(FrameOutcome::Accepted),
        }
    }

    fn count_error(&mut self, error: &IngestError) {
        if error.class() == ErrorClass::Protocol {
            self.stats.protocol_errors += 1;
        }
    }

    /// Retry every pending continuation. Keeps going past failures and
    /// returns the first one.
    fn resolve_pending(&mut self) -> Result<(), IngestError> {
        let keys: Vec<u32> = self.requests.sequences().collect();
        let mut result = Ok(());
        for key in keys {
            if let Err(e) = self.continue_packet(key) {
                if result.is_ok() {
                    result = Err(e);
                } else {
                    self.count_error(&e);
                    log::warn!("[ingest] continuation for frame {key} failed: {e}");
                }
            }
        }
        result
    }

    /// Feed the packet waiting on frame `key` from stored frames until it is
    /// complete or the next frame is missing.
    fn continue_packet(&mut self, mut key: u32) -> Result<(), IngestError> {
        loop {
            let Some(frame) = self.cadus.get(key).cloned() else {
                return Ok(());
            };
            let Some(mut slice) = self.requests.dequeue(key) else {
                return Ok(());
            };

            let take = slice.remaining_len().min(PACKET_ZONE_LEN);
            let pointer = frame.first_header_pointer;
            let consistent =
                pointer == NO_HEADER || (take < PACKET_ZONE_LEN && usize::from(pointer) == take);
            if !consistent {
                log::warn!(
                    "[ingest] dropping APID {:#05x} seq {}: frame {key} pointer {pointer} after {take} continuation bytes",
                    slice.apid(),
                    slice.sequence_count()
                );
                return Err(IngestError::ContinuationConflict {
                    frame_count: key,
                    pointer,
                    expected: take,
                });
            }

            slice.append_remaining(&frame.packet_zone[..take])?;
            if slice.is_complete() {
                self.stats.continuations_resolved += 1;
                return self.record_space_packet(slice);
            }

            key = Rollover::FRAME_COUNT.next(key);
            self.park(key, slice);
        }
    }

    /// Queue `slice` until frame `key` is available.
    fn park(&mut self, key: u32, slice: PacketSlice) {
        match self.requests.enqueue(key, slice) {
            Enqueued::Inserted { evicted } => {
                for (count, lost) in evicted {
                    log::debug!(
                        "[ingest] continuation for frame {count} evicted (APID {:#05x} seq {})",
                        lost.apid(),
                        lost.sequence_count()
                    );
                    self.stats.continuations_dropped += 1;
                }
            }
            Enqueued::Duplicate(lost) => {
                log::warn!(
                    "[ingest] frame {key} already awaited; dropping APID {:#05x} seq {}",
                    lost.apid(),
                    lost.sequence_count()
                );
                self.stats.continuations_dropped += 1;
            }
        }
    }

    /// Slice the packet the frame's header pointer refers to.
    ///
    /// A header with fewer than 14 bytes left in the zone is counted in
    /// `headers_truncated` and dropped, not carried into the next frame.
    fn follow_first_header(&mut self, frame: &LinkFrame) -> Result<(), IngestError> {
        let Some(offset) = frame.first_header_offset() else {
            return Ok(());
        };
        if offset >= PACKET_ZONE_LEN {
            return Err(PacketError::InvalidHeader {
                field: "first_header_pointer",
                value: offset as u64,
            }
            .into());
        }
        let tail = &frame.packet_zone[offset..];

        match PrimaryHeader::peek(tail) {
            Some(header) if !self.streams.contains_key(&header.apid) => {
                self.stats.packets_ignored += 1;
                return Ok(());
            }
            _ => {}
        }

        let slice = match PacketSlice::from_zone(tail) {
            Ok(slice) => slice,
            Err(PacketError::TruncatedHeader { available }) => {
                log::debug!(
                    "[ingest] frame {}: header at {offset} cut off after {available} bytes",
                    frame.frame_count
                );
                self.stats.headers_truncated += 1;
                return Ok(());
            }
            Err(PacketError::UnsupportedVariant(variant)) => {
                log::debug!(
                    "[ingest] frame {}: payload variant {variant:#07b} ignored",
                    frame.frame_count
                );
                self.stats.packets_ignored += 1;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if slice.is_complete() {
            return self.record_space_packet(slice);
        }
        self.stats.continuations_started += 1;
        let next = Rollover::FRAME_COUNT.next(frame.frame_count);
        self.park(next, slice);
        self.continue_packet(next)
    }

    /// Hand a complete packet to segment reassembly.
    fn record_space_packet(&mut self, slice: PacketSlice) -> Result<(), IngestError> {
        let apid = slice.apid();
        let seq = slice.sequence_count();

        if self.config.validate_crc && slice.verify_crc() == Some(false) {
            log::warn!("[ingest] APID {apid:#05x} seq {seq}: CRC mismatch, dropped");
            self.stats.crc_failures += 1;
            return Ok(());
        }

        let stream = self
            .streams
            .get_mut(&apid)
            .ok_or(IngestError::UnmonitoredApid(apid))?;

        if slice.sequence_flags() == SequenceFlags::Unsegmented {
            return Self::finalize(&self.registry, &mut self.stats, stream, apid, vec![slice]);
        }

        let key = u32::from(seq);
        match stream.segmented.enqueue(key, slice) {
            Enqueued::Duplicate(_) => {
                log::debug!("[ingest] APID {apid:#05x}: duplicate segment {seq}");
                self.stats.segments_dropped += 1;
                return Ok(());
            }
            Enqueued::Inserted { evicted } => {
                self.stats.segments_stored += 1;
                for (old, _) in evicted {
                    log::debug!("[ingest] APID {apid:#05x}: segment {old} evicted");
                    self.stats.segments_dropped += 1;
                }
            }
        }

        let Some(run) = segments::find_run(&stream.segmented, key) else {
            return Ok(());
        };
        let parts: Vec<PacketSlice> = run
            .iter()
            .filter_map(|k| stream.segmented.dequeue(*k))
            .collect();
        Self::finalize(&self.registry, &mut self.stats, stream, apid, parts)
    }

    /// Concatenate a run, decode it and append the record.
    fn finalize(
        registry: &DecoderRegistry,
        stats: &mut IngestStats,
        stream: &mut PacketStream,
        apid: u16,
        parts: Vec<PacketSlice>,
    ) -> Result<(), IngestError> {
        if let Some(part) = parts.iter().find(|p| !p.is_complete()) {
            return Err(IngestError::IncompleteSegment {
                apid,
                sequence_count: part.sequence_count(),
                remaining: part.remaining_len(),
            });
        }
        let first = parts.first().map_or(0, PacketSlice::sequence_count);
        let count = parts.len();
        let mut data = Vec::with_capacity(parts.iter().map(|p| p.data().len()).sum());
        for part in parts {
            data.extend_from_slice(part.data());
        }

        let record = registry.decode(apid, first, count, &data)?;
        log::debug!(
            "[ingest] APID {apid:#05x} seq {first}: {} record from {count} segment(s)",
            record.kind
        );
        stats.packets_completed += 1;
        stream.complete.push(record);
        Ok(())
    }
}
