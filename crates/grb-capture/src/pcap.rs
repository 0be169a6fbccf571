// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Classic libpcap reader extracting CADUs from UDP datagrams.
//!
//! Both byte orders and both timestamp resolutions are accepted. Each record
//! is unwrapped down to its UDP payload; payloads of exactly 2048 bytes are
//! yielded, anything else (other protocols, fragments, short datagrams) is
//! counted as skipped.
//!
//! Supported link types: Ethernet (1, with one optional 802.1Q tag), raw
//! IPv4 (101, 228) and Linux cooked capture (113).

use crate::error::CaptureError;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use grb::CADU_LEN;
use std::io::{ErrorKind, Read};

pub const LINKTYPE_ETHERNET: u32 = 1;
pub const LINKTYPE_RAW: u32 = 101;
pub const LINKTYPE_IPV4: u32 = 228;
pub const LINKTYPE_LINUX_SLL: u32 = 113;

const MAGIC_MICROS: u32 = 0xa1b2_c3d4;
const MAGIC_NANOS: u32 = 0xa1b2_3c4d;
const GLOBAL_HEADER_LEN: usize = 24;
const RECORD_HEADER_LEN: usize = 16;
const MAX_RECORD_LEN: u32 = 256 * 1024;

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_VLAN: u16 = 0x8100;
const IPPROTO_UDP: u8 = 17;
const UDP_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    Little,
    Big,
}

impl Order {
    fn u32(self, b: &[u8]) -> u32 {
        match self {
            Order::Little => LittleEndian::read_u32(b),
            Order::Big => BigEndian::read_u32(b),
        }
    }
}

#[derive(Debug)]
pub struct PcapReader<R> {
    reader: R,
    order: Order,
    nanos: bool,
    link_type: u32,
    records: u64,
    skipped: u64,
    done: bool,
}

impl<R: Read> PcapReader<R> {
    /// Read and check the global header.
    pub fn new(mut reader: R) -> Result<Self, CaptureError> {
        let mut header = [0u8; GLOBAL_HEADER_LEN];
        if read_full(&mut reader, &mut header)? < GLOBAL_HEADER_LEN {
            return Err(CaptureError::PcapTruncated("global header"));
        }

        let magic = LittleEndian::read_u32(&header[0..4]);
        let (order, nanos) = match magic {
            MAGIC_MICROS => (Order::Little, false),
            MAGIC_NANOS => (Order::Little, true),
            m if m.swap_bytes() == MAGIC_MICROS => (Order::Big, false),
            m if m.swap_bytes() == MAGIC_NANOS => (Order::Big, true),
            other => return Err(CaptureError::PcapMagic(other)),
        };

        let link_type = order.u32(&header[20..24]) & 0x0FFF_FFFF;
        if !matches!(
            link_type,
            LINKTYPE_ETHERNET | LINKTYPE_RAW | LINKTYPE_IPV4 | LINKTYPE_LINUX_SLL
        ) {
            return Err(CaptureError::UnsupportedLinkType(link_type));
        }

        tracing::debug!(
            "pcap: {:?} endian, {} timestamps, link type {}",
            order,
            if nanos { "ns" } else { "us" },
            link_type
        );
        Ok(Self {
            reader,
            order,
            nanos,
            link_type,
            records: 0,
            skipped: 0,
            done: false,
        })
    }

    pub fn link_type(&self) -> u32 {
        self.link_type
    }

    /// Records read so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Records that did not carry a CADU.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Next record as (timestamp ns, data), or `None` at end of file.
    fn read_record(&mut self) -> Result<Option<(u64, Vec<u8>)>, CaptureError> {
        let mut header = [0u8; RECORD_HEADER_LEN];
        match read_full(&mut self.reader, &mut header)? {
            0 => return Ok(None),
            RECORD_HEADER_LEN => {}
            _ => return Err(CaptureError::PcapTruncated("record header")),
        }

        let secs = u64::from(self.order.u32(&header[0..4]));
        let frac = u64::from(self.order.u32(&header[4..8]));
        let incl_len = self.order.u32(&header[8..12]);
        if incl_len > MAX_RECORD_LEN {
            return Err(CaptureError::PcapRecordTooLarge(incl_len));
        }

        let mut data = vec![0u8; incl_len as usize];
        if read_full(&mut self.reader, &mut data)? < data.len() {
            return Err(CaptureError::PcapTruncated("record data"));
        }
        self.records += 1;

        let nanos = if self.nanos { frac } else { frac * 1_000 };
        Ok(Some((secs * 1_000_000_000 + nanos, data)))
    }
}

impl<R: Read> Iterator for PcapReader<R> {
    type Item = Result<Vec<u8>, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let (_, data) = match self.read_record() {
                Ok(Some(record)) => record,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            match udp_payload(self.link_type, &data) {
                Some(payload) if payload.len() == CADU_LEN => return Some(Ok(payload.to_vec())),
                Some(payload) => {
                    tracing::trace!("pcap record {}: {} byte datagram", self.records, payload.len());
                    self.skipped += 1;
                }
                None => {
                    tracing::trace!("pcap record {}: not an IPv4/UDP datagram", self.records);
                    self.skipped += 1;
                }
            }
        }
        None
    }
}

/// Fill `buf` as far as the reader allows. Returns the bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// UDP payload of a captured link-layer frame.
pub fn udp_payload(link_type: u32, data: &[u8]) -> Option<&[u8]> {
    let ip = match link_type {
        LINKTYPE_ETHERNET => {
            let mut ethertype = BigEndian::read_u16(data.get(12..14)?);
            let mut at = 14;
            if ethertype == ETHERTYPE_VLAN {
                ethertype = BigEndian::read_u16(data.get(16..18)?);
                at = 18;
            }
            if ethertype != ETHERTYPE_IPV4 {
                return None;
            }
            data.get(at..)?
        }
        LINKTYPE_LINUX_SLL => {
            if BigEndian::read_u16(data.get(14..16)?) != ETHERTYPE_IPV4 {
                return None;
            }
            data.get(16..)?
        }
        LINKTYPE_RAW | LINKTYPE_IPV4 => data,
        _ => return None,
    };
    ipv4_udp_payload(ip)
}

fn ipv4_udp_payload(ip: &[u8]) -> Option<&[u8]> {
    let first = *ip.first()?;
    if first >> 4 != 4 {
        return None;
    }
    let header_len = usize::from(first & 0x0F) * 4;
    let total_len = usize::from(BigEndian::read_u16(ip.get(2..4)?));
    let fragment = BigEndian::read_u16(ip.get(6..8)?);
    // more-fragments set or nonzero offset
    if fragment & 0x3FFF != 0 {
        return None;
    }
    if *ip.get(9)? != IPPROTO_UDP || header_len < 20 {
        return None;
    }

    let udp = ip.get(header_len..total_len.min(ip.len()))?;
    let udp_len = usize::from(BigEndian::read_u16(udp.get(4..6)?));
    if udp_len < UDP_HEADER_LEN {
        return None;
    }
    udp.get(UDP_HEADER_LEN..udp_len.min(udp.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ipv4_udp(payload: &[u8], fragment: u16) -> Vec<u8> {
        let udp_len = (UDP_HEADER_LEN + payload.len()) as u16;
        let total = 20 + udp_len;
        let mut ip = vec![0x45, 0];
        ip.extend_from_slice(&total.to_be_bytes());
        ip.extend_from_slice(&[0, 1]);
        ip.extend_from_slice(&fragment.to_be_bytes());
        ip.extend_from_slice(&[64, IPPROTO_UDP, 0, 0]);
        ip.extend_from_slice(&[10, 0, 0, 1, 239, 1, 2, 3]);
        ip.extend_from_slice(&40000u16.to_be_bytes());
        ip.extend_from_slice(&50020u16.to_be_bytes());
        ip.extend_from_slice(&udp_len.to_be_bytes());
        ip.extend_from_slice(&[0, 0]);
        ip.extend_from_slice(payload);
        ip
    }

    fn ethernet(ip: &[u8]) -> Vec<u8> {
        let mut frame = vec![0xff; 12];
        frame.extend_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
        frame.extend_from_slice(ip);
        frame
    }

    #[test]
    fn test_udp_payload_ethernet() {
        let frame = ethernet(&ipv4_udp(b"hello", 0));
        assert_eq!(udp_payload(LINKTYPE_ETHERNET, &frame), Some(&b"hello"[..]));
    }

    #[test]
    fn test_udp_payload_vlan_and_padding() {
        let mut frame = vec![0xff; 12];
        frame.extend_from_slice(&ETHERTYPE_VLAN.to_be_bytes());
        frame.extend_from_slice(&[0, 7]);
        frame.extend_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
        frame.extend_from_slice(&ipv4_udp(b"abc", 0));
        // Ethernet minimum-size padding after the datagram
        frame.extend_from_slice(&[0; 20]);
        assert_eq!(udp_payload(LINKTYPE_ETHERNET, &frame), Some(&b"abc"[..]));
    }

    #[test]
    fn test_fragments_and_non_udp_skipped() {
        assert_eq!(udp_payload(LINKTYPE_RAW, &ipv4_udp(b"x", 0x2000)), None);
        assert_eq!(udp_payload(LINKTYPE_RAW, &ipv4_udp(b"x", 0x0010)), None);

        let mut tcp = ipv4_udp(b"x", 0);
        tcp[9] = 6;
        assert_eq!(udp_payload(LINKTYPE_RAW, &tcp), None);
        assert_eq!(udp_payload(LINKTYPE_ETHERNET, &[0; 10]), None);
    }

    #[test]
    fn test_bad_magic() {
        let err = PcapReader::new(Cursor::new(vec![0u8; 24])).unwrap_err();
        assert!(matches!(err, CaptureError::PcapMagic(0)));

        let err = PcapReader::new(Cursor::new(vec![0u8; 5])).unwrap_err();
        assert!(matches!(err, CaptureError::PcapTruncated("global header")));
    }

    #[test]
    fn test_big_endian_nanos_header() {
        let mut file = Vec::new();
        file.extend_from_slice(&MAGIC_NANOS.to_be_bytes());
        file.extend_from_slice(&[0, 2, 0, 4]);
        file.extend_from_slice(&[0; 8]);
        file.extend_from_slice(&65535u32.to_be_bytes());
        file.extend_from_slice(&LINKTYPE_RAW.to_be_bytes());

        let payload = ipv4_udp(&[0xAB; CADU_LEN], 0);
        file.extend_from_slice(&7u32.to_be_bytes());
        file.extend_from_slice(&500u32.to_be_bytes());
        file.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        file.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        file.extend_from_slice(&payload);

        let mut reader = PcapReader::new(Cursor::new(file)).unwrap();
        assert_eq!(reader.order, Order::Big);
        assert!(reader.nanos);
        assert_eq!(reader.read_record().unwrap().unwrap().0, 7_000_000_500);
    }

    #[test]
    fn test_truncated_record() {
        let mut file = Vec::new();
        file.extend_from_slice(&MAGIC_MICROS.to_le_bytes());
        file.extend_from_slice(&[2, 0, 4, 0]);
        file.extend_from_slice(&[0; 8]);
        file.extend_from_slice(&65535u32.to_le_bytes());
        file.extend_from_slice(&LINKTYPE_ETHERNET.to_le_bytes());
        file.extend_from_slice(&[0; 8]);
        file.extend_from_slice(&100u32.to_le_bytes());
        file.extend_from_slice(&100u32.to_le_bytes());
        file.extend_from_slice(&[0; 30]);

        let items: Vec<_> = PcapReader::new(Cursor::new(file)).unwrap().collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(CaptureError::PcapTruncated("record data"))
        ));
    }
}
