// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CADU capture files.
//!
//! Three on-disk formats are read, all yielding one 2048-byte CADU per item:
//!
//! | Format | Extensions | Layout |
//! |--------|------------|--------|
//! | Hex CSV | `.csv`, `.hex` | one frame per line, comma separated hex bytes |
//! | Raw | `.bin`, `.cadu`, `.raw` | back-to-back frames |
//! | Pcap | `.pcap`, `.cap` | UDP datagrams carrying one frame each |

use crate::error::CaptureError;
use crate::pcap::PcapReader;
use grb::CADU_LEN;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    HexCsv,
    Raw,
    Pcap,
}

impl CaptureFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "hex" => Some(Self::HexCsv),
            "bin" | "cadu" | "raw" => Some(Self::Raw),
            "pcap" | "cap" => Some(Self::Pcap),
            _ => None,
        }
    }
}

impl FromStr for CaptureFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" | "hex" | "hexcsv" => Ok(Self::HexCsv),
            "raw" | "bin" | "cadu" => Ok(Self::Raw),
            "pcap" => Ok(Self::Pcap),
            other => Err(format!("unknown capture format '{}' (csv, raw, pcap)", other)),
        }
    }
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HexCsv => "csv",
            Self::Raw => "raw",
            Self::Pcap => "pcap",
        })
    }
}

/// Hex CSV reader: each non-blank line holds one frame as hex bytes,
/// comma separated (`1a,cf,fc,1d,...`) or as one unbroken hex string.
#[derive(Debug)]
pub struct HexCsvReader<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> HexCsvReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    fn parse_line(&self, line: &str) -> Result<Vec<u8>, CaptureError> {
        let mut frame = Vec::with_capacity(CADU_LEN);
        for token in line.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let bytes = hex::decode(token).map_err(|source| CaptureError::InvalidHex {
                line: self.line,
                source,
            })?;
            frame.extend_from_slice(&bytes);
        }
        if frame.len() != CADU_LEN {
            return Err(CaptureError::FrameLength {
                index: self.line,
                actual: frame.len(),
            });
        }
        Ok(frame)
    }
}

impl<R: BufRead> Iterator for HexCsvReader<R> {
    type Item = Result<Vec<u8>, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let line = self.buf.trim();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(self.parse_line(line));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Raw reader: a plain concatenation of 2048-byte frames.
#[derive(Debug)]
pub struct RawReader<R> {
    reader: R,
    index: usize,
    done: bool,
}

impl<R: Read> RawReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            index: 0,
            done: false,
        }
    }
}

impl<R: Read> Iterator for RawReader<R> {
    type Item = Result<Vec<u8>, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut frame = vec![0u8; CADU_LEN];
        let mut filled = 0;
        while filled < CADU_LEN {
            match self.reader.read(&mut frame[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }

        let index = self.index;
        self.index += 1;
        match filled {
            CADU_LEN => Some(Ok(frame)),
            0 => {
                self.done = true;
                None
            }
            partial => {
                self.done = true;
                Some(Err(CaptureError::FrameLength {
                    index,
                    actual: partial,
                }))
            }
        }
    }
}

/// Any capture file, opened by format.
#[derive(Debug)]
pub enum CaptureReader {
    HexCsv(HexCsvReader<BufReader<File>>),
    Raw(RawReader<BufReader<File>>),
    Pcap(PcapReader<BufReader<File>>),
}

impl CaptureReader {
    /// Open `path`, inferring the format from its extension unless given.
    pub fn open<P: AsRef<Path>>(
        path: P,
        format: Option<CaptureFormat>,
    ) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let format = format
            .or_else(|| CaptureFormat::from_path(path))
            .ok_or_else(|| CaptureError::UnknownFormat(path.to_path_buf()))?;
        let reader = BufReader::new(File::open(path)?);

        tracing::debug!("Opening {} as {}", path.display(), format);
        Ok(match format {
            CaptureFormat::HexCsv => Self::HexCsv(HexCsvReader::new(reader)),
            CaptureFormat::Raw => Self::Raw(RawReader::new(reader)),
            CaptureFormat::Pcap => Self::Pcap(PcapReader::new(reader)?),
        })
    }

    pub fn format(&self) -> CaptureFormat {
        match self {
            Self::HexCsv(_) => CaptureFormat::HexCsv,
            Self::Raw(_) => CaptureFormat::Raw,
            Self::Pcap(_) => CaptureFormat::Pcap,
        }
    }
}

impl Iterator for CaptureReader {
    type Item = Result<Vec<u8>, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::HexCsv(r) => r.next(),
            Self::Raw(r) => r.next(),
            Self::Pcap(r) => r.next(),
        }
    }
}
