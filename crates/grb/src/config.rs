// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ingestor configuration.
//!
//! Supports both programmatic and file-based (TOML) configuration.
//!
//! ```toml
//! virtual_channel = 5
//! apids = [0x383, 0x410, 0x421]
//! frame_capacity = 64
//! validate_crc = false
//!
//! [frames]
//! check_fecf = false
//! ```

use crate::frame::{FrameValidation, RHCP_VCID};
use crate::payload::{mps_hi, mps_lo, xrs};
use crate::sequence::Rollover;
use crate::store::check_capacity;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Reassembly engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Virtual channel to process; frames on other channels are skipped.
    #[serde(default = "default_virtual_channel")]
    pub virtual_channel: u8,

    /// APIDs to reassemble. Each needs a registered payload decoder.
    #[serde(default = "default_apids")]
    pub apids: Vec<u16>,

    /// Recent link frames kept for continuation lookups.
    #[serde(default = "default_frame_capacity")]
    pub frame_capacity: usize,

    /// Packets waiting on a future frame.
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,

    /// In-flight segments per APID.
    #[serde(default = "default_segment_capacity")]
    pub segment_capacity: usize,

    /// Drop packets whose CRC-32 trailer does not match.
    #[serde(default)]
    pub validate_crc: bool,

    /// Optional link frame checks.
    #[serde(default)]
    pub frames: FrameValidation,
}

fn default_virtual_channel() -> u8 {
    RHCP_VCID
}

fn default_apids() -> Vec<u16> {
    vec![xrs::APID, mps_lo::APID, mps_hi::APID]
}

fn default_frame_capacity() -> usize {
    64
}

fn default_request_capacity() -> usize {
    16
}

fn default_segment_capacity() -> usize {
    64
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            virtual_channel: default_virtual_channel(),
            apids: default_apids(),
            frame_capacity: default_frame_capacity(),
            request_capacity: default_request_capacity(),
            segment_capacity: default_segment_capacity(),
            frames: FrameValidation::default(),
            validate_crc: false,
        }
    }
}

impl IngestConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: IngestConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.virtual_channel > 0x3F {
            return Err(ConfigError::Invalid(format!(
                "virtual channel {} does not fit 6 bits",
                self.virtual_channel
            )));
        }
        if self.apids.is_empty() {
            return Err(ConfigError::Invalid("No APIDs configured".into()));
        }
        if let Some(apid) = self.apids.iter().find(|a| **a > 0x7FF) {
            return Err(ConfigError::Invalid(format!(
                "APID {apid:#x} does not fit 11 bits"
            )));
        }

        let stores = [
            ("frame_capacity", self.frame_capacity, Rollover::FRAME_COUNT),
            ("request_capacity", self.request_capacity, Rollover::FRAME_COUNT),
            ("segment_capacity", self.segment_capacity, Rollover::SEQUENCE_COUNT),
        ];
        for (name, capacity, rollover) in stores {
            check_capacity(rollover, capacity)
                .map_err(|e| ConfigError::Invalid(format!("{name}: {e}")))?;
        }
        Ok(())
    }

    /// Builder: set the virtual channel.
    pub fn virtual_channel(mut self, vcid: u8) -> Self {
        self.virtual_channel = vcid;
        self
    }

    /// Builder: replace the monitored APIDs.
    pub fn apids(mut self, apids: impl IntoIterator<Item = u16>) -> Self {
        self.apids = apids.into_iter().collect();
        self
    }

    /// Builder: set all three store capacities.
    pub fn capacities(mut self, frames: usize, requests: usize, segments: usize) -> Self {
        self.frame_capacity = frames;
        self.request_capacity = requests;
        self.segment_capacity = segments;
        self
    }

    /// Builder: set link frame checks.
    pub fn frame_validation(mut self, validation: FrameValidation) -> Self {
        self.frames = validation;
        self
    }

    /// Builder: enable packet CRC enforcement.
    pub fn validate_crc(mut self, enable: bool) -> Self {
        self.validate_crc = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = IngestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.virtual_channel, 5);
        assert_eq!(config.apids, vec![0x383, 0x410, 0x421]);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
            apids = [0x383]
            segment_capacity = 8
            validate_crc = true

            [frames]
            count_usage_flag = true
        "#;
        let config = IngestConfig::from_toml(toml).unwrap();
        assert_eq!(config.apids, vec![0x383]);
        assert_eq!(config.segment_capacity, 8);
        assert_eq!(config.frame_capacity, 64);
        assert!(config.validate_crc);
        assert_eq!(config.frames.count_usage_flag, Some(true));
        assert!(!config.frames.check_fecf);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = IngestConfig::default().validate_crc(true).capacities(8, 4, 8);
        let text = config.to_toml().unwrap();
        assert_eq!(IngestConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_segment_capacity_limit() {
        let config = IngestConfig::default().capacities(64, 16, 4097);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("segment_capacity"));
    }

    #[test]
    fn test_rejects_wide_values() {
        assert!(IngestConfig::default().virtual_channel(64).validate().is_err());
        assert!(IngestConfig::default().apids([0x800]).validate().is_err());
        assert!(IngestConfig::default().apids([]).validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grb.toml");
        std::fs::write(&path, "virtual_channel = 6\n").unwrap();
        let config = IngestConfig::from_file(&path).unwrap();
        assert_eq!(config.virtual_channel, 6);
    }
}
