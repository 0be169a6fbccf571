// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Paced CADU transmission over UDP.
//!
//! Sends frames from any capture (or a synthetic stream) to a unicast or
//! multicast target, one frame per datagram.

use crate::error::CaptureError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

/// Frame pacing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum FrameRate {
    /// Fixed rate in frames per second.
    PerSecond(f64),
    /// As fast as the socket accepts.
    #[default]
    Unlimited,
}

impl FrameRate {
    /// Rate from a CLI value; zero or negative means unlimited.
    pub fn from_fps(fps: f64) -> Self {
        if fps <= 0.0 {
            Self::Unlimited
        } else {
            Self::PerSecond(fps)
        }
    }

    /// Gap between consecutive frames.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            Self::Unlimited => None,
            Self::PerSecond(fps) => Some(Duration::from_secs_f64(1.0 / fps)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Destination address.
    pub target: SocketAddr,
    /// Pacing.
    pub rate: FrameRate,
    /// Multicast TTL, used only for multicast targets.
    pub ttl: u32,
}

impl ReplayConfig {
    pub fn new(target: SocketAddr) -> Self {
        Self {
            target,
            rate: FrameRate::Unlimited,
            ttl: 1,
        }
    }

    pub fn rate(mut self, rate: FrameRate) -> Self {
        self.rate = rate;
        self
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplayStats {
    pub frames_sent: u64,
    pub bytes_sent: u64,
    /// Wall time from the first frame to the last.
    pub duration_secs: f64,
}

impl ReplayStats {
    pub fn frames_per_second(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.frames_sent as f64 / self.duration_secs
        } else {
            0.0
        }
    }
}

/// UDP frame sender.
#[derive(Debug)]
pub struct Replayer {
    socket: UdpSocket,
    config: ReplayConfig,
    started: Option<Instant>,
    next_send: Option<Instant>,
    stats: ReplayStats,
}

impl Replayer {
    pub fn new(config: ReplayConfig) -> Result<Self, CaptureError> {
        let domain = Domain::for_address(config.target);
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        if let SocketAddr::V4(target) = config.target {
            if target.ip().is_multicast() {
                socket.set_multicast_ttl_v4(config.ttl)?;
            }
        }
        let bind: SocketAddr = match config.target {
            SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
            SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
        };
        socket.bind(&bind.into())?;

        Ok(Self {
            socket: socket.into(),
            config,
            started: None,
            next_send: None,
            stats: ReplayStats::default(),
        })
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    /// Send one frame, sleeping first if the configured rate requires it.
    pub fn send(&mut self, frame: &[u8]) -> Result<(), CaptureError> {
        if let Some(interval) = self.config.rate.interval() {
            let now = Instant::now();
            let due = self.next_send.unwrap_or(now);
            if due > now {
                std::thread::sleep(due - now);
            }
            // catch up after a stall instead of bursting
            self.next_send = Some(due.max(now) + interval);
        }

        let sent = self.socket.send_to(frame, self.config.target)?;
        let started = *self.started.get_or_insert_with(Instant::now);
        self.stats.frames_sent += 1;
        self.stats.bytes_sent += sent as u64;
        self.stats.duration_secs = started.elapsed().as_secs_f64();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rate() {
        assert_eq!(FrameRate::from_fps(0.0), FrameRate::Unlimited);
        assert_eq!(FrameRate::from_fps(-3.0).interval(), None);
        assert_eq!(
            FrameRate::from_fps(4.0).interval(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_paced_send() {
        let sink = UdpSocket::bind("127.0.0.1:0").unwrap();
        let target = sink.local_addr().unwrap();
        let config = ReplayConfig::new(target).rate(FrameRate::PerSecond(50.0));
        let mut replayer = Replayer::new(config).unwrap();

        let start = Instant::now();
        for _ in 0..3 {
            replayer.send(&[0u8; 16]).unwrap();
        }
        // two full intervals between three frames
        assert!(start.elapsed() >= Duration::from_millis(39));
        assert_eq!(replayer.stats().frames_sent, 3);
        assert_eq!(replayer.stats().bytes_sent, 48);
    }
}
