// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Live CADU reception over UDP.

use crate::error::CaptureError;
use grb::CADU_LEN;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

/// UDP port GRB frames are usually forwarded to.
pub const DEFAULT_PORT: u16 = 50020;

/// Receive timeout, so callers can poll a shutdown flag.
pub const DEFAULT_POLL: Duration = Duration::from_millis(200);

/// Receives one CADU per datagram.
#[derive(Debug)]
pub struct UdpFrameReceiver {
    socket: UdpSocket,
    buf: Vec<u8>,
    received: u64,
    skipped: u64,
}

impl UdpFrameReceiver {
    /// Bind `addr`, joining `group` on `interface` when given.
    pub fn bind(
        addr: SocketAddrV4,
        group: Option<Ipv4Addr>,
        interface: Ipv4Addr,
    ) -> Result<Self, CaptureError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&SocketAddr::V4(addr).into())?;

        if let Some(group) = group {
            socket.join_multicast_v4(&group, &interface)?;
            tracing::info!("Joined multicast group {} on {}", group, interface);
        }

        let socket: UdpSocket = socket.into();
        socket.set_read_timeout(Some(DEFAULT_POLL))?;
        tracing::debug!("Listening on {}", socket.local_addr()?);

        Ok(Self {
            socket,
            buf: vec![0u8; 65536],
            received: 0,
            skipped: 0,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, CaptureError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<(), CaptureError> {
        self.socket.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Wait for the next frame. Returns `Ok(None)` when the receive timeout
    /// expires; datagrams that are not 2048 bytes long are dropped.
    pub fn recv_frame(&mut self) -> Result<Option<Vec<u8>>, CaptureError> {
        loop {
            let (len, from) = match self.socket.recv_from(&mut self.buf) {
                Ok(r) => r,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(None)
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if len != CADU_LEN {
                tracing::debug!("Dropped {} byte datagram from {}", len, from);
                self.skipped += 1;
                continue;
            }
            self.received += 1;
            return Ok(Some(self.buf[..len].to_vec()));
        }
    }

    /// Frames received so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Datagrams dropped for their size.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
