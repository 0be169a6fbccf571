// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Circular counter arithmetic.
//!
//! Frame counts roll over at 2^24 and packet sequence counts at 2^14. Order
//! between two counters is decided by their forward distance: `a` is newer
//! than `b` when `(a - b) mod M` lies strictly inside `(0, M/2)`.

/// A counter space of size `modulus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rollover {
    modulus: u32,
}

impl Rollover {
    /// Virtual channel frame counter (24 bits).
    pub const FRAME_COUNT: Rollover = Rollover::new(1 << 24);
    /// Space packet sequence counter (14 bits).
    pub const SEQUENCE_COUNT: Rollover = Rollover::new(1 << 14);

    /// # Panics
    ///
    /// Panics if `modulus < 2`.
    pub const fn new(modulus: u32) -> Self {
        assert!(modulus >= 2, "rollover modulus must be at least 2");
        Self { modulus }
    }

    pub const fn modulus(self) -> u32 {
        self.modulus
    }

    /// Forward distance from `from` to `to`, in `[0, M)`.
    #[inline]
    pub fn distance(self, from: u32, to: u32) -> u32 {
        let m = u64::from(self.modulus);
        ((u64::from(to) + m - u64::from(from) % m) % m) as u32
    }

    /// True if `a` lies strictly ahead of `b` within half the counter space.
    #[inline]
    pub fn is_newer(self, a: u32, b: u32) -> bool {
        let d = self.distance(b, a);
        d > 0 && d < self.modulus / 2
    }

    #[inline]
    pub fn next(self, seq: u32) -> u32 {
        self.add(seq, 1)
    }

    #[inline]
    pub fn prev(self, seq: u32) -> u32 {
        self.add(seq, self.modulus - 1)
    }

    #[inline]
    pub fn add(self, seq: u32, n: u32) -> u32 {
        ((u64::from(seq) + u64::from(n)) % u64::from(self.modulus)) as u32
    }
}
