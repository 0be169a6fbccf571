// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded store keyed by a rolling counter.
//!
//! Holds out-of-order link frames, pending continuations and packet
//! segments until whatever they are waiting on shows up.
//!
//! ```text
//!   index:  0        1        2            len-1
//!         [newest] [ ... ] [ ... ] ... [oldest]   <- evicted first when full
//! ```
//!
//! Entries stay sorted newest-first under [`Rollover::is_newer`]. That order
//! is only well defined while every stored key sits less than half the
//! counter space behind the newest one, so [`SequenceStore::enqueue`]
//! evicts entries that fall out of that window as stale. Lookups binary
//! search the order.

use crate::sequence::Rollover;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("capacity {capacity} exceeds a quarter of modulus {modulus}")]
    CapacityTooLarge { capacity: usize, modulus: u32 },

    #[error("capacity must be at least 1")]
    ZeroCapacity,
}

/// Outcome of [`SequenceStore::enqueue`].
#[derive(Debug, PartialEq)]
pub enum Enqueued<T> {
    /// Stored. Carries whatever was evicted to make room or fell out of
    /// the ordering window, oldest last.
    Inserted { evicted: Vec<(u32, T)> },
    /// Key already present; the store is unchanged and the item is handed
    /// back.
    Duplicate(T),
}

impl<T> Enqueued<T> {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Enqueued::Inserted { .. })
    }
}

/// Fixed-capacity, newest-first store keyed by circular sequence number.
#[derive(Debug, Clone)]
pub struct SequenceStore<T> {
    rollover: Rollover,
    capacity: usize,
    entries: Vec<(u32, T)>,
}

impl<T> SequenceStore<T> {
    /// Create an empty store. `capacity` must be in `1..=modulus/4`.
    pub fn new(rollover: Rollover, capacity: usize) -> Result<Self, StoreError> {
        check_capacity(rollover, capacity)?;
        Ok(Self {
            rollover,
            capacity,
            entries: Vec::with_capacity(capacity),
        })
    }

    /// Insert `item` under `seq`.
    ///
    /// Duplicates are rejected without touching the store. A key that cannot
    /// be ordered behind the current newest entry becomes the new newest,
    /// and entries half the counter space or more behind it are evicted.
    /// If the store is still full the oldest entry goes next. The item is
    /// then placed ahead of the first entry it is newer than.
    pub fn enqueue(&mut self, seq: u32, item: T) -> Enqueued<T> {
        debug_assert!(seq < self.rollover.modulus());

        if self.entries.iter().any(|(s, _)| *s == seq) {
            return Enqueued::Duplicate(item);
        }

        let rollover = self.rollover;
        let mut evicted = Vec::new();
        let becomes_newest = self
            .entries
            .first()
            .map_or(true, |(newest, _)| !rollover.is_newer(*newest, seq));
        if becomes_newest {
            while let Some((oldest, _)) = self.entries.last() {
                if rollover.is_newer(seq, *oldest) {
                    break;
                }
                evicted.extend(self.entries.pop());
            }
        }
        if self.entries.len() >= self.capacity {
            evicted.extend(self.entries.pop());
        }

        let at = self
            .entries
            .iter()
            .position(|(s, _)| rollover.is_newer(seq, *s))
            .unwrap_or(self.entries.len());
        self.entries.insert(at, (seq, item));

        Enqueued::Inserted { evicted }
    }

    pub fn get(&self, seq: u32) -> Option<&T> {
        self.index_of(seq).map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, seq: u32) -> Option<&mut T> {
        self.index_of(seq).map(|i| &mut self.entries[i].1)
    }

    pub fn contains(&self, seq: u32) -> bool {
        self.index_of(seq).is_some()
    }

    /// Remove and return the entry under `seq`.
    pub fn dequeue(&mut self, seq: u32) -> Option<T> {
        self.index_of(seq).map(|i| self.entries.remove(i).1)
    }

    /// Remove and return the oldest entry.
    pub fn pop_oldest(&mut self) -> Option<(u32, T)> {
        self.entries.pop()
    }

    /// Keys, newest first.
    pub fn sequences(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|(s, _)| *s)
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.entries.iter().map(|(s, t)| (*s, t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn rollover(&self) -> Rollover {
        self.rollover
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn index_of(&self, seq: u32) -> Option<usize> {
        let (mut lo, mut hi) = (0, self.entries.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let at = self.entries[mid].0;
            if at == seq {
                return Some(mid);
            }
            if self.rollover.is_newer(at, seq) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        None
    }
}

pub(crate) fn check_capacity(rollover: Rollover, capacity: usize) -> Result<(), StoreError> {
    if capacity == 0 {
        return Err(StoreError::ZeroCapacity);
    }
    if capacity > (rollover.modulus() / 4) as usize {
        return Err(StoreError::CapacityTooLarge {
            capacity,
            modulus: rollover.modulus(),
        });
    }
    Ok(())
}
