// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Contiguous segment runs.
//!
//! A segmented packet is a run `First, Continuation*, Last` with
//! consecutive sequence counts (mod 2^14). Runs are searched outward from
//! the segment that just arrived; a single missing count ends the search.

use crate::packet::{PacketSlice, SequenceFlags};
use crate::store::SequenceStore;

/// Sequence counts of the complete run through `seq`, oldest first, or
/// `None` while any member is still missing.
pub(crate) fn find_run(store: &SequenceStore<PacketSlice>, seq: u32) -> Option<Vec<u32>> {
    let flags = store.get(seq)?.sequence_flags();
    match flags {
        SequenceFlags::Unsegmented => Some(vec![seq]),
        SequenceFlags::First => {
            let mut run = vec![seq];
            run.extend(walk(store, seq, Direction::Forward)?);
            Some(run)
        }
        SequenceFlags::Last => {
            let mut run = walk(store, seq, Direction::Backward)?;
            run.reverse();
            run.push(seq);
            Some(run)
        }
        SequenceFlags::Continuation => {
            let mut run = walk(store, seq, Direction::Backward)?;
            let tail = walk(store, seq, Direction::Forward)?;
            run.reverse();
            run.push(seq);
            run.extend(tail);
            Some(run)
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    /// Towards the `Last` segment.
    Forward,
    /// Towards the `First` segment.
    Backward,
}

/// Step away from `seq` collecting continuations until the terminating
/// segment for `dir`. Returned in walk order, terminator included.
fn walk(store: &SequenceStore<PacketSlice>, seq: u32, dir: Direction) -> Option<Vec<u32>> {
    let rollover = store.rollover();
    let terminator = match dir {
        Direction::Forward => SequenceFlags::Last,
        Direction::Backward => SequenceFlags::First,
    };
    let step = |s| match dir {
        Direction::Forward => rollover.next(s),
        Direction::Backward => rollover.prev(s),
    };

    let mut found = Vec::new();
    let mut at = seq;
    // a run can never hold more segments than the store
    for _ in 0..store.len() {
        at = step(at);
        let flags = store.get(at)?.sequence_flags();
        found.push(at);
        if flags == terminator {
            return Some(found);
        }
        if flags != SequenceFlags::Continuation {
            return None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::SpacePacketBuilder;
    use crate::sequence::Rollover;

    fn store_with(segments: &[(u16, SequenceFlags)]) -> SequenceStore<PacketSlice> {
        let mut store = SequenceStore::new(Rollover::SEQUENCE_COUNT, 16).unwrap();
        for &(seq, flags) in segments {
            let bytes = SpacePacketBuilder::new(0x383)
                .sequence_flags(flags)
                .sequence_count(seq)
                .build(&[seq as u8])
                .unwrap();
            let slice = PacketSlice::from_zone(&bytes).unwrap();
            store.enqueue(u32::from(seq), slice);
        }
        store
    }

    use SequenceFlags::{Continuation as C, First as F, Last as L};

    #[test]
    fn test_run_from_each_position() {
        let store = store_with(&[(100, F), (101, C), (102, L)]);
        for seq in [100, 101, 102] {
            assert_eq!(find_run(&store, seq), Some(vec![100, 101, 102]));
        }
    }

    #[test]
    fn test_gap_blocks_run() {
        let store = store_with(&[(100, F), (102, L)]);
        assert_eq!(find_run(&store, 100), None);
        assert_eq!(find_run(&store, 102), None);
    }

    #[test]
    fn test_run_across_wrap() {
        let store = store_with(&[(16383, F), (0, C), (1, L)]);
        assert_eq!(find_run(&store, 0), Some(vec![16383, 0, 1]));
    }

    #[test]
    fn test_foreign_first_breaks_run() {
        // a second First where a Continuation belongs
        let store = store_with(&[(10, F), (11, F), (12, L)]);
        assert_eq!(find_run(&store, 10), None);
        assert_eq!(find_run(&store, 12), Some(vec![11, 12]));
    }

    #[test]
    fn test_first_then_last() {
        let store = store_with(&[(7, F), (8, L)]);
        assert_eq!(find_run(&store, 8), Some(vec![7, 8]));
    }
}
