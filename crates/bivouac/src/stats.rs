//! Per-thread scratch acquisition counters.
//!
//! Scratch calls are confined to the calling thread, so the counters are
//! thread-local: a thread observes exactly its own acquisitions, and
//! parallel test threads stay independent. Reading the counters before
//! and after a call is how heap fallback (and its guaranteed release) is
//! observed from the outside.

use std::cell::Cell;

/// Snapshot of one thread's scratch allocation counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScratchStats {
    /// Regions served from a stack reservoir.
    pub stack_acquires: u64,
    /// Regions served from a heap block.
    pub heap_acquires: u64,
    /// Heap blocks released.
    pub heap_releases: u64,
}

impl ScratchStats {
    /// Heap blocks acquired but not yet released on this thread.
    ///
    /// Zero whenever no scratch call is in flight: every heap block is
    /// released before its `with_scratch_*` call returns or unwinds.
    pub fn heap_outstanding(&self) -> u64 {
        self.heap_acquires - self.heap_releases
    }
}

thread_local! {
    static STATS: Cell<ScratchStats> = const {
        Cell::new(ScratchStats {
            stack_acquires: 0,
            heap_acquires: 0,
            heap_releases: 0,
        })
    };
}

/// Current counters for the calling thread.
pub fn snapshot() -> ScratchStats {
    STATS.with(Cell::get)
}

pub(crate) fn record_stack_acquire() {
    bump(|s| s.stack_acquires += 1);
}

pub(crate) fn record_heap_acquire() {
    bump(|s| s.heap_acquires += 1);
}

pub(crate) fn record_heap_release() {
    bump(|s| s.heap_releases += 1);
}

fn bump(f: impl FnOnce(&mut ScratchStats)) {
    STATS.with(|cell| {
        let mut s = cell.get();
        f(&mut s);
        cell.set(s);
    });
}
