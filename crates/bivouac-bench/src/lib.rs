//! Shared workloads for the scratch allocator benchmarks.
//!
//! Each workload touches the full requested span so the benches measure
//! acquisition plus a realistic single pass over the region, not just
//! the strategy branch.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::mem::MaybeUninit;

/// Request sizes covering every reservoir rung plus two heap sizes.
pub const LADDER_AND_BEYOND: [usize; 6] = [8, 64, 256, 1024, 4096, 65536];

/// Write an index-derived pattern across the span and fold it to a sum.
///
/// The fold forces the writes to be observable, keeping the optimizer
/// from discarding the buffer traffic.
pub fn fill_and_sum(bytes: &mut [MaybeUninit<u8>]) -> u64 {
    let mut sum = 0u64;
    for (i, slot) in bytes.iter_mut().enumerate() {
        sum += u64::from(*slot.write(i as u8));
    }
    sum
}

/// The same workload against a plain `Vec`, as the heap baseline.
pub fn fill_and_sum_vec(len: usize) -> u64 {
    let mut buf = vec![0u8; len];
    let mut sum = 0u64;
    for (i, slot) in buf.iter_mut().enumerate() {
        *slot = i as u8;
        sum += u64::from(*slot);
    }
    sum
}
