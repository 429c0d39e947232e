//! Fixed-size stack reservoir shapes and the rung-selection ladder.
//!
//! A [`Reservoir`] is a block of uninitialized 8-byte words that lives in
//! the caller's frame and serves as the storage candidate for the stack
//! path. The ladder instantiates four rungs — 8 B, 64 B, 256 B and
//! 1024 B, each a power-of-two multiple of the previous — and
//! [`StackClass::for_request`] picks the smallest rung that satisfies a
//! request, or reports that none does.

use std::mem::MaybeUninit;

/// Size in bytes of one reservoir word.
pub const WORD_BYTES: usize = std::mem::size_of::<u64>();

/// Natural alignment of every reservoir rung.
///
/// All rungs are arrays of 8-byte words, so requests needing stricter
/// alignment than this cannot be served from the stack.
pub const RESERVOIR_ALIGN: usize = std::mem::align_of::<u64>();

/// Largest request (in bytes) the stack path can serve.
pub const MAX_STACK_BYTES: usize = 1024;

/// A fixed-size stack storage candidate of `WORDS` uninitialized 8-byte
/// words.
///
/// The allocator never reads or writes the words itself; only the
/// block's size and natural alignment matter. A reservoir is always a
/// local in the frame that runs the caller's closure, so its storage
/// outlives the closure by construction.
pub struct Reservoir<const WORDS: usize> {
    words: [MaybeUninit<u64>; WORDS],
}

impl<const WORDS: usize> Reservoir<WORDS> {
    /// Capacity of this rung in bytes.
    pub const BYTES: usize = WORDS * WORD_BYTES;

    /// Create a reservoir. The contents are uninitialized.
    pub fn new() -> Self {
        Self {
            words: [MaybeUninit::uninit(); WORDS],
        }
    }

    /// Base pointer of the reservoir's storage, aligned to
    /// [`RESERVOIR_ALIGN`].
    pub(crate) fn as_mut_bytes_ptr(&mut self) -> *mut MaybeUninit<u8> {
        self.words.as_mut_ptr().cast()
    }
}

impl<const WORDS: usize> Default for Reservoir<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

/// The four reservoir rungs available to the stack path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackClass {
    /// 8-byte rung (1 word).
    B8,
    /// 64-byte rung (8 words).
    B64,
    /// 256-byte rung (32 words).
    B256,
    /// 1024-byte rung (128 words).
    B1024,
}

impl StackClass {
    /// Pick the smallest rung that can hold `byte_count` bytes at
    /// `align`, or `None` if the request must go to the heap.
    ///
    /// `None` is returned when `byte_count` exceeds [`MAX_STACK_BYTES`],
    /// when `align` exceeds [`RESERVOIR_ALIGN`], or when `byte_count` is
    /// zero (zero-length requests are rejected upstream and have no
    /// rung).
    pub fn for_request(byte_count: usize, align: usize) -> Option<Self> {
        if align > RESERVOIR_ALIGN {
            return None;
        }
        match byte_count {
            1..=8 => Some(Self::B8),
            9..=64 => Some(Self::B64),
            65..=256 => Some(Self::B256),
            257..=1024 => Some(Self::B1024),
            _ => None,
        }
    }

    /// Capacity of this rung in bytes.
    pub fn bytes(self) -> usize {
        match self {
            Self::B8 => 8,
            Self::B64 => 64,
            Self::B256 => 256,
            Self::B1024 => 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rung_sizes_match_shapes() {
        assert_eq!(Reservoir::<1>::BYTES, StackClass::B8.bytes());
        assert_eq!(Reservoir::<8>::BYTES, StackClass::B64.bytes());
        assert_eq!(Reservoir::<32>::BYTES, StackClass::B256.bytes());
        assert_eq!(Reservoir::<128>::BYTES, StackClass::B1024.bytes());
    }

    #[test]
    fn exact_rung_boundaries() {
        assert_eq!(StackClass::for_request(1, 1), Some(StackClass::B8));
        assert_eq!(StackClass::for_request(8, 8), Some(StackClass::B8));
        assert_eq!(StackClass::for_request(9, 1), Some(StackClass::B64));
        assert_eq!(StackClass::for_request(64, 8), Some(StackClass::B64));
        assert_eq!(StackClass::for_request(65, 1), Some(StackClass::B256));
        assert_eq!(StackClass::for_request(256, 8), Some(StackClass::B256));
        assert_eq!(StackClass::for_request(257, 1), Some(StackClass::B1024));
        assert_eq!(StackClass::for_request(1024, 8), Some(StackClass::B1024));
    }

    #[test]
    fn oversized_requests_have_no_rung() {
        assert_eq!(StackClass::for_request(1025, 1), None);
        assert_eq!(StackClass::for_request(1 << 20, 8), None);
    }

    #[test]
    fn overaligned_requests_have_no_rung() {
        assert_eq!(StackClass::for_request(8, 16), None);
        assert_eq!(StackClass::for_request(1024, 64), None);
    }

    #[test]
    fn zero_length_has_no_rung() {
        assert_eq!(StackClass::for_request(0, 1), None);
    }

    proptest! {
        #[test]
        fn selected_rung_is_smallest_sufficient(byte_count in 1usize..=1024, align_pow in 0u32..=3) {
            let align = 1usize << align_pow;
            let rung = StackClass::for_request(byte_count, align).unwrap();
            prop_assert!(rung.bytes() >= byte_count);
            // No smaller rung fits.
            for smaller in [StackClass::B8, StackClass::B64, StackClass::B256] {
                if smaller.bytes() < rung.bytes() {
                    prop_assert!(smaller.bytes() < byte_count);
                }
            }
        }
    }
}
