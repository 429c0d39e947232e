//! Raw scoped scratch allocation: stack reservoir or heap fallback.
//!
//! This is the crate's only module containing `unsafe` code. Each unsafe
//! block carries a mandatory `// SAFETY:` comment; the casts here are the
//! whole of the crate's safety surface, and the callers in [`crate::typed`]
//! stay `#![deny(unsafe_code)]` clean by going through them.

#![allow(unsafe_code)]

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::mem::MaybeUninit;
use std::ptr::NonNull;
use std::slice;

use crate::reservoir::{Reservoir, StackClass};
use crate::stats;

/// Run `op` on a scratch region of exactly `byte_count` writable,
/// uninitialized bytes whose base address is a multiple of `align`.
///
/// Requests of at most 1024 bytes needing alignment of at most 8 are
/// served from a fixed-size reservoir in this call's frame; larger or
/// stricter requests fall back to a heap block that is released
/// immediately after `op` finishes, on every exit path. If `op` panics,
/// the panic resumes at the caller only after the storage has been
/// released.
///
/// The region must not escape `op`: the slice borrow ends when the
/// closure returns, and the backing storage is reclaimed with the frame
/// or the heap block. The region is never larger than requested, so
/// there is no reserve capacity to stray into.
///
/// # Panics
///
/// Panics if `byte_count` is zero, if `align` is zero or not a power of
/// two, or if the rounded-up allocation size would overflow `isize`.
/// These are contract violations by the caller, not recoverable
/// conditions. Heap exhaustion aborts via
/// [`std::alloc::handle_alloc_error`].
pub fn with_scratch_bytes<R>(
    byte_count: usize,
    align: usize,
    op: impl FnOnce(&mut [MaybeUninit<u8>]) -> R,
) -> R {
    assert!(byte_count > 0, "scratch byte count must be positive");
    assert!(
        align > 0 && align.is_power_of_two(),
        "scratch alignment must be a positive power of two (got {align})"
    );

    match StackClass::for_request(byte_count, align) {
        Some(StackClass::B8) => {
            let mut reservoir = Reservoir::<1>::new();
            in_reservoir(&mut reservoir, byte_count, op)
        }
        Some(StackClass::B64) => {
            let mut reservoir = Reservoir::<8>::new();
            in_reservoir(&mut reservoir, byte_count, op)
        }
        Some(StackClass::B256) => {
            let mut reservoir = Reservoir::<32>::new();
            in_reservoir(&mut reservoir, byte_count, op)
        }
        Some(StackClass::B1024) => {
            let mut reservoir = Reservoir::<128>::new();
            in_reservoir(&mut reservoir, byte_count, op)
        }
        None => {
            let mut block = HeapBlock::allocate(byte_count, align);
            op(block.as_uninit_bytes())
            // `block` drops here, after `op` has returned or unwound.
        }
    }
}

/// Run `op` on a `byte_count`-long view into a stack reservoir.
///
/// The view borrows from `reservoir`, so the storage outlives the
/// closure structurally; no keep-alive barrier is needed after the call.
fn in_reservoir<const WORDS: usize, R>(
    reservoir: &mut Reservoir<WORDS>,
    byte_count: usize,
    op: impl FnOnce(&mut [MaybeUninit<u8>]) -> R,
) -> R {
    debug_assert!(byte_count <= Reservoir::<WORDS>::BYTES);
    stats::record_stack_acquire();
    // SAFETY: the reservoir owns `Reservoir::<WORDS>::BYTES >= byte_count`
    // contiguous bytes, the pointer derives from the live `&mut` borrow
    // (which the returned slice inherits), and `MaybeUninit<u8>` has no
    // validity requirements.
    let view = unsafe { slice::from_raw_parts_mut(reservoir.as_mut_bytes_ptr(), byte_count) };
    op(view)
}

/// An aligned heap allocation released on drop.
///
/// `Drop` deallocates with the identical layout, so release runs exactly
/// once on normal return, early return, and unwind.
struct HeapBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl HeapBlock {
    /// Allocate `byte_count` bytes at `align` from the global allocator.
    ///
    /// # Panics
    ///
    /// Panics if the layout is unrepresentable (rounded-up size overflows
    /// `isize`); aborts via [`handle_alloc_error`] on heap exhaustion.
    fn allocate(byte_count: usize, align: usize) -> Self {
        let layout = match Layout::from_size_align(byte_count, align) {
            Ok(layout) => layout,
            Err(_) => panic!(
                "scratch request of {byte_count} bytes at alignment {align} exceeds the address space"
            ),
        };
        // SAFETY: `layout` has non-zero size; `with_scratch_bytes` asserts
        // `byte_count > 0` before reaching the heap path.
        let raw = unsafe { alloc(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            handle_alloc_error(layout)
        };
        stats::record_heap_acquire();
        Self { ptr, layout }
    }

    /// The block's storage as a writable uninitialized byte slice.
    fn as_uninit_bytes(&mut self) -> &mut [MaybeUninit<u8>] {
        // SAFETY: `ptr` is valid for `layout.size()` bytes, exclusively
        // borrowed through `&mut self`, and `MaybeUninit<u8>` permits any
        // contents.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr().cast(), self.layout.size()) }
    }
}

impl Drop for HeapBlock {
    fn drop(&mut self) {
        stats::record_heap_release();
        // SAFETY: `ptr` came from `alloc` with exactly `self.layout`, and
        // `Drop` runs at most once, so this is the single matching
        // deallocation.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

/// Reinterpret a raw scratch region as `capacity` uninitialized `T`
/// slots.
///
/// # Panics
///
/// Panics if the region is shorter than `capacity * size_of::<T>()`
/// bytes — a defensive check against a misbehaving raw layer; the typed
/// layer has already overflow-checked the product.
pub(crate) fn cast_slots<T>(
    bytes: &mut [MaybeUninit<u8>],
    capacity: usize,
) -> &mut [MaybeUninit<T>] {
    assert!(
        bytes.len() >= std::mem::size_of::<T>() * capacity,
        "raw scratch region shorter than the typed request"
    );
    debug_assert_eq!(bytes.as_ptr() as usize % std::mem::align_of::<T>(), 0);
    // SAFETY: the region holds at least `capacity * size_of::<T>()` bytes
    // (asserted above) at `align_of::<T>()` (the typed layer requested
    // that alignment), and `MaybeUninit<T>` has no validity requirements.
    unsafe { slice::from_raw_parts_mut(bytes.as_mut_ptr().cast(), capacity) }
}

/// A `capacity`-long slot view for a zero-sized element type.
///
/// No storage backs the view; none is needed.
pub(crate) fn dangling_slots<'a, T>(capacity: usize) -> &'a mut [MaybeUninit<T>] {
    debug_assert_eq!(std::mem::size_of::<T>(), 0);
    // SAFETY: for a zero-sized element type, any well-aligned non-null
    // pointer is valid for a slice of any length, and no storage exists
    // for the slice to alias.
    unsafe { slice::from_raw_parts_mut(NonNull::<MaybeUninit<T>>::dangling().as_ptr(), capacity) }
}
