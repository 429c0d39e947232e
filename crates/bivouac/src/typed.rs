//! Typed scoped scratch allocation over the raw byte layer.
//!
//! [`with_scratch_slots`] sizes a raw request from an element type and a
//! capacity, then reinterprets the byte region as uninitialized `T`
//! slots. The allocator never constructs or drops `T` values: callers
//! must initialize a slot before reading it, and must tear down anything
//! they construct before the closure returns.

use std::mem::MaybeUninit;

use crate::raw;

/// Run `op` on exactly `capacity` uninitialized slots of `T`, aligned
/// for `T` and valid only for the duration of the call.
///
/// The backing region is `capacity * size_of::<T>()` bytes obtained from
/// [`with_scratch_bytes`](crate::with_scratch_bytes); the slot view is
/// clamped to `capacity` even when the backing rung is larger.
/// Zero-sized element types need no storage and are served without
/// touching either allocation path.
///
/// # Panics
///
/// Panics if `capacity` is zero, or if `capacity * size_of::<T>()`
/// overflows `usize` ("too much scratch memory requested") — the
/// overflow check fires before any storage is acquired.
pub fn with_scratch_slots<T, R>(
    capacity: usize,
    op: impl FnOnce(&mut [MaybeUninit<T>]) -> R,
) -> R {
    assert!(capacity > 0, "scratch capacity must be positive");
    let stride = std::mem::size_of::<T>();
    if stride == 0 {
        return op(raw::dangling_slots::<T>(capacity));
    }
    let Some(byte_count) = stride.checked_mul(capacity) else {
        panic!("too much scratch memory requested: {capacity} slots of {stride} bytes overflows usize")
    };
    raw::with_scratch_bytes(byte_count, std::mem::align_of::<T>(), |bytes| {
        op(raw::cast_slots::<T>(bytes, capacity))
    })
}

/// Run `op` on a single uninitialized `T` slot.
///
/// Equivalent to [`with_scratch_slots`] with a capacity of one, narrowed
/// to the one slot — which exists by construction once the capacity
/// precondition holds.
pub fn with_scratch_slot<T, R>(op: impl FnOnce(&mut MaybeUninit<T>) -> R) -> R {
    with_scratch_slots(1, |slots: &mut [MaybeUninit<T>]| op(&mut slots[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats;

    #[test]
    fn slot_count_is_exactly_capacity() {
        with_scratch_slots::<i32, _>(4, |slots| {
            assert_eq!(slots.len(), 4);
            assert_eq!(slots.as_ptr() as usize % std::mem::align_of::<i32>(), 0);
        });
    }

    #[test]
    fn written_slots_read_back() {
        with_scratch_slots::<u64, _>(3, |slots| {
            // `write` returns a reference to the now-initialized value.
            let a = *slots[0].write(11);
            let b = *slots[1].write(22);
            let c = *slots[2].write(33);
            assert_eq!(a + b + c, 66);
        });
    }

    #[test]
    fn single_slot_form_works() {
        let doubled = with_scratch_slot::<(u32, u32), _>(|slot| {
            let pair = slot.write((21, 2));
            pair.0 * pair.1
        });
        assert_eq!(doubled, 42);
    }

    #[test]
    fn wide_elements_fall_back_to_heap() {
        #[repr(align(64))]
        struct CacheLine([u8; 64]);

        let before = stats::snapshot();
        with_scratch_slots::<CacheLine, _>(2, |slots| {
            assert_eq!(slots.len(), 2);
            assert_eq!(slots.as_ptr() as usize % 64, 0);
        });
        let after = stats::snapshot();
        assert_eq!(after.heap_acquires - before.heap_acquires, 1);
        assert_eq!(after.heap_releases - before.heap_releases, 1);
    }

    #[test]
    fn zero_sized_elements_need_no_storage() {
        let before = stats::snapshot();
        with_scratch_slots::<(), _>(5, |slots| {
            assert_eq!(slots.len(), 5);
            for slot in slots.iter_mut() {
                slot.write(());
            }
        });
        let after = stats::snapshot();
        assert_eq!(before, after);
    }

    #[test]
    #[should_panic(expected = "scratch capacity must be positive")]
    fn zero_capacity_is_rejected() {
        with_scratch_slots::<u8, _>(0, |_| ());
    }

    #[test]
    #[should_panic(expected = "too much scratch memory requested")]
    fn capacity_overflow_is_rejected() {
        with_scratch_slots::<u64, _>(usize::MAX / 4, |_| ());
    }

    #[test]
    fn capacity_overflow_fires_before_allocation() {
        let before = stats::snapshot();
        let result = std::panic::catch_unwind(|| {
            with_scratch_slots::<u64, _>(usize::MAX / 2, |_| ());
        });
        assert!(result.is_err());
        assert_eq!(before, stats::snapshot());
    }
}
