//! Scoped, size-adaptive scratch allocation.
//!
//! Bivouac hands callers a short-lived, writable, uninitialized memory
//! region that is valid only for the duration of a single closure
//! invocation. Small requests are served from a fixed-size reservoir in
//! the calling frame; everything else falls back to a heap block that is
//! released on every exit path, including unwinding.
//!
//! # Architecture
//!
//! ```text
//! with_scratch_slots::<T>(capacity, op)   with_scratch_slot::<T>(op)
//!        │ stride × capacity (checked)          │ capacity = 1
//!        ▼                                      ▼
//! with_scratch_bytes(byte_count, align, op) ◀───┘
//!        │
//!        ├── byte_count ≤ 1024 and align ≤ 8 → stack reservoir
//!        │                                     (8 / 64 / 256 / 1024 B rungs)
//!        └── otherwise ───────────────────────→ heap block, dropped after `op`
//! ```
//!
//! # Contract
//!
//! The region is uninitialized: callers must write a slot before reading
//! it, and must tear down anything they construct in it before `op`
//! returns. The region must not escape `op` — the `&mut` borrow handed to
//! the closure ends when the closure does, and the backing storage is
//! reclaimed immediately afterwards.
//!
//! # Safety boundary
//!
//! All `unsafe` code lives in [`raw`]; every unsafe block carries a
//! `// SAFETY:` comment. The other modules are `#![deny(unsafe_code)]`
//! clean.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod raw;
pub mod reservoir;
pub mod stats;
pub mod typed;

// Public re-exports for the primary API surface.
pub use raw::with_scratch_bytes;
pub use reservoir::StackClass;
pub use stats::ScratchStats;
pub use typed::{with_scratch_slot, with_scratch_slots};
