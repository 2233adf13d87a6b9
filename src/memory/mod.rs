//! Backing storage for matrix buffers.
//!
//! Two allocators implement [`MatrixAllocator`]:
//!
//! - [`AlignedAllocator`]: 64-byte aligned buffers from the global heap.
//! - [`HugePagePool`]: a bump arena over a region of 2 MiB pages, released
//!   in strict reverse order of allocation.

use std::ptr::NonNull;

use crate::error::Result;

pub mod aligned;
pub mod huge_page;

pub use aligned::{AlignedAllocator, ALIGNED};
pub use huge_page::{HugePagePool, PoolConfig, DEFAULT_PAGE_COUNT, HUGE_PAGE_SIZE};

/// Alignment of every buffer handed out by this crate's allocators.
pub const ALIGNMENT: usize = 64;

/// Source of element buffers for matrices.
pub trait MatrixAllocator {
    /// Returns storage for `count` elements of `T`, aligned to [`ALIGNMENT`].
    ///
    /// The contents are unspecified; callers initialize the buffer.
    fn allocate<T>(&self, count: usize) -> Result<NonNull<T>>;

    /// Gives a buffer back to the allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate::<T>(count)` on this allocator with the
    /// same `count`, and must not be used afterwards. Allocators with stack
    /// discipline additionally require buffers to be returned in reverse
    /// order of allocation.
    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, count: usize);
}
