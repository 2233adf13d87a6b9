use std::alloc::{alloc, dealloc, Layout};
use std::mem;
use std::ptr::NonNull;

use crate::error::{allocation_error, layout_error, Result};
use crate::memory::{MatrixAllocator, ALIGNMENT};

/// Global-heap allocator returning cache-line aligned buffers.
///
/// Stateless; every matrix built with [`SquareMatrix::new`](crate::SquareMatrix::new)
/// and friends borrows the [`ALIGNED`] instance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AlignedAllocator;

/// Shared instance used by the allocator-less constructors.
pub static ALIGNED: AlignedAllocator = AlignedAllocator;

impl AlignedAllocator {
    fn layout<T>(count: usize) -> Result<Layout> {
        let align = ALIGNMENT.max(mem::align_of::<T>());
        let size = count
            .checked_mul(mem::size_of::<T>())
            .ok_or_else(|| layout_error(usize::MAX, align, "element count overflows usize"))?;

        // Zero-sized layouts cannot be passed to the global allocator.
        Layout::from_size_align(size.max(1), align)
            .map_err(|err| layout_error(size, align, err.to_string()))
    }
}

impl MatrixAllocator for AlignedAllocator {
    fn allocate<T>(&self, count: usize) -> Result<NonNull<T>> {
        let layout = Self::layout::<T>(count)?;

        let ptr = unsafe { alloc(layout) as *mut T };

        NonNull::new(ptr).ok_or_else(|| {
            log::error!("aligned allocation of {} bytes failed", layout.size());
            allocation_error(
                layout.size(),
                layout.align(),
                "global allocator returned null",
            )
        })
    }

    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, count: usize) {
        // The layout was valid when the buffer was allocated.
        if let Ok(layout) = Self::layout::<T>(count) {
            dealloc(ptr.as_ptr() as *mut u8, layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_is_aligned() {
        for count in [1usize, 3, 64, 1000] {
            let ptr = ALIGNED.allocate::<u8>(count).unwrap();
            assert_eq!(ptr.as_ptr() as usize % ALIGNMENT, 0);
            unsafe { ALIGNED.deallocate(ptr, count) };
        }
    }

    #[test]
    fn test_overflowing_request_is_a_layout_error() {
        let err = ALIGNED.allocate::<u64>(usize::MAX).unwrap_err();
        assert!(matches!(err, crate::MatmulError::Layout { .. }));
    }
}
