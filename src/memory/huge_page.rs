//! Bump arena over pre-reserved huge pages.
//!
//! The pool reserves `page_count` 2 MiB pages the first time a buffer is
//! requested, optionally touching every 4 KiB so that page faults are paid
//! up front instead of inside a measured multiplication. Allocation advances
//! a single cursor; release moves it back. There is no free list: buffers
//! must be released in exactly the reverse order they were obtained.
//!
//! The cursor lives in a [`Cell`], so the pool is `!Sync` and can only be
//! used from the thread that owns it.
//!
//! ```no_run
//! use squaremat::{HugePagePool, PoolConfig, SquareMatrix, Strategy};
//!
//! let pool = HugePagePool::new(PoolConfig::with_pages(8));
//! let a = SquareMatrix::<i32, 256, HugePagePool>::make_random_in(&pool, 0, 9)?;
//! let b = SquareMatrix::<i32, 256, HugePagePool>::make_random_in(&pool, 0, 9)?;
//! let mut c = SquareMatrix::<i32, 256, HugePagePool>::new_in(&pool)?;
//! a.multiply(&b, &mut c, Strategy::TiledRegisterBlocked)?;
//! # Ok::<(), squaremat::MatmulError>(())
//! ```

use std::cell::Cell;
use std::mem;
use std::ptr::NonNull;

use once_cell::unsync::OnceCell;

use crate::error::{MatmulError, Result};
use crate::memory::{MatrixAllocator, ALIGNMENT};

/// Size of one huge page.
pub const HUGE_PAGE_SIZE: usize = 2 * 1024 * 1024;

/// Pages reserved by [`PoolConfig::default`], 1 GiB in total.
pub const DEFAULT_PAGE_COUNT: usize = 512;

const TOUCH_STRIDE: usize = 4096;

/// Sizing and mapping options for a [`HugePagePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of 2 MiB pages to reserve.
    pub page_count: usize,
    /// Touch the whole region right after mapping it.
    pub prefault: bool,
    /// Map regular pages (with transparent huge page advice) when no
    /// explicit huge pages are available, instead of failing.
    pub allow_regular_pages: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            page_count: DEFAULT_PAGE_COUNT,
            prefault: true,
            allow_regular_pages: true,
        }
    }
}

impl PoolConfig {
    pub fn with_pages(page_count: usize) -> Self {
        PoolConfig {
            page_count,
            ..Self::default()
        }
    }

    pub fn prefault(mut self, prefault: bool) -> Self {
        self.prefault = prefault;
        self
    }

    pub fn allow_regular_pages(mut self, allow: bool) -> Self {
        self.allow_regular_pages = allow;
        self
    }

    /// Total bytes the pool will reserve.
    pub fn capacity(&self) -> usize {
        self.page_count.saturating_mul(HUGE_PAGE_SIZE)
    }
}

/// Process-local bump allocator over huge pages.
pub struct HugePagePool {
    config: PoolConfig,
    region: OnceCell<Region>,
    offset: Cell<usize>,
}

impl Default for HugePagePool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl HugePagePool {
    /// Creates an empty pool. Nothing is mapped until the first request.
    pub fn new(config: PoolConfig) -> Self {
        HugePagePool {
            config,
            region: OnceCell::new(),
            offset: Cell::new(0),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    /// Current cursor position in bytes.
    pub fn offset(&self) -> usize {
        self.offset.get()
    }

    pub fn remaining(&self) -> usize {
        self.capacity() - self.offset.get()
    }

    pub fn is_mapped(&self) -> bool {
        self.region.get().is_some()
    }

    /// `Some(true)` when the region is backed by explicit huge pages,
    /// `None` before the first allocation.
    pub fn is_huge(&self) -> Option<bool> {
        self.region.get().map(|region| region.huge)
    }

    /// Bytes consumed by a request for `count` elements of `T`.
    pub const fn rounded_size<T>(count: usize) -> usize {
        (count * mem::size_of::<T>() + ALIGNMENT - 1) & !(ALIGNMENT - 1)
    }

    /// Carves storage for `count` elements of `T` off the top of the pool.
    ///
    /// Fails with [`MatmulError::PoolExhausted`] when the rounded request
    /// does not fit in the remaining capacity; nothing is reclaimed.
    pub fn get<T>(&self, count: usize) -> Result<NonNull<T>> {
        debug_assert!(mem::align_of::<T>() <= ALIGNMENT);

        let region = self
            .region
            .get_or_try_init(|| Region::map(&self.config))?;

        let offset = self.offset.get();
        let size = count
            .checked_mul(mem::size_of::<T>())
            .and_then(|bytes| bytes.checked_add(ALIGNMENT - 1))
            .map(|bytes| bytes & !(ALIGNMENT - 1));

        let size = match size {
            Some(size) if size <= region.len - offset => size,
            requested => {
                let err = MatmulError::PoolExhausted {
                    requested: requested.unwrap_or(usize::MAX),
                    remaining: region.len - offset,
                    capacity: region.len,
                };
                log::error!("{err}");
                return Err(err);
            }
        };

        self.offset.set(offset + size);

        // SAFETY: offset + size <= region.len, so the result stays inside the mapping.
        let ptr = unsafe { region.base.as_ptr().add(offset) };
        Ok(unsafe { NonNull::new_unchecked(ptr as *mut T) })
    }

    /// Moves the cursor back by the rounded size of `count` elements of `T`.
    ///
    /// # Safety
    ///
    /// Must mirror the most recent outstanding `get::<T>(count)`. Calls that
    /// are out of order or sized differently leave the cursor pointing into
    /// live buffers, and later requests will hand those bytes out again.
    pub unsafe fn release<T>(&self, count: usize) {
        let size = Self::rounded_size::<T>(count);
        let offset = self.offset.get();
        debug_assert!(
            size <= offset,
            "huge page pool released more than it handed out"
        );
        self.offset.set(offset.wrapping_sub(size));
    }
}

impl MatrixAllocator for HugePagePool {
    fn allocate<T>(&self, count: usize) -> Result<NonNull<T>> {
        self.get(count)
    }

    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, count: usize) {
        if let Some(region) = self.region.get() {
            let top = self
                .offset
                .get()
                .wrapping_sub(Self::rounded_size::<T>(count));
            debug_assert_eq!(
                ptr.as_ptr() as usize,
                region.base.as_ptr() as usize + top,
                "huge page pool buffers must be released in reverse allocation order"
            );
        }
        self.release::<T>(count);
    }
}

/// The mapped backing region of a pool.
struct Region {
    base: NonNull<u8>,
    len: usize,
    huge: bool,
}

impl Region {
    fn map(config: &PoolConfig) -> Result<Region> {
        let len = config.capacity();
        if len == 0 {
            return Err(MatmulError::MapFailed {
                size: 0,
                message: "pool has no pages".to_string(),
            });
        }

        let region = match map_huge(len) {
            Ok(base) => Region {
                base,
                len,
                huge: true,
            },
            Err(reason) if !config.allow_regular_pages => {
                return Err(MatmulError::MapFailed {
                    size: len,
                    message: reason,
                });
            }
            Err(reason) => {
                log::warn!(
                    "huge pages unavailable ({reason}), falling back to regular pages"
                );
                Region {
                    base: map_regular(len)?,
                    len,
                    huge: false,
                }
            }
        };

        if config.prefault {
            for offset in (0..len).step_by(TOUCH_STRIDE) {
                unsafe { region.base.as_ptr().add(offset).write_volatile(0) };
            }
        }

        log::debug!(
            "mapped {} MiB pool ({} pages, huge: {}, prefaulted: {})",
            len / (1024 * 1024),
            config.page_count,
            region.huge,
            config.prefault
        );

        Ok(region)
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        unsafe { unmap(self.base, self.len) };
    }
}

#[cfg(target_os = "linux")]
fn map_huge(len: usize) -> std::result::Result<NonNull<u8>, String> {
    unsafe { mmap_anonymous(len, libc::MAP_HUGETLB) }
        .ok_or_else(|| std::io::Error::last_os_error().to_string())
}

#[cfg(not(target_os = "linux"))]
fn map_huge(_len: usize) -> std::result::Result<NonNull<u8>, String> {
    Err("explicit huge pages are only supported on Linux".to_string())
}

#[cfg(unix)]
fn map_regular(len: usize) -> Result<NonNull<u8>> {
    let base = unsafe { mmap_anonymous(len, 0) }.ok_or_else(|| MatmulError::MapFailed {
        size: len,
        message: std::io::Error::last_os_error().to_string(),
    })?;

    #[cfg(target_os = "linux")]
    unsafe {
        // Advisory only; a kernel without THP support simply ignores it.
        libc::madvise(base.as_ptr() as *mut libc::c_void, len, libc::MADV_HUGEPAGE);
    }

    Ok(base)
}

#[cfg(unix)]
unsafe fn mmap_anonymous(len: usize, extra_flags: libc::c_int) -> Option<NonNull<u8>> {
    let ptr = libc::mmap(
        std::ptr::null_mut(),
        len,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | extra_flags,
        -1,
        0,
    );

    if ptr == libc::MAP_FAILED {
        None
    } else {
        NonNull::new(ptr as *mut u8)
    }
}

#[cfg(unix)]
unsafe fn unmap(base: NonNull<u8>, len: usize) {
    libc::munmap(base.as_ptr() as *mut libc::c_void, len);
}

#[cfg(not(unix))]
fn map_regular(len: usize) -> Result<NonNull<u8>> {
    let layout = std::alloc::Layout::from_size_align(len, HUGE_PAGE_SIZE)
        .map_err(|err| crate::error::layout_error(len, HUGE_PAGE_SIZE, err.to_string()))?;
    let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
    NonNull::new(ptr).ok_or_else(|| MatmulError::MapFailed {
        size: len,
        message: "global allocator returned null".to_string(),
    })
}

#[cfg(not(unix))]
unsafe fn unmap(base: NonNull<u8>, len: usize) {
    if let Ok(layout) = std::alloc::Layout::from_size_align(len, HUGE_PAGE_SIZE) {
        std::alloc::dealloc(base.as_ptr(), layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool() -> HugePagePool {
        HugePagePool::new(PoolConfig::with_pages(1).prefault(false))
    }

    #[test]
    fn test_rounded_size() {
        assert_eq!(HugePagePool::rounded_size::<u8>(1), 64);
        assert_eq!(HugePagePool::rounded_size::<i32>(16), 64);
        assert_eq!(HugePagePool::rounded_size::<i32>(17), 128);
        assert_eq!(HugePagePool::rounded_size::<u64>(0), 0);
    }

    #[test]
    fn test_mapping_is_lazy() {
        let pool = small_pool();
        assert!(!pool.is_mapped());
        assert_eq!(pool.is_huge(), None);

        let ptr = pool.get::<i32>(10).unwrap();
        assert!(pool.is_mapped());
        assert_eq!(ptr.as_ptr() as usize % ALIGNMENT, 0);
        unsafe { pool.release::<i32>(10) };
    }

    #[test]
    fn test_cursor_moves_by_rounded_size() {
        let pool = small_pool();
        let a = pool.get::<u8>(1).unwrap();
        assert_eq!(pool.offset(), 64);
        let b = pool.get::<u16>(100).unwrap();
        assert_eq!(pool.offset(), 64 + 256);
        assert_eq!(b.as_ptr() as usize - a.as_ptr() as usize, 64);

        unsafe {
            pool.deallocate(b, 100);
            pool.deallocate(a, 1);
        }
        assert_eq!(pool.offset(), 0);
    }

    #[test]
    fn test_exhaustion_leaves_cursor_untouched() {
        let pool = small_pool();
        let _block = pool.get::<u8>(HUGE_PAGE_SIZE - 64).unwrap();
        let before = pool.offset();

        let err = pool.get::<u8>(128).unwrap_err();
        assert_eq!(
            err,
            MatmulError::PoolExhausted {
                requested: 128,
                remaining: 64,
                capacity: HUGE_PAGE_SIZE,
            }
        );
        assert_eq!(pool.offset(), before);

        unsafe { pool.release::<u8>(HUGE_PAGE_SIZE - 64) };
    }

    #[test]
    fn test_zero_pages_fails_to_map() {
        let pool = HugePagePool::new(PoolConfig::with_pages(0));
        assert!(matches!(
            pool.get::<u8>(1),
            Err(MatmulError::MapFailed { size: 0, .. })
        ));
    }
}
