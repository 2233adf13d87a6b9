//! Software prefetch hints.
//!
//! Prefetch instructions never fault, so callers may hint addresses past the
//! end of a buffer as long as the pointer itself is computed without
//! overflowing (`wrapping_add`). x86 uses `_mm_prefetch`; aarch64 has no
//! stable prefetch intrinsic, so the `prfm` instruction is emitted directly.
//! Other targets get no hints.

#[cfg(target_arch = "x86")]
use std::arch::x86::{_mm_prefetch, _MM_HINT_T0, _MM_HINT_T1};

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0, _MM_HINT_T1};

#[cfg(target_arch = "aarch64")]
use std::arch::asm;

/// Cache line size assumed when spacing hints.
pub const CACHE_LINE: usize = 64;

/// Hints that `ptr` will be read soon and should be pulled into L1.
#[inline(always)]
pub fn prefetch_l1<T>(ptr: *const T) {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    unsafe {
        _mm_prefetch(ptr as *const i8, _MM_HINT_T0);
    }

    #[cfg(target_arch = "aarch64")]
    unsafe {
        asm!("prfm pldl1keep, [{0}]", in(reg) ptr, options(nostack, readonly, preserves_flags));
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    let _ = ptr;
}

/// Hints that `ptr` will be read later and should be pulled into L2.
#[inline(always)]
pub fn prefetch_l2<T>(ptr: *const T) {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    unsafe {
        _mm_prefetch(ptr as *const i8, _MM_HINT_T1);
    }

    #[cfg(target_arch = "aarch64")]
    unsafe {
        asm!("prfm pldl2keep, [{0}]", in(reg) ptr, options(nostack, readonly, preserves_flags));
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    let _ = ptr;
}

/// Issues one L1 hint per cache line covering `len` elements from `ptr`.
#[inline(always)]
pub fn prefetch_span_l1<T>(ptr: *const T, len: usize) {
    let step = (CACHE_LINE / std::mem::size_of::<T>().max(1)).max(1);
    let mut offset = 0;
    while offset < len {
        prefetch_l1(ptr.wrapping_add(offset));
        offset += step;
    }
}
