//! AVX2 8-lane i32 vector.
//!
//! `I32x8` wraps `__m256i` and backs every vectorized strategy when the build
//! detected AVX2. Multiplication uses `_mm256_mullo_epi32`, which keeps the
//! low 32 bits of each product, i.e. the same wrapping result as the scalar
//! path.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::simd::traits::SimdLanes;

/// Number of i32 elements that fit in an AVX2 256-bit vector.
pub(crate) const LANE_COUNT: usize = 8;

/// AVX2 SIMD vector containing 8 packed i32 values.
#[derive(Copy, Clone, Debug)]
pub struct I32x8 {
    pub elements: __m256i,
}

impl SimdLanes<i32> for I32x8 {
    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    unsafe fn zeros() -> Self {
        I32x8 {
            elements: _mm256_setzero_si256(),
        }
    }

    #[inline(always)]
    unsafe fn splat(value: i32) -> Self {
        I32x8 {
            elements: _mm256_set1_epi32(value),
        }
    }

    #[inline(always)]
    unsafe fn load(ptr: *const i32) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        I32x8 {
            elements: _mm256_loadu_si256(ptr as *const __m256i),
        }
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut i32) {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        _mm256_storeu_si256(ptr as *mut __m256i, self.elements);
    }

    #[inline(always)]
    unsafe fn mul_add(self, a: Self, b: Self) -> Self {
        I32x8 {
            elements: _mm256_add_epi32(self.elements, _mm256_mullo_epi32(a.elements, b.elements)),
        }
    }

    /// Folds the upper 128-bit half onto the lower one, then reduces the
    /// remaining four lanes with two shuffles.
    #[inline(always)]
    unsafe fn reduce_sum(self) -> i32 {
        let low = _mm256_castsi256_si128(self.elements);
        let high = _mm256_extracti128_si256(self.elements, 1);
        let sum = _mm_add_epi32(low, high);
        let sum = _mm_add_epi32(sum, _mm_shuffle_epi32(sum, 0b01_00_11_10));
        let sum = _mm_add_epi32(sum, _mm_shuffle_epi32(sum, 0b10_11_00_01));
        _mm_cvtsi128_si32(sum)
    }
}
