#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::simd::traits::SimdLanes;

pub(crate) const LANE_COUNT: usize = 4;

/// SSE4.1 vector containing 4 packed i32 values.
#[derive(Copy, Clone, Debug)]
pub struct I32x4 {
    pub elements: __m128i,
}

impl SimdLanes<i32> for I32x4 {
    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    unsafe fn zeros() -> Self {
        I32x4 {
            elements: _mm_setzero_si128(),
        }
    }

    #[inline(always)]
    unsafe fn splat(value: i32) -> Self {
        I32x4 {
            elements: _mm_set1_epi32(value),
        }
    }

    #[inline(always)]
    unsafe fn load(ptr: *const i32) -> Self {
        I32x4 {
            elements: _mm_loadu_si128(ptr as *const __m128i),
        }
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut i32) {
        _mm_storeu_si128(ptr as *mut __m128i, self.elements);
    }

    #[inline(always)]
    unsafe fn mul_add(self, a: Self, b: Self) -> Self {
        I32x4 {
            elements: _mm_add_epi32(self.elements, _mm_mullo_epi32(a.elements, b.elements)),
        }
    }

    #[inline(always)]
    unsafe fn reduce_sum(self) -> i32 {
        let sum = _mm_add_epi32(
            self.elements,
            _mm_shuffle_epi32(self.elements, 0b01_00_11_10),
        );
        let sum = _mm_add_epi32(sum, _mm_shuffle_epi32(sum, 0b10_11_00_01));
        _mm_cvtsi128_si32(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_add_and_reduce() {
        let acc = [10, 20, 30, 40];
        let b = [1, -1, 2, -2];
        let mut out = [0i32; 4];
        let sum = unsafe {
            let r = I32x4::load(acc.as_ptr()).mul_add(I32x4::splat(3), I32x4::load(b.as_ptr()));
            r.store(out.as_mut_ptr());
            r.reduce_sum()
        };
        assert_eq!(out, [13, 17, 36, 34]);
        assert_eq!(sum, 100);
    }
}
