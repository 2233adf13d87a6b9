#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

use crate::simd::traits::SimdLanes;

pub const LANE_COUNT: usize = 4;

/// A SIMD vector of 4 32-bit signed integers
#[derive(Copy, Clone, Debug)]
pub struct I32x4 {
    elements: int32x4_t,
}

impl SimdLanes<i32> for I32x4 {
    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    unsafe fn zeros() -> Self {
        Self {
            elements: vdupq_n_s32(0),
        }
    }

    #[inline(always)]
    unsafe fn splat(value: i32) -> Self {
        Self {
            elements: vdupq_n_s32(value),
        }
    }

    #[inline(always)]
    unsafe fn load(ptr: *const i32) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        Self {
            elements: vld1q_s32(ptr),
        }
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut i32) {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        vst1q_s32(ptr, self.elements);
    }

    // vmlaq wraps like the scalar path.
    #[inline(always)]
    unsafe fn mul_add(self, a: Self, b: Self) -> Self {
        Self {
            elements: vmlaq_s32(self.elements, a.elements, b.elements),
        }
    }

    #[inline(always)]
    unsafe fn reduce_sum(self) -> i32 {
        vaddvq_s32(self.elements)
    }
}
