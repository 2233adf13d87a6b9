//! Array-backed lane vector.
//!
//! Used for every element type without a native implementation and as the
//! whole backend when the build detected no usable instruction set. LLVM is
//! usually able to turn the fixed-length loops into vector code on its own.

use num::traits::{WrappingAdd, WrappingMul, Zero};

use crate::simd::traits::SimdLanes;

/// `L` lanes of `T` stored in an ordinary array.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Portable<T, const L: usize>(pub [T; L]);

impl<T, const L: usize> SimdLanes<T> for Portable<T, L>
where
    T: Copy + Zero + WrappingAdd + WrappingMul,
{
    const LANES: usize = L;

    #[inline(always)]
    unsafe fn zeros() -> Self {
        Portable([T::zero(); L])
    }

    #[inline(always)]
    unsafe fn splat(value: T) -> Self {
        Portable([value; L])
    }

    #[inline(always)]
    unsafe fn load(ptr: *const T) -> Self {
        Portable(std::ptr::read_unaligned(ptr as *const [T; L]))
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut T) {
        std::ptr::write_unaligned(ptr as *mut [T; L], self.0);
    }

    #[inline(always)]
    unsafe fn mul_add(self, a: Self, b: Self) -> Self {
        let mut out = self.0;
        for lane in 0..L {
            out[lane] = out[lane].wrapping_add(&a.0[lane].wrapping_mul(&b.0[lane]));
        }
        Portable(out)
    }

    #[inline(always)]
    unsafe fn reduce_sum(self) -> T {
        self.0
            .iter()
            .fold(T::zero(), |acc, lane| acc.wrapping_add(lane))
    }
}
