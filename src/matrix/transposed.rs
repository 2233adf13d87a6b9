//! Row × row strategies over the right operand's transposed copy.
//!
//! Both operands are read with unit stride: row `y` of `a` against row `x` of
//! `bᵀ`, which is column `x` of `b`.

use crate::element::{Element, LaneCheck};
use crate::matrix::Dim;
use crate::simd::SimdLanes;

pub(crate) fn multiply<T: Element, const N: usize>(a: &[T], bt: &[T], c: &mut [T]) {
    let w = Dim::<N>::WIDTH;

    for y in 0..N {
        let a_row = &a[y * w..y * w + N];
        for x in 0..N {
            let b_row = &bt[x * w..x * w + N];
            c[Dim::<N>::index(x, y)] = a_row
                .iter()
                .zip(b_row)
                .fold(T::zero(), |sum, (&p, &q)| T::mul_add(sum, p, q));
        }
    }
}

/// Same access pattern as [`multiply`], reducing `k` a full lane vector at a
/// time.
///
/// Rows are walked up to the next lane multiple past `N`. Storage is padded
/// to a multiple of [`REGISTER_TILE`](crate::REGISTER_TILE), which every
/// lane width divides, and padding is zero, so the extra lanes add nothing.
///
/// # Safety
///
/// The CPU must support the lane backend the build script selected.
#[cfg_attr(avx2, target_feature(enable = "avx2"))]
#[cfg_attr(sse, target_feature(enable = "sse4.1"))]
#[cfg_attr(neon, target_feature(enable = "neon"))]
pub(crate) unsafe fn multiply_vectorized<T: Element, const N: usize>(
    a: &[T],
    bt: &[T],
    c: &mut [T],
) {
    let lanes = LaneCheck::<T>::LANES;
    let w = Dim::<N>::WIDTH;
    let span = N.div_ceil(lanes) * lanes;
    debug_assert!(span <= w);

    for y in 0..N {
        let a_row = &a[y * w..y * w + span];
        for x in 0..N {
            let b_row = &bt[x * w..x * w + span];

            // SAFETY: both rows hold `span` elements and `span` is a multiple of `lanes`.
            let sum = unsafe {
                let mut acc = <T::Lanes as SimdLanes<T>>::zeros();
                for k in (0..span).step_by(lanes) {
                    let va = <T::Lanes as SimdLanes<T>>::load(a_row.as_ptr().add(k));
                    let vb = <T::Lanes as SimdLanes<T>>::load(b_row.as_ptr().add(k));
                    acc = acc.mul_add(va, vb);
                }
                acc.reduce_sum()
            };

            c[Dim::<N>::index(x, y)] = sum;
        }
    }
}
