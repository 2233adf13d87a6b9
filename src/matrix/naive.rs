//! Row × column triple loop, the baseline every other strategy must match.

use crate::element::Element;
use crate::matrix::Dim;

/// `c[x, y] = Σ_k a[k, y] * b[x, k]`, striding down `b`'s columns.
pub(crate) fn multiply<T: Element, const N: usize>(a: &[T], b: &[T], c: &mut [T]) {
    for y in 0..N {
        for x in 0..N {
            let mut sum = T::zero();
            for k in 0..N {
                sum = T::mul_add(sum, a[Dim::<N>::index(k, y)], b[Dim::<N>::index(x, k)]);
            }
            c[Dim::<N>::index(x, y)] = sum;
        }
    }
}
