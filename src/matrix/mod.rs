//! The square matrix type and its multiplication strategies.
//!
//! A [`SquareMatrix<T, N>`] owns two buffers of `W × W` elements, where `W`
//! is `N` rounded up to a multiple of [`REGISTER_TILE`]: the row-major
//! `primary` buffer and a `transposed` shadow holding its transpose. Only
//! the leading `N × N` region is logical; the padding is always zero.
//!
//! ```text
//!            x →  0   1  ... N-1 | N ... W-1
//!   y = 0       [ a00 a10 ...    | 0 ... 0 ]
//!   y = 1       [ a01 a11 ...    | 0 ... 0 ]
//!   ...
//!   y = N-1     [ ...            | 0 ... 0 ]
//!   y = N..W-1  [ 0   0   ...            0 ]
//! ```
//!
//! The shadow is refreshed eagerly by every constructor that populates the
//! primary buffer. An output of [`SquareMatrix::multiply`] has a stale
//! shadow until [`SquareMatrix::compute_transpose`] is called.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Index;
use std::ptr::NonNull;
use std::slice;

use rand::distr::{Distribution, Uniform};
use rand::Rng;

use crate::element::{Element, LaneCheck};
use crate::error::{MatmulError, Result};
use crate::memory::{AlignedAllocator, MatrixAllocator, ALIGNED};
use crate::REGISTER_TILE;

mod kernels;
mod naive;
mod packing;
mod strategy;
mod tiled;
mod transposed;

pub use packing::{pack_tile, pack_tile_prefetched, Block, PackedTile};
pub use strategy::Strategy;

/// Layout of an `N × N` matrix.
pub struct Dim<const N: usize>;

impl<const N: usize> Dim<N> {
    pub const SIZE: usize = N;

    /// Row stride and padded edge length.
    pub const WIDTH: usize = N.div_ceil(REGISTER_TILE) * REGISTER_TILE;

    /// Elements in one buffer, padding included.
    pub const LEN: usize = Self::WIDTH * Self::WIDTH;

    pub(crate) const VALID: () = assert!(
        N > 0 && N % 4 == 0,
        "matrix dimension must be a non-zero multiple of 4"
    );

    /// Buffer offset of column `x`, row `y`.
    #[inline(always)]
    pub const fn index(x: usize, y: usize) -> usize {
        y * Self::WIDTH + x
    }
}

/// A fixed-size square matrix with a transposed shadow copy.
///
/// Storage comes from the allocator `A` and is returned to it on drop, the
/// shadow first. With a [`HugePagePool`](crate::HugePagePool), matrices must
/// therefore be dropped in reverse order of construction.
pub struct SquareMatrix<'a, T: Element, const N: usize, A: MatrixAllocator = AlignedAllocator> {
    primary: NonNull<T>,
    transposed: NonNull<T>,
    fresh_transpose: bool,
    allocator: &'a A,
    _marker: PhantomData<T>,
}

// SAFETY: both buffers are exclusively owned; sharing or sending the matrix
// shares the allocator reference, which requires `A: Sync`.
unsafe impl<T: Element, const N: usize, A: MatrixAllocator + Sync> Send
    for SquareMatrix<'_, T, N, A>
{
}
unsafe impl<T: Element, const N: usize, A: MatrixAllocator + Sync> Sync
    for SquareMatrix<'_, T, N, A>
{
}

impl<T: Element, const N: usize> SquareMatrix<'static, T, N> {
    /// Zero matrix on the global heap.
    ///
    /// # Panics
    ///
    /// Panics if the allocation fails.
    pub fn new() -> Self {
        match Self::new_in(&ALIGNED) {
            Ok(matrix) => matrix,
            Err(err) => panic!("{err}"),
        }
    }

    /// Uniform random entries in `[lower, upper]` from the thread RNG.
    pub fn make_random(lower: T, upper: T) -> Result<Self> {
        Self::make_random_in(&ALIGNED, lower, upper)
    }

    pub fn make_random_with<R: Rng + ?Sized>(rng: &mut R, lower: T, upper: T) -> Result<Self> {
        Self::make_random_with_in(&ALIGNED, rng, lower, upper)
    }

    /// Builds a matrix from exactly `N * N` values in row-major order.
    pub fn from_slice(values: &[T]) -> Result<Self> {
        Self::from_slice_in(&ALIGNED, values)
    }

    /// Builds a matrix from `f(x, y)` for every column `x` and row `y`.
    ///
    /// # Panics
    ///
    /// Panics if the allocation fails.
    pub fn from_fn<F: FnMut(usize, usize) -> T>(f: F) -> Self {
        match Self::from_fn_in(&ALIGNED, f) {
            Ok(matrix) => matrix,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T: Element, const N: usize> Default for SquareMatrix<'static, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Element, const N: usize, A: MatrixAllocator> SquareMatrix<'a, T, N, A> {
    /// Zero matrix with both buffers taken from `allocator`, primary first.
    pub fn new_in(allocator: &'a A) -> Result<Self> {
        #[allow(clippy::let_unit_value)]
        let () = Dim::<N>::VALID;
        #[allow(clippy::let_unit_value)]
        let () = LaneCheck::<T>::VALID;

        let len = Dim::<N>::LEN;
        let primary = allocator.allocate::<T>(len)?;
        let transposed = match allocator.allocate::<T>(len) {
            Ok(ptr) => ptr,
            Err(err) => {
                // SAFETY: `primary` was just allocated with `len` and is the
                // most recent allocation.
                unsafe { allocator.deallocate(primary, len) };
                return Err(err);
            }
        };

        // SAFETY: both buffers hold `len` elements; a pool may hand back dirty bytes.
        unsafe {
            fill_zero(primary, len);
            fill_zero(transposed, len);
        }

        Ok(SquareMatrix {
            primary,
            transposed,
            fresh_transpose: true,
            allocator,
            _marker: PhantomData,
        })
    }

    pub fn make_random_in(allocator: &'a A, lower: T, upper: T) -> Result<Self> {
        Self::make_random_with_in(allocator, &mut rand::rng(), lower, upper)
    }

    /// Fills the logical region with i.i.d. uniform draws from
    /// `[lower, upper]`, then computes the transpose.
    pub fn make_random_with_in<R: Rng + ?Sized>(
        allocator: &'a A,
        rng: &mut R,
        lower: T,
        upper: T,
    ) -> Result<Self> {
        let invalid = || MatmulError::InvalidBounds {
            lower: lower.to_string(),
            upper: upper.to_string(),
        };
        if lower > upper {
            return Err(invalid());
        }
        let dist = Uniform::new_inclusive(lower, upper).map_err(|_| invalid())?;

        let mut matrix = Self::new_in(allocator)?;
        let data = matrix.data_mut();
        for y in 0..N {
            for value in &mut data[Dim::<N>::index(0, y)..Dim::<N>::index(N, y)] {
                *value = dist.sample(rng);
            }
        }
        matrix.compute_transpose();
        Ok(matrix)
    }

    pub fn from_slice_in(allocator: &'a A, values: &[T]) -> Result<Self> {
        if values.len() != N * N {
            return Err(MatmulError::DimensionMismatch {
                expected: N * N,
                actual: values.len(),
            });
        }

        let mut matrix = Self::new_in(allocator)?;
        let data = matrix.data_mut();
        for (y, row) in values.chunks_exact(N).enumerate() {
            data[Dim::<N>::index(0, y)..Dim::<N>::index(N, y)].copy_from_slice(row);
        }
        matrix.compute_transpose();
        Ok(matrix)
    }

    pub fn from_fn_in<F: FnMut(usize, usize) -> T>(allocator: &'a A, mut f: F) -> Result<Self> {
        let mut matrix = Self::new_in(allocator)?;
        let data = matrix.data_mut();
        for y in 0..N {
            for x in 0..N {
                data[Dim::<N>::index(x, y)] = f(x, y);
            }
        }
        matrix.compute_transpose();
        Ok(matrix)
    }

    /// Element at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is not below `N`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self[(x, y)]
    }

    /// Padded edge length `W`, the row stride of both buffers.
    pub const fn width(&self) -> usize {
        Dim::<N>::WIDTH
    }

    /// The whole primary buffer, padding included.
    pub fn data(&self) -> &[T] {
        // SAFETY: the buffer holds LEN initialized elements for the life of `self`.
        unsafe { slice::from_raw_parts(self.primary.as_ptr(), Dim::<N>::LEN) }
    }

    /// The whole transposed buffer, padding included. May be stale, see
    /// [`has_fresh_transpose`](Self::has_fresh_transpose).
    pub fn data_transposed(&self) -> &[T] {
        // SAFETY: as in `data`.
        unsafe { slice::from_raw_parts(self.transposed.as_ptr(), Dim::<N>::LEN) }
    }

    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        // SAFETY: as in `data`; `&mut self` makes the borrow unique.
        unsafe { slice::from_raw_parts_mut(self.primary.as_ptr(), Dim::<N>::LEN) }
    }

    /// Logical row `y` of the primary buffer.
    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < N, "row {y} out of range for a {N}x{N} matrix");
        &self.data()[Dim::<N>::index(0, y)..Dim::<N>::index(N, y)]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..N).map(move |y| self.row(y))
    }

    pub fn has_fresh_transpose(&self) -> bool {
        self.fresh_transpose
    }

    /// Rebuilds the transposed shadow from the primary buffer.
    ///
    /// Walks the upper triangle once and writes both mirrored entries.
    pub fn compute_transpose(&mut self) {
        // SAFETY: the buffers are distinct allocations of LEN elements each.
        let (primary, transposed) = unsafe {
            (
                slice::from_raw_parts(self.primary.as_ptr(), Dim::<N>::LEN),
                slice::from_raw_parts_mut(self.transposed.as_ptr(), Dim::<N>::LEN),
            )
        };

        for y in 0..N {
            for x in y..N {
                transposed[Dim::<N>::index(x, y)] = primary[Dim::<N>::index(y, x)];
                transposed[Dim::<N>::index(y, x)] = primary[Dim::<N>::index(x, y)];
            }
        }
        self.fresh_transpose = true;
    }

    /// A new matrix holding the transpose, from the same allocator.
    pub fn transpose(&self) -> Result<SquareMatrix<'a, T, N, A>> {
        let mut result = Self::new_in(self.allocator)?;
        let data = result.data_mut();
        for (y, row) in self.rows().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                data[Dim::<N>::index(y, x)] = value;
            }
        }
        result.compute_transpose();
        Ok(result)
    }

    /// `out = self × other` computed by `strategy`.
    ///
    /// `out` is zeroed first, padding included, and its transposed shadow
    /// is left stale. Strategies that read `other`'s shadow fail with
    /// [`MatmulError::StaleTranspose`] if it is stale.
    pub fn multiply<B: MatrixAllocator, C: MatrixAllocator>(
        &self,
        other: &SquareMatrix<'_, T, N, B>,
        out: &mut SquareMatrix<'_, T, N, C>,
        strategy: Strategy,
    ) -> Result<()> {
        if strategy.reads_transposed() && !other.fresh_transpose {
            log::warn!(
                "{strategy} on a {N}x{N} operand with a stale transposed copy"
            );
            return Err(MatmulError::StaleTranspose {
                strategy: strategy.name(),
            });
        }

        out.fresh_transpose = false;
        let c = out.data_mut();
        c.fill(T::zero());

        let a = self.data();
        let (b, bt) = (other.data(), other.data_transposed());
        // SAFETY: the build script only sets a backend cfg after detecting
        // that feature on the host CPU, and the vectorized strategies only
        // enable the feature of that backend.
        unsafe {
            match strategy {
                Strategy::Naive => naive::multiply::<T, N>(a, b, c),
                Strategy::Transposed => transposed::multiply::<T, N>(a, bt, c),
                Strategy::TransposedVectorized => transposed::multiply_vectorized::<T, N>(a, bt, c),
                Strategy::Tiled => tiled::multiply::<T, N>(a, bt, c),
                Strategy::TiledVectorized => tiled::multiply_vectorized::<T, N>(a, b, c),
                Strategy::TiledPrefetch => tiled::multiply_prefetch::<T, N>(a, b, c),
                Strategy::TiledRegisterBlocked => tiled::multiply_register_blocked::<T, N>(a, b, c),
            }
        }
        Ok(())
    }

    /// [`multiply`](Self::multiply) with [`Strategy::default`].
    pub fn multiply_default<B: MatrixAllocator, C: MatrixAllocator>(
        &self,
        other: &SquareMatrix<'_, T, N, B>,
        out: &mut SquareMatrix<'_, T, N, C>,
    ) -> Result<()> {
        self.multiply(other, out, Strategy::default())
    }

    /// Writes the logical grid to stdout.
    pub fn print(&self) {
        print!("{self}");
    }
}

/// # Safety
///
/// `ptr` must be valid for writes of `len` elements.
unsafe fn fill_zero<T: Element>(ptr: NonNull<T>, len: usize) {
    for i in 0..len {
        ptr.as_ptr().add(i).write(T::zero());
    }
}

impl<T: Element, const N: usize, A: MatrixAllocator> Drop for SquareMatrix<'_, T, N, A> {
    fn drop(&mut self) {
        // SAFETY: both buffers came from this allocator with LEN elements;
        // released in reverse order of allocation.
        unsafe {
            self.allocator.deallocate(self.transposed, Dim::<N>::LEN);
            self.allocator.deallocate(self.primary, Dim::<N>::LEN);
        }
    }
}

impl<T: Element, const N: usize, A: MatrixAllocator> Index<(usize, usize)>
    for SquareMatrix<'_, T, N, A>
{
    type Output = T;

    /// Indexed by `(x, y)`: column, then row.
    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &T {
        assert!(
            x < N && y < N,
            "index ({x}, {y}) out of range for a {N}x{N} matrix"
        );
        &self.data()[Dim::<N>::index(x, y)]
    }
}

impl<T, const N: usize, A, B> PartialEq<SquareMatrix<'_, T, N, B>> for SquareMatrix<'_, T, N, A>
where
    T: Element,
    A: MatrixAllocator,
    B: MatrixAllocator,
{
    /// Compares the logical region only.
    fn eq(&self, other: &SquareMatrix<'_, T, N, B>) -> bool {
        self.rows().zip(other.rows()).all(|(lhs, rhs)| lhs == rhs)
    }
}

impl<T: Element, const N: usize, A: MatrixAllocator> Eq for SquareMatrix<'_, T, N, A> {}

impl<T: Element, const N: usize, A: MatrixAllocator> fmt::Display for SquareMatrix<'_, T, N, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for value in row {
                write!(f, "{value:5} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<T: Element, const N: usize, A: MatrixAllocator> fmt::Debug for SquareMatrix<'_, T, N, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SquareMatrix")
            .field("size", &N)
            .field("width", &Dim::<N>::WIDTH)
            .field("fresh_transpose", &self.fresh_transpose)
            .field("rows", &self.rows().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_width() {
        assert_eq!(Dim::<4>::WIDTH, 48);
        assert_eq!(Dim::<48>::WIDTH, 48);
        assert_eq!(Dim::<52>::WIDTH, 96);
        assert_eq!(Dim::<256>::WIDTH, 288);
        assert_eq!(Dim::<8>::LEN, 48 * 48);
        assert_eq!(Dim::<8>::index(3, 2), 2 * 48 + 3);
    }

    #[test]
    fn test_new_is_zero_with_fresh_shadow() {
        let m = SquareMatrix::<i32, 12>::new();
        assert!(m.data().iter().all(|&v| v == 0));
        assert!(m.data_transposed().iter().all(|&v| v == 0));
        assert!(m.has_fresh_transpose());
        assert_eq!(m.width(), 48);
    }

    #[test]
    fn test_shadow_mirrors_primary() {
        let m = SquareMatrix::<i32, 8>::from_fn(|x, y| (y * 8 + x) as i32);
        let w = m.width();
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(m.data_transposed()[y * w + x], m.data()[x * w + y]);
            }
        }
    }

    #[test]
    fn test_random_fill_keeps_padding_zero() {
        let m = SquareMatrix::<i32, 20>::make_random(1, 9).unwrap();
        let w = m.width();
        for y in 0..w {
            for x in 0..w {
                let (p, t) = (m.data()[y * w + x], m.data_transposed()[y * w + x]);
                if x < 20 && y < 20 {
                    assert!((1..=9).contains(&p));
                } else {
                    assert_eq!((p, t), (0, 0));
                }
            }
        }
    }

    #[test]
    fn test_multiply_marks_output_stale() {
        let a = SquareMatrix::<i32, 4>::from_fn(|x, y| (x + y) as i32);
        let mut out = SquareMatrix::<i32, 4>::new();
        a.multiply(&a, &mut out, Strategy::Naive).unwrap();
        assert!(!out.has_fresh_transpose());

        let mut next = SquareMatrix::<i32, 4>::new();
        let err = a.multiply(&out, &mut next, Strategy::Transposed).unwrap_err();
        assert_eq!(
            err,
            MatmulError::StaleTranspose {
                strategy: "TRANSPOSED"
            }
        );

        // Strategies reading the primary buffer accept a stale shadow.
        a.multiply(&out, &mut next, Strategy::TiledVectorized).unwrap();
    }

    #[test]
    fn test_debug_lists_rows() {
        let m = SquareMatrix::<u8, 4>::from_fn(|x, _| x as u8);
        let debug = format!("{m:?}");
        assert!(debug.starts_with("SquareMatrix { size: 4, width: 48"));
        assert!(debug.contains("[0, 1, 2, 3]"));
    }
}
