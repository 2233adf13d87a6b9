/// A fixed-width vector of `T` lanes.
///
/// Implemented by the native instruction-set vectors (AVX2, SSE4.1, NEON)
/// and by [`Portable`](crate::simd::portable::Portable), which runs the same
/// algorithm on a plain array. All arithmetic is wrapping so that every
/// implementation produces bit-identical results for integer lanes.
pub trait SimdLanes<T>: Copy {
    /// Number of `T` values held by one vector.
    const LANES: usize;

    /// Returns a vector with every lane set to zero.
    ///
    /// # Safety
    ///
    /// The instruction set backing the implementation must be available.
    unsafe fn zeros() -> Self;

    /// Broadcasts `value` into every lane.
    ///
    /// # Safety
    ///
    /// The instruction set backing the implementation must be available.
    unsafe fn splat(value: T) -> Self;

    /// Loads `LANES` consecutive values starting at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `LANES` elements. No alignment is
    /// required.
    unsafe fn load(ptr: *const T) -> Self;

    /// Stores all lanes to `LANES` consecutive slots starting at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of `LANES` elements. No alignment is
    /// required.
    unsafe fn store(self, ptr: *mut T);

    /// Returns `self + a * b` lane by lane, wrapping on overflow.
    ///
    /// # Safety
    ///
    /// The instruction set backing the implementation must be available.
    unsafe fn mul_add(self, a: Self, b: Self) -> Self;

    /// Horizontal wrapping sum of all lanes.
    ///
    /// # Safety
    ///
    /// The instruction set backing the implementation must be available.
    unsafe fn reduce_sum(self) -> T;
}
