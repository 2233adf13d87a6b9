//! Element types a [`SquareMatrix`](crate::SquareMatrix) can hold.
//!
//! Only exact integer types qualify: every strategy has to agree with the
//! naive product bit for bit, which rounding arithmetic cannot promise.

use std::fmt::{Debug, Display};
use std::marker::PhantomData;

use num::traits::{WrappingAdd, WrappingMul, Zero};
use rand::distr::uniform::SampleUniform;

use crate::simd::portable::Portable;
use crate::simd::{NativeI32, SimdLanes, PORTABLE_LANES};
use crate::{REGISTER_COLS, REGISTER_TILE, TILE, VECTOR_ROWS};

/// An exact integer element with an associated lane vector.
pub trait Element:
    Copy
    + Default
    + Debug
    + Display
    + PartialEq
    + Eq
    + PartialOrd
    + Zero
    + WrappingAdd
    + WrappingMul
    + SampleUniform
    + Send
    + Sync
    + 'static
{
    /// Vector type used by the vectorized kernels for this element.
    type Lanes: SimdLanes<Self>;

    /// `acc + a * b`, wrapping on overflow like the vector path.
    #[inline(always)]
    fn mul_add(acc: Self, a: Self, b: Self) -> Self {
        acc.wrapping_add(&a.wrapping_mul(&b))
    }
}

impl Element for i32 {
    type Lanes = NativeI32;
}

macro_rules! portable_element {
    ($($t:ty),+ $(,)?) => {
        $(
            impl Element for $t {
                type Lanes = Portable<$t, PORTABLE_LANES>;
            }
        )+
    };
}

portable_element!(i8, i16, i64, u8, u16, u32, u64);

/// Compile-time check that `T`'s lane width fits the tile geometry.
pub(crate) struct LaneCheck<T>(PhantomData<T>);

impl<T: Element> LaneCheck<T> {
    pub(crate) const LANES: usize = <T::Lanes as SimdLanes<T>>::LANES;

    pub(crate) const VALID: () = assert!(
        TILE % Self::LANES == 0
            && TILE % VECTOR_ROWS == 0
            && REGISTER_TILE % (REGISTER_COLS * Self::LANES) == 0,
        "lane width must divide the tile and register-tile widths"
    );
}
