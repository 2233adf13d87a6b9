//! # squaremat
//!
//! Fixed-size square matrix multiplication with seven interchangeable
//! strategies, from the textbook triple loop to a cache-tiled,
//! register-blocked SIMD kernel, over storage that can live in a huge-page
//! bump arena.
//!
//! ```
//! use squaremat::{SquareMatrix, Strategy};
//!
//! let a = SquareMatrix::<i32, 64>::make_random(0, 9)?;
//! let b = SquareMatrix::<i32, 64>::make_random(0, 9)?;
//!
//! let mut expected = SquareMatrix::<i32, 64>::new();
//! let mut actual = SquareMatrix::<i32, 64>::new();
//! a.multiply(&b, &mut expected, Strategy::Naive)?;
//! a.multiply(&b, &mut actual, Strategy::TiledRegisterBlocked)?;
//! assert_eq!(expected, actual);
//! # Ok::<(), squaremat::MatmulError>(())
//! ```

pub mod element;
pub mod error;
pub mod matrix;
pub mod memory;
pub mod simd;
pub mod validate;

pub use element::Element;
pub use error::{MatmulError, Result};
pub use matrix::{Dim, SquareMatrix, Strategy};
pub use memory::{AlignedAllocator, HugePagePool, MatrixAllocator, PoolConfig};

/// Block edge of the TILED, TILED_VECTORIZED and TILED_PREFETCH strategies.
pub const TILE: usize = 32;

/// Output rows held in registers by the TILED_VECTORIZED kernel.
pub const VECTOR_ROWS: usize = 4;

/// Block edge of the TILED_REGISTER_BLOCKED strategy. Matrix storage is
/// padded to a multiple of it.
pub const REGISTER_TILE: usize = 48;

/// Output rows per register-blocked micro tile.
pub const REGISTER_ROWS: usize = 6;

/// Lane vectors (column groups) per register-blocked micro tile.
pub const REGISTER_COLS: usize = 2;
