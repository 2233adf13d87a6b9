//! AVX2 SIMD implementations for 256-bit integer vector operations.
//!
//! # Architecture Requirements
//!
//! - **CPU Support**: Intel Haswell (2013+) or AMD Excavator (2015+)
//! - **Target Architecture**: x86 or x86_64
//! - **Compilation**: best compiled with `-C target-feature=+avx2` so the
//!   intrinsics inline into the kernels
//! - **Runtime Detection**: the build script enables this module only when
//!   the build machine reports AVX2
//!
//! # Available Types
//!
//! - [`i32x8::I32x8`]: 8 packed 32-bit integers, the lane vector used by
//!   `i32` matrices.

pub mod i32x8;
