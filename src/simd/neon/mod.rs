//! ARM NEON SIMD implementations for 128-bit integer vector operations.
//!
//! # Architecture Requirements
//!
//! - **CPU Support**: any AArch64 processor (Apple Silicon, AWS Graviton, ...)
//! - **Target Architecture**: AArch64 only; the horizontal add `vaddvq_s32`
//!   has no ARMv7 equivalent
//! - **Runtime Detection**: the build script enables this module when the
//!   build machine reports `asimd`/`neon`

pub mod i32x4;
