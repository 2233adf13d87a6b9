//! SSE4.1 SIMD implementations for 128-bit integer vector operations.
//!
//! SSE4.1 is the oldest x86 extension with a 32-bit lane multiply
//! (`_mm_mullo_epi32`), so plain SSE2 machines use the portable fallback.

pub mod i32x4;
