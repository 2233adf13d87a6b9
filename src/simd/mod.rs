//! Lane vectors used by the vectorized kernels.
//!
//! Exactly one of the cfgs `avx2`, `sse`, `neon` or `fallback` is set by the
//! build script. [`NativeI32`] names the vector type `i32` matrices use under
//! that cfg; every other element type goes through [`portable::Portable`].

#[cfg(all(avx2, any(target_arch = "x86", target_arch = "x86_64")))]
pub mod avx2;

#[cfg(all(sse, any(target_arch = "x86", target_arch = "x86_64")))]
pub mod sse;

#[cfg(all(neon, target_arch = "aarch64"))]
pub mod neon;

pub mod portable;
pub mod prefetch;
pub mod traits;

pub use traits::SimdLanes;

/// Lane count of the portable vector.
pub const PORTABLE_LANES: usize = 8;

#[cfg(all(avx2, any(target_arch = "x86", target_arch = "x86_64")))]
pub type NativeI32 = avx2::i32x8::I32x8;

#[cfg(all(sse, any(target_arch = "x86", target_arch = "x86_64")))]
pub type NativeI32 = sse::i32x4::I32x4;

#[cfg(all(neon, target_arch = "aarch64"))]
pub type NativeI32 = neon::i32x4::I32x4;

#[cfg(not(any(
    all(avx2, any(target_arch = "x86", target_arch = "x86_64")),
    all(sse, any(target_arch = "x86", target_arch = "x86_64")),
    all(neon, target_arch = "aarch64")
)))]
pub type NativeI32 = portable::Portable<i32, PORTABLE_LANES>;

/// Name of the backend selected at build time, for reports.
pub const fn backend_name() -> &'static str {
    if cfg!(all(avx2, any(target_arch = "x86", target_arch = "x86_64"))) {
        "avx2"
    } else if cfg!(all(sse, any(target_arch = "x86", target_arch = "x86_64"))) {
        "sse4.1"
    } else if cfg!(all(neon, target_arch = "aarch64")) {
        "neon"
    } else {
        "portable"
    }
}
