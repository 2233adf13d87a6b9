//! Cache-blocked strategies.
//!
//! All four walk output row blocks `i`, then k-blocks, then output column
//! blocks `j`, packing one tile of each operand per step and handing the
//! pair to a microkernel. Blocks at the matrix edge are partial; packing
//! zero-pads them to a full tile.

use std::cmp::min;

use crate::element::Element;
use crate::matrix::kernels::{register_blocked_kernel, scalar_kernel, vector_kernel};
use crate::matrix::packing::{pack_tile, pack_tile_prefetched, prefetch_block, Block, PackedTile};
use crate::matrix::Dim;
use crate::{REGISTER_TILE, TILE};

#[inline(always)]
fn block(row_offset: usize, col_offset: usize, rows: usize, cols: usize) -> Block {
    Block {
        row_offset,
        col_offset,
        rows,
        cols,
    }
}

/// Packs tiles of `a` and `bᵀ` and reduces them with the scalar kernel.
pub(crate) fn multiply<T: Element, const N: usize>(a: &[T], bt: &[T], c: &mut [T]) {
    let w = Dim::<N>::WIDTH;
    let mut a_pack = PackedTile::<T, TILE>::zeroed();
    let mut bt_pack = PackedTile::<T, TILE>::zeroed();

    for i in (0..N).step_by(TILE) {
        let rows = min(TILE, N - i);
        for k in (0..N).step_by(TILE) {
            let depth = min(TILE, N - k);
            pack_tile(a, w, block(i, k, rows, depth), &mut a_pack);

            for j in (0..N).step_by(TILE) {
                let cols = min(TILE, N - j);
                pack_tile(bt, w, block(j, k, cols, depth), &mut bt_pack);
                scalar_kernel(&a_pack, &bt_pack, c, w, block(i, j, rows, cols));
            }
        }
    }
}

/// Packs `b` directly, row by k, and keeps four output rows in vectors.
///
/// # Safety
///
/// The CPU must support the lane backend the build script selected.
#[cfg_attr(avx2, target_feature(enable = "avx2"))]
#[cfg_attr(sse, target_feature(enable = "sse4.1"))]
#[cfg_attr(neon, target_feature(enable = "neon"))]
pub(crate) unsafe fn multiply_vectorized<T: Element, const N: usize>(
    a: &[T],
    b: &[T],
    c: &mut [T],
) {
    let w = Dim::<N>::WIDTH;
    let mut a_pack = PackedTile::<T, TILE>::zeroed();
    let mut b_pack = PackedTile::<T, TILE>::zeroed();

    for i in (0..N).step_by(TILE) {
        let rows = min(TILE, N - i);
        for k in (0..N).step_by(TILE) {
            let depth = min(TILE, N - k);
            pack_tile(a, w, block(i, k, rows, depth), &mut a_pack);

            for j in (0..N).step_by(TILE) {
                let cols = min(TILE, N - j);
                pack_tile(b, w, block(k, j, depth, cols), &mut b_pack);
                vector_kernel(&a_pack, &b_pack, c, w, block(i, j, rows, cols));
            }
        }
    }
}

/// [`multiply_vectorized`] with prefetch hints: the next column block of `b`
/// goes to L2 before the current one is packed, and packing hints each next
/// source row into L1.
///
/// # Safety
///
/// The CPU must support the lane backend the build script selected.
#[cfg_attr(avx2, target_feature(enable = "avx2"))]
#[cfg_attr(sse, target_feature(enable = "sse4.1"))]
#[cfg_attr(neon, target_feature(enable = "neon"))]
pub(crate) unsafe fn multiply_prefetch<T: Element, const N: usize>(
    a: &[T],
    b: &[T],
    c: &mut [T],
) {
    let w = Dim::<N>::WIDTH;
    let mut a_pack = PackedTile::<T, TILE>::zeroed();
    let mut b_pack = PackedTile::<T, TILE>::zeroed();

    for i in (0..N).step_by(TILE) {
        let rows = min(TILE, N - i);
        for k in (0..N).step_by(TILE) {
            let depth = min(TILE, N - k);
            pack_tile_prefetched(a, w, block(i, k, rows, depth), &mut a_pack);

            for j in (0..N).step_by(TILE) {
                let cols = min(TILE, N - j);
                prefetch_block(b, w, k, j + TILE);
                pack_tile_prefetched(b, w, block(k, j, depth, cols), &mut b_pack);
                vector_kernel(&a_pack, &b_pack, c, w, block(i, j, rows, cols));
            }
        }
    }
}

/// 48-wide tiles reduced by the 6 × 2-vector register kernel.
///
/// # Safety
///
/// The CPU must support the lane backend the build script selected.
#[cfg_attr(avx2, target_feature(enable = "avx2"))]
#[cfg_attr(sse, target_feature(enable = "sse4.1"))]
#[cfg_attr(neon, target_feature(enable = "neon"))]
pub(crate) unsafe fn multiply_register_blocked<T: Element, const N: usize>(
    a: &[T],
    b: &[T],
    c: &mut [T],
) {
    let w = Dim::<N>::WIDTH;
    let mut a_pack = PackedTile::<T, REGISTER_TILE>::zeroed();
    let mut b_pack = PackedTile::<T, REGISTER_TILE>::zeroed();

    for i in (0..N).step_by(REGISTER_TILE) {
        let rows = min(REGISTER_TILE, N - i);
        for k in (0..N).step_by(REGISTER_TILE) {
            let depth = min(REGISTER_TILE, N - k);
            pack_tile(a, w, block(i, k, rows, depth), &mut a_pack);

            for j in (0..N).step_by(REGISTER_TILE) {
                let cols = min(REGISTER_TILE, N - j);
                pack_tile(b, w, block(k, j, depth, cols), &mut b_pack);
                register_blocked_kernel(&a_pack, &b_pack, c, w, block(i, j, rows, cols));
            }
        }
    }
}
