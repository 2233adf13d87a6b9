//! Microkernels that accumulate the product of two packed tiles into the
//! output buffer.
//!
//! Every kernel adds into `c`; callers zero the output once before the first
//! k-block. The output block is described by a [`Block`] in output
//! coordinates, and `width` is the row stride of `c`.
//!
//! The vector kernels round the block's column count up to whole vectors and
//! the register kernel also rounds its row count up to whole micro tiles. The
//! extra lanes land in the zero padding of the output buffer and only ever
//! receive products with zero-padded tile entries, so padding stays zero.

use crate::element::{Element, LaneCheck};
use crate::matrix::packing::{Block, PackedTile};
use crate::simd::SimdLanes;
use crate::{REGISTER_COLS, REGISTER_ROWS, REGISTER_TILE, TILE, VECTOR_ROWS};

const _: () = assert!(REGISTER_TILE % REGISTER_ROWS == 0);
const _: () = assert!(TILE % VECTOR_ROWS == 0);

#[inline(always)]
fn round_up(value: usize, multiple: usize) -> usize {
    value.div_ceil(multiple) * multiple
}

/// Panics unless the `rows × cols` window at `block`'s origin fits in `c`.
#[inline(always)]
fn check_window<T>(c: &[T], width: usize, block: Block, rows: usize, cols: usize) {
    assert!(
        block.col_offset + cols <= width && (block.row_offset + rows) * width <= c.len(),
        "output window {rows}x{cols} at ({}, {}) exceeds buffer of width {width}",
        block.row_offset,
        block.col_offset,
    );
}

/// `C[r][c] += Σ_k a[r][k] * bt[c][k]`, both tiles indexed by `k` along
/// their rows.
pub(crate) fn scalar_kernel<T: Element>(
    a_pack: &PackedTile<T, TILE>,
    bt_pack: &PackedTile<T, TILE>,
    c: &mut [T],
    width: usize,
    block: Block,
) {
    for row in 0..block.rows {
        let a_row = &a_pack.data[row];
        let base = (block.row_offset + row) * width + block.col_offset;
        for col in 0..block.cols {
            let sum = a_row
                .iter()
                .zip(&bt_pack.data[col])
                .fold(T::zero(), |sum, (&p, &q)| T::mul_add(sum, p, q));
            c[base + col] = c[base + col].wrapping_add(&sum);
        }
    }
}

/// Holds [`VECTOR_ROWS`] output rows of one vector each in registers while
/// streaming rows of the packed `b` tile.
///
/// # Safety
///
/// The CPU must support the lane backend the build script selected.
#[cfg_attr(avx2, target_feature(enable = "avx2"))]
#[cfg_attr(sse, target_feature(enable = "sse4.1"))]
#[cfg_attr(neon, target_feature(enable = "neon"))]
pub(crate) unsafe fn vector_kernel<T: Element>(
    a_pack: &PackedTile<T, TILE>,
    b_pack: &PackedTile<T, TILE>,
    c: &mut [T],
    width: usize,
    block: Block,
) {
    let lanes = LaneCheck::<T>::LANES;
    let rows = round_up(block.rows, VECTOR_ROWS);
    let cols = round_up(block.cols, lanes);
    check_window(c, width, block, rows, cols);
    let c_ptr = c.as_mut_ptr();

    for row in (0..rows).step_by(VECTOR_ROWS) {
        for col in (0..cols).step_by(lanes) {
            let origin = (block.row_offset + row) * width + block.col_offset + col;

            // SAFETY: the window check covers every `origin + i * width` for
            // i < VECTOR_ROWS, and `col + lanes <= TILE` keeps tile reads in
            // bounds because lanes divide TILE.
            unsafe {
                let mut acc = [<T::Lanes as SimdLanes<T>>::zeros(); VECTOR_ROWS];
                for (i, slot) in acc.iter_mut().enumerate() {
                    *slot = <T::Lanes as SimdLanes<T>>::load(c_ptr.add(origin + i * width));
                }

                for k in 0..TILE {
                    let b = <T::Lanes as SimdLanes<T>>::load(b_pack.ptr_at(k, col));
                    for (i, slot) in acc.iter_mut().enumerate() {
                        let a = <T::Lanes as SimdLanes<T>>::splat(a_pack.data[row + i][k]);
                        *slot = slot.mul_add(a, b);
                    }
                }

                for (i, slot) in acc.into_iter().enumerate() {
                    slot.store(c_ptr.add(origin + i * width));
                }
            }
        }
    }
}

/// [`REGISTER_ROWS`] × [`REGISTER_COLS`] vectors of output accumulated in
/// registers across a whole [`REGISTER_TILE`] k-block; `C` is loaded and
/// stored once per micro tile.
///
/// # Safety
///
/// The CPU must support the lane backend the build script selected.
#[cfg_attr(avx2, target_feature(enable = "avx2"))]
#[cfg_attr(sse, target_feature(enable = "sse4.1"))]
#[cfg_attr(neon, target_feature(enable = "neon"))]
pub(crate) unsafe fn register_blocked_kernel<T: Element>(
    a_pack: &PackedTile<T, REGISTER_TILE>,
    b_pack: &PackedTile<T, REGISTER_TILE>,
    c: &mut [T],
    width: usize,
    block: Block,
) {
    let lanes = LaneCheck::<T>::LANES;
    let step = REGISTER_COLS * lanes;
    let rows = round_up(block.rows, REGISTER_ROWS);
    let cols = round_up(block.cols, step);
    check_window(c, width, block, rows, cols);
    let c_ptr = c.as_mut_ptr();

    for row in (0..rows).step_by(REGISTER_ROWS) {
        for col in (0..cols).step_by(step) {
            let origin = (block.row_offset + row) * width + block.col_offset + col;

            // SAFETY: the window check covers the micro tile; `rows` and
            // `cols` never exceed REGISTER_TILE since REGISTER_ROWS and
            // `step` both divide it.
            unsafe {
                let mut acc = [[<T::Lanes as SimdLanes<T>>::zeros(); REGISTER_COLS]; REGISTER_ROWS];
                for (i, acc_row) in acc.iter_mut().enumerate() {
                    for (j, slot) in acc_row.iter_mut().enumerate() {
                        *slot = <T::Lanes as SimdLanes<T>>::load(
                            c_ptr.add(origin + i * width + j * lanes),
                        );
                    }
                }

                for k in 0..REGISTER_TILE {
                    let mut b = [<T::Lanes as SimdLanes<T>>::zeros(); REGISTER_COLS];
                    for (j, slot) in b.iter_mut().enumerate() {
                        *slot = <T::Lanes as SimdLanes<T>>::load(b_pack.ptr_at(k, col + j * lanes));
                    }
                    for (i, acc_row) in acc.iter_mut().enumerate() {
                        let a = <T::Lanes as SimdLanes<T>>::splat(a_pack.data[row + i][k]);
                        for (slot, &bv) in acc_row.iter_mut().zip(&b) {
                            *slot = slot.mul_add(a, bv);
                        }
                    }
                }

                for (i, acc_row) in acc.into_iter().enumerate() {
                    for (j, slot) in acc_row.into_iter().enumerate() {
                        slot.store(c_ptr.add(origin + i * width + j * lanes));
                    }
                }
            }
        }
    }
}
