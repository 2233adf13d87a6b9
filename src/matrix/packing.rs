//! Tile packing.
//!
//! A packed tile is a small `S × S` copy of a rectangular block of a matrix
//! buffer, stored contiguously and cache-line aligned. Packing always clears
//! the whole tile first, so a partial block at the matrix edge reads as zero
//! outside its limits and contributes nothing to a dot product.
//!
//! The memory layout of a tile packed from rows `r0..r0+rows` and columns
//! `c0..c0+cols` of a buffer `m` with row stride `w`:
//!
//! ```text
//! data[0]   = [ m[r0][c0], m[r0][c0+1], ..., m[r0][c0+cols-1], 0, ..., 0 ]  (S elements)
//! data[1]   = [ m[r0+1][c0], ...                                          ]
//! ...
//! data[S-1] = [ 0, ..., 0 ]   (rows past `rows` stay zero)
//! ```

use crate::element::Element;
use crate::simd::prefetch::{prefetch_l2, prefetch_span_l1};

/// An `S × S` row-major scratch tile, aligned for vector loads.
#[repr(C, align(64))]
pub struct PackedTile<T, const S: usize> {
    pub data: [[T; S]; S],
}

impl<T: Element, const S: usize> PackedTile<T, S> {
    pub fn zeroed() -> Self {
        PackedTile {
            data: [[T::zero(); S]; S],
        }
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        for row in self.data.iter_mut() {
            row.fill(T::zero());
        }
    }

    /// Pointer to element `(row, col)`; used by the vector kernels.
    #[inline(always)]
    pub fn ptr_at(&self, row: usize, col: usize) -> *const T {
        self.data[row][col..].as_ptr()
    }
}

/// Describes the block of the source buffer to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub row_offset: usize,
    pub col_offset: usize,
    pub rows: usize,
    pub cols: usize,
}

/// Copies `block` of `src` (row stride `width`) into `pack`, zero-padding
/// the rest of the tile.
#[inline(always)]
pub fn pack_tile<T: Element, const S: usize>(
    src: &[T],
    width: usize,
    block: Block,
    pack: &mut PackedTile<T, S>,
) {
    debug_assert!(block.rows <= S && block.cols <= S);

    pack.clear();
    for row in 0..block.rows {
        let start = (block.row_offset + row) * width + block.col_offset;
        pack.data[row][..block.cols].copy_from_slice(&src[start..start + block.cols]);
    }
}

/// [`pack_tile`] that also hints the next source row into L1 while the
/// current one is copied.
#[inline(always)]
pub fn pack_tile_prefetched<T: Element, const S: usize>(
    src: &[T],
    width: usize,
    block: Block,
    pack: &mut PackedTile<T, S>,
) {
    debug_assert!(block.rows <= S && block.cols <= S);

    pack.clear();
    for row in 0..block.rows {
        let start = (block.row_offset + row) * width + block.col_offset;
        prefetch_span_l1(src.as_ptr().wrapping_add(start + width), block.cols);
        pack.data[row][..block.cols].copy_from_slice(&src[start..start + block.cols]);
    }
}

/// Hints the first row of the block at (`row`, `col`) into L2, ahead of the
/// packing call that will need it.
#[inline(always)]
pub fn prefetch_block<T>(src: &[T], width: usize, row: usize, col: usize) {
    prefetch_l2(src.as_ptr().wrapping_add(row * width + col));
}
