//! Portable vector-tile gather
//!
//! Builds one `[f64; L]` tile per field from `L` scalar loads and stores it
//! with a single contiguous copy. The compiler lowers the tile to vector
//! registers; no ISA-specific gather instruction is issued.

use super::scalar::gather_range;
use super::{GatherOutput, GatherStrategy, RawGather};
use crate::dataset::Records;
use std::hint::black_box;

/// Compiler-level vector loads, `L` indices per step (4 or 8)
#[derive(Copy, Clone, Debug, Default)]
pub struct VectorLoad<const L: usize>;

/// # Safety
/// Same contract as [`gather_range`].
#[inline(always)]
unsafe fn gather_tiles<const L: usize, const STORE: bool>(g: RawGather) {
    let chunks = g.len / L;

    for c in 0..chunks {
        let offset = c * L;
        let records: [*const f64; L] =
            std::array::from_fn(|l| g.src.add(*g.idx.add(offset + l) as usize * g.record_stride));

        for d in 0..g.dims {
            let field = d * g.field_stride;
            let tile: [f64; L] = std::array::from_fn(|l| *records[l].add(field));
            if STORE {
                let dst = g.out.add(d * g.out_stride + offset);
                std::ptr::copy_nonoverlapping(tile.as_ptr(), dst, L);
            } else {
                black_box(tile);
            }
        }
    }

    // Handle remainder with scalar
    gather_range::<STORE>(g, chunks * L);
}

impl<const L: usize> GatherStrategy for VectorLoad<L> {
    fn name(&self) -> &'static str {
        "vector"
    }

    fn lanes(&self) -> usize {
        L
    }

    unsafe fn gather(
        &self,
        src: &Records,
        idx: &[i32],
        dst: Option<&mut GatherOutput>,
        cursor: usize,
    ) -> usize {
        let g = RawGather::new(src, idx, dst, cursor);
        if g.stores() {
            gather_tiles::<L, true>(g);
        } else {
            gather_tiles::<L, false>(g);
        }
        idx.len()
    }
}
