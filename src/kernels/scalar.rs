//! Scalar gather kernels
//!
//! [`gather_range`] is the single scalar loop every other kernel falls back
//! to for its remainder. [`gather_traced`] is the bounds-checked variant used
//! when a memory-access tracer is attached.

use super::{GatherOutput, GatherStrategy, RawGather, validate_indices};
use crate::dataset::Records;
use crate::error::Result;
use crate::trace::tracer::{AccessOp, AccessTracer};
use std::hint::black_box;

/// Gather positions `[start, g.len)` one scalar at a time
///
/// # Safety
/// - `g.idx` valid for `g.len` reads, every index addressing a record of `g.src`
/// - with `STORE`, `g.out` valid for `d * g.out_stride + j` writes for all
///   `d < g.dims`, `j < g.len`
#[inline(always)]
pub(crate) unsafe fn gather_range<const STORE: bool>(g: RawGather, start: usize) {
    for j in start..g.len {
        let record = g.src.add(*g.idx.add(j) as usize * g.record_stride);
        for d in 0..g.dims {
            let v = *record.add(d * g.field_stride);
            if STORE {
                *g.out.add(d * g.out_stride + j) = v;
            } else {
                black_box(v);
            }
        }
    }
}

/// One load per field per index, no vector instructions
#[derive(Copy, Clone, Debug)]
pub struct ScalarLoad {
    lanes: usize,
}

impl ScalarLoad {
    /// Scalar kernel reported against a `lanes`-wide vector family
    pub fn new(lanes: usize) -> Self {
        Self { lanes }
    }
}

impl GatherStrategy for ScalarLoad {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn lanes(&self) -> usize {
        self.lanes
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
            gather_range::<true>(g, 0);
        } else {
            gather_range::<false>(g, 0);
        }
        idx.len()
    }
}

/// Bounds-checked scalar gather that reports every access to `tracer`
///
/// Each field load emits an [`AccessOp::Read`] of the source address; each
/// store into `dst` emits an [`AccessOp::Write`] of the destination address.
pub fn gather_traced(
    src: &Records,
    idx: &[i32],
    mut dst: Option<&mut GatherOutput>,
    cursor: usize,
    tracer: &mut dyn AccessTracer,
) -> Result<usize> {
    validate_indices(src, idx)?;
    let layout = src.layout();
    let data = src.as_slice();

    if let Some(out) = dst.as_deref() {
        assert_eq!(out.dims, layout.dims(), "destination field count mismatch");
        assert!(
            cursor + idx.len() <= out.capacity,
            "destination holds {} records, gather needs {}",
            out.capacity,
            cursor + idx.len()
        );
    }

    for (j, &k) in idx.iter().enumerate() {
        for d in 0..layout.dims() {
            let slot = &data[layout.offset(k as usize, d)];
            tracer.record(AccessOp::Read, slot);
            if let Some(out) = dst.as_deref_mut() {
                let capacity = out.capacity;
                let target = &mut out.data[d * capacity + cursor + j];
                *target = *slot;
                tracer.record(AccessOp::Write, target);
            }
        }
    }

    Ok(idx.len())
}
