//! Correctness checks for gathered output
//!
//! Expected values come from [`RecordLayout::encode`](crate::layout::RecordLayout::encode),
//! the same rule the generator filled the records with. Comparison is
//! bit-exact: the kernels only move data.
//!
//! [`verify_stride`] also rebuilds the record index of every position from
//! `(i, stride, n)` instead of reading the index buffer, so a wrong index
//! pattern fails the check as well as a wrong kernel.

use crate::dataset::Records;
use crate::error::{Error, Result};
use crate::kernels::GatherOutput;
use crate::layout::RecordLayout;
use crate::trace::NeighborTrace;

/// Check output positions `[start, start + idx.len())` against `idx`
pub fn verify_gather(
    records: &Records,
    idx: &[i32],
    out: &GatherOutput,
    start: usize,
) -> Result<()> {
    let layout = records.layout();
    if out.dims() != layout.dims() || start + idx.len() > out.capacity() {
        return Err(Error::invalid_argument(
            "out",
            format!(
                "destination of {} x {} cannot hold {} records at {start}",
                out.dims(),
                out.capacity(),
                idx.len()
            ),
        ));
    }

    for (j, &k) in idx.iter().enumerate() {
        check_record(layout, out, start + j, k as usize)?;
    }
    Ok(())
}

/// Check a synthetic stride run: position `i` must hold record `(i * stride) mod n`
pub fn verify_stride(
    records: &Records,
    n: usize,
    stride: usize,
    out: &GatherOutput,
) -> Result<()> {
    let layout = records.layout();
    if out.dims() != layout.dims() || n > out.capacity() {
        return Err(Error::invalid_argument(
            "out",
            format!(
                "destination of {} x {} cannot hold {n} records",
                out.dims(),
                out.capacity()
            ),
        ));
    }
    if n == 0 {
        return Ok(());
    }

    let step = stride % n;
    let mut k = 0;
    for position in 0..n {
        check_record(layout, out, position, k)?;
        // k < n and step < n, so the sum cannot overflow
        k += step;
        if k >= n {
            k -= n;
        }
    }
    Ok(())
}

fn check_record(
    layout: &RecordLayout,
    out: &GatherOutput,
    position: usize,
    k: usize,
) -> Result<()> {
    for d in 0..layout.dims() {
        let expected = layout.encode(k, d);
        let got = out.get(position, d);
        if got.to_bits() != expected.to_bits() {
            return Err(Error::VerificationFailed {
                position,
                field: d,
                expected,
                got,
            });
        }
    }
    Ok(())
}

/// Check a full trace replay, atom lists laid end to end from position 0
pub fn verify_trace(records: &Records, trace: &NeighborTrace, out: &GatherOutput) -> Result<()> {
    let mut cursor = 0;
    for atom in 0..trace.nlocal() {
        let neighbors = trace.neighbors(atom);
        verify_gather(records, neighbors, out, cursor)?;
        cursor += neighbors.len();
    }
    Ok(())
}
