//! Neighbor-list trace replay
//!
//! Drives a [`GatherStrategy`] with the captured per-atom neighbor lists.
//! Each atom's gather appends to one output stream; the count a call
//! returns advances the cursor for the next atom.
//!
//! Neighbor indices may reach into the slack region `[nall, 2 * nall)`.
//! With the SoA encoding (`d * nall + i`) those records repeat values of
//! the next field of a local record, so verification cannot tell a field
//! mix-up on a slack-region neighbor from a correct gather.

use crate::dataset::Records;
use crate::error::{Error, Result};
use crate::kernels::{GatherOutput, GatherStrategy, gather_traced};
use crate::layout::{LayoutKind, RecordLayout};
use crate::trace::NeighborTrace;
use crate::trace::tracer::AccessTracer;

/// A trace bound to a record container sized for it
///
/// The container has `2 * (nlocal + nghost)` records, so every neighbor
/// index the trace accepted is in bounds.
pub struct TraceReplay {
    trace: NeighborTrace,
    records: Records,
}

impl TraceReplay {
    /// Generate records for `trace` in the given layout
    pub fn new(
        trace: NeighborTrace,
        kind: LayoutKind,
        dims: usize,
        padding: bool,
    ) -> Result<Self> {
        let layout =
            RecordLayout::with_capacity(kind, dims, padding, trace.nall(), trace.n_alloc())?;
        if layout.storage_len() > i32::MAX as usize {
            return Err(Error::invalid_argument(
                "trace",
                format!("{} atoms exceed the 32-bit gather offset range", trace.nall()),
            ));
        }
        let records = Records::generate(layout)?;
        Ok(Self { trace, records })
    }

    /// The replayed trace
    pub fn trace(&self) -> &NeighborTrace {
        &self.trace
    }

    /// Source records
    pub fn records(&self) -> &Records {
        &self.records
    }

    /// Output stream large enough for one full replay
    pub fn output(&self) -> Result<GatherOutput> {
        GatherOutput::new(self.records.layout().dims(), self.trace.total_neighbors())
    }

    /// Replay every atom's list through `strategy`, returning records gathered
    ///
    /// # Panics
    /// If `dst` cannot hold [`NeighborTrace::total_neighbors`] records.
    pub fn run(&self, strategy: &dyn GatherStrategy, mut dst: Option<&mut GatherOutput>) -> usize {
        let mut cursor = 0;
        for atom in 0..self.trace.nlocal() {
            let neighbors = self.trace.neighbors(atom);
            // SAFETY: trace indices are < n_alloc of the container built in `new`.
            cursor +=
                unsafe { strategy.gather(&self.records, neighbors, dst.as_deref_mut(), cursor) };
        }
        cursor
    }

    /// Replay with every memory access reported to `tracer`
    pub fn run_traced(
        &self,
        mut dst: Option<&mut GatherOutput>,
        tracer: &mut dyn AccessTracer,
    ) -> Result<usize> {
        let mut cursor = 0;
        for atom in 0..self.trace.nlocal() {
            let neighbors = self.trace.neighbors(atom);
            cursor += gather_traced(&self.records, neighbors, dst.as_deref_mut(), cursor, tracer)?;
        }
        Ok(cursor)
    }
}
