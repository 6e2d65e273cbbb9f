//! Deterministic benchmark inputs
//!
//! Record values follow [`RecordLayout::encode`], so the verifier can
//! recompute every expected output without a stored copy of the input.
//! Synthetic index arrays follow `idx[i] = (i * stride) mod n` over the full
//! `n_alloc` slack region.

use crate::error::{Error, Result};
use crate::layout::{LayoutKind, RecordLayout};
use crate::memory::AlignedBuffer;

/// Largest record index the i32 index buffers (and hardware gathers) can hold
pub const MAX_RECORD_INDEX: usize = i32::MAX as usize;

/// Aligned record container filled with encoded values
pub struct Records {
    data: AlignedBuffer<f64>,
    layout: RecordLayout,
}

impl Records {
    /// Allocate storage for `layout` and fill all `n_alloc` records
    ///
    /// Padding slots stay zero.
    pub fn generate(layout: RecordLayout) -> Result<Self> {
        let mut data = AlignedBuffer::zeroed(layout.storage_len())?;
        for i in 0..layout.n_alloc() {
            for d in 0..layout.dims() {
                data[layout.offset(i, d)] = layout.encode(i, d);
            }
        }
        Ok(Self { data, layout })
    }

    /// Placement rules of this container
    #[inline]
    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Raw storage
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Base pointer of the storage
    #[inline]
    pub fn as_ptr(&self) -> *const f64 {
        self.data.as_ptr()
    }

    /// Field `d` of record `i`
    #[inline]
    pub fn get(&self, i: usize, d: usize) -> f64 {
        self.data[self.layout.offset(i, d)]
    }
}

/// Synthetic stride pattern over `n_alloc` slots
///
/// Every entry lies in `[0, n)`. An empty `n` yields an empty buffer.
pub fn stride_indices(n: usize, n_alloc: usize, stride: usize) -> Result<AlignedBuffer<i32>> {
    if n == 0 {
        return AlignedBuffer::zeroed(0);
    }
    if n > MAX_RECORD_INDEX {
        return Err(Error::invalid_argument(
            "n",
            format!("{n} records exceed the 32-bit index range"),
        ));
    }
    // both factors reduced below n <= 2^31, so the product fits in u64
    let n64 = n as u64;
    let step = (stride % n) as u64;
    AlignedBuffer::from_fn(n_alloc, |i| ((i % n) as u64 * step % n64) as i32)
}

/// One benchmark point's inputs: records plus a uniform-stride index sequence
pub struct Dataset {
    records: Records,
    indices: AlignedBuffer<i32>,
    stride: usize,
}

impl Dataset {
    /// Generate records and indices for `n` lookups with the given stride
    pub fn synthetic(
        kind: LayoutKind,
        dims: usize,
        padding: bool,
        n: usize,
        stride: usize,
    ) -> Result<Self> {
        if stride == 0 {
            return Err(Error::invalid_argument("stride", "must be at least 1"));
        }
        let layout = RecordLayout::new(kind, dims, padding, n)?;
        if layout.n_alloc() > MAX_RECORD_INDEX + 1 {
            return Err(Error::invalid_argument(
                "n",
                format!("{n} records exceed the 32-bit index range"),
            ));
        }
        let indices = stride_indices(n, layout.n_alloc(), stride)?;
        let records = Records::generate(layout)?;
        Ok(Self {
            records,
            indices,
            stride,
        })
    }

    /// Number of lookups per kernel call
    #[inline]
    pub fn n(&self) -> usize {
        self.records.layout().n()
    }

    /// Index stride
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Source records
    #[inline]
    pub fn records(&self) -> &Records {
        &self.records
    }

    /// The `n` indices one kernel call consumes
    #[inline]
    pub fn indices(&self) -> &[i32] {
        &self.indices[..self.n()]
    }
}
