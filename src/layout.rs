//! Record placement rules for AoS and SoA storage
//!
//! A record is `dims` f64 fields. Both the dataset generator and the
//! verifier go through [`RecordLayout`], so the address rules and the value
//! encoding live in exactly one place.
//!
//! ```text
//! SoA (field stride = n_alloc):    AoS (record stride = dims + pad):
//!   x0 x1 x2 ... x(n_alloc-1)        x0 y0 z0 [p]  x1 y1 z1 [p]  ...
//!   y0 y1 y2 ...
//!   z0 z1 z2 ...
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Container shape for multi-field records
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// Array of structures: one interleaved array
    Aos,
    /// Structure of arrays: one array per field
    #[default]
    Soa,
}

impl LayoutKind {
    /// Short report name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aos => "AoS",
            Self::Soa => "SoA",
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aos" => Ok(Self::Aos),
            "soa" => Ok(Self::Soa),
            other => Err(Error::invalid_argument(
                "layout",
                format!("expected 'aos' or 'soa', got '{other}'"),
            )),
        }
    }
}

/// Storage offset of field `d` of record `i`
///
/// Padding only exists for AoS; it widens every record by one slot.
#[inline]
pub const fn offset(
    kind: LayoutKind,
    i: usize,
    d: usize,
    dims: usize,
    n_alloc: usize,
    padding: bool,
) -> usize {
    match kind {
        LayoutKind::Aos => i * (dims + padding as usize) + d,
        LayoutKind::Soa => d * n_alloc + i,
    }
}

/// Value stored in field `d` of record `i`
///
/// The encoding is invertible, so a gathered value identifies the record it
/// came from: `i * dims + d` for AoS, `d * n + i` for SoA.
///
/// For SoA that only holds for `i < n`. In the slack region record `n + j`
/// field `d` carries the same value as record `j` field `d + 1`.
#[inline]
pub fn encode(kind: LayoutKind, i: usize, d: usize, dims: usize, n: usize) -> f64 {
    match kind {
        LayoutKind::Aos => (i * dims + d) as f64,
        LayoutKind::Soa => (d * n + i) as f64,
    }
}

/// Geometry of one record container
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    kind: LayoutKind,
    dims: usize,
    padding: bool,
    n: usize,
    n_alloc: usize,
}

impl RecordLayout {
    /// Layout for `n` logical records with the standard `2 * n` slack
    pub fn new(kind: LayoutKind, dims: usize, padding: bool, n: usize) -> Result<Self> {
        let n_alloc = n
            .checked_mul(2)
            .ok_or_else(|| Error::invalid_argument("n", format!("{n} records overflow")))?;
        Self::with_capacity(kind, dims, padding, n, n_alloc)
    }

    /// Layout with an explicit allocation size
    pub fn with_capacity(
        kind: LayoutKind,
        dims: usize,
        padding: bool,
        n: usize,
        n_alloc: usize,
    ) -> Result<Self> {
        if dims == 0 {
            return Err(Error::invalid_argument("dims", "records need at least one field"));
        }
        if n_alloc < n {
            return Err(Error::invalid_argument(
                "n_alloc",
                format!("capacity {n_alloc} smaller than record count {n}"),
            ));
        }
        let layout = Self {
            kind,
            dims,
            padding: padding && kind == LayoutKind::Aos,
            n,
            n_alloc,
        };
        layout
            .storage_len_checked()
            .ok_or_else(|| Error::invalid_argument("n_alloc", "storage size overflows"))?;
        Ok(layout)
    }

    /// Container shape
    #[inline]
    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Fields per record
    #[inline]
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Whether records carry a padding slot (AoS only)
    #[inline]
    pub fn padding(&self) -> bool {
        self.padding
    }

    /// Logical record count (the `N` of the value encoding)
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Allocated record count
    #[inline]
    pub fn n_alloc(&self) -> usize {
        self.n_alloc
    }

    /// Elements between consecutive records of one field
    #[inline]
    pub fn record_stride(&self) -> usize {
        match self.kind {
            LayoutKind::Aos => self.dims + self.padding as usize,
            LayoutKind::Soa => 1,
        }
    }

    /// Elements between field `d` and field `d + 1` of one record
    #[inline]
    pub fn field_stride(&self) -> usize {
        match self.kind {
            LayoutKind::Aos => 1,
            LayoutKind::Soa => self.n_alloc,
        }
    }

    /// Record footprint in elements, padding included
    #[inline]
    pub fn record_elems(&self) -> usize {
        self.dims + self.padding as usize
    }

    /// Flat offset of field `d` of record `i`
    #[inline]
    pub fn offset(&self, i: usize, d: usize) -> usize {
        offset(self.kind, i, d, self.dims, self.n_alloc, self.padding)
    }

    /// Encoded value of field `d` of record `i`
    #[inline]
    pub fn encode(&self, i: usize, d: usize) -> f64 {
        encode(self.kind, i, d, self.dims, self.n)
    }

    /// Number of f64 slots backing the container
    #[inline]
    pub fn storage_len(&self) -> usize {
        self.n_alloc * self.record_elems()
    }

    fn storage_len_checked(&self) -> Option<usize> {
        self.n_alloc.checked_mul(self.record_elems())
    }
}
