//! Captured neighbor-list traces
//!
//! A trace is line-oriented text. Each record starts with a two-character
//! prefix:
//!
//! ```text
//! N: <nlocal> <nghost> <maxneighs>   capacity, exactly once, first
//! A: <atom>                          start (or restart) an atom's list
//! I: <idx> <idx> ...                 append neighbors to the current atom
//! ```
//!
//! Other lines are ignored. Neighbor indices address records of a container
//! with `2 * (nlocal + nghost)` slots.

pub mod tracer;

use crate::error::{Error, Result};
use crate::memory::AlignedBuffer;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Per-atom neighbor lists read from a trace
pub struct NeighborTrace {
    nlocal: usize,
    nghost: usize,
    maxneighs: usize,
    lists: AlignedBuffer<i32>,
    counts: Vec<usize>,
}

impl NeighborTrace {
    /// Parse a trace file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Self::read(BufReader::new(file)).map_err(|e| match e {
            Error::Io { source, .. } => Error::io(path, source),
            other => other,
        })
    }

    /// Parse trace text
    pub fn parse(text: &str) -> Result<Self> {
        Self::read(text.as_bytes())
    }

    /// Parse a trace from any buffered reader
    pub fn read(reader: impl BufRead) -> Result<Self> {
        let mut builder: Option<TraceBuilder> = None;
        let mut atom: Option<usize> = None;
        let mut last = 0;

        for (n, line) in reader.lines().enumerate() {
            let lineno = n + 1;
            last = lineno;
            let line = line.map_err(|e| Error::io("<trace>", e))?;

            if let Some(rest) = line.strip_prefix("N:") {
                if builder.is_some() {
                    return Err(Error::DuplicateCapacity { line: lineno });
                }
                let [nlocal, nghost, maxneighs] = parse_capacity(lineno, rest)?;
                if nlocal <= 0 || maxneighs <= 0 {
                    return Err(Error::InvalidCapacity {
                        line: lineno,
                        nlocal,
                        maxneighs,
                    });
                }
                if nghost < 0 {
                    return Err(Error::parse(lineno, format!("negative ghost count {nghost}")));
                }
                builder = Some(TraceBuilder::new(
                    nlocal as usize,
                    nghost as usize,
                    maxneighs as usize,
                )?);
            } else if let Some(rest) = line.strip_prefix("A:") {
                let b = builder
                    .as_mut()
                    .ok_or_else(|| Error::parse(lineno, "atom record before 'N:'"))?;
                let id = parse_int(lineno, single_token(lineno, rest)?)?;
                atom = Some(b.start_atom(id).map_err(|r| Error::parse(lineno, r))?);
            } else if let Some(rest) = line.strip_prefix("I:") {
                let b = builder
                    .as_mut()
                    .ok_or_else(|| Error::parse(lineno, "index record before 'N:'"))?;
                let a = atom.ok_or_else(|| Error::parse(lineno, "index record before any 'A:'"))?;
                for tok in rest.split_whitespace() {
                    let k = parse_int(lineno, tok)?;
                    b.push(a, k).map_err(|r| Error::parse(lineno, r))?;
                }
            }
        }

        builder
            .map(TraceBuilder::finish)
            .ok_or_else(|| Error::parse(last, "trace has no 'N:' capacity record"))
    }

    /// Build a trace from in-memory lists, one per local atom
    pub fn from_lists(nghost: usize, maxneighs: usize, lists: &[Vec<i32>]) -> Result<Self> {
        if lists.is_empty() || maxneighs == 0 {
            return Err(Error::invalid_argument(
                "lists",
                "need at least one atom and a non-zero capacity",
            ));
        }
        let mut b = TraceBuilder::new(lists.len(), nghost, maxneighs)?;
        for (atom, list) in lists.iter().enumerate() {
            for &k in list {
                b.push(atom, k as i64)
                    .map_err(|r| Error::invalid_argument("lists", r))?;
            }
        }
        Ok(b.finish())
    }

    /// Local atoms (one neighbor list each)
    #[inline]
    pub fn nlocal(&self) -> usize {
        self.nlocal
    }

    /// Ghost atoms (addressable, no list)
    #[inline]
    pub fn nghost(&self) -> usize {
        self.nghost
    }

    /// Declared neighbor capacity per atom
    #[inline]
    pub fn maxneighs(&self) -> usize {
        self.maxneighs
    }

    /// Local plus ghost atoms
    #[inline]
    pub fn nall(&self) -> usize {
        self.nlocal + self.nghost
    }

    /// Record slots the replay container must provide
    #[inline]
    pub fn n_alloc(&self) -> usize {
        2 * self.nall()
    }

    /// Neighbors of local atom `atom`
    pub fn neighbors(&self, atom: usize) -> &[i32] {
        let start = atom * self.maxneighs;
        &self.lists[start..start + self.counts[atom]]
    }

    /// Neighbor count of every local atom
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Sum of all neighbor counts
    pub fn total_neighbors(&self) -> usize {
        self.counts.iter().sum()
    }
}

impl std::fmt::Debug for NeighborTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeighborTrace")
            .field("nlocal", &self.nlocal)
            .field("nghost", &self.nghost)
            .field("maxneighs", &self.maxneighs)
            .field("total_neighbors", &self.total_neighbors())
            .finish()
    }
}

struct TraceBuilder {
    trace: NeighborTrace,
}

impl TraceBuilder {
    fn new(nlocal: usize, nghost: usize, maxneighs: usize) -> Result<Self> {
        let slots = nlocal
            .checked_mul(maxneighs)
            .ok_or(Error::OutOfMemory { size: usize::MAX })?;
        let fits = nlocal
            .checked_add(nghost)
            .and_then(|n| n.checked_mul(2))
            .is_some_and(|n| n <= i32::MAX as usize);
        if !fits {
            return Err(Error::invalid_argument(
                "nghost",
                "atom count exceeds the 32-bit index range",
            ));
        }
        Ok(Self {
            trace: NeighborTrace {
                nlocal,
                nghost,
                maxneighs,
                lists: AlignedBuffer::zeroed(slots)?,
                counts: vec![0; nlocal],
            },
        })
    }

    fn start_atom(&mut self, id: i64) -> std::result::Result<usize, String> {
        let t = &mut self.trace;
        if id < 0 || id as usize >= t.nlocal {
            return Err(format!("atom {id} outside [0, {})", t.nlocal));
        }
        let atom = id as usize;
        t.counts[atom] = 0;
        Ok(atom)
    }

    fn push(&mut self, atom: usize, k: i64) -> std::result::Result<(), String> {
        let t = &mut self.trace;
        let n_alloc = t.n_alloc();
        if k < 0 || k as usize >= n_alloc {
            return Err(format!("neighbor index {k} outside [0, {n_alloc})"));
        }
        let count = t.counts[atom];
        if count == t.maxneighs {
            return Err(format!(
                "atom {atom} exceeds the neighbor capacity of {}",
                t.maxneighs
            ));
        }
        t.lists[atom * t.maxneighs + count] = k as i32;
        t.counts[atom] = count + 1;
        Ok(())
    }

    fn finish(self) -> NeighborTrace {
        self.trace
    }
}

fn parse_int(line: usize, tok: &str) -> Result<i64> {
    tok.parse()
        .map_err(|_| Error::parse(line, format!("expected an integer, got '{tok}'")))
}

fn single_token(line: usize, rest: &str) -> Result<&str> {
    let mut toks = rest.split_whitespace();
    match (toks.next(), toks.next()) {
        (Some(tok), None) => Ok(tok),
        _ => Err(Error::parse(line, "expected exactly one atom id")),
    }
}

fn parse_capacity(line: usize, rest: &str) -> Result<[i64; 3]> {
    let vals = rest
        .split_whitespace()
        .map(|tok| parse_int(line, tok))
        .collect::<Result<Vec<_>>>()?;
    <[i64; 3]>::try_from(vals).map_err(|v| {
        Error::parse(
            line,
            format!("expected '<nlocal> <nghost> <maxneighs>', got {} values", v.len()),
        )
    })
}
