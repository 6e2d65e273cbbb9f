//! Memory-access tracing
//!
//! A tracer is an optional collaborator handed to the traced kernels. It is
//! never consulted by the timed kernels, so an absent tracer costs nothing.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Kind of memory access
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AccessOp {
    /// Load from the record container
    Read,
    /// Store into the gather destination
    Write,
}

impl AccessOp {
    /// Single-character op code used in trace lines
    #[inline]
    pub const fn code(self) -> char {
        match self {
            Self::Read => 'R',
            Self::Write => 'W',
        }
    }
}

/// Receives one call per memory access of a traced kernel
pub trait AccessTracer {
    /// Record an access of `op` kind at `addr`
    fn record(&mut self, op: AccessOp, addr: *const f64);
}

/// Writes `<op>: <address>` lines to a sink
///
/// I/O errors do not interrupt the kernel; the first one is kept and
/// returned by [`MemTracer::finish`].
pub struct MemTracer<W: Write> {
    out: W,
    lines: u64,
    error: Option<std::io::Error>,
    path: PathBuf,
}

impl MemTracer<BufWriter<File>> {
    /// Create (truncate) the trace file at `path`
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        Ok(Self::with_path(BufWriter::new(file), path))
    }
}

impl<W: Write> MemTracer<W> {
    /// Trace into an arbitrary writer
    pub fn new(out: W) -> Self {
        Self::with_path(out, PathBuf::from("<memory>"))
    }

    fn with_path(out: W, path: PathBuf) -> Self {
        Self {
            out,
            lines: 0,
            error: None,
            path,
        }
    }

    /// Lines written so far
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Flush the sink and hand it back
    pub fn finish(mut self) -> Result<W> {
        if let Some(e) = self.error.take() {
            return Err(Error::io(self.path, e));
        }
        self.out.flush().map_err(|e| Error::io(&self.path, e))?;
        Ok(self.out)
    }
}

impl<W: Write> AccessTracer for MemTracer<W> {
    fn record(&mut self, op: AccessOp, addr: *const f64) {
        if self.error.is_some() {
            return;
        }
        match writeln!(self.out, "{}: {:p}", op.code(), addr) {
            Ok(()) => self.lines += 1,
            Err(e) => self.error = Some(e),
        }
    }
}

/// Trace sink path for a neighbor-list trace: `mem_tracer_<file name>.txt`
///
/// The sink is placed next to the input trace.
pub fn mem_tracer_path(trace_file: &Path) -> PathBuf {
    let name = trace_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    trace_file.with_file_name(format!("mem_tracer_{name}.txt"))
}
