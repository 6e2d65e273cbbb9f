//! CSV report stream
//!
//! A report is a parameter preamble (name line, value line, blank line),
//! a header row, and one data row per benchmark point. Numeric columns are
//! right-aligned in 14-character fields.

use crate::error::{Error, Result};
use crate::metrics::Metrics;
use std::io::Write;

const WIDTH: usize = 14;

/// Parameters printed ahead of a stride sweep
#[derive(Clone, Debug, PartialEq)]
pub struct SweepPreamble {
    /// Vector family name
    pub isa: &'static str,
    /// Layout name
    pub layout: &'static str,
    /// Index stride
    pub stride: usize,
    /// Fields per record
    pub dims: usize,
    /// Nominal clock in GHz
    pub freq_ghz: f64,
    /// Cache-line size in bytes
    pub cache_line: usize,
    /// f64 lanes per vector
    pub lanes: usize,
    /// Analytic cache lines per gather
    pub lines_per_gather: usize,
}

/// Parameters printed ahead of a trace replay
#[derive(Clone, Debug, PartialEq)]
pub struct TracePreamble {
    /// Vector family name
    pub isa: &'static str,
    /// Layout name
    pub layout: &'static str,
    /// Fields per record
    pub dims: usize,
    /// Nominal clock in GHz
    pub freq_ghz: f64,
    /// Cache-line size in bytes
    pub cache_line: usize,
    /// f64 lanes per vector
    pub lanes: usize,
}

/// Writes report lines to `out`
pub struct Report<W: Write> {
    out: W,
}

impl<W: Write> Report<W> {
    /// Report into `out`
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the sink
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{line}").map_err(|e| Error::io("<report>", e))
    }

    /// Free-form line (status messages such as `Test passed!`)
    pub fn line(&mut self, text: &str) -> Result<()> {
        self.emit(text)
    }

    /// Flush the sink
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(|e| Error::io("<report>", e))
    }

    /// Stride-sweep preamble
    pub fn sweep_preamble(&mut self, p: &SweepPreamble) -> Result<()> {
        self.emit(
            "ISA,Layout,Stride,Dims,Frequency (GHz),Cache Line Size (B),Vector Width (e),Cache Lines/Gather",
        )?;
        self.emit(&format!(
            "{},{},{},{},{:.6},{},{},{}\n",
            p.isa, p.layout, p.stride, p.dims, p.freq_ghz, p.cache_line, p.lanes, p.lines_per_gather
        ))
    }

    /// Stride-sweep header; `tsc` adds the measured-cycles column
    pub fn sweep_header(&mut self, tsc: bool) -> Result<()> {
        let mut cols = vec![
            "N",
            "Size(kB)",
            "tot. time",
            "time/LUP(ms)",
            "cy/it",
            "cy/gather",
            "cy/elem",
            "tCL(10^6)",
        ];
        if tsc {
            cols.push("TSC cy/elem");
        }
        self.emit(&header(&cols))
    }

    /// One stride-sweep data row
    pub fn sweep_row(&mut self, m: &Metrics) -> Result<()> {
        let mut row = format!(
            "{:>w$},{:>w$.2},{:>w$.10},{:>w$.10},{:>w$.6},{:>w$.6},{:>w$.6},{:>w$.6}",
            m.n,
            m.size_kb,
            m.time,
            m.time_per_lookup,
            m.cycles_per_iteration,
            m.cycles_per_gather,
            m.cycles_per_element,
            m.lines_touched_millions(),
            w = WIDTH
        );
        if let Some(tsc) = m.tsc_cycles_per_element {
            row.push_str(&format!(",{tsc:>WIDTH$.6}"));
        }
        self.emit(&row)
    }

    /// Trace-replay preamble
    pub fn trace_preamble(&mut self, p: &TracePreamble) -> Result<()> {
        self.emit("ISA,Layout,Dims,Frequency (GHz),Cache Line Size (B),Vector Width (e)")?;
        self.emit(&format!(
            "{},{},{},{:.6},{},{}\n",
            p.isa, p.layout, p.dims, p.freq_ghz, p.cache_line, p.lanes
        ))
    }

    /// Trace-replay header; `tsc` adds the measured-cycles column
    pub fn trace_header(&mut self, tsc: bool) -> Result<()> {
        let mut cols = vec!["tot. time", "time/LUP(ms)", "cy/it", "cy/gather", "cy/elem"];
        if tsc {
            cols.push("TSC cy/elem");
        }
        self.emit(&header(&cols))
    }

    /// One trace-replay data row
    pub fn trace_row(&mut self, m: &Metrics) -> Result<()> {
        let mut row = format!(
            "{:>w$.10},{:>w$.10},{:>w$.6},{:>w$.6},{:>w$.6}",
            m.time,
            m.time_per_lookup,
            m.cycles_per_iteration,
            m.cycles_per_gather,
            m.cycles_per_element,
            w = WIDTH
        );
        if let Some(tsc) = m.tsc_cycles_per_element {
            row.push_str(&format!(",{tsc:>WIDTH$.6}"));
        }
        self.emit(&row)
    }
}

fn header(cols: &[&str]) -> String {
    cols.iter()
        .map(|c| format!("{c:>WIDTH$}"))
        .collect::<Vec<_>>()
        .join(",")
}
