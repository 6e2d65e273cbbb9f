//! End-to-end runs of the stride and trace benchmarks

mod common;

use common::{quick_calibration, random_trace};
use gatherbench::bench::TEST_PASSED;
use gatherbench::kernels::gather_checked;
use gatherbench::prelude::*;
use gatherbench::verify::verify_gather;
use std::cell::Cell;
use std::rc::Rc;

fn stride_config(stride: usize) -> BenchConfig {
    BenchConfig::default()
        .with_stride(stride)
        .with_freq_ghz(2.5)
        .with_strategy(StrategyKind::Vector)
        .with_calibration(quick_calibration())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn unit_stride_touches_most_lines() {
    let mut bench = StrideBench::new(stride_config(1)).unwrap();
    let r = bench.run_point(512).unwrap();
    let m = r.metrics;

    // 8 elements per 64-byte line, stride 1: 512 * (8 - 1)
    assert_eq!(m.lines_touched, 3584);
    assert_eq!(m.n, 512);
    assert_eq!(m.size_kb, 14.336);

    let lookups = 512.0 * r.measurement.repetitions as f64;
    let lanes = bench.config().lanes() as f64;
    assert!(close(m.time, r.measurement.elapsed_secs));
    assert!(close(m.time_per_lookup, m.time * 1e6 / lookups));
    assert!(close(m.cycles_per_iteration, m.time * 2.5e9 * lanes / lookups));
    assert!(close(m.cycles_per_gather, m.cycles_per_iteration / 3.0));
    assert!(close(m.cycles_per_element, m.time * 2.5e9 / (lookups * 3.0)));
}

#[test]
fn line_sized_stride_touches_none() {
    let mut bench = StrideBench::new(stride_config(64)).unwrap();
    let r = bench.run_point(512).unwrap();
    assert_eq!(r.metrics.lines_touched, 0);
    assert!(r.measurement.repetitions >= 1);
}

#[test]
fn empty_problem_does_not_divide_by_zero() {
    let mut bench = StrideBench::new(stride_config(3).with_verify(true)).unwrap();
    let r = bench.run_point(0).unwrap();
    assert!(r.measurement.repetitions >= 1);
    let m = r.metrics;
    for v in [
        m.time_per_lookup,
        m.cycles_per_iteration,
        m.cycles_per_gather,
        m.cycles_per_element,
    ] {
        assert!(v.is_finite());
        assert_eq!(v, 0.0);
    }
    assert_eq!(m.lines_touched, 0);
}

#[test]
fn sweep_report_shape() {
    let config = stride_config(2)
        .with_layout(LayoutKind::Aos)
        .with_padding(true)
        .with_verify(true)
        .with_sweep(SweepRange {
            start: 512,
            end: 2000,
            growth: 1.5,
        });
    let mut bench = StrideBench::new(config).unwrap();
    let mut report = Report::new(Vec::new());
    let results = bench.run(&mut report).unwrap();
    let sizes: Vec<usize> = results.iter().map(|r| r.metrics.n).collect();
    assert_eq!(sizes, vec![512, 768, 1152, 1728]);

    let text = String::from_utf8(report.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "ISA,Layout,Stride,Dims,Frequency (GHz),Cache Line Size (B),Vector Width (e),Cache Lines/Gather"
    );
    assert!(lines[1].starts_with(&format!("{},AoS,2,3,2.500000,64,", bench.config().isa)));
    assert_eq!(lines[2], "");
    assert!(lines[3].trim_start().starts_with("N,"));
    assert_eq!(text.matches(TEST_PASSED).count(), 4);

    let rows: Vec<&&str> = lines[4..].iter().filter(|l| **l != TEST_PASSED).collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].split(',').next().unwrap().trim(), "512");
}

#[test]
fn corrupted_output_fails_verification() {
    let ds = Dataset::synthetic(LayoutKind::Soa, 3, false, 512, 7).unwrap();
    let mut out = GatherOutput::new(3, 512).unwrap();
    let strategy = select_strategy(StrategyKind::Scalar, Isa::Avx2).unwrap();
    gather_checked(strategy.as_ref(), ds.records(), ds.indices(), Some(&mut out), 0).unwrap();
    verify_gather(ds.records(), ds.indices(), &out, 0).unwrap();

    // shift the record window by one: every position now disagrees
    let err = verify_gather(ds.records(), &ds.indices()[1..], &out, 0).unwrap_err();
    assert!(err.is_verification_failure());
    assert!(err.to_string().starts_with("Test failed"));
}

#[test]
fn unsupported_hardware_is_reported() {
    let config = BenchConfig::default()
        .with_isa(Isa::Avx512)
        .with_strategy(StrategyKind::Hardware);
    match StrideBench::new(config) {
        Ok(bench) => assert!(detect_simd().has_avx512(), "{}", bench.strategy_name()),
        Err(Error::UnsupportedStrategy { strategy, .. }) => {
            assert_eq!(strategy, "hardware");
            assert!(!detect_simd().has_avx512());
        }
        Err(other) => panic!("unexpected error {other}"),
    }
}

#[test]
fn trace_bench_end_to_end() {
    let (text, lists) = random_trace(42, 40, 10, 16);
    let total: usize = lists.iter().map(Vec::len).sum();
    let trace = NeighborTrace::parse(&text).unwrap();

    let config = BenchConfig::default()
        .with_layout(LayoutKind::Aos)
        .with_strategy(StrategyKind::Scalar)
        .with_verify(true)
        .with_calibration(quick_calibration());
    let mut bench = TraceBench::new(config, trace).unwrap();
    let mut report = Report::new(Vec::new());
    let r = bench.run(&mut report, None).unwrap();
    assert!(r.verified);
    assert_eq!(r.metrics.n, total);

    let text = String::from_utf8(report.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "ISA,Layout,Dims,Frequency (GHz),Cache Line Size (B),Vector Width (e)"
    );
    assert_eq!(lines[3].split(',').count(), 5);
    assert_eq!(lines[5], TEST_PASSED);
}

#[test]
fn traced_trace_bench_times_one_pass() {
    struct Count(usize);
    impl AccessTracer for Count {
        fn record(&mut self, _: AccessOp, _: *const f64) {
            self.0 += 1;
        }
    }

    let trace = NeighborTrace::parse("N: 2 0 3\nA: 0\nI: 1 1\nA: 1\nI: 0\n").unwrap();
    let config = BenchConfig::default()
        .with_strategy(StrategyKind::Scalar)
        .with_calibration(quick_calibration());
    let mut bench = TraceBench::new(config, trace).unwrap();
    let mut count = Count(0);
    let r = bench.run_point(Some(&mut count)).unwrap();
    assert_eq!(r.measurement.repetitions, 1);
    assert!(!r.verified);
    // reads only: 3 neighbors x 3 fields
    assert_eq!(count.0, 9);
}

#[test]
fn huge_stride_sweeps_and_verifies() {
    for stride in [(1usize << 63) + 1, usize::MAX / 4] {
        let config = stride_config(stride)
            .with_verify(true)
            .with_sweep(SweepRange::single(512));
        let mut bench = StrideBench::new(config).unwrap();
        assert_eq!(bench.lines_per_gather(), 3 * bench.config().lanes());

        let mut report = Report::new(Vec::new());
        let results = bench.run(&mut report).unwrap();
        assert!(results[0].verified);
        assert_eq!(results[0].metrics.lines_touched, 0);
    }
}

#[test]
fn single_array_mode_counts_eight_elements_per_gather() {
    let config = stride_config(4)
        .with_single_array(true)
        .with_verify(true);
    let mut bench = StrideBench::new(config).unwrap();
    assert_eq!(bench.config().dims, 1);
    let r = bench.run_point(512).unwrap();
    let m = r.metrics;

    assert!(r.verified);
    assert_eq!(m.size_kb, 512.0 * 12.0 / 1000.0);
    assert!(close(m.cycles_per_gather, m.cycles_per_element * 8.0));
    assert!(close(m.cycles_per_iteration, m.cycles_per_element));
    assert_eq!(m.lines_touched, 512);
}

/// Gathers every record but the last one
struct DropsLast(Box<dyn GatherStrategy>);

impl GatherStrategy for DropsLast {
    fn name(&self) -> &'static str {
        "drops-last"
    }

    fn lanes(&self) -> usize {
        self.0.lanes()
    }

    unsafe fn gather(
        &self,
        src: &Records,
        idx: &[i32],
        dst: Option<&mut GatherOutput>,
        cursor: usize,
    ) -> usize {
        let keep = idx.len().saturating_sub(1);
        unsafe { self.0.gather(src, &idx[..keep], dst, cursor) }
    }
}

#[test]
fn verification_mismatch_stops_the_sweep() {
    let config = stride_config(1)
        .with_verify(true)
        .with_sweep(SweepRange::single(512));
    let inner = select_strategy(StrategyKind::Scalar, Isa::Avx2).unwrap();
    let mut bench = StrideBench::new(config)
        .unwrap()
        .with_gather(Box::new(DropsLast(inner)));
    assert_eq!(bench.strategy_name(), "drops-last");

    let mut report = Report::new(Vec::new());
    match bench.run(&mut report) {
        Err(Error::VerificationFailed {
            position,
            field,
            expected,
            got,
        }) => {
            assert_eq!((position, field), (511, 0));
            assert_eq!(expected, 511.0);
            assert_eq!(got, 0.0);
        }
        other => panic!("expected a verification failure, got {other:?}"),
    }
    let text = String::from_utf8(report.into_inner()).unwrap();
    assert!(!text.contains(TEST_PASSED));
    assert_eq!(text.lines().count(), 4);
}

#[test]
fn measured_cycles_reach_the_report() {
    let config = stride_config(2)
        .with_measure_cycles(true)
        .with_sweep(SweepRange::single(512));
    let mut bench = StrideBench::new(config).unwrap();
    let mut report = Report::new(Vec::new());
    let results = bench.run(&mut report).unwrap();

    let text = String::from_utf8(report.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    let tsc = results[0].metrics.tsc_cycles_per_element;
    if TscMarker::available() {
        assert!(bench.config().measure_cycles);
        assert!(lines[3].trim_end().ends_with("TSC cy/elem"));
        assert_eq!(lines[4].split(',').count(), 9);
        assert!(tsc.unwrap() > 0.0);
    } else {
        assert!(!bench.config().measure_cycles);
        assert_eq!(lines[4].split(',').count(), 8);
        assert!(tsc.is_none());
    }
}

/// Reports a fixed cycle count and counts region brackets
struct FixedCycles {
    cycles: u64,
    regions: Rc<Cell<u32>>,
}

impl RegionMarker for FixedCycles {
    fn start(&mut self) {}

    fn stop(&mut self) {
        self.regions.set(self.regions.get() + 1);
    }

    fn cycles(&self) -> Option<u64> {
        Some(self.cycles)
    }
}

#[test]
fn injected_marker_drives_the_cycle_column() {
    struct Discard;
    impl AccessTracer for Discard {
        fn record(&mut self, _: AccessOp, _: *const f64) {}
    }

    let trace = NeighborTrace::parse("N: 2 0 3\nA: 0\nI: 1 1\nA: 1\nI: 0\n").unwrap();
    let config = BenchConfig::default()
        .with_strategy(StrategyKind::Scalar)
        .with_measure_cycles(true)
        .with_calibration(quick_calibration());
    let regions = Rc::new(Cell::new(0));
    let mut bench = TraceBench::new(config, trace)
        .unwrap()
        .with_marker(Box::new(FixedCycles {
            cycles: 900,
            regions: Rc::clone(&regions),
        }));

    let mut report = Report::new(Vec::new());
    let r = bench.run(&mut report, Some(&mut Discard)).unwrap();
    // one traced pass brackets one region
    assert_eq!(regions.get(), 1);
    assert_eq!(r.measurement.cycles, Some(900));

    let text = String::from_utf8(report.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    if bench.config().measure_cycles {
        // 3 neighbors x 3 fields
        assert_eq!(r.metrics.tsc_cycles_per_element, Some(100.0));
        assert!(lines[3].trim_end().ends_with("TSC cy/elem"));
        assert_eq!(lines[4].split(',').last().unwrap().trim(), "100.000000");
    } else {
        assert_eq!(r.metrics.tsc_cycles_per_element, None);
        assert_eq!(lines[4].split(',').count(), 5);
    }
}
