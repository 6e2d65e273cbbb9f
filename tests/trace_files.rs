//! Trace parsing from disk, replay of random traces, and the memory tracer

mod common;

use common::{available_strategies, random_trace, write_file};
use gatherbench::prelude::*;
use gatherbench::trace::tracer::mem_tracer_path;
use gatherbench::verify::verify_trace;

#[test]
fn parses_documented_example_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "small.trace",
        "N: 2 0 3\nA: 0\nI: 1 1\nA: 1\nI: 0\n",
    );
    let trace = NeighborTrace::open(&path).unwrap();
    assert_eq!(trace.nlocal(), 2);
    assert_eq!(trace.nghost(), 0);
    assert_eq!(trace.maxneighs(), 3);
    assert_eq!(trace.neighbors(0), &[1, 1]);
    assert_eq!(trace.neighbors(1), &[0]);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = NeighborTrace::open(dir.path().join("absent.trace")).unwrap_err();
    match err {
        Error::Io { path, .. } => assert!(path.ends_with("absent.trace")),
        other => panic!("expected Io, got {other}"),
    }
}

#[test]
fn duplicate_capacity_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "dup.trace", "N: 2 0 3\nA: 0\nI: 1\nN: 4 0 3\n");
    let err = NeighborTrace::open(&path).unwrap_err();
    assert!(matches!(err, Error::DuplicateCapacity { line: 4 }));
}

#[test]
fn random_traces_round_trip() {
    for seed in 0..8 {
        let (text, lists) = random_trace(seed, 50, 20, 12);
        let trace = NeighborTrace::parse(&text).unwrap();
        assert_eq!(trace.nlocal(), 50);
        for (atom, list) in lists.iter().enumerate() {
            assert_eq!(trace.neighbors(atom), list.as_slice(), "seed {seed} atom {atom}");
        }
        assert_eq!(
            trace.total_neighbors(),
            lists.iter().map(Vec::len).sum::<usize>()
        );
    }
}

#[test]
fn random_traces_replay_and_verify() {
    for (seed, kind, padding) in [
        (1, LayoutKind::Soa, false),
        (2, LayoutKind::Aos, false),
        (3, LayoutKind::Aos, true),
    ] {
        let (text, _) = random_trace(seed, 64, 32, 21);
        for isa in [Isa::Avx2, Isa::Avx512] {
            for strategy in available_strategies(isa) {
                let trace = NeighborTrace::parse(&text).unwrap();
                let total = trace.total_neighbors();
                let replay = TraceReplay::new(trace, kind, 3, padding).unwrap();
                let mut out = replay.output().unwrap();
                assert_eq!(replay.run(strategy.as_ref(), Some(&mut out)), total);
                verify_trace(replay.records(), replay.trace(), &out).unwrap_or_else(|e| {
                    panic!("{} ({isa}) {kind} padding={padding}: {e}", strategy.name())
                });
            }
        }
    }
}

#[test]
fn mem_tracer_writes_one_line_per_access() {
    let dir = tempfile::tempdir().unwrap();
    let trace_path = write_file(
        dir.path(),
        "md.trace",
        "N: 2 1 4\nA: 0\nI: 1 2 5\nA: 1\nI: 0\n",
    );
    let trace = NeighborTrace::open(&trace_path).unwrap();
    let replay = TraceReplay::new(trace, LayoutKind::Aos, 3, false).unwrap();

    let sink = mem_tracer_path(&trace_path);
    assert_eq!(sink, dir.path().join("mem_tracer_md.trace.txt"));

    let mut tracer = MemTracer::create(&sink).unwrap();
    let mut out = replay.output().unwrap();
    let n = replay.run_traced(Some(&mut out), &mut tracer).unwrap();
    assert_eq!(n, 4);
    assert_eq!(tracer.lines(), 24);
    tracer.finish().unwrap();

    let text = std::fs::read_to_string(&sink).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 24);
    assert!(lines.iter().all(|l| l.starts_with("R: 0x") || l.starts_with("W: 0x")));
    // read of record 1 field 0 precedes its store
    let base = replay.records().as_ptr() as usize;
    assert_eq!(lines[0], format!("R: {:#x}", base + 3 * 8));
    assert!(lines[1].starts_with("W: "));
}

#[test]
fn mem_tracer_without_destination_only_reads() {
    let dir = tempfile::tempdir().unwrap();
    let trace = NeighborTrace::parse("N: 1 0 2\nA: 0\nI: 0 1\n").unwrap();
    let replay = TraceReplay::new(trace, LayoutKind::Soa, 3, false).unwrap();
    let sink = dir.path().join("reads.txt");
    let mut tracer = MemTracer::create(&sink).unwrap();
    replay.run_traced(None, &mut tracer).unwrap();
    tracer.finish().unwrap();
    let text = std::fs::read_to_string(&sink).unwrap();
    assert_eq!(text.lines().count(), 6);
    assert!(text.lines().all(|l| l.starts_with("R: ")));
}
