//! Every strategy reproduces the encoded record values for each layout

mod common;

use common::available_strategies;
use gatherbench::kernels::gather_checked;
use gatherbench::prelude::*;
use gatherbench::verify::verify_gather;

fn check(kind: LayoutKind, padding: bool, n: usize, stride: usize) {
    let ds = Dataset::synthetic(kind, 3, padding, n, stride).unwrap();
    for isa in [Isa::Avx2, Isa::Avx512] {
        for strategy in available_strategies(isa) {
            let mut out = GatherOutput::new(3, n).unwrap();
            let count =
                gather_checked(strategy.as_ref(), ds.records(), ds.indices(), Some(&mut out), 0)
                    .unwrap();
            assert_eq!(count, n);
            verify_gather(ds.records(), ds.indices(), &out, 0).unwrap_or_else(|e| {
                panic!(
                    "{} ({isa}) {kind} padding={padding} n={n} stride={stride}: {e}",
                    strategy.name()
                )
            });
        }
    }
}

#[test]
fn soa_strides() {
    for n in [512, 20000] {
        for stride in [1, 2, 7, 64] {
            check(LayoutKind::Soa, false, n, stride);
        }
    }
}

#[test]
fn aos_strides() {
    for n in [512, 20000] {
        for stride in [1, 2, 7, 64] {
            check(LayoutKind::Aos, false, n, stride);
        }
    }
}

#[test]
fn aos_padded_strides() {
    for n in [512, 20000] {
        for stride in [1, 2, 7, 64] {
            check(LayoutKind::Aos, true, n, stride);
        }
    }
}

#[test]
fn sizes_off_the_vector_width() {
    for n in [1, 3, 5, 13, 515] {
        check(LayoutKind::Soa, false, n, 3);
        check(LayoutKind::Aos, true, n, 3);
    }
}

#[test]
fn explicit_values() {
    // stride 2 over N = 512: position 300 reads record 600 mod 512 = 88
    let ds = Dataset::synthetic(LayoutKind::Soa, 3, false, 512, 2).unwrap();
    let strategy = ScalarLoad::new(4);
    let mut out = GatherOutput::new(3, 512).unwrap();
    gather_checked(&strategy, ds.records(), ds.indices(), Some(&mut out), 0).unwrap();
    assert_eq!(out.get(300, 0), 88.0);
    assert_eq!(out.get(300, 1), 512.0 + 88.0);
    assert_eq!(out.get(300, 2), 1024.0 + 88.0);

    let ds = Dataset::synthetic(LayoutKind::Aos, 3, true, 512, 2).unwrap();
    let mut out = GatherOutput::new(3, 512).unwrap();
    gather_checked(&strategy, ds.records(), ds.indices(), Some(&mut out), 0).unwrap();
    assert_eq!(out.get(300, 0), 264.0);
    assert_eq!(out.get(300, 2), 266.0);
}

#[test]
fn out_of_range_indices_rejected() {
    let ds = Dataset::synthetic(LayoutKind::Aos, 3, false, 64, 1).unwrap();
    for strategy in available_strategies(Isa::Avx2) {
        let err = gather_checked(strategy.as_ref(), ds.records(), &[0, 128], None, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { arg: "idx", .. }));
    }
}
