//! AVX-512 hardware gather kernels
//!
//! Processes 8 f64s per `vgatherdpd zmm` with a 256-bit index vector.
//! The instruction requires a mask register; it is fixed to `0xFF` so no
//! lane is ever masked out.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;
use std::hint::black_box;

use crate::kernels::RawGather;
use crate::kernels::scalar::gather_range;

const F64_LANES: usize = 8;

/// All eight lanes active
const ALL_LANES: __mmask8 = 0xFF;

/// AVX-512 gather of `g.len` records
///
/// # Safety
/// - CPU must support AVX-512F
/// - Same pointer contract as [`gather_range`]
/// - `idx * record_stride` must fit in an i32 for every index
#[target_feature(enable = "avx512f,avx2")]
pub unsafe fn gather_f64<const STORE: bool>(g: RawGather) {
    let chunks = g.len / F64_LANES;

    let passthrough = _mm512_setzero_pd();
    let scale = _mm256_set1_epi32(g.record_stride as i32);

    for i in 0..chunks {
        let offset = i * F64_LANES;

        let raw = _mm256_loadu_si256(g.idx.add(offset) as *const __m256i);
        let vindex = if g.record_stride == 1 {
            raw
        } else {
            _mm256_mullo_epi32(raw, scale)
        };

        for d in 0..g.dims {
            let base = g.src.add(d * g.field_stride);
            let v = _mm512_mask_i32gather_pd::<8>(passthrough, ALL_LANES, vindex, base);
            if STORE {
                _mm512_storeu_pd(g.out.add(d * g.out_stride + offset), v);
            } else {
                black_box(v);
            }
        }
    }

    // Handle remainder with scalar
    gather_range::<STORE>(g, chunks * F64_LANES);
}
