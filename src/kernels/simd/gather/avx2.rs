//! AVX2 hardware gather kernels
//!
//! Processes 4 f64s per `vgatherdpd` with a 128-bit index vector. The mask
//! operand is all-ones, so every lane is always loaded.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;
use std::hint::black_box;

use crate::kernels::RawGather;
use crate::kernels::scalar::gather_range;

const F64_LANES: usize = 4;

/// AVX2 gather of `g.len` records
///
/// AoS record offsets are formed in-register (`idx * record_stride`), SoA
/// fields use per-field base pointers with the raw indices.
///
/// # Safety
/// - CPU must support AVX2
/// - Same pointer contract as [`gather_range`]
/// - `idx * record_stride` must fit in an i32 for every index
#[target_feature(enable = "avx2")]
pub unsafe fn gather_f64<const STORE: bool>(g: RawGather) {
    let chunks = g.len / F64_LANES;

    let all_lanes = _mm256_castsi256_pd(_mm256_set1_epi64x(-1));
    let passthrough = _mm256_setzero_pd();
    let scale = _mm_set1_epi32(g.record_stride as i32);

    for i in 0..chunks {
        let offset = i * F64_LANES;

        let raw = _mm_loadu_si128(g.idx.add(offset) as *const __m128i);
        let vindex = if g.record_stride == 1 {
            raw
        } else {
            _mm_mullo_epi32(raw, scale)
        };

        for d in 0..g.dims {
            let base = g.src.add(d * g.field_stride);
            let v = _mm256_mask_i32gather_pd::<8>(passthrough, base, vindex, all_lanes);
            if STORE {
                _mm256_storeu_pd(g.out.add(d * g.out_stride + offset), v);
            } else {
                black_box(v);
            }
        }
    }

    // Handle remainder with scalar
    gather_range::<STORE>(g, chunks * F64_LANES);
}
