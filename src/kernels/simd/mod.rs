//! SIMD detection and hardware gather kernels
//!
//! This module provides runtime CPU feature detection. The gather kernels
//! live in [`gather`], split per instruction set:
//!
//! ```text
//! simd/
//! ├── mod.rs          # This file: detection only
//! └── gather/
//!     ├── mod.rs      # Unified dispatch
//!     ├── avx2.rs     # vgatherdpd ymm, 4 f64 lanes
//!     └── avx512.rs   # vgatherdpd zmm, 8 f64 lanes
//! ```
//!
//! | Instruction Set | Vector Width | f64 lanes |
//! |-----------------|--------------|-----------|
//! | AVX-512F        | 512 bits     | 8         |
//! | AVX2            | 256 bits     | 4         |
//! | Scalar          | N/A          | 1         |

pub mod gather;

use std::sync::OnceLock;

/// SIMD capability level detected at runtime
///
/// Higher values indicate more capable instruction sets. Non-x86 hosts
/// always report [`SimdLevel::Scalar`]; the portable strategies still run
/// there, only hardware gathers do not.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SimdLevel {
    /// AVX-512F (512-bit vectors, 8 f64s, mask registers)
    Avx512 = 2,
    /// AVX2 (256-bit vectors, 4 f64s)
    Avx2 = 1,
    /// No usable gather instructions
    Scalar = 0,
}

impl SimdLevel {
    /// Returns true if this level supports 512-bit gathers
    #[inline]
    pub const fn has_avx512(self) -> bool {
        matches!(self, Self::Avx512)
    }

    /// Returns true if this level supports 256-bit gathers
    #[inline]
    pub const fn has_avx2(self) -> bool {
        matches!(self, Self::Avx512 | Self::Avx2)
    }

    /// Returns the name of this SIMD level as a string
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Avx512 => "AVX-512",
            Self::Avx2 => "AVX2",
            Self::Scalar => "Scalar",
        }
    }
}

impl std::fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached SIMD level detection
static SIMD_LEVEL: OnceLock<SimdLevel> = OnceLock::new();

/// Detect the best available SIMD level for the current CPU
///
/// The first call performs detection, later calls return the cached value.
#[inline]
pub fn detect_simd() -> SimdLevel {
    *SIMD_LEVEL.get_or_init(detect_simd_uncached)
}

/// Perform actual CPU feature detection (called once)
#[cold]
fn detect_simd_uncached() -> SimdLevel {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx512f") {
            return SimdLevel::Avx512;
        }

        if is_x86_feature_detected!("avx2") {
            return SimdLevel::Avx2;
        }
    }

    SimdLevel::Scalar
}
