//! Hardware gather dispatch
//!
//! Routes a [`HardwareGather`] call to the AVX2 or AVX-512 kernel. The
//! strategy can only be constructed after the host has been checked for
//! the required instruction set, which is what makes the `unsafe`
//! `target_feature` calls below sound.

#[cfg(target_arch = "x86_64")]
mod avx2;
#[cfg(target_arch = "x86_64")]
mod avx512;

use super::detect_simd;
use crate::dataset::Records;
use crate::error::{Error, Result};
use crate::kernels::{GatherOutput, GatherStrategy, Isa, RawGather};

/// Explicit `vgatherdpd` gathers under an always-true mask
#[derive(Copy, Clone, Debug)]
pub struct HardwareGather {
    isa: Isa,
}

impl HardwareGather {
    /// Hardware gathers for `isa`, if this CPU can issue them
    pub fn new(isa: Isa) -> Result<Self> {
        let detected = detect_simd();
        if detected < isa.required_level() {
            return Err(Error::UnsupportedStrategy {
                strategy: "hardware",
                required: isa.required_level().as_str(),
                detected: detected.as_str(),
            });
        }
        Ok(Self { isa })
    }

    /// Vector family this strategy issues
    pub fn isa(&self) -> Isa {
        self.isa
    }
}

impl GatherStrategy for HardwareGather {
    fn name(&self) -> &'static str {
        "hardware"
    }

    fn lanes(&self) -> usize {
        self.isa.lanes()
    }

    unsafe fn gather(
        &self,
        src: &Records,
        idx: &[i32],
        dst: Option<&mut GatherOutput>,
        cursor: usize,
    ) -> usize {
        assert!(
            src.layout().storage_len() <= i32::MAX as usize,
            "record storage exceeds the 32-bit gather offset range"
        );
        let g = RawGather::new(src, idx, dst, cursor);
        if g.stores() {
            dispatch::<true>(self.isa, g);
        } else {
            dispatch::<false>(self.isa, g);
        }
        idx.len()
    }
}

/// # Safety
/// The host must support `isa`; see [`HardwareGather::new`].
#[inline]
unsafe fn dispatch<const STORE: bool>(isa: Isa, g: RawGather) {
    #[cfg(target_arch = "x86_64")]
    match isa {
        Isa::Avx512 => avx512::gather_f64::<STORE>(g),
        Isa::Avx2 => avx2::gather_f64::<STORE>(g),
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        let _ = isa;
        crate::kernels::scalar::gather_range::<STORE>(g, 0);
    }
}
