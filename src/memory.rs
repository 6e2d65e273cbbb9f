//! Cache-line aligned buffers
//!
//! Every data and index buffer the benchmark touches is allocated on a
//! 64-byte boundary so vector loads never straddle a line they were not
//! meant to touch. Buffers are zero-initialised with `alloc_zeroed`, which
//! is a valid bit pattern for any `bytemuck::Pod` element type.

use crate::error::{Error, Result};
use bytemuck::Pod;
use std::alloc::{Layout as AllocLayout, alloc_zeroed, dealloc};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// Alignment of every benchmark buffer (one x86 cache line, AVX-512 width)
pub const ARRAY_ALIGNMENT: usize = 64;

/// Owned, zero-initialised, 64-byte aligned array of `T`
///
/// Dereferences to `[T]`. Zero-length buffers do not allocate.
pub struct AlignedBuffer<T: Pod> {
    ptr: NonNull<T>,
    len: usize,
}

// SAFETY: the buffer uniquely owns its allocation, like `Vec<T>`.
unsafe impl<T: Pod + Send> Send for AlignedBuffer<T> {}
unsafe impl<T: Pod + Sync> Sync for AlignedBuffer<T> {}

impl<T: Pod> AlignedBuffer<T> {
    /// Allocate `len` zeroed elements
    ///
    /// Fails with [`Error::OutOfMemory`] when the allocator returns null or
    /// the byte size overflows.
    pub fn zeroed(len: usize) -> Result<Self> {
        if len == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                len: 0,
            });
        }

        let layout = Self::layout(len)?;
        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc_zeroed(layout) } as *mut T;
        let ptr = NonNull::new(raw).ok_or(Error::OutOfMemory {
            size: layout.size(),
        })?;

        Ok(Self { ptr, len })
    }

    /// Allocate `len` elements and fill them from `f(i)`
    pub fn from_fn(len: usize, mut f: impl FnMut(usize) -> T) -> Result<Self> {
        let mut buf = Self::zeroed(len)?;
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = f(i);
        }
        Ok(buf)
    }

    fn layout(len: usize) -> Result<AllocLayout> {
        let size = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(Error::OutOfMemory { size: usize::MAX })?;
        let align = ARRAY_ALIGNMENT.max(std::mem::align_of::<T>());
        AllocLayout::from_size_align(size, align).map_err(|_| Error::OutOfMemory { size })
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Shared view of the contents
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: ptr is valid for len initialised elements (or dangling with len 0).
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Mutable view of the contents
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: unique ownership, ptr valid for len elements.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Pod> Deref for AlignedBuffer<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Pod> DerefMut for AlignedBuffer<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Pod> Drop for AlignedBuffer<T> {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        if let Ok(layout) = Self::layout(self.len) {
            // SAFETY: allocated in `zeroed` with this exact layout.
            unsafe { dealloc(self.ptr.as_ptr() as *mut u8, layout) };
        }
    }
}

impl<T: Pod + std::fmt::Debug> std::fmt::Debug for AlignedBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len)
            .field("ptr", &self.ptr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_cache_aligned<T>(ptr: *const T) -> bool {
        (ptr as usize).is_multiple_of(ARRAY_ALIGNMENT)
    }

    #[test]
    fn test_zeroed_is_aligned_and_zero() {
        let buf = AlignedBuffer::<f64>::zeroed(1000).unwrap();
        assert_eq!(buf.len(), 1000);
        assert!(is_cache_aligned(buf.as_ptr()));
        assert!(buf.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_index_buffer_alignment() {
        // i32 has 4-byte natural alignment; the buffer must still be line aligned
        for len in [1, 3, 17, 4096] {
            let buf = AlignedBuffer::<i32>::zeroed(len).unwrap();
            assert!(is_cache_aligned(buf.as_ptr()), "len {len} misaligned");
        }
    }

    #[test]
    fn test_empty_buffer() {
        let buf = AlignedBuffer::<f64>::zeroed(0).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.as_slice(), &[] as &[f64]);
    }

    #[test]
    fn test_from_fn() {
        let buf = AlignedBuffer::from_fn(5, |i| (i * 2) as i32).unwrap();
        assert_eq!(&buf[..], &[0, 2, 4, 6, 8]);
        assert!(is_cache_aligned(buf.as_ptr()));
    }

    #[test]
    fn test_overflowing_size_is_out_of_memory() {
        let err = AlignedBuffer::<f64>::zeroed(usize::MAX).unwrap_err();
        assert!(matches!(err, Error::OutOfMemory { .. }));
    }
}
