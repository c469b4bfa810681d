use std::alloc::{Layout, alloc, dealloc};
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use log::debug;

use crate::error::ArrayError;

/// Owning handle to a block of `cap` uninitialized slots of `T`.
///
/// Dropping a `RawBuf` frees the block but never drops its contents: the
/// owner decides which slots are live. A zero capacity (or a zero-sized `T`)
/// holds no allocation at all and the pointer is dangling.
pub(crate) struct RawBuf<T> {
    ptr: NonNull<T>,
    cap: usize,
    _marker: PhantomData<T>,
}

// SAFETY: the buffer owns its slots exclusively, so it can move to another
// thread whenever T can.
unsafe impl<T: Send> Send for RawBuf<T> {}
// SAFETY: shared access to the buffer only hands out shared access to T.
unsafe impl<T: Sync> Sync for RawBuf<T> {}

impl<T> RawBuf<T> {
    pub(crate) const fn dangling() -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
            _marker: PhantomData,
        }
    }

    /// Allocates room for exactly `cap` values.
    pub(crate) fn try_allocate(cap: usize) -> Result<Self, ArrayError> {
        if cap == 0 {
            return Ok(Self::dangling());
        }

        let layout = Layout::array::<T>(cap).map_err(|_| ArrayError::CapacityOverflow)?;
        if layout.size() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                cap,
                _marker: PhantomData,
            });
        }

        if injected_failure() {
            debug!("injected failure for {} byte allocation", layout.size());
            return Err(ArrayError::AllocFailed { layout });
        }

        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc(layout) };
        match NonNull::new(ptr.cast::<T>()) {
            Some(ptr) => Ok(Self {
                ptr,
                cap,
                _marker: PhantomData,
            }),
            None => {
                debug!("allocation of {} bytes failed", layout.size());
                Err(ArrayError::AllocFailed { layout })
            }
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }
}

impl<T> Drop for RawBuf<T> {
    fn drop(&mut self) {
        let size = mem::size_of::<T>() * self.cap;
        if size != 0 {
            unsafe {
                // SAFETY: the same layout was validated by `try_allocate`.
                let layout = Layout::from_size_align_unchecked(size, mem::align_of::<T>());
                dealloc(self.ptr.as_ptr().cast::<u8>(), layout);
            }
        }
    }
}

#[cfg(test)]
#[inline]
fn injected_failure() -> bool {
    fault::should_fail()
}

#[cfg(not(test))]
#[inline(always)]
fn injected_failure() -> bool {
    false
}
