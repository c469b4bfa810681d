use std::alloc::Layout;
use std::fmt;

use thiserror::Error;

/// Failures reported by the checked (`try_*`) operations of a `DynamicArray`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArrayError {
    /// The requested capacity overflows `usize` or exceeds `isize::MAX` bytes.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The allocator could not satisfy the request.
    #[error("memory allocation of {} bytes failed", .layout.size())]
    AllocFailed { layout: Layout },

    #[error("index out of range: the len is {len} but the index is {index}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("position out of range: the len is {len} but the position is {position}")]
    PositionOutOfRange { position: usize, len: usize },
}

impl ArrayError {
    /// Whether this error comes from the memory primitive rather than a bad
    /// index or position.
    pub fn is_alloc_failure(&self) -> bool {
        matches!(self, ArrayError::CapacityOverflow | ArrayError::AllocFailed { .. })
    }
}

/// A rejected insertion. Hands the item back to the caller untouched.
#[derive(Debug)]
pub struct InsertError<T> {
    pub error: ArrayError,
    pub item: T,
}

impl<T> InsertError<T> {
    pub fn into_item(self) -> T {
        self.item
    }
}

impl<T> fmt::Display for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "insert failed: {}", self.error)
    }
}

impl<T: fmt::Debug> std::error::Error for InsertError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
