//! A growable array with explicit capacity and strong-guarantee mutation.
//!
//! [`DynamicArray`] keeps its elements in one owned block. Capacity is
//! tracked separately from the logical size; a fresh array holds
//! [`DynamicArray::DEFAULT_CAPACITY`] slots, and growing past the capacity
//! reallocates to [`DynamicArray::GROWTH_FACTOR`] times the requested size.
//!
//! ```
//! use fsarray::DynamicArray;
//!
//! let mut arr = DynamicArray::new();
//! for i in 0..10 {
//!     arr.push_back(i);
//! }
//! assert_eq!(arr.capacity(), 16);
//!
//! arr.erase(arr.begin() + 5);
//! assert_eq!(arr, [0, 1, 2, 3, 4, 6, 7, 8, 9]);
//! ```

mod array;
mod cursor;
mod error;
mod iter;
mod raw;

pub use array::DynamicArray;
pub use cursor::Cursor;
pub use error::{ArrayError, InsertError};
pub use iter::IntoIter;

#[cfg(test)]
mod tests;
