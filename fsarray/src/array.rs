use std::alloc::handle_alloc_error;
use std::cmp;
use std::fmt;
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr;
use std::slice;

use log::trace;

use crate::cursor::Cursor;
use crate::error::{ArrayError, InsertError};
use crate::iter::IntoIter;
use crate::raw::RawBuf;

/// A contiguous growable array with an explicit capacity.
///
/// Every mutating operation either succeeds completely or leaves the array
/// exactly as it was (strong guarantee), including when an element's
/// `Clone` or `Default` panics halfway through. The checked `try_*` forms
/// report allocation failure and bad positions as [`ArrayError`]; the
/// unchecked forms panic on bad indices or positions and hand allocation
/// failure to [`handle_alloc_error`], like `Vec`.
///
/// Positions are [`Cursor`] offsets. Any operation that reallocates or shifts
/// storage changes what a previously obtained cursor refers to.
pub struct DynamicArray<T> {
    buf: RawBuf<T>,
    len: usize,
}

/// Drops the values written so far if construction is interrupted by a panic.
struct PartialFill<T> {
    base: *mut T,
    start: usize,
    filled: usize,
}

impl<T> PartialFill<T> {
    fn new(base: *mut T, start: usize) -> Self {
        Self {
            base,
            start,
            filled: 0,
        }
    }

    /// SAFETY: slot `start + filled` must be in bounds and uninitialized.
    unsafe fn push(&mut self, value: T) {
        unsafe { ptr::write(self.base.add(self.start + self.filled), value) };
        self.filled += 1;
    }

    fn commit(self) -> usize {
        let filled = self.filled;
        mem::forget(self);
        filled
    }
}

impl<T> Drop for PartialFill<T> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.base.add(self.start),
                self.filled,
            ));
        }
    }
}

#[cold]
#[track_caller]
fn fail(error: ArrayError) -> ! {
    match error {
        ArrayError::AllocFailed { layout } => handle_alloc_error(layout),
        other => panic!("{}", other),
    }
}

#[inline]
#[track_caller]
fn unwrap_or_fail<R>(result: Result<R, ArrayError>) -> R {
    match result {
        Ok(value) => value,
        Err(error) => fail(error),
    }
}

impl<T> DynamicArray<T> {
    /// Capacity of a freshly constructed array.
    pub const DEFAULT_CAPACITY: usize = 16;

    /// Reallocation makes room for this many times the requested size.
    pub const GROWTH_FACTOR: usize = 2;

    /// The array without any allocation: capacity 0, size 0.
    ///
    /// This is also the state [`take`](Self::take) leaves behind.
    pub const fn empty() -> Self {
        Self {
            buf: RawBuf::dangling(),
            len: 0,
        }
    }

    /// An empty array with [`DEFAULT_CAPACITY`](Self::DEFAULT_CAPACITY) slots.
    pub fn new() -> Self {
        unwrap_or_fail(Self::try_new())
    }

    pub fn try_new() -> Result<Self, ArrayError> {
        Self::try_with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// An empty array with exactly `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        unwrap_or_fail(Self::try_with_capacity(capacity))
    }

    pub fn try_with_capacity(capacity: usize) -> Result<Self, ArrayError> {
        Ok(Self {
            buf: RawBuf::try_allocate(capacity)?,
            len: 0,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn begin(&self) -> Cursor {
        Cursor::at(0)
    }

    /// One past the last live element; always `begin() + len()`.
    #[inline]
    pub fn end(&self) -> Cursor {
        self.begin() + self.len
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: slots [0, len) are live; the pointer is non-null and aligned
        // even without an allocation.
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.buf.as_ptr(), self.len) }
    }

    pub fn as_ptr(&self) -> *const T {
        self.buf.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.as_ptr()
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Checked element access.
    pub fn at(&self, index: usize) -> Result<&T, ArrayError> {
        let len = self.len;
        self.get(index)
            .ok_or(ArrayError::IndexOutOfRange { index, len })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, ArrayError> {
        let len = self.len;
        self.get_mut(index)
            .ok_or(ArrayError::IndexOutOfRange { index, len })
    }

    /// Exchanges storage, size and capacity with `other`. Never fails.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.buf, &mut other.buf);
        mem::swap(&mut self.len, &mut other.len);
    }

    /// Moves the contents out, leaving `self` with no allocation.
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::empty())
    }

    /// Move assignment: `self` gets the contents of `source`, and `source`
    /// gets what `self` held before.
    pub fn move_from(&mut self, source: &mut Self) {
        self.swap(source);
    }

    /// Makes sure `additional` more elements fit without reallocating.
    pub fn reserve(&mut self, additional: usize) {
        unwrap_or_fail(self.try_reserve(additional))
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), ArrayError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(ArrayError::CapacityOverflow)?;
        if required > self.capacity() {
            self.relocate(required)?;
        }
        Ok(())
    }

    /// Drops the spare capacity. An empty array releases its allocation.
    pub fn shrink_to_fit(&mut self) {
        unwrap_or_fail(self.try_shrink_to_fit())
    }

    pub fn try_shrink_to_fit(&mut self) -> Result<(), ArrayError> {
        if self.len < self.capacity() {
            self.relocate(self.len)?;
        }
        Ok(())
    }

    /// Moves the live elements into a fresh block of `new_cap` slots.
    /// On failure nothing has changed.
    fn relocate(&mut self, new_cap: usize) -> Result<(), ArrayError> {
        debug_assert!(new_cap >= self.len);
        let new_buf = RawBuf::try_allocate(new_cap)?;
        trace!(
            "relocating {} elements: capacity {} -> {}",
            self.len,
            self.capacity(),
            new_cap
        );
        // SAFETY: distinct blocks, both hold at least `len` slots. Moving
        // bits cannot fail, and the old block is freed without dropping.
        unsafe {
            ptr::copy_nonoverlapping(self.buf.as_ptr(), new_buf.as_ptr(), self.len);
        }
        self.buf = new_buf;
        Ok(())
    }

    /// Capacity to allocate when `new_len` does not fit.
    fn grown_capacity(new_len: usize) -> Result<usize, ArrayError> {
        new_len
            .checked_mul(Self::GROWTH_FACTOR)
            .ok_or(ArrayError::CapacityOverflow)
    }

    fn grow_for(&mut self, new_len: usize) -> Result<(), ArrayError> {
        if new_len > self.capacity() {
            self.relocate(Self::grown_capacity(new_len)?)?;
        }
        Ok(())
    }

    /// Shortens the array to `new_len`, dropping the tail. Never reallocates.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        let tail = unsafe {
            ptr::slice_from_raw_parts_mut(self.buf.as_ptr().add(new_len), self.len - new_len)
        };
        // Shrink first: a panicking destructor must not expose dropped slots.
        self.len = new_len;
        unsafe { ptr::drop_in_place(tail) };
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Sets the size to `new_len`, filling new slots with values from `fill`.
    pub fn resize_with<F>(&mut self, new_len: usize, fill: F)
    where
        F: FnMut() -> T,
    {
        unwrap_or_fail(self.try_resize_with(new_len, fill))
    }

    /// Strong guarantee: on allocation failure, or if `fill` panics, the
    /// array keeps its old storage, size, capacity and contents.
    pub fn try_resize_with<F>(&mut self, new_len: usize, mut fill: F) -> Result<(), ArrayError>
    where
        F: FnMut() -> T,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }

        if new_len <= self.capacity() {
            let mut guard = PartialFill::new(self.buf.as_ptr(), self.len);
            for _ in self.len..new_len {
                unsafe { guard.push(fill()) };
            }
            self.len += guard.commit();
            return Ok(());
        }

        // Build the grown block completely before touching `self`.
        let new_buf = RawBuf::try_allocate(Self::grown_capacity(new_len)?)?;
        let mut guard = PartialFill::new(new_buf.as_ptr(), self.len);
        for _ in self.len..new_len {
            unsafe { guard.push(fill()) };
        }
        guard.commit();
        trace!(
            "relocating {} elements: capacity {} -> {}",
            self.len,
            self.capacity(),
            new_buf.capacity()
        );
        unsafe {
            ptr::copy_nonoverlapping(self.buf.as_ptr(), new_buf.as_ptr(), self.len);
        }
        self.buf = new_buf;
        self.len = new_len;
        Ok(())
    }

    /// Inserts `item` before `pos`, shifting the tail right by one.
    ///
    /// Returns the position of the inserted element.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is past `end()`.
    #[track_caller]
    pub fn insert(&mut self, pos: Cursor, item: T) -> Cursor {
        match self.try_insert(pos, item) {
            Ok(cursor) => cursor,
            Err(rejected) => fail(rejected.error),
        }
    }

    pub fn try_insert(&mut self, pos: Cursor, item: T) -> Result<Cursor, InsertError<T>> {
        // Reallocation invalidates the meaning of `pos`, so keep the offset.
        let offset = pos.offset();
        if offset > self.len {
            let error = ArrayError::PositionOutOfRange {
                position: offset,
                len: self.len,
            };
            return Err(InsertError { error, item });
        }

        let grown = self
            .len
            .checked_add(1)
            .ok_or(ArrayError::CapacityOverflow)
            .and_then(|new_len| self.grow_for(new_len));
        if let Err(error) = grown {
            return Err(InsertError { error, item });
        }

        unsafe { ptr::write(self.buf.as_ptr().add(self.len), item) };
        self.len += 1;
        self.as_mut_slice()[offset..].rotate_right(1);
        Ok(Cursor::at(offset))
    }

    /// Removes the element at `pos`, shifting the tail left by one.
    ///
    /// Returns the position now holding the following element, which is
    /// `end()` when the last element was erased.
    ///
    /// # Panics
    ///
    /// Panics if `pos` does not denote a live element.
    #[track_caller]
    pub fn erase(&mut self, pos: Cursor) -> Cursor {
        unwrap_or_fail(self.try_erase(pos))
    }

    pub fn try_erase(&mut self, pos: Cursor) -> Result<Cursor, ArrayError> {
        let offset = pos.offset();
        if offset >= self.len {
            return Err(ArrayError::PositionOutOfRange {
                position: offset,
                len: self.len,
            });
        }
        drop(self.remove_unchecked(offset));
        Ok(pos)
    }

    /// Removes and returns the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        unwrap_or_fail(self.try_remove(index))
    }

    pub fn try_remove(&mut self, index: usize) -> Result<T, ArrayError> {
        if index >= self.len {
            return Err(ArrayError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(self.remove_unchecked(index))
    }

    fn remove_unchecked(&mut self, index: usize) -> T {
        debug_assert!(index < self.len);
        unsafe {
            let p = self.buf.as_ptr().add(index);
            let item = ptr::read(p);
            ptr::copy(p.add(1), p, self.len - index - 1);
            self.len -= 1;
            item
        }
    }

    #[track_caller]
    pub fn push_back(&mut self, item: T) {
        self.insert(self.end(), item);
    }

    pub fn try_push_back(&mut self, item: T) -> Result<(), InsertError<T>> {
        self.try_insert(self.end(), item).map(|_| ())
    }

    /// Removes the last element.
    ///
    /// # Panics
    ///
    /// Calling this on an empty array is a caller bug and panics.
    #[track_caller]
    pub fn pop_back(&mut self) {
        assert!(!self.is_empty(), "pop_back on an empty DynamicArray");
        self.erase(self.end() - 1);
    }

    /// Removes the last element and returns it, or `None` if empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            // SAFETY: the slot was live and is now outside [0, len).
            unsafe { Some(ptr::read(self.buf.as_ptr().add(self.len))) }
        }
    }
}

impl<T: Default> DynamicArray<T> {
    /// `size` default values, with capacity `max(size, DEFAULT_CAPACITY)`.
    pub fn with_size(size: usize) -> Self {
        unwrap_or_fail(Self::try_with_size(size))
    }

    pub fn try_with_size(size: usize) -> Result<Self, ArrayError> {
        let mut array = Self::try_with_capacity(cmp::max(size, Self::DEFAULT_CAPACITY))?;
        array.try_resize_with(size, T::default)?;
        Ok(array)
    }

    /// Sets the size to `new_len`.
    ///
    /// Growing past the capacity reallocates to `GROWTH_FACTOR * new_len`
    /// slots. New slots hold `T::default()`; callers should not depend on
    /// their value. Shrinking drops the tail and keeps the capacity.
    pub fn resize(&mut self, new_len: usize) {
        unwrap_or_fail(self.try_resize(new_len))
    }

    pub fn try_resize(&mut self, new_len: usize) -> Result<(), ArrayError> {
        self.try_resize_with(new_len, T::default)
    }
}

impl<T: Clone> DynamicArray<T> {
    /// Deep copy with the same capacity as `self`.
    ///
    /// If cloning an element panics, the copies made so far are dropped and
    /// the new block is released before the panic continues.
    pub fn try_clone(&self) -> Result<Self, ArrayError> {
        let buf = RawBuf::try_allocate(self.capacity())?;
        let mut guard = PartialFill::new(buf.as_ptr(), 0);
        for item in self.iter() {
            unsafe { guard.push(item.clone()) };
        }
        let len = guard.commit();
        Ok(Self { buf, len })
    }

    /// Copy assignment: copies `source` aside, then swaps it in.
    pub fn assign_from(&mut self, source: &Self) -> Result<(), ArrayError> {
        let mut copy = source.try_clone()?;
        self.swap(&mut copy);
        Ok(())
    }
}

impl<T> Drop for DynamicArray<T> {
    fn drop(&mut self) {
        // The buffer frees the block once the live elements are gone.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.buf.as_ptr(), self.len));
        }
    }
}

impl<T: Clone> Clone for DynamicArray<T> {
    fn clone(&self) -> Self {
        unwrap_or_fail(self.try_clone())
    }

    fn clone_from(&mut self, source: &Self) {
        unwrap_or_fail(self.assign_from(source))
    }
}

impl<T> Default for DynamicArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for DynamicArray<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for DynamicArray<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> AsRef<[T]> for DynamicArray<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AsMut<[T]> for DynamicArray<T> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> Index<usize> for DynamicArray<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        unwrap_or_fail(self.at(index))
    }
}

impl<T> IndexMut<usize> for DynamicArray<T> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        unwrap_or_fail(self.at_mut(index))
    }
}

impl<T: fmt::Debug> fmt::Debug for DynamicArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U> PartialEq<DynamicArray<U>> for DynamicArray<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &DynamicArray<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for DynamicArray<T> {}

impl<T, U, const N: usize> PartialEq<[U; N]> for DynamicArray<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == &other[..]
    }
}

impl<T, U> PartialEq<&[U]> for DynamicArray<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T, U> PartialEq<Vec<U>> for DynamicArray<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &Vec<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T> Extend<T> for DynamicArray<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<T> FromIterator<T> for DynamicArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        array.extend(iter);
        array
    }
}

impl<T> IntoIterator for DynamicArray<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        // The elements now belong to the iterator; skip our destructor.
        let mut this = ManuallyDrop::new(self);
        let buf = mem::replace(&mut this.buf, RawBuf::dangling());
        IntoIter::new(buf, this.len)
    }
}

impl<'a, T> IntoIterator for &'a DynamicArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynamicArray<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
