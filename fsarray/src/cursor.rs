use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A position inside a `DynamicArray`, counted from `begin()`.
///
/// A cursor is just an offset: it stays memory-safe across reallocation, but
/// any operation that grows, shrinks or shifts the array changes which
/// element it denotes. Recompute cursors after such operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cursor(usize);

impl Cursor {
    pub const fn at(offset: usize) -> Self {
        Cursor(offset)
    }

    pub const fn offset(self) -> usize {
        self.0
    }
}

impl From<Cursor> for usize {
    fn from(cursor: Cursor) -> usize {
        cursor.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl Add<usize> for Cursor {
    type Output = Cursor;

    fn add(self, rhs: usize) -> Cursor {
        Cursor(self.0 + rhs)
    }
}

impl AddAssign<usize> for Cursor {
    fn add_assign(&mut self, rhs: usize) {
        self.0 += rhs;
    }
}

impl Sub<usize> for Cursor {
    type Output = Cursor;

    fn sub(self, rhs: usize) -> Cursor {
        Cursor(self.0 - rhs)
    }
}

impl SubAssign<usize> for Cursor {
    fn sub_assign(&mut self, rhs: usize) {
        self.0 -= rhs;
    }
}

/// Distance between two cursors.
impl Sub<Cursor> for Cursor {
    type Output = usize;

    fn sub(self, rhs: Cursor) -> usize {
        self.0 - rhs.0
    }
}
