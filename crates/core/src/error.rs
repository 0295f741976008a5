//! Error types for Herald collections.

use core::fmt;

/// Result type alias for fallible collection operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by positional operations on ordered collections.
///
/// Everything else in the library is total: adding a present element or
/// removing an absent one is simply a no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// An index lies outside the collection.
    IndexOutOfBounds {
        index: usize,
        len: usize,
    },
    /// The element is already in the collection.
    DuplicateElement,
    /// A move refers to a position outside the collection.
    InvalidMove {
        from: usize,
        to: usize,
        len: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IndexOutOfBounds { index, len } => {
                write!(f, "Index {} out of bounds for length {}", index, len)
            }
            Error::DuplicateElement => {
                write!(f, "Element is already present")
            }
            Error::InvalidMove { from, to, len } => {
                write!(f, "Invalid move from {} to {} for length {}", from, to, len)
            }
        }
    }
}

impl Error {
    /// Creates an index out of bounds error.
    pub fn index_out_of_bounds(index: usize, len: usize) -> Self {
        Error::IndexOutOfBounds { index, len }
    }

    /// Creates a duplicate element error.
    pub fn duplicate_element() -> Self {
        Error::DuplicateElement
    }

    /// Creates an invalid move error.
    pub fn invalid_move(from: usize, to: usize, len: usize) -> Self {
        Error::InvalidMove { from, to, len }
    }
}
