use std::fmt;

/// Errors returned by fallible map and cursor operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested key is not present in the map.
    KeyNotFound,
    /// The cursor is past-the-end where an element is required, would move
    /// before the first element, belongs to another map, or points at an
    /// erased node.
    InvalidIterator,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeyNotFound => write!(f, "key not found"),
            Error::InvalidIterator => write!(f, "invalid iterator"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T, E = Error> = core::result::Result<T, E>;
