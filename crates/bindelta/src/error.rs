//! The error taxonomy shared by every component in the crate.
//!
//! All fallible operations return [`DataError`] through the crate-wide
//! [`Result`] alias, so callers deal with a single failure channel whether a
//! violation is an in-memory bounds problem or a propagated file IO error.

use std::io;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, DataError>;

/// Errors produced by binary data access and mutation.
#[derive(Debug, Error)]
pub enum DataError {
    /// A position or range lies outside the valid data.
    #[error("position {position} out of bounds (size {size})")]
    OutOfBounds {
        /// The offending position (or exclusive range end).
        position: u64,
        /// Size of the data at the time of the access.
        size: u64,
    },

    /// A requested size exceeds what the store can address.
    #[error("requested size {requested} exceeds addressable capacity")]
    DataOverflow {
        /// The size or position that overflowed.
        requested: u64,
    },

    /// An operation was attempted on a source that has been closed.
    #[error("data source is closed")]
    ResourceClosed,

    /// A mutation was attempted on a source opened read-only.
    #[error("data source is read-only")]
    ReadOnly,

    /// Underlying file IO failed.
    #[error("i/o failure")]
    Io(#[from] io::Error),
}

impl DataError {
    pub(crate) fn out_of_bounds(position: u64, size: u64) -> Self {
        DataError::OutOfBounds { position, size }
    }

    pub(crate) fn overflow(requested: u64) -> Self {
        DataError::DataOverflow { requested }
    }
}

impl From<DataError> for io::Error {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Io(inner) => inner,
            other => {
                let kind = match &other {
                    DataError::OutOfBounds { .. } | DataError::DataOverflow { .. } => {
                        io::ErrorKind::InvalidInput
                    }
                    DataError::ReadOnly => io::ErrorKind::PermissionDenied,
                    _ => io::ErrorKind::Other,
                };
                io::Error::new(kind, other)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::DataError;

    #[test]
    fn io_conversion_preserves_inner_error() {
        let inner = io::Error::new(io::ErrorKind::UnexpectedEof, "short read");
        let err: io::Error = DataError::Io(inner).into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn bounds_errors_map_to_invalid_input() {
        let err: io::Error = DataError::out_of_bounds(10, 4).into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
