//! The read-only and editable binary data contracts, plus the plain
//! array-backed implementation.
//!
//! [`BinaryData`] is the sole boundary consumed by format decoders and handed
//! to the editor surface; [`EditableBinaryData`] layers the edit path on top.
//! [`ByteArrayData`] is the simplest implementation of both and doubles as the
//! snapshot type returned by the `copy_*` operations.

use std::io::Write;

use crate::error::{DataError, Result};

/// Chunk size used by the default stream export.
const SAVE_CHUNK: usize = 4096;

pub(crate) fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| DataError::overflow(value))
}

/// A read-only view over a sequence of bytes.
///
/// The size of the data never changes behind the caller's back; it only moves
/// through the explicit mutation API of [`EditableBinaryData`].
///
/// # Examples
///
/// ```rust
/// use bindelta::{BinaryData, ByteArrayData};
///
/// let data = ByteArrayData::from(&[0x01, 0x02, 0x03][..]);
/// assert_eq!(data.len(), 3);
/// assert_eq!(data.byte(1)?, 0x02);
/// assert!(data.byte(3).is_err());
/// # Ok::<(), bindelta::DataError>(())
/// ```
pub trait BinaryData {
    /// Size of the data in bytes.
    fn len(&self) -> u64;

    /// Returns `true` if the data holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the byte at `position`.
    ///
    /// # Errors
    ///
    /// [`DataError::OutOfBounds`] when `position >= len()`.
    fn byte(&self, position: u64) -> Result<u8>;

    /// Copies `target.len()` bytes starting at `position` into `target`.
    ///
    /// # Errors
    ///
    /// [`DataError::OutOfBounds`] when the requested range does not lie fully
    /// inside the data.
    fn copy_to_slice(&self, position: u64, target: &mut [u8]) -> Result<()>;

    /// Returns an independent snapshot of `length` bytes starting at `start`.
    ///
    /// # Errors
    ///
    /// [`DataError::OutOfBounds`] when the range does not lie fully inside
    /// the data, [`DataError::DataOverflow`] when it cannot be addressed.
    fn copy_range(&self, start: u64, length: u64) -> Result<ByteArrayData> {
        let mut buf = vec![0u8; to_usize(length)?];
        self.copy_to_slice(start, &mut buf)?;
        Ok(ByteArrayData::from(buf))
    }

    /// Returns an independent snapshot of the whole data.
    ///
    /// # Errors
    ///
    /// See [`BinaryData::copy_range`].
    fn copy_all(&self) -> Result<ByteArrayData> {
        self.copy_range(0, self.len())
    }

    /// Writes the whole data to `out`, front to back.
    ///
    /// # Errors
    ///
    /// Read failures surface as their [`DataError`]; write failures as
    /// [`DataError::Io`].
    fn save_to_stream(&self, out: &mut dyn Write) -> Result<()> {
        let mut buf = [0u8; SAVE_CHUNK];
        let len = self.len();
        let mut position = 0u64;
        while position < len {
            let chunk = to_usize((len - position).min(SAVE_CHUNK as u64))?;
            self.copy_to_slice(position, &mut buf[..chunk])?;
            out.write_all(&buf[..chunk])?;
            position += chunk as u64;
        }
        Ok(())
    }
}

/// The edit path over a [`BinaryData`].
pub trait EditableBinaryData: BinaryData {
    /// Inserts `data` before the byte at `position`; `position == len()`
    /// appends.
    ///
    /// # Errors
    ///
    /// [`DataError::OutOfBounds`] when `position > len()`.
    fn insert(&mut self, position: u64, data: &[u8]) -> Result<()>;

    /// Removes `length` bytes starting at `position`.
    ///
    /// # Errors
    ///
    /// [`DataError::OutOfBounds`] when the range does not lie fully inside
    /// the data.
    fn remove(&mut self, position: u64, length: u64) -> Result<()>;

    /// Grows the data with trailing zeros or discards the tail.
    ///
    /// # Errors
    ///
    /// [`DataError::DataOverflow`] when `new_len` cannot be addressed.
    fn set_len(&mut self, new_len: u64) -> Result<()>;

    /// Replaces the bytes at `position` with `data`, growing the data when
    /// `data` reaches past the current end.
    ///
    /// # Errors
    ///
    /// [`DataError::OutOfBounds`] when `position > len()`.
    fn overwrite(&mut self, position: u64, data: &[u8]) -> Result<()> {
        let len = self.len();
        if position > len {
            return Err(DataError::out_of_bounds(position, len));
        }
        let replaced = (len - position).min(data.len() as u64);
        self.remove(position, replaced)?;
        self.insert(position, data)
    }

    /// Replaces the single byte at `position`; `position == len()` appends.
    ///
    /// # Errors
    ///
    /// [`DataError::OutOfBounds`] when `position > len()`.
    fn set_byte(&mut self, position: u64, value: u8) -> Result<()> {
        self.overwrite(position, &[value])
    }
}

impl<T: BinaryData + ?Sized> BinaryData for &T {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn byte(&self, position: u64) -> Result<u8> {
        (**self).byte(position)
    }

    fn copy_to_slice(&self, position: u64, target: &mut [u8]) -> Result<()> {
        (**self).copy_to_slice(position, target)
    }

    fn copy_range(&self, start: u64, length: u64) -> Result<ByteArrayData> {
        (**self).copy_range(start, length)
    }

    fn save_to_stream(&self, out: &mut dyn Write) -> Result<()> {
        (**self).save_to_stream(out)
    }
}

impl<T: BinaryData + ?Sized> BinaryData for &mut T {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn byte(&self, position: u64) -> Result<u8> {
        (**self).byte(position)
    }

    fn copy_to_slice(&self, position: u64, target: &mut [u8]) -> Result<()> {
        (**self).copy_to_slice(position, target)
    }

    fn copy_range(&self, start: u64, length: u64) -> Result<ByteArrayData> {
        (**self).copy_range(start, length)
    }

    fn save_to_stream(&self, out: &mut dyn Write) -> Result<()> {
        (**self).save_to_stream(out)
    }
}

impl<T: EditableBinaryData + ?Sized> EditableBinaryData for &mut T {
    fn insert(&mut self, position: u64, data: &[u8]) -> Result<()> {
        (**self).insert(position, data)
    }

    fn remove(&mut self, position: u64, length: u64) -> Result<()> {
        (**self).remove(position, length)
    }

    fn set_len(&mut self, new_len: u64) -> Result<()> {
        (**self).set_len(new_len)
    }

    fn overwrite(&mut self, position: u64, data: &[u8]) -> Result<()> {
        (**self).overwrite(position, data)
    }

    fn set_byte(&mut self, position: u64, value: u8) -> Result<()> {
        (**self).set_byte(position, value)
    }
}

/// A `Vec<u8>`-backed implementation of the binary data contracts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteArrayData {
    bytes: Vec<u8>,
}

impl ByteArrayData {
    /// Creates an empty instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the data, returning the underlying vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    fn check_range(&self, position: u64, length: u64) -> Result<usize> {
        let end = position
            .checked_add(length)
            .ok_or_else(|| DataError::overflow(length))?;
        if end > self.len() {
            return Err(DataError::out_of_bounds(end, self.len()));
        }
        to_usize(position)
    }
}

impl From<Vec<u8>> for ByteArrayData {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for ByteArrayData {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }
}

impl BinaryData for ByteArrayData {
    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn byte(&self, position: u64) -> Result<u8> {
        let at = self.check_range(position, 1)?;
        Ok(self.bytes[at])
    }

    fn copy_to_slice(&self, position: u64, target: &mut [u8]) -> Result<()> {
        let at = self.check_range(position, target.len() as u64)?;
        target.copy_from_slice(&self.bytes[at..at + target.len()]);
        Ok(())
    }

    fn save_to_stream(&self, out: &mut dyn Write) -> Result<()> {
        out.write_all(&self.bytes)?;
        Ok(())
    }
}

impl EditableBinaryData for ByteArrayData {
    fn insert(&mut self, position: u64, data: &[u8]) -> Result<()> {
        if position > self.len() {
            return Err(DataError::out_of_bounds(position, self.len()));
        }
        let at = to_usize(position)?;
        self.bytes.splice(at..at, data.iter().copied());
        Ok(())
    }

    fn remove(&mut self, position: u64, length: u64) -> Result<()> {
        let at = self.check_range(position, length)?;
        self.bytes.drain(at..at + to_usize(length)?);
        Ok(())
    }

    fn set_len(&mut self, new_len: u64) -> Result<()> {
        self.bytes.resize(to_usize(new_len)?, 0);
        Ok(())
    }

    fn overwrite(&mut self, position: u64, data: &[u8]) -> Result<()> {
        if position > self.len() {
            return Err(DataError::out_of_bounds(position, self.len()));
        }
        let at = to_usize(position)?;
        let end = at + data.len();
        if end > self.bytes.len() {
            self.bytes.resize(end, 0);
        }
        self.bytes[at..end].copy_from_slice(data);
        Ok(())
    }
}
