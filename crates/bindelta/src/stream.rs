//! Sequential stream adaptors over the random-access contracts.
//!
//! This layer holds no positional-lookup logic of its own; it only maps a
//! cursor onto a [`BinaryData`] or [`EditableBinaryData`], speaking the
//! classic `std::io` vocabulary plus mark/reset.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::{
    data::{BinaryData, EditableBinaryData},
    error::Result,
};

fn resolve_seek(target: SeekFrom, current: u64, len: u64) -> io::Result<u64> {
    let resolved = match target {
        SeekFrom::Start(position) => Some(position),
        SeekFrom::End(delta) => len.checked_add_signed(delta),
        SeekFrom::Current(delta) => current.checked_add_signed(delta),
    };
    resolved.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative position")
    })
}

/// A sequential reader over any [`BinaryData`].
///
/// Seeking past the end is allowed; reads there simply return EOF.
///
/// # Examples
///
/// ```rust
/// use std::io::Read;
///
/// use bindelta::{ByteArrayData, DataReader};
///
/// let data = ByteArrayData::from(&[1u8, 2, 3, 4][..]);
/// let mut reader = DataReader::new(&data);
/// assert_eq!(reader.skip(1), 1);
/// let mut buf = [0u8; 2];
/// reader.read_exact(&mut buf)?;
/// assert_eq!(buf, [2, 3]);
/// assert_eq!(reader.available(), 1);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct DataReader<D: BinaryData> {
    data: D,
    position: u64,
    mark: u64,
}

impl<D: BinaryData> DataReader<D> {
    /// Creates a reader positioned at the start.
    #[must_use]
    pub fn new(data: D) -> Self {
        Self {
            data,
            position: 0,
            mark: 0,
        }
    }

    /// Current cursor position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes remaining before EOF, clamped at zero.
    #[must_use]
    pub fn available(&self) -> u64 {
        self.data.len().saturating_sub(self.position)
    }

    /// Advances by `min(count, remaining)` bytes, returning how far it moved.
    pub fn skip(&mut self, count: u64) -> u64 {
        let skipped = count.min(self.available());
        self.position += skipped;
        skipped
    }

    /// Jumps to the end, returning the new position.
    pub fn finish(&mut self) -> u64 {
        self.position = self.data.len();
        self.position
    }

    /// Remembers the current position for [`DataReader::reset`].
    pub fn mark(&mut self) {
        self.mark = self.position;
    }

    /// Returns to the last marked position (the start when never marked).
    pub fn reset(&mut self) {
        self.position = self.mark;
    }

    /// Reads one byte, or `None` at EOF.
    ///
    /// # Errors
    ///
    /// Propagates the underlying [`crate::DataError`].
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.position >= self.data.len() {
            return Ok(None);
        }
        let value = self.data.byte(self.position)?;
        self.position += 1;
        Ok(Some(value))
    }

    /// Consumes the reader, returning the underlying data.
    pub fn into_inner(self) -> D {
        self.data
    }
}

impl<D: BinaryData> Read for DataReader<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.available();
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let count = usize::try_from((buf.len() as u64).min(remaining))
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "read too large"))?;
        self.data
            .copy_to_slice(self.position, &mut buf[..count])
            .map_err(io::Error::from)?;
        self.position += count as u64;
        Ok(count)
    }
}

impl<D: BinaryData> Seek for DataReader<D> {
    fn seek(&mut self, target: SeekFrom) -> io::Result<u64> {
        self.position = resolve_seek(target, self.position, self.data.len())?;
        Ok(self.position)
    }
}

/// A sequential writer over any [`EditableBinaryData`].
///
/// Writes overwrite at the cursor and auto-grow the backing store; writing
/// after a seek past the end zero-fills the gap first.
#[derive(Debug)]
pub struct DataWriter<D: EditableBinaryData> {
    data: D,
    position: u64,
}

impl<D: EditableBinaryData> DataWriter<D> {
    /// Creates a writer positioned at the start.
    #[must_use]
    pub fn new(data: D) -> Self {
        Self { data, position: 0 }
    }

    /// Creates a writer positioned at the end, for appending.
    #[must_use]
    pub fn append(data: D) -> Self {
        let position = data.len();
        Self { data, position }
    }

    /// Current cursor position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Jumps to the end, returning the new position.
    pub fn finish(&mut self) -> u64 {
        self.position = self.data.len();
        self.position
    }

    /// Consumes the writer, returning the underlying data.
    pub fn into_inner(self) -> D {
        self.data
    }
}

impl<D: EditableBinaryData> Write for DataWriter<D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.position > self.data.len() {
            self.data.set_len(self.position).map_err(io::Error::from)?;
        }
        self.data
            .overwrite(self.position, buf)
            .map_err(io::Error::from)?;
        self.position += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<D: EditableBinaryData> Seek for DataWriter<D> {
    fn seek(&mut self, target: SeekFrom) -> io::Result<u64> {
        self.position = resolve_seek(target, self.position, self.data.len())?;
        Ok(self.position)
    }
}
