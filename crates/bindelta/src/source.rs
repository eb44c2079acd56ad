//! File-backed random-access data source.
//!
//! [`FileDataSource`] wraps one exclusively-held file handle and offers
//! byte/bulk random IO plus truncate/extend. All IO is blocking and
//! synchronous on the calling thread; callers serialize access. Cache
//! consumers detect staleness through the source's generation counter: every
//! mutation bumps it, so a cache only has to remember the generation it last
//! loaded under.

use std::{
    cell::{Cell, RefCell},
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::{DataError, Result};

/// File open mode, controlling whether mutations are permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Reads only; every mutation fails with [`DataError::ReadOnly`].
    ReadOnly,
    /// Reads and writes; the file is created when missing.
    ReadWrite,
}

/// Exclusive wrapper over one open file.
///
/// Interior mutability keeps the read path usable through a shared reference;
/// there is no internal locking, instances are single-threaded.
#[derive(Debug)]
pub struct FileDataSource {
    file: RefCell<Option<File>>,
    path: PathBuf,
    mode: FileMode,
    len: Cell<u64>,
    generation: Cell<u64>,
}

impl FileDataSource {
    /// Opens `path` in the given mode.
    ///
    /// # Errors
    ///
    /// [`DataError::Io`] when the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, mode: FileMode) -> Result<Self> {
        let path = path.as_ref();
        let file = match mode {
            FileMode::ReadOnly => File::open(path)?,
            FileMode::ReadWrite => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)?,
        };
        let len = file.metadata()?.len();
        debug!(path = %path.display(), ?mode, len, "opened file data source");
        Ok(Self {
            file: RefCell::new(Some(file)),
            path: path.to_path_buf(),
            mode,
            len: Cell::new(len),
            generation: Cell::new(0),
        })
    }

    /// Path the source was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The open mode.
    #[must_use]
    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// Returns `true` once [`FileDataSource::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.file.borrow().is_none()
    }

    /// Current invalidation generation. Bumped by every mutation and by
    /// [`FileDataSource::invalidate`]; caches compare it against the
    /// generation they last loaded under.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Marks all cached file pages stale by bumping the generation.
    pub fn invalidate(&self) {
        self.bump();
    }

    /// Current file length in bytes.
    ///
    /// # Errors
    ///
    /// [`DataError::ResourceClosed`] after [`FileDataSource::close`].
    pub fn len(&self) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.len.get())
    }

    /// Returns `true` when the file holds no bytes.
    ///
    /// # Errors
    ///
    /// [`DataError::ResourceClosed`] after [`FileDataSource::close`].
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Truncates or extends the file to `new_len`; extension zero-fills.
    ///
    /// # Errors
    ///
    /// [`DataError::ResourceClosed`], [`DataError::ReadOnly`], or
    /// [`DataError::Io`].
    pub fn set_len(&self, new_len: u64) -> Result<()> {
        self.ensure_writable()?;
        let guard = self.file.borrow();
        let file = guard.as_ref().ok_or(DataError::ResourceClosed)?;
        file.set_len(new_len)?;
        self.len.set(new_len);
        self.bump();
        Ok(())
    }

    /// Reads the byte at `position`.
    ///
    /// # Errors
    ///
    /// [`DataError::OutOfBounds`] when `position` is at or past the end,
    /// [`DataError::ResourceClosed`], or [`DataError::Io`].
    pub fn byte(&self, position: u64) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact_at(position, &mut buf)?;
        Ok(buf[0])
    }

    /// Overwrites the byte at `position`; `position == len()` appends.
    ///
    /// # Errors
    ///
    /// See [`FileDataSource::write_at`].
    pub fn set_byte(&self, position: u64, value: u8) -> Result<()> {
        self.write_at(position, &[value])
    }

    /// Reads up to `buf.len()` bytes starting at `position`, clipped at the
    /// end of the file. Returns the number of bytes read; `0` when
    /// `position` is at or past the end.
    ///
    /// # Errors
    ///
    /// [`DataError::ResourceClosed`] or [`DataError::Io`].
    pub fn read_at(&self, position: u64, buf: &mut [u8]) -> Result<usize> {
        let mut guard = self.file.borrow_mut();
        let file = guard.as_mut().ok_or(DataError::ResourceClosed)?;
        let len = self.len.get();
        if position >= len {
            return Ok(0);
        }
        let available = len - position;
        let count = usize::try_from((buf.len() as u64).min(available))
            .map_err(|_| DataError::overflow(available))?;
        file.seek(SeekFrom::Start(position))?;
        file.read_exact(&mut buf[..count])?;
        Ok(count)
    }

    /// Fills `buf` with the bytes starting at `position`.
    ///
    /// # Errors
    ///
    /// [`DataError::OutOfBounds`] when the range reaches past the end,
    /// [`DataError::ResourceClosed`], or [`DataError::Io`].
    pub fn read_exact_at(&self, position: u64, buf: &mut [u8]) -> Result<()> {
        let len = self.len()?;
        let end = position
            .checked_add(buf.len() as u64)
            .ok_or_else(|| DataError::overflow(buf.len() as u64))?;
        if end > len {
            return Err(DataError::out_of_bounds(end, len));
        }
        let read = self.read_at(position, buf)?;
        debug_assert_eq!(read, buf.len());
        Ok(())
    }

    /// Writes `data` at `position`, extending the file when the range reaches
    /// past the current end.
    ///
    /// # Errors
    ///
    /// [`DataError::ResourceClosed`], [`DataError::ReadOnly`], or
    /// [`DataError::Io`].
    pub fn write_at(&self, position: u64, data: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        let end = position
            .checked_add(data.len() as u64)
            .ok_or_else(|| DataError::overflow(data.len() as u64))?;
        let mut guard = self.file.borrow_mut();
        let file = guard.as_mut().ok_or(DataError::ResourceClosed)?;
        file.seek(SeekFrom::Start(position))?;
        file.write_all(data)?;
        if end > self.len.get() {
            self.len.set(end);
        }
        self.bump();
        Ok(())
    }

    /// Flushes pending writes and releases the file handle. Every subsequent
    /// call on this source fails with [`DataError::ResourceClosed`].
    ///
    /// # Errors
    ///
    /// [`DataError::ResourceClosed`] when already closed, [`DataError::Io`]
    /// when the final flush fails.
    pub fn close(&self) -> Result<()> {
        let mut file = self
            .file
            .borrow_mut()
            .take()
            .ok_or(DataError::ResourceClosed)?;
        let flushed = file.flush();
        debug!(path = %self.path.display(), "closed file data source");
        flushed?;
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(DataError::ResourceClosed);
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        self.ensure_open()?;
        if self.mode == FileMode::ReadOnly {
            return Err(DataError::ReadOnly);
        }
        Ok(())
    }

    fn bump(&self) {
        self.generation.set(self.generation.get() + 1);
    }
}
