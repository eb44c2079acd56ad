//! The delta document: an ordered segment list stitching original-file bytes
//! and newly written bytes into one logical sequence.
//!
//! Edits never copy pre-existing bytes. An insert appends the new bytes to
//! the document's memory store and splices a memory segment into the chain; a
//! removal trims or drops segment bookkeeping. Edit cost is proportional to
//! the edit, not to the file size.
//!
//! The memory store is append-only: once bytes land there for one insert they
//! are never overwritten in place, so snapshots taken earlier stay valid
//! while sharing the store.
//!
//! # Examples
//!
//! ```rust
//! use bindelta::{BinaryData, DeltaDocument, EditableBinaryData};
//!
//! let mut doc = DeltaDocument::new();
//! doc.insert(0, &[0x00; 10])?;
//! doc.insert(2, &[0xAA, 0xBB, 0xCC, 0xDD])?;
//! assert_eq!(doc.len(), 14);
//! assert_eq!(doc.byte(2)?, 0xAA);
//! assert_eq!(doc.byte(6)?, 0x00);
//! # Ok::<(), bindelta::DataError>(())
//! ```

use std::{cell::RefCell, fmt, io::Write, ops::Range, rc::Rc};

use tracing::debug;

use crate::{
    cache::PageWindow,
    data::{BinaryData, ByteArrayData, EditableBinaryData, to_usize},
    error::{DataError, Result},
    paged::{DEFAULT_PAGE_SIZE, PagedData},
    segment::{DataSegment, SegmentChain},
    source::{FileDataSource, FileMode},
};

/// Callback fired after every structural mutation with the affected document
/// window.
pub type ChangeListener = Box<dyn FnMut(Range<u64>)>;

/// A document represented as original-data-plus-edits rather than one
/// flattened buffer.
pub struct DeltaDocument {
    chain: SegmentChain,
    memory: Rc<RefCell<PagedData>>,
    source: Option<Rc<FileDataSource>>,
    cache: Option<Rc<RefCell<PageWindow>>>,
    listeners: Vec<ChangeListener>,
}

impl fmt::Debug for DeltaDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeltaDocument")
            .field("len", &self.chain.len())
            .field("segments", &self.chain.segments())
            .finish_non_exhaustive()
    }
}

impl Default for DeltaDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DeltaDocument {
    /// Creates an empty document with [`DEFAULT_PAGE_SIZE`] memory pages.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates an empty document with the given memory page size.
    ///
    /// # Panics
    ///
    /// Panics when `page_size` is zero.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            chain: SegmentChain::new(),
            memory: Rc::new(RefCell::new(PagedData::with_page_size(page_size))),
            source: None,
            cache: None,
            listeners: Vec::new(),
        }
    }

    /// Creates a document over `source` with one initial segment spanning it.
    ///
    /// # Errors
    ///
    /// [`DataError::ResourceClosed`] when the source is already closed.
    pub fn with_source(source: Rc<FileDataSource>) -> Result<Self> {
        Self::with_source_page_size(source, DEFAULT_PAGE_SIZE)
    }

    /// Creates a document over `source` with the given page size, used for
    /// both the file page cache and the memory store.
    ///
    /// # Errors
    ///
    /// [`DataError::ResourceClosed`] when the source is already closed.
    ///
    /// # Panics
    ///
    /// Panics when `page_size` is zero.
    pub fn with_source_page_size(source: Rc<FileDataSource>, page_size: usize) -> Result<Self> {
        let length = source.len()?;
        let chain = if length == 0 {
            SegmentChain::new()
        } else {
            SegmentChain::from_segment(DataSegment::Source { offset: 0, length })
        };
        let cache = PageWindow::with_page_size(Rc::clone(&source), page_size);
        Ok(Self {
            chain,
            memory: Rc::new(RefCell::new(PagedData::with_page_size(page_size))),
            source: Some(source),
            cache: Some(Rc::new(RefCell::new(cache))),
            listeners: Vec::new(),
        })
    }

    /// Opens the file at `path` and builds a document over it.
    ///
    /// # Errors
    ///
    /// [`DataError::Io`] when the file cannot be opened.
    pub fn open(path: impl AsRef<std::path::Path>, mode: FileMode) -> Result<Self> {
        let source = Rc::new(FileDataSource::open(path, mode)?);
        Self::with_source(source)
    }

    /// The original data source, when the document was built over one.
    #[must_use]
    pub fn source(&self) -> Option<&Rc<FileDataSource>> {
        self.source.as_ref()
    }

    /// The current segment list, in document order.
    #[must_use]
    pub fn segments(&self) -> &[DataSegment] {
        self.chain.segments()
    }

    /// Registers a callback fired after every structural mutation with the
    /// affected window.
    pub fn on_change(&mut self, listener: impl FnMut(Range<u64>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Takes a cheap snapshot sharing the underlying stores.
    ///
    /// Because the memory store is append-only and segments are value
    /// descriptors, the snapshot stays byte-identical no matter how the
    /// document is edited afterwards.
    #[must_use]
    pub fn snapshot(&self) -> DeltaSnapshot {
        DeltaSnapshot {
            chain: self.chain.clone(),
            memory: Rc::clone(&self.memory),
            cache: self.cache.clone(),
        }
    }

    fn notify(&mut self, window: Range<u64>) {
        for listener in &mut self.listeners {
            listener(window.clone());
        }
    }

    /// Appends `data` to the memory store and splices the matching memory
    /// segment in at `position`. Caller validates `position <= len`.
    fn splice_in(&mut self, position: u64, data: &[u8]) -> Result<()> {
        let offset = self.memory.borrow_mut().append(data)?;
        self.chain.insert(
            position,
            DataSegment::Memory {
                offset,
                length: data.len() as u64,
            },
        );
        Ok(())
    }
}

/// Reads one byte out of whichever store holds `segments[index]`.
fn chain_byte(
    chain: &SegmentChain,
    memory: &RefCell<PagedData>,
    cache: Option<&Rc<RefCell<PageWindow>>>,
    position: u64,
) -> Result<u8> {
    let Some((index, offset)) = chain.locate(position) else {
        return Err(DataError::out_of_bounds(position, chain.len()));
    };
    match chain.segments()[index] {
        DataSegment::Source { offset: base, .. } => {
            let cache = cache.ok_or(DataError::ResourceClosed)?;
            cache.borrow_mut().byte(base + offset)
        }
        DataSegment::Memory { offset: base, .. } => memory.borrow().byte(base + offset),
    }
}

/// Bulk read across segment boundaries.
fn chain_copy(
    chain: &SegmentChain,
    memory: &RefCell<PagedData>,
    cache: Option<&Rc<RefCell<PageWindow>>>,
    position: u64,
    target: &mut [u8],
) -> Result<()> {
    let end = position
        .checked_add(target.len() as u64)
        .ok_or_else(|| DataError::overflow(target.len() as u64))?;
    if end > chain.len() {
        return Err(DataError::out_of_bounds(end, chain.len()));
    }
    if target.is_empty() {
        return Ok(());
    }
    let (mut index, mut offset) = chain.locate(position).expect("range validated above");
    let mut copied = 0usize;
    while copied < target.len() {
        let segment = chain.segments()[index];
        let chunk = to_usize((segment.length() - offset).min((target.len() - copied) as u64))?;
        let out = &mut target[copied..copied + chunk];
        match segment {
            DataSegment::Source { offset: base, .. } => {
                let cache = cache.ok_or(DataError::ResourceClosed)?;
                cache.borrow_mut().copy_to_slice(base + offset, out)?;
            }
            DataSegment::Memory { offset: base, .. } => {
                memory.borrow().copy_to_slice(base + offset, out)?;
            }
        }
        copied += chunk;
        index += 1;
        offset = 0;
    }
    Ok(())
}

impl BinaryData for DeltaDocument {
    fn len(&self) -> u64 {
        self.chain.len()
    }

    fn byte(&self, position: u64) -> Result<u8> {
        chain_byte(&self.chain, &self.memory, self.cache.as_ref(), position)
    }

    fn copy_to_slice(&self, position: u64, target: &mut [u8]) -> Result<()> {
        chain_copy(
            &self.chain,
            &self.memory,
            self.cache.as_ref(),
            position,
            target,
        )
    }
}

impl EditableBinaryData for DeltaDocument {
    fn insert(&mut self, position: u64, data: &[u8]) -> Result<()> {
        if position > self.len() {
            return Err(DataError::out_of_bounds(position, self.len()));
        }
        if data.is_empty() {
            return Ok(());
        }
        self.splice_in(position, data)?;
        debug!(position, length = data.len(), "insert");
        self.notify(position..position + data.len() as u64);
        Ok(())
    }

    fn remove(&mut self, position: u64, length: u64) -> Result<()> {
        let old_len = self.len();
        let end = position
            .checked_add(length)
            .ok_or_else(|| DataError::overflow(length))?;
        if end > old_len {
            return Err(DataError::out_of_bounds(end, old_len));
        }
        if length == 0 {
            return Ok(());
        }
        self.chain.remove(position, length);
        debug!(position, length, "remove");
        self.notify(position..old_len);
        Ok(())
    }

    fn set_len(&mut self, new_len: u64) -> Result<()> {
        let old_len = self.len();
        if new_len == old_len {
            return Ok(());
        }
        if new_len > old_len {
            // Zeros come out of the memory store; contiguous appends coalesce
            // into one segment.
            let page_size = self.memory.borrow().page_size();
            let zeros = vec![0u8; page_size];
            let mut grown = old_len;
            while grown < new_len {
                let chunk = to_usize((new_len - grown).min(page_size as u64))?;
                self.splice_in(grown, &zeros[..chunk])?;
                grown += chunk as u64;
            }
        } else {
            self.chain.remove(new_len, old_len - new_len);
        }
        debug!(old_len, new_len, "set_len");
        self.notify(old_len.min(new_len)..old_len.max(new_len));
        Ok(())
    }

    fn overwrite(&mut self, position: u64, data: &[u8]) -> Result<()> {
        let old_len = self.len();
        if position > old_len {
            return Err(DataError::out_of_bounds(position, old_len));
        }
        if data.is_empty() {
            return Ok(());
        }
        // Remove-then-insert keeps the memory store append-only; overwrite
        // never touches previously appended bytes in place.
        let replaced = (old_len - position).min(data.len() as u64);
        self.chain.remove(position, replaced);
        self.splice_in(position, data)?;
        debug!(position, length = data.len(), "overwrite");
        self.notify(position..position + data.len() as u64);
        Ok(())
    }
}

/// A cheap point-in-time view of a [`DeltaDocument`].
///
/// Shares the document's stores; stays valid across later edits because the
/// memory store is append-only.
#[derive(Clone)]
pub struct DeltaSnapshot {
    chain: SegmentChain,
    memory: Rc<RefCell<PagedData>>,
    cache: Option<Rc<RefCell<PageWindow>>>,
}

impl fmt::Debug for DeltaSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeltaSnapshot")
            .field("len", &self.chain.len())
            .field("segments", &self.chain.segments())
            .finish_non_exhaustive()
    }
}

impl DeltaSnapshot {
    /// A snapshot of a snapshot is the snapshot itself.
    #[must_use]
    pub fn snapshot(&self) -> DeltaSnapshot {
        self.clone()
    }

    /// The segment list frozen at snapshot time.
    #[must_use]
    pub fn segments(&self) -> &[DataSegment] {
        self.chain.segments()
    }
}

impl BinaryData for DeltaSnapshot {
    fn len(&self) -> u64 {
        self.chain.len()
    }

    fn byte(&self, position: u64) -> Result<u8> {
        chain_byte(&self.chain, &self.memory, self.cache.as_ref(), position)
    }

    fn copy_to_slice(&self, position: u64, target: &mut [u8]) -> Result<()> {
        chain_copy(
            &self.chain,
            &self.memory,
            self.cache.as_ref(),
            position,
            target,
        )
    }
}

/// Keeps `ByteArrayData` exports of documents one call away.
impl DeltaDocument {
    /// Writes the whole document to `out` without materializing it.
    ///
    /// # Errors
    ///
    /// See [`BinaryData::save_to_stream`].
    pub fn save(&self, out: &mut dyn Write) -> Result<()> {
        self.save_to_stream(out)
    }

    /// Materializes the whole document as an independent byte array.
    ///
    /// # Errors
    ///
    /// See [`BinaryData::copy_all`].
    pub fn to_bytes(&self) -> Result<ByteArrayData> {
        self.copy_all()
    }
}
