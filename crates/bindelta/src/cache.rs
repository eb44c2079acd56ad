//! Two-slot page cache in front of a [`FileDataSource`].
//!
//! An editor redraw reads overwhelmingly sequentially, so two cached pages
//! with round-robin eviction capture almost all hits at a fraction of the
//! bookkeeping of a general LRU. This is a deliberate minimal design, not a
//! general cache.
//!
//! A page-load IO failure fails the read; stale bytes are never served.

use std::rc::Rc;

use tracing::trace;

use crate::{
    error::{DataError, Result},
    paged::DEFAULT_PAGE_SIZE,
    source::FileDataSource,
};

#[derive(Debug)]
struct PageSlot {
    /// File-page index held by this slot, or `None` when unset.
    index: Option<u64>,
    buf: Vec<u8>,
    /// Valid bytes in `buf`; shorter than the page size only at file end.
    filled: usize,
}

impl PageSlot {
    fn unset(page_size: usize) -> Self {
        Self {
            index: None,
            buf: vec![0; page_size],
            filled: 0,
        }
    }

    fn clear(&mut self) {
        self.index = None;
        self.filled = 0;
    }
}

/// Turns byte queries against a file into page-aligned reads through a
/// two-slot cache.
#[derive(Debug)]
pub struct PageWindow {
    source: Rc<FileDataSource>,
    page_size: usize,
    slots: [PageSlot; 2],
    /// Round-robin cursor selecting the slot to evict on a miss.
    next_evict: usize,
    seen_generation: u64,
    loads: u64,
}

impl PageWindow {
    /// Creates a window over `source` with [`DEFAULT_PAGE_SIZE`] pages.
    #[must_use]
    pub fn new(source: Rc<FileDataSource>) -> Self {
        Self::with_page_size(source, DEFAULT_PAGE_SIZE)
    }

    /// Creates a window over `source` with the given page size.
    ///
    /// # Panics
    ///
    /// Panics when `page_size` is zero.
    #[must_use]
    pub fn with_page_size(source: Rc<FileDataSource>, page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be non-zero");
        let seen_generation = source.generation();
        Self {
            source,
            page_size,
            slots: [PageSlot::unset(page_size), PageSlot::unset(page_size)],
            next_evict: 0,
            seen_generation,
            loads: 0,
        }
    }

    /// The configured page size in bytes.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The underlying source.
    #[must_use]
    pub fn source(&self) -> &Rc<FileDataSource> {
        &self.source
    }

    /// Number of page loads performed so far. Exposed so tests can pin the
    /// eviction mechanics, not just read results.
    #[must_use]
    pub fn loads(&self) -> u64 {
        self.loads
    }

    /// Marks both slots unset.
    pub fn clear_cache(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }

    /// Reads the byte at `position` in the file.
    ///
    /// # Errors
    ///
    /// [`DataError::OutOfBounds`] when `position` is at or past the end of
    /// the file, [`DataError::ResourceClosed`] after the source is closed,
    /// [`DataError::Io`] when a page load fails.
    pub fn byte(&mut self, position: u64) -> Result<u8> {
        self.refresh_generation();
        let len = self.source.len()?;
        if position >= len {
            return Err(DataError::out_of_bounds(position, len));
        }
        let page = position / self.page_size as u64;
        let offset = (position % self.page_size as u64) as usize;
        let slot = self.slot_for(page)?;
        let slot = &self.slots[slot];
        if offset >= slot.filled {
            return Err(DataError::out_of_bounds(position, len));
        }
        Ok(slot.buf[offset])
    }

    /// Copies `target.len()` bytes starting at `position` into `target`,
    /// page by page through the cache.
    ///
    /// # Errors
    ///
    /// See [`PageWindow::byte`].
    pub fn copy_to_slice(&mut self, position: u64, target: &mut [u8]) -> Result<()> {
        self.refresh_generation();
        let len = self.source.len()?;
        let end = position
            .checked_add(target.len() as u64)
            .ok_or_else(|| DataError::overflow(target.len() as u64))?;
        if end > len {
            return Err(DataError::out_of_bounds(end, len));
        }
        let mut copied = 0usize;
        while copied < target.len() {
            let at = position + copied as u64;
            let page = at / self.page_size as u64;
            let offset = (at % self.page_size as u64) as usize;
            let slot = self.slot_for(page)?;
            let slot = &self.slots[slot];
            if offset >= slot.filled {
                return Err(DataError::out_of_bounds(at, len));
            }
            let chunk = (slot.filled - offset).min(target.len() - copied);
            target[copied..copied + chunk].copy_from_slice(&slot.buf[offset..offset + chunk]);
            copied += chunk;
        }
        Ok(())
    }

    fn refresh_generation(&mut self) {
        let generation = self.source.generation();
        if generation != self.seen_generation {
            trace!(generation, "source mutated, dropping cached pages");
            self.clear_cache();
            self.seen_generation = generation;
        }
    }

    fn slot_for(&mut self, page: u64) -> Result<usize> {
        if let Some(hit) = self.slots.iter().position(|s| s.index == Some(page)) {
            return Ok(hit);
        }
        let evicted = self.next_evict;
        self.load_slot(evicted, page)?;
        self.next_evict = (self.next_evict + 1) % self.slots.len();
        Ok(evicted)
    }

    fn load_slot(&mut self, slot: usize, page: u64) -> Result<()> {
        let start = page
            .checked_mul(self.page_size as u64)
            .ok_or_else(|| DataError::overflow(page))?;
        let entry = &mut self.slots[slot];
        // Stays unset if the load fails part-way.
        entry.clear();
        let filled = self.source.read_at(start, &mut entry.buf)?;
        entry.filled = filled;
        entry.index = Some(page);
        self.loads += 1;
        trace!(page, filled, slot, "loaded file page");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // File-backed behavior is covered by the integration tests in
    // `tests/page_cache.rs`; the slot bookkeeping below needs no file.
    use super::PageSlot;

    #[test]
    fn unset_slot_holds_no_page() {
        let mut slot = PageSlot::unset(16);
        assert!(slot.index.is_none());
        slot.index = Some(3);
        slot.filled = 16;
        slot.clear();
        assert!(slot.index.is_none());
        assert_eq!(slot.filled, 0);
    }
}
