//! Growable byte store subdivided into fixed-size pages.
//!
//! Growth never reallocates existing pages, so appending to a large store
//! costs only the new pages. Arbitrary-position insert and remove physically
//! shift only the bytes strictly after the edit point, one page-sized chunk
//! per copy step; those are the only O(n) operations here.

use crate::{
    data::{BinaryData, EditableBinaryData, to_usize},
    error::{DataError, Result},
};

/// Page size used when none is given: 1 KiB.
pub const DEFAULT_PAGE_SIZE: usize = 1024;

/// A growable byte store backed by an ordered list of fixed-size pages.
///
/// Every page except the last holds exactly `page_size` bytes; the last page
/// may be partial. `page_count == ceil(len / page_size)`.
///
/// # Examples
///
/// ```rust
/// use bindelta::{BinaryData, EditableBinaryData, PagedData};
///
/// let mut data = PagedData::with_page_size(4);
/// data.set_len(10)?;
/// assert_eq!(data.page_count(), 3);
/// data.set_byte(9, 0xFF)?;
/// assert_eq!(data.byte(9)?, 0xFF);
/// # Ok::<(), bindelta::DataError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PagedData {
    pages: Vec<Vec<u8>>,
    page_size: usize,
    len: u64,
}

impl PagedData {
    /// Creates an empty store with [`DEFAULT_PAGE_SIZE`] pages.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates an empty store with the given page size.
    ///
    /// # Panics
    ///
    /// Panics when `page_size` is zero.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be non-zero");
        Self {
            pages: Vec::new(),
            page_size,
            len: 0,
        }
    }

    /// The configured page size in bytes.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of allocated pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The bytes of page `index`, if allocated.
    #[must_use]
    pub fn page(&self, index: usize) -> Option<&[u8]> {
        self.pages.get(index).map(Vec::as_slice)
    }

    /// Appends `data` at the end, returning the start offset of the appended
    /// run.
    ///
    /// # Errors
    ///
    /// [`DataError::DataOverflow`] when the grown store cannot be addressed.
    pub fn append(&mut self, data: &[u8]) -> Result<u64> {
        let start = self.len;
        let new_len = start
            .checked_add(data.len() as u64)
            .ok_or_else(|| DataError::overflow(data.len() as u64))?;
        self.set_len(new_len)?;
        self.write_from(start, data)?;
        Ok(start)
    }

    /// Writes `data` over existing bytes starting at `position`.
    ///
    /// # Errors
    ///
    /// [`DataError::OutOfBounds`] when the range reaches past the end.
    pub fn write_from(&mut self, position: u64, data: &[u8]) -> Result<()> {
        let end = self.check_range(position, data.len() as u64)?;
        let mut written = 0usize;
        while written < data.len() {
            let (page, offset) = self.locate(position + written as u64);
            let room = self.pages[page].len() - offset;
            let chunk = room.min(data.len() - written);
            self.pages[page][offset..offset + chunk]
                .copy_from_slice(&data[written..written + chunk]);
            written += chunk;
        }
        debug_assert_eq!(position + written as u64, end);
        Ok(())
    }

    fn locate(&self, position: u64) -> (usize, usize) {
        let page_size = self.page_size as u64;
        ((position / page_size) as usize, (position % page_size) as usize)
    }

    /// Validates `[position, position + length)`, returning the exclusive end.
    fn check_range(&self, position: u64, length: u64) -> Result<u64> {
        let end = position
            .checked_add(length)
            .ok_or_else(|| DataError::overflow(length))?;
        if end > self.len {
            return Err(DataError::out_of_bounds(end, self.len));
        }
        Ok(end)
    }

    /// Shifts `[from, from + count)` to start at `to`, `to > from`, moving
    /// one page-sized chunk at a time from the tail.
    fn shift_right(&mut self, from: u64, to: u64, count: u64) -> Result<()> {
        let mut tmp = vec![0u8; self.page_size];
        let mut remaining = count;
        while remaining > 0 {
            let chunk = remaining.min(self.page_size as u64);
            let src = from + remaining - chunk;
            let dst = to + remaining - chunk;
            let chunk_len = to_usize(chunk)?;
            self.read_into(src, &mut tmp[..chunk_len])?;
            self.write_from(dst, &tmp[..chunk_len])?;
            remaining -= chunk;
        }
        Ok(())
    }

    /// Shifts `[from, from + count)` to start at `to`, `to < from`, moving
    /// one page-sized chunk at a time from the front.
    fn shift_left(&mut self, from: u64, to: u64, count: u64) -> Result<()> {
        let mut tmp = vec![0u8; self.page_size];
        let mut moved = 0u64;
        while moved < count {
            let chunk = (count - moved).min(self.page_size as u64);
            let chunk_len = to_usize(chunk)?;
            self.read_into(from + moved, &mut tmp[..chunk_len])?;
            self.write_from(to + moved, &tmp[..chunk_len])?;
            moved += chunk;
        }
        Ok(())
    }

    fn read_into(&self, position: u64, target: &mut [u8]) -> Result<()> {
        self.check_range(position, target.len() as u64)?;
        let mut read = 0usize;
        while read < target.len() {
            let (page, offset) = self.locate(position + read as u64);
            let page_bytes = &self.pages[page];
            let chunk = (page_bytes.len() - offset).min(target.len() - read);
            target[read..read + chunk].copy_from_slice(&page_bytes[offset..offset + chunk]);
            read += chunk;
        }
        Ok(())
    }
}

impl Default for PagedData {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryData for PagedData {
    fn len(&self) -> u64 {
        self.len
    }

    fn byte(&self, position: u64) -> Result<u8> {
        if position >= self.len {
            return Err(DataError::out_of_bounds(position, self.len));
        }
        let (page, offset) = self.locate(position);
        Ok(self.pages[page][offset])
    }

    fn copy_to_slice(&self, position: u64, target: &mut [u8]) -> Result<()> {
        self.read_into(position, target)
    }
}

impl EditableBinaryData for PagedData {
    fn insert(&mut self, position: u64, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        if position > self.len {
            return Err(DataError::out_of_bounds(position, self.len));
        }
        let old_len = self.len;
        let grow = data.len() as u64;
        let new_len = old_len
            .checked_add(grow)
            .ok_or_else(|| DataError::overflow(grow))?;
        self.set_len(new_len)?;
        self.shift_right(position, position + grow, old_len - position)?;
        self.write_from(position, data)
    }

    fn remove(&mut self, position: u64, length: u64) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        let end = self.check_range(position, length)?;
        self.shift_left(end, position, self.len - end)?;
        self.set_len(self.len - length)
    }

    fn set_len(&mut self, new_len: u64) -> Result<()> {
        if new_len == self.len {
            return Ok(());
        }
        let page_size = self.page_size as u64;
        let new_count = to_usize(new_len.div_ceil(page_size))?;
        if new_len < self.len {
            self.pages.truncate(new_count);
            if let Some(last) = self.pages.last_mut() {
                let keep = to_usize(new_len - (new_count as u64 - 1) * page_size)?;
                last.truncate(keep);
            }
        } else {
            let old_count = self.pages.len();
            if old_count > 0 && old_count < new_count {
                // The old last page becomes an interior page.
                self.pages[old_count - 1].resize(self.page_size, 0);
            }
            while self.pages.len() < new_count {
                let covered = self.pages.len() as u64 * page_size;
                let size = to_usize((new_len - covered).min(page_size))?;
                self.pages.push(vec![0; size]);
            }
            if old_count == new_count && new_count > 0 {
                let tail = to_usize(new_len - (new_count as u64 - 1) * page_size)?;
                self.pages[new_count - 1].resize(tail, 0);
            }
        }
        self.len = new_len;
        Ok(())
    }

    fn overwrite(&mut self, position: u64, data: &[u8]) -> Result<()> {
        if position > self.len {
            return Err(DataError::out_of_bounds(position, self.len));
        }
        let end = position
            .checked_add(data.len() as u64)
            .ok_or_else(|| DataError::overflow(data.len() as u64))?;
        if end > self.len {
            self.set_len(end)?;
        }
        self.write_from(position, data)
    }

    fn set_byte(&mut self, position: u64, value: u8) -> Result<()> {
        self.overwrite(position, &[value])
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn filled(page_size: usize, bytes: &[u8]) -> PagedData {
        let mut data = PagedData::with_page_size(page_size);
        data.append(bytes).unwrap();
        data
    }

    fn contents(data: &PagedData) -> Vec<u8> {
        data.copy_all().unwrap().into_vec()
    }

    #[test]
    fn grow_allocates_zeroed_pages() {
        let mut data = PagedData::with_page_size(4);
        data.set_len(10).unwrap();
        assert_eq!(data.page_count(), 3);
        assert_eq!(data.page(0).unwrap().len(), 4);
        assert_eq!(data.page(2).unwrap().len(), 2);
        assert_eq!(contents(&data), vec![0u8; 10]);
    }

    #[test]
    fn shrink_discards_trailing_pages() {
        let mut data = filled(4, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        data.set_len(5).unwrap();
        assert_eq!(data.page_count(), 2);
        assert_eq!(contents(&data), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn grow_within_last_page() {
        let mut data = filled(8, &[1, 2, 3]);
        data.set_len(6).unwrap();
        assert_eq!(data.page_count(), 1);
        assert_eq!(contents(&data), vec![1, 2, 3, 0, 0, 0]);
    }

    #[test]
    fn append_returns_start_offset() {
        let mut data = PagedData::with_page_size(4);
        assert_eq!(data.append(&[1, 2, 3]).unwrap(), 0);
        assert_eq!(data.append(&[4, 5, 6]).unwrap(), 3);
        assert_eq!(contents(&data), vec![1, 2, 3, 4, 5, 6]);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(4)]
    #[case(1024)]
    fn insert_shifts_tail_across_pages(#[case] page_size: usize) {
        let mut data = filled(page_size, &[0, 1, 2, 3, 4, 5, 6, 7]);
        data.insert(3, &[0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(
            contents(&data),
            vec![0, 1, 2, 0xAA, 0xBB, 0xCC, 3, 4, 5, 6, 7]
        );
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(4)]
    #[case(1024)]
    fn remove_shifts_tail_across_pages(#[case] page_size: usize) {
        let mut data = filled(page_size, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        data.remove(3, 5).unwrap();
        assert_eq!(contents(&data), vec![0, 1, 2, 8, 9]);
    }

    #[test]
    fn insert_larger_than_page() {
        let mut data = filled(4, &[1, 2, 3, 4]);
        let run: Vec<u8> = (10..30).collect();
        data.insert(2, &run).unwrap();
        let mut expected = vec![1, 2];
        expected.extend_from_slice(&run);
        expected.extend_from_slice(&[3, 4]);
        assert_eq!(contents(&data), expected);
    }

    #[test]
    fn insert_at_end_appends() {
        let mut data = filled(4, &[1, 2]);
        data.insert(2, &[3, 4]).unwrap();
        assert_eq!(contents(&data), vec![1, 2, 3, 4]);
    }

    #[test]
    fn out_of_bounds_edits_fail() {
        let mut data = filled(4, &[1, 2, 3]);
        assert!(data.insert(4, &[0]).is_err());
        assert!(data.remove(2, 2).is_err());
        assert!(data.byte(3).is_err());
    }

    #[test]
    fn zero_length_edits_are_no_ops() {
        let mut data = filled(4, &[1, 2, 3]);
        data.insert(1, &[]).unwrap();
        data.remove(1, 0).unwrap();
        assert_eq!(contents(&data), vec![1, 2, 3]);
        assert_eq!(data.page_count(), 1);
    }
}
