//! Segment descriptors and the ordered segment chain.
//!
//! A segment describes where a contiguous run of logical document bytes
//! really lives — an offset range in the original source, or an offset range
//! in the document's in-memory paged store — without copying the bytes.
//! The chain keeps the segments in document order next to a cumulative
//! start-offset index, so locating the segment for a position is a binary
//! search rather than a scan.

/// A contiguous run of document bytes, tagged with the store holding them.
///
/// Segments are value descriptors: splitting or trimming them adjusts
/// bookkeeping ranges only, the underlying bytes never move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSegment {
    /// Bytes still living in the original data source.
    Source {
        /// Start offset in the source file.
        offset: u64,
        /// Run length in bytes.
        length: u64,
    },
    /// Bytes living in the document's append-only memory store.
    Memory {
        /// Start offset in the memory store.
        offset: u64,
        /// Run length in bytes.
        length: u64,
    },
}

impl DataSegment {
    /// Run length in bytes.
    #[must_use]
    pub fn length(&self) -> u64 {
        match self {
            DataSegment::Source { length, .. } | DataSegment::Memory { length, .. } => *length,
        }
    }

    /// Start offset within the backing store.
    #[must_use]
    pub fn store_offset(&self) -> u64 {
        match self {
            DataSegment::Source { offset, .. } | DataSegment::Memory { offset, .. } => *offset,
        }
    }

    /// The first `length` bytes of this segment.
    fn head(self, length: u64) -> Self {
        debug_assert!(length <= self.length());
        self.sub(0, length)
    }

    /// The bytes after the first `skip`.
    fn tail(self, skip: u64) -> Self {
        debug_assert!(skip <= self.length());
        self.sub(skip, self.length() - skip)
    }

    fn sub(self, skip: u64, length: u64) -> Self {
        match self {
            DataSegment::Source { offset, .. } => DataSegment::Source {
                offset: offset + skip,
                length,
            },
            DataSegment::Memory { offset, .. } => DataSegment::Memory {
                offset: offset + skip,
                length,
            },
        }
    }

    /// Whether `other` continues this segment in the same store.
    fn continues_into(&self, other: &DataSegment) -> bool {
        match (self, other) {
            (
                DataSegment::Source { offset, length },
                DataSegment::Source { offset: next, .. },
            )
            | (
                DataSegment::Memory { offset, length },
                DataSegment::Memory { offset: next, .. },
            ) => offset + length == *next,
            _ => false,
        }
    }

    fn extend(&mut self, by: u64) {
        match self {
            DataSegment::Source { length, .. } | DataSegment::Memory { length, .. } => {
                *length += by;
            }
        }
    }
}

/// The ordered segment list plus its cumulative start-offset index.
///
/// Invariants: no zero-length segments; the starts index always matches the
/// segment list; concatenating the segments in order reconstructs the whole
/// document; adjacent segments contiguous in the same store are coalesced.
#[derive(Debug, Clone, Default)]
pub(crate) struct SegmentChain {
    segments: Vec<DataSegment>,
    /// `starts[i]` is the document position of `segments[i]`.
    starts: Vec<u64>,
    len: u64,
}

impl SegmentChain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_segment(segment: DataSegment) -> Self {
        let mut chain = Self::new();
        chain.insert(0, segment);
        chain
    }

    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    pub(crate) fn segments(&self) -> &[DataSegment] {
        &self.segments
    }

    /// Finds the segment containing `position`, returning its index and the
    /// offset of `position` within it. `None` when `position >= len`.
    pub(crate) fn locate(&self, position: u64) -> Option<(usize, u64)> {
        if position >= self.len {
            return None;
        }
        let index = self.starts.partition_point(|start| *start <= position) - 1;
        Some((index, position - self.starts[index]))
    }

    /// Inserts `segment` so its bytes start at document position `position`.
    /// Splits the containing segment when `position` falls strictly inside
    /// one; a boundary insert keeps neighbors untouched.
    ///
    /// Caller guarantees `position <= len`.
    pub(crate) fn insert(&mut self, position: u64, segment: DataSegment) {
        if segment.length() == 0 {
            return;
        }
        debug_assert!(position <= self.len);
        let index = match self.locate(position) {
            None => {
                // At the very end.
                self.segments.push(segment);
                self.segments.len() - 1
            }
            Some((index, 0)) => {
                self.segments.insert(index, segment);
                index
            }
            Some((index, offset)) => {
                let existing = self.segments[index];
                self.segments[index] = existing.head(offset);
                self.segments
                    .splice(index + 1..index + 1, [segment, existing.tail(offset)]);
                index + 1
            }
        };
        self.len += segment.length();
        self.rebuild_starts(index.saturating_sub(1));
        self.coalesce_around(index);
    }

    /// Removes `length` document bytes starting at `position`. Fully covered
    /// segments leave the list; partially covered ones get their range
    /// trimmed.
    ///
    /// Caller guarantees `position + length <= len`.
    pub(crate) fn remove(&mut self, position: u64, length: u64) {
        if length == 0 {
            return;
        }
        debug_assert!(position + length <= self.len);
        let (mut index, offset) = self.locate(position).expect("validated by caller");
        if offset > 0 {
            // Detach the head so removal starts on a segment boundary.
            let existing = self.segments[index];
            self.segments[index] = existing.head(offset);
            self.segments.insert(index + 1, existing.tail(offset));
            index += 1;
        }
        let mut remaining = length;
        let mut covered = 0usize;
        while remaining > 0 {
            let seg_len = self.segments[index + covered].length();
            if seg_len > remaining {
                break;
            }
            remaining -= seg_len;
            covered += 1;
        }
        self.segments.drain(index..index + covered);
        if remaining > 0 {
            self.segments[index] = self.segments[index].tail(remaining);
        }
        self.len -= length;
        self.rebuild_starts(index.saturating_sub(1));
        self.coalesce_around(index);
    }

    /// Recomputes the starts index from entry `from` on.
    fn rebuild_starts(&mut self, from: usize) {
        let from = from.min(self.starts.len());
        self.starts.truncate(from);
        let mut next = match from.checked_sub(1) {
            Some(prev) => self.starts[prev] + self.segments[prev].length(),
            None => 0,
        };
        for segment in &self.segments[from..] {
            self.starts.push(next);
            next += segment.length();
        }
        debug_assert_eq!(self.starts.len(), self.segments.len());
        debug_assert_eq!(next, self.len);
    }

    /// Merges the boundary pairs around `index` when contiguous in the same
    /// store.
    fn coalesce_around(&mut self, index: usize) {
        // Right boundary first so `index` stays valid for the left one.
        self.try_merge(index);
        if index > 0 {
            self.try_merge(index - 1);
        }
    }

    fn try_merge(&mut self, left: usize) {
        if left + 1 >= self.segments.len() {
            return;
        }
        let right = self.segments[left + 1];
        if self.segments[left].continues_into(&right) {
            self.segments[left].extend(right.length());
            self.segments.remove(left + 1);
            self.starts.remove(left + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(offset: u64, length: u64) -> DataSegment {
        DataSegment::Source { offset, length }
    }

    fn memory(offset: u64, length: u64) -> DataSegment {
        DataSegment::Memory { offset, length }
    }

    /// Concatenating segment lengths must reconstruct the chain length, and
    /// locate must agree with a linear scan.
    fn check_invariants(chain: &SegmentChain) {
        let total: u64 = chain.segments().iter().map(DataSegment::length).sum();
        assert_eq!(total, chain.len());
        assert!(chain.segments().iter().all(|s| s.length() > 0));
        let mut start = 0;
        for (i, segment) in chain.segments().iter().enumerate() {
            assert_eq!(chain.locate(start), Some((i, 0)));
            start += segment.length();
        }
        assert_eq!(chain.locate(chain.len()), None);
    }

    #[test]
    fn insert_into_middle_splits() {
        let mut chain = SegmentChain::from_segment(source(0, 10));
        chain.insert(4, memory(0, 3));
        assert_eq!(
            chain.segments(),
            &[source(0, 4), memory(0, 3), source(4, 6)]
        );
        assert_eq!(chain.len(), 13);
        check_invariants(&chain);
    }

    #[test]
    fn insert_at_boundary_does_not_split() {
        let mut chain = SegmentChain::from_segment(source(0, 10));
        chain.insert(4, memory(0, 2));
        chain.insert(4, memory(10, 2));
        assert_eq!(
            chain.segments(),
            &[source(0, 4), memory(10, 2), memory(0, 2), source(4, 6)]
        );
        check_invariants(&chain);
    }

    #[test]
    fn insert_at_ends() {
        let mut chain = SegmentChain::from_segment(source(0, 4));
        chain.insert(0, memory(0, 2));
        chain.insert(chain.len(), memory(2, 2));
        assert_eq!(
            chain.segments(),
            &[memory(0, 2), source(0, 4), memory(2, 2)]
        );
        check_invariants(&chain);
    }

    #[test]
    fn contiguous_memory_appends_coalesce() {
        let mut chain = SegmentChain::new();
        chain.insert(0, memory(0, 4));
        chain.insert(4, memory(4, 4));
        assert_eq!(chain.segments(), &[memory(0, 8)]);
        check_invariants(&chain);
    }

    #[test]
    fn remove_spanning_multiple_segments() {
        let mut chain = SegmentChain::from_segment(source(0, 10));
        chain.insert(4, memory(0, 3));
        // Drop the last source byte before the memory run, all of it, and the
        // first two source bytes after it.
        chain.remove(3, 6);
        assert_eq!(chain.segments(), &[source(0, 3), source(6, 4)]);
        assert_eq!(chain.len(), 7);
        check_invariants(&chain);
    }

    #[test]
    fn remove_inside_one_segment_trims() {
        let mut chain = SegmentChain::from_segment(source(0, 10));
        chain.remove(3, 5);
        assert_eq!(chain.segments(), &[source(0, 3), source(8, 2)]);
        check_invariants(&chain);
    }

    #[test]
    fn remove_rejoining_halves_coalesces() {
        let mut chain = SegmentChain::from_segment(source(0, 10));
        chain.insert(5, memory(0, 3));
        chain.remove(5, 3);
        assert_eq!(chain.segments(), &[source(0, 10)]);
        check_invariants(&chain);
    }

    #[test]
    fn remove_everything_empties_the_chain() {
        let mut chain = SegmentChain::from_segment(source(0, 6));
        chain.remove(0, 6);
        assert!(chain.segments().is_empty());
        assert_eq!(chain.len(), 0);
        check_invariants(&chain);
    }

    #[test]
    fn locate_uses_cumulative_starts() {
        let mut chain = SegmentChain::from_segment(source(0, 10));
        chain.insert(4, memory(0, 3));
        assert_eq!(chain.locate(0), Some((0, 0)));
        assert_eq!(chain.locate(3), Some((0, 3)));
        assert_eq!(chain.locate(4), Some((1, 0)));
        assert_eq!(chain.locate(6), Some((1, 2)));
        assert_eq!(chain.locate(7), Some((2, 0)));
        assert_eq!(chain.locate(12), Some((2, 5)));
        assert_eq!(chain.locate(13), None);
    }
}
