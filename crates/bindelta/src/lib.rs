//! An edit buffer for arbitrarily large binary files.
//!
//! `bindelta` lets an interactive binary editor perform localized inserts,
//! overwrites, and deletions without rewriting the whole file or loading it
//! wholly into memory. A document is an ordered list of segments stitching
//! original-file bytes and newly written bytes into one logical sequence
//! (informally, a piece table over bytes), so edit cost is proportional to
//! the edit, not to the file size. File reads go through a small two-slot
//! page cache.
//!
//! # Examples
//!
//! In-memory editing:
//!
//! ```rust
//! use bindelta::{BinaryData, DeltaDocument, EditableBinaryData};
//!
//! let mut doc = DeltaDocument::new();
//! doc.insert(0, b"hello world")?;
//! doc.overwrite(6, b"delta")?;
//! assert_eq!(doc.copy_all()?.as_slice(), b"hello delta");
//! # Ok::<(), bindelta::DataError>(())
//! ```
//!
//! Documents over a file keep the file untouched until the caller saves;
//! snapshots share the underlying stores and stay valid across later edits:
//!
//! ```rust
//! use bindelta::{BinaryData, DeltaDocument, EditableBinaryData};
//!
//! let mut doc = DeltaDocument::new();
//! doc.insert(0, &[1, 2, 3, 4])?;
//! let snapshot = doc.snapshot();
//! doc.remove(1, 2)?;
//! assert_eq!(snapshot.copy_all()?.as_slice(), &[1, 2, 3, 4]);
//! assert_eq!(doc.copy_all()?.as_slice(), &[1, 4]);
//! # Ok::<(), bindelta::DataError>(())
//! ```

mod cache;
mod data;
mod doc_window;
mod document;
mod error;
mod paged;
mod segment;
mod source;
mod stream;

#[cfg(test)]
mod tests;

pub use cache::PageWindow;
pub use data::{BinaryData, ByteArrayData, EditableBinaryData};
pub use doc_window::DocumentWindow;
pub use document::{ChangeListener, DeltaDocument, DeltaSnapshot};
pub use error::{DataError, Result};
pub use paged::{DEFAULT_PAGE_SIZE, PagedData};
pub use segment::DataSegment;
pub use source::{FileDataSource, FileMode};
pub use stream::{DataReader, DataWriter};
