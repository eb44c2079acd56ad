//! Thin position-translating adapter over a shared [`DeltaDocument`].
//!
//! Multiple consumers (a renderer, streams, decoders) clone the handle and
//! see one document without duplicating any split/merge logic; the window
//! only maps window-relative positions onto the document.

use std::{cell::RefCell, rc::Rc};

use crate::{
    data::{BinaryData, ByteArrayData, EditableBinaryData},
    document::DeltaDocument,
    error::{DataError, Result},
};

/// A view of a [`DeltaDocument`] starting at a fixed document position.
///
/// The window covers `[start, document_len)`; its length tracks the document
/// as it is edited. Positions passed to the window are window-relative.
#[derive(Debug, Clone)]
pub struct DocumentWindow {
    document: Rc<RefCell<DeltaDocument>>,
    start: u64,
}

impl DocumentWindow {
    /// Creates a window over `document` starting at document position
    /// `start`.
    #[must_use]
    pub fn new(document: Rc<RefCell<DeltaDocument>>, start: u64) -> Self {
        Self { document, start }
    }

    /// The shared document.
    #[must_use]
    pub fn document(&self) -> &Rc<RefCell<DeltaDocument>> {
        &self.document
    }

    /// Document position of the window's first byte.
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    fn translate(&self, position: u64) -> Result<u64> {
        self.start
            .checked_add(position)
            .ok_or_else(|| DataError::overflow(position))
    }
}

impl BinaryData for DocumentWindow {
    fn len(&self) -> u64 {
        self.document.borrow().len().saturating_sub(self.start)
    }

    fn byte(&self, position: u64) -> Result<u8> {
        self.document.borrow().byte(self.translate(position)?)
    }

    fn copy_to_slice(&self, position: u64, target: &mut [u8]) -> Result<()> {
        self.document
            .borrow()
            .copy_to_slice(self.translate(position)?, target)
    }

    fn copy_range(&self, start: u64, length: u64) -> Result<ByteArrayData> {
        self.document
            .borrow()
            .copy_range(self.translate(start)?, length)
    }
}

impl EditableBinaryData for DocumentWindow {
    fn insert(&mut self, position: u64, data: &[u8]) -> Result<()> {
        let at = self.translate(position)?;
        self.document.borrow_mut().insert(at, data)
    }

    fn remove(&mut self, position: u64, length: u64) -> Result<()> {
        let at = self.translate(position)?;
        self.document.borrow_mut().remove(at, length)
    }

    fn set_len(&mut self, new_len: u64) -> Result<()> {
        let total = self.translate(new_len)?;
        self.document.borrow_mut().set_len(total)
    }

    fn overwrite(&mut self, position: u64, data: &[u8]) -> Result<()> {
        let at = self.translate(position)?;
        self.document.borrow_mut().overwrite(at, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(content: &[u8]) -> Rc<RefCell<DeltaDocument>> {
        let mut doc = DeltaDocument::new();
        doc.insert(0, content).unwrap();
        Rc::new(RefCell::new(doc))
    }

    #[test]
    fn reads_translate_positions() {
        let doc = shared(&[10, 11, 12, 13, 14]);
        let window = DocumentWindow::new(doc, 2);
        assert_eq!(window.len(), 3);
        assert_eq!(window.byte(0).unwrap(), 12);
        assert_eq!(window.byte(2).unwrap(), 14);
        assert!(window.byte(3).is_err());
    }

    #[test]
    fn edits_flow_into_the_document() {
        let doc = shared(&[1, 2, 3, 4]);
        let mut window = DocumentWindow::new(Rc::clone(&doc), 1);
        window.insert(1, &[9]).unwrap();
        window.remove(0, 1).unwrap();
        assert_eq!(
            doc.borrow().copy_all().unwrap().into_vec(),
            vec![1, 9, 3, 4]
        );
    }

    #[test]
    fn two_windows_share_one_document() {
        let doc = shared(&[1, 2, 3, 4]);
        let mut left = DocumentWindow::new(Rc::clone(&doc), 0);
        let right = DocumentWindow::new(Rc::clone(&doc), 2);
        left.insert(0, &[0]).unwrap();
        assert_eq!(right.byte(0).unwrap(), 2);
        assert_eq!(right.len(), 3);
    }

    #[test]
    fn window_length_tracks_the_document() {
        let doc = shared(&[1, 2, 3]);
        let window = DocumentWindow::new(Rc::clone(&doc), 2);
        assert_eq!(window.len(), 1);
        doc.borrow_mut().set_len(2).unwrap();
        assert_eq!(window.len(), 0);
        assert!(window.byte(0).is_err());
    }
}
