//! Model-based round-trip: random edit sequences applied to a delta document
//! and to a plain in-memory vector, byte-compared after every step.

use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};

use crate::{BinaryData, DeltaDocument, EditableBinaryData, PagedData};

#[derive(Debug, Clone)]
enum Edit {
    Insert { at: usize, bytes: Vec<u8> },
    Remove { at: usize, len: usize },
    Overwrite { at: usize, bytes: Vec<u8> },
    SetLen { len: usize },
}

fn small_bytes(g: &mut Gen) -> Vec<u8> {
    let mut bytes = Vec::<u8>::arbitrary(g);
    bytes.truncate(32);
    bytes
}

impl Arbitrary for Edit {
    fn arbitrary(g: &mut Gen) -> Self {
        match u8::arbitrary(g) % 4 {
            0 => Edit::Insert {
                at: usize::arbitrary(g),
                bytes: small_bytes(g),
            },
            1 => Edit::Remove {
                at: usize::arbitrary(g),
                len: usize::arbitrary(g) % 24,
            },
            2 => Edit::Overwrite {
                at: usize::arbitrary(g),
                bytes: small_bytes(g),
            },
            _ => Edit::SetLen {
                len: usize::arbitrary(g) % 200,
            },
        }
    }
}

/// Applies `edit` to the reference model, returning the clamped form actually
/// performed so the system under test runs the identical operation.
fn apply_model(model: &mut Vec<u8>, edit: &Edit) -> Edit {
    match edit {
        Edit::Insert { at, bytes } => {
            let at = at % (model.len() + 1);
            model.splice(at..at, bytes.iter().copied());
            Edit::Insert {
                at,
                bytes: bytes.clone(),
            }
        }
        Edit::Remove { at, len } => {
            let at = at % (model.len() + 1);
            let len = (*len).min(model.len() - at);
            model.drain(at..at + len);
            Edit::Remove { at, len }
        }
        Edit::Overwrite { at, bytes } => {
            let at = at % (model.len() + 1);
            let end = at + bytes.len();
            if end > model.len() {
                model.resize(end, 0);
            }
            model[at..end].copy_from_slice(bytes);
            Edit::Overwrite {
                at,
                bytes: bytes.clone(),
            }
        }
        Edit::SetLen { len } => {
            model.resize(*len, 0);
            Edit::SetLen { len: *len }
        }
    }
}

fn apply_edit(target: &mut impl EditableBinaryData, edit: &Edit) {
    match edit {
        Edit::Insert { at, bytes } => target.insert(*at as u64, bytes).unwrap(),
        Edit::Remove { at, len } => target.remove(*at as u64, *len as u64).unwrap(),
        Edit::Overwrite { at, bytes } => target.overwrite(*at as u64, bytes).unwrap(),
        Edit::SetLen { len } => target.set_len(*len as u64).unwrap(),
    }
}

fn matches_model(target: &impl BinaryData, model: &[u8]) -> bool {
    if target.len() != model.len() as u64 {
        return false;
    }
    target.copy_all().unwrap().as_slice() == model
}

#[test]
fn document_round_trips_against_vector_model() {
    fn prop(edits: Vec<Edit>) -> TestResult {
        let mut doc = DeltaDocument::with_page_size(16);
        let mut model = Vec::new();
        for edit in &edits {
            let clamped = apply_model(&mut model, edit);
            apply_edit(&mut doc, &clamped);
            if !matches_model(&doc, &model) {
                return TestResult::error(format!("diverged after {clamped:?}"));
            }
            // Bounds follow the size after every step.
            if !model.is_empty() && doc.byte(model.len() as u64 - 1).is_err() {
                return TestResult::failed();
            }
            if doc.byte(model.len() as u64).is_ok() {
                return TestResult::failed();
            }
        }
        TestResult::passed()
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(prop as fn(Vec<Edit>) -> TestResult);
}

#[test]
fn paged_data_round_trips_against_vector_model() {
    fn prop(edits: Vec<Edit>) -> TestResult {
        let mut paged = PagedData::with_page_size(4);
        let mut model = Vec::new();
        for edit in &edits {
            let clamped = apply_model(&mut model, edit);
            apply_edit(&mut paged, &clamped);
            if !matches_model(&paged, &model) {
                return TestResult::error(format!("diverged after {clamped:?}"));
            }
        }
        TestResult::passed()
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(prop as fn(Vec<Edit>) -> TestResult);
}

#[test]
fn snapshots_are_unaffected_by_later_edits() {
    fn prop(before: Vec<Edit>, after: Vec<Edit>) -> TestResult {
        let mut doc = DeltaDocument::with_page_size(16);
        let mut model = Vec::new();
        for edit in &before {
            let clamped = apply_model(&mut model, edit);
            apply_edit(&mut doc, &clamped);
        }
        let snapshot = doc.snapshot();
        let frozen = model.clone();
        for edit in &after {
            let clamped = apply_model(&mut model, edit);
            apply_edit(&mut doc, &clamped);
        }
        if !matches_model(&snapshot, &frozen) {
            return TestResult::failed();
        }
        if !matches_model(&doc, &model) {
            return TestResult::failed();
        }
        TestResult::passed()
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Vec<Edit>, Vec<Edit>) -> TestResult);
}

#[test]
fn inserts_preserve_surrounding_bytes() {
    fn prop(seed: Vec<u8>, at: usize, bytes: Vec<u8>) -> TestResult {
        let mut doc = DeltaDocument::with_page_size(16);
        doc.insert(0, &seed).unwrap();
        let before = doc.copy_all().unwrap().into_vec();
        let at = at % (seed.len() + 1);
        doc.insert(at as u64, &bytes).unwrap();
        let after = doc.copy_all().unwrap().into_vec();
        if after.len() != before.len() + bytes.len() {
            return TestResult::failed();
        }
        if after[..at] != before[..at] || after[at + bytes.len()..] != before[at..] {
            return TestResult::failed();
        }
        if after[at..at + bytes.len()] != bytes {
            return TestResult::failed();
        }
        TestResult::passed()
    }
    QuickCheck::new()
        .tests(300)
        .quickcheck(prop as fn(Vec<u8>, usize, Vec<u8>) -> TestResult);
}
