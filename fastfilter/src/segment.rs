//! Host-side view of an index segment.
//!
//! The filter never owns index data. A host exposes each segment through
//! [`SegmentReader`], which hands out textual identifiers and per-field
//! [`NumericDocValues`] iterators. [`MemorySegment`] is a simple in-memory
//! implementation used by the command line tool and tests.

use std::collections::HashMap;

use serde::Deserialize;

use crate::model::{DocId, SegmentId};

/// Forward-only numeric doc values of one field in one segment.
///
/// Values of a document are exposed in ascending order.
pub trait NumericDocValues: Send {
    /// Positions the iterator on `doc` and returns how many values it has.
    ///
    /// `doc` must be strictly greater than the doc passed to the previous
    /// call. Implementations may return garbage when this is violated;
    /// callers are expected to go through
    /// [`StoredFieldCursor`](crate::cursor::StoredFieldCursor), which checks it.
    fn advance(&mut self, doc: DocId) -> usize;

    /// Returns the next value of the current document, or `None` once all
    /// of the values reported by `advance` have been consumed.
    fn next_value(&mut self) -> Option<i64>;
}

/// Read access to a segment of the index.
pub trait SegmentReader: Sync {
    /// Returns the segment's identifier.
    fn id(&self) -> SegmentId;

    /// Returns one more than the largest doc id in this segment.
    fn max_doc(&self) -> DocId;

    /// Returns the textual identifier of `doc`, if it has one.
    fn identifier(&self, doc: DocId) -> Option<&str>;

    /// Opens doc values for `field`.
    ///
    /// Returns `None` when no document of this segment has a value for the
    /// field, so that there is no value store to read at all.
    fn numeric_doc_values(&self, field: &str) -> Option<Box<dyn NumericDocValues + '_>>;
}

/// A document held by a [`MemorySegment`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MemoryDocument {
    /// Textual identifier of the document.
    #[serde(default)]
    pub id: Option<String>,
    /// Numeric values per field. A field may hold several values.
    #[serde(default)]
    pub values: HashMap<String, Vec<i64>>,
}

impl MemoryDocument {
    /// Creates a document with the given identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            values: HashMap::new(),
        }
    }

    /// Adds a value for `field`.
    pub fn value(mut self, field: impl Into<String>, value: i64) -> Self {
        self.values.entry(field.into()).or_default().push(value);
        self
    }
}

/// In-memory segment whose doc ids are the positions of its documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySegment {
    id: SegmentId,
    documents: Vec<MemoryDocument>,
}

impl MemorySegment {
    /// Creates an empty segment.
    pub fn new(id: SegmentId) -> Self {
        Self {
            id,
            documents: Vec::new(),
        }
    }

    /// Creates a segment from documents, sorting each document's values.
    pub fn from_documents(id: SegmentId, documents: Vec<MemoryDocument>) -> Self {
        let mut segment = Self::new(id);
        for document in documents {
            segment.push(document);
        }
        segment
    }

    /// Appends a document and returns its doc id.
    pub fn push(&mut self, mut document: MemoryDocument) -> DocId {
        for values in document.values.values_mut() {
            values.sort_unstable();
        }
        self.documents.push(document);
        (self.documents.len() - 1) as DocId
    }

    /// Returns the documents in doc id order.
    pub fn documents(&self) -> &[MemoryDocument] {
        &self.documents
    }
}

impl SegmentReader for MemorySegment {
    fn id(&self) -> SegmentId {
        self.id
    }

    fn max_doc(&self) -> DocId {
        self.documents.len() as DocId
    }

    fn identifier(&self, doc: DocId) -> Option<&str> {
        self.documents
            .get(doc as usize)
            .and_then(|d| d.id.as_deref())
    }

    fn numeric_doc_values(&self, field: &str) -> Option<Box<dyn NumericDocValues + '_>> {
        let has_field = self
            .documents
            .iter()
            .any(|d| d.values.get(field).is_some_and(|v| !v.is_empty()));
        if !has_field {
            return None;
        }
        Some(Box::new(MemoryDocValues {
            documents: &self.documents,
            field: field.to_string(),
            current: &[],
        }))
    }
}

struct MemoryDocValues<'a> {
    documents: &'a [MemoryDocument],
    field: String,
    current: &'a [i64],
}

impl NumericDocValues for MemoryDocValues<'_> {
    fn advance(&mut self, doc: DocId) -> usize {
        self.current = self
            .documents
            .get(doc as usize)
            .and_then(|d| d.values.get(&self.field))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        self.current.len()
    }

    fn next_value(&mut self) -> Option<i64> {
        let (first, rest) = self.current.split_first()?;
        self.current = rest;
        Some(*first)
    }
}
