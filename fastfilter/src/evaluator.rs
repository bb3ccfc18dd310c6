//! Per-segment evaluation of a fast filter.

use std::sync::Arc;

use crate::codec::DecodedSet;
use crate::cursor::{CursorBinding, ValueCursor};
use crate::error::{Error, Result};
use crate::model::{DocId, FieldSelector, OperationMode};
use crate::segment::SegmentReader;

/// Lifecycle of a [`FilterEvaluator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorState {
    /// Not yet bound to a segment. Evaluation fails.
    Unbound,
    /// Bound to a segment without values for the field. Every document gets
    /// the same verdict.
    BoundNoField,
    /// Bound to a segment with a cursor over the field's values.
    BoundWithField,
}

enum Binding<'a> {
    Unbound,
    NoField,
    Field(ValueCursor<'a>),
}

/// Decides, document by document, whether a segment's documents pass.
///
/// An evaluator belongs to one thread and one segment at a time. Documents
/// must be evaluated in non-decreasing doc id order; asking for the same doc
/// twice returns the first outcome again without reading any more values.
pub struct FilterEvaluator<'a> {
    set: Arc<DecodedSet>,
    mode: OperationMode,
    field: FieldSelector,
    binding: Binding<'a>,
    last: Option<(DocId, Result<bool>)>,
}

impl<'a> FilterEvaluator<'a> {
    /// Creates an unbound evaluator.
    pub fn new(set: Arc<DecodedSet>, mode: OperationMode, field: FieldSelector) -> Self {
        Self {
            set,
            mode,
            field,
            binding: Binding::Unbound,
            last: None,
        }
    }

    /// Binds the evaluator to `segment`, replacing any previous binding.
    pub fn bind(&mut self, segment: &'a dyn SegmentReader) {
        self.binding = match CursorBinding::bind(segment, &self.field) {
            CursorBinding::Bound(cursor) => Binding::Field(cursor),
            CursorBinding::NoValuesInSegment => {
                tracing::debug!(
                    "Field [{}] has no values in segment {}, every document gets verdict {}",
                    self.field.name(),
                    segment.id(),
                    self.mode.absent_verdict()
                );
                Binding::NoField
            }
        };
        self.last = None;
    }

    pub fn state(&self) -> EvaluatorState {
        match self.binding {
            Binding::Unbound => EvaluatorState::Unbound,
            Binding::NoField => EvaluatorState::BoundNoField,
            Binding::Field(_) => EvaluatorState::BoundWithField,
        }
    }

    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    /// Returns whether `doc` passes the filter.
    ///
    /// # Errors
    ///
    /// - [`Error::Unbound`] before [`bind`](Self::bind) was called.
    /// - [`Error::DocOrder`] when `doc` is smaller than the last evaluated doc.
    /// - [`Error::ValueParse`] or [`Error::ValueOverflow`] when the document's
    ///   value cannot be read as an unsigned 32-bit integer.
    pub fn evaluate(&mut self, doc: DocId) -> Result<bool> {
        if let Some((last_doc, outcome)) = &self.last {
            if doc == *last_doc {
                return outcome.clone();
            }
            if doc < *last_doc {
                return Err(Error::DocOrder {
                    current: *last_doc,
                    requested: doc,
                });
            }
        }

        let outcome = match &mut self.binding {
            Binding::Unbound => return Err(Error::Unbound),
            Binding::NoField => Ok(self.mode.absent_verdict()),
            Binding::Field(cursor) => match cursor.first_value(doc) {
                Ok(Some(value)) => Ok(self.mode.verdict(self.set.contains(value))),
                Ok(None) => Ok(self.mode.absent_verdict()),
                Err(e) => Err(e),
            },
        };

        tracing::trace!("doc {} -> {:?}", doc, outcome);
        self.last = Some((doc, outcome.clone()));
        outcome
    }
}
