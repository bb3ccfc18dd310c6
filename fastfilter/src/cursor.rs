//! Cursors over the per-document values tested against the set.
//!
//! The variant is chosen once, when the cursor is bound to a segment:
//!
//! - [`IdentifierCursor`] parses the document's textual `_id`; it is random
//!   access and has no position.
//! - [`StoredFieldCursor`] walks the segment's numeric doc values forward.
//!
//! Both hand out values as `u32`. A value that does not fit fails the
//! document instead of being truncated.

use std::num::IntErrorKind;

use crate::error::{Error, Result};
use crate::model::{DocId, FieldSelector};
use crate::segment::{NumericDocValues, SegmentReader};

/// Outcome of binding a cursor to a segment.
pub enum CursorBinding<'a> {
    /// The field has no value store in this segment.
    NoValuesInSegment,
    /// A cursor over the field's values.
    Bound(ValueCursor<'a>),
}

impl<'a> CursorBinding<'a> {
    /// Binds a cursor for `selector` over `segment`.
    pub fn bind(segment: &'a dyn SegmentReader, selector: &FieldSelector) -> Self {
        match selector {
            FieldSelector::Identifier => {
                CursorBinding::Bound(ValueCursor::Identifier(IdentifierCursor::new(segment)))
            }
            FieldSelector::Stored(field) => match segment.numeric_doc_values(field) {
                Some(values) => {
                    CursorBinding::Bound(ValueCursor::Stored(StoredFieldCursor::new(values)))
                }
                None => CursorBinding::NoValuesInSegment,
            },
        }
    }
}

/// The stream of values a filter tests within one segment.
pub enum ValueCursor<'a> {
    Identifier(IdentifierCursor<'a>),
    Stored(StoredFieldCursor<'a>),
}

impl ValueCursor<'_> {
    /// Reads the first value of `doc`, or `None` if it has no value.
    ///
    /// For stored fields this advances the cursor, so `doc` must be greater
    /// than the doc of the previous read.
    pub fn first_value(&mut self, doc: DocId) -> Result<Option<u32>> {
        match self {
            ValueCursor::Identifier(cursor) => cursor.value(doc),
            ValueCursor::Stored(cursor) => {
                cursor.advance(doc)?;
                cursor.next_value()
            }
        }
    }
}

/// Reads values by parsing the document's textual identifier.
pub struct IdentifierCursor<'a> {
    segment: &'a dyn SegmentReader,
}

impl<'a> IdentifierCursor<'a> {
    pub fn new(segment: &'a dyn SegmentReader) -> Self {
        Self { segment }
    }

    /// Parses the identifier of `doc` as a base-10 integer.
    pub fn value(&self, doc: DocId) -> Result<Option<u32>> {
        match self.segment.identifier(doc) {
            Some(text) => parse_identifier(doc, text).map(Some),
            None => Ok(None),
        }
    }
}

/// Reads values from a segment's numeric doc values, strictly forward.
pub struct StoredFieldCursor<'a> {
    values: Box<dyn NumericDocValues + 'a>,
    current: Option<DocId>,
    remaining: usize,
}

impl<'a> StoredFieldCursor<'a> {
    pub fn new(values: Box<dyn NumericDocValues + 'a>) -> Self {
        Self {
            values,
            current: None,
            remaining: 0,
        }
    }

    /// Returns the doc the cursor is positioned on.
    pub fn doc(&self) -> Option<DocId> {
        self.current
    }

    /// Positions the cursor on `doc`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocOrder`] when `doc` is not greater than the doc of
    /// the previous call. The cursor is left where it was.
    pub fn advance(&mut self, doc: DocId) -> Result<()> {
        if let Some(current) = self.current {
            if doc <= current {
                return Err(Error::DocOrder {
                    current,
                    requested: doc,
                });
            }
        }
        self.remaining = self.values.advance(doc);
        self.current = Some(doc);
        Ok(())
    }

    /// Consumes the next value of the current document.
    ///
    /// Returns `None` when the document has no values left or the cursor has
    /// not been advanced yet.
    pub fn next_value(&mut self) -> Result<Option<u32>> {
        let Some(doc) = self.current else {
            return Ok(None);
        };
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        match self.values.next_value() {
            Some(raw) => to_set_value(doc, raw).map(Some),
            None => {
                self.remaining = 0;
                Ok(None)
            }
        }
    }
}

/// Narrows a doc value to the `u32` domain of the set.
fn to_set_value(doc: DocId, raw: i64) -> Result<u32> {
    u32::try_from(raw).map_err(|_| Error::ValueOverflow {
        doc,
        value: raw.to_string(),
    })
}

/// Parses an identifier such as `"42"` or `"+42"`.
fn parse_identifier(doc: DocId, text: &str) -> Result<u32> {
    match text.parse::<i64>() {
        Ok(value) => to_set_value(doc, value),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => Err(Error::ValueOverflow {
                doc,
                value: text.to_string(),
            }),
            _ => Err(Error::ValueParse {
                doc,
                value: text.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{MemoryDocument, MemorySegment};
    use rstest::rstest;

    fn segment_with_ids(ids: &[&str]) -> MemorySegment {
        MemorySegment::from_documents(
            0,
            ids.iter().map(|id| MemoryDocument::with_id(*id)).collect(),
        )
    }

    fn stored_cursor<'a>(segment: &'a MemorySegment, field: &str) -> ValueCursor<'a> {
        match CursorBinding::bind(segment, &FieldSelector::Stored(field.to_string())) {
            CursorBinding::Bound(cursor) => cursor,
            CursorBinding::NoValuesInSegment => panic!("expected values for {}", field),
        }
    }

    #[rstest]
    #[case::plain("42", 42)]
    #[case::zero("0", 0)]
    #[case::plus_sign("+7", 7)]
    #[case::max("4294967295", u32::MAX)]
    fn should_parse_numeric_identifier(#[case] id: &str, #[case] expected: u32) {
        // given
        let segment = segment_with_ids(&[id]);
        let cursor = IdentifierCursor::new(&segment);

        // when
        let value = cursor.value(0).unwrap();

        // then
        assert_eq!(value, Some(expected));
    }

    #[rstest]
    #[case::letters("abc")]
    #[case::empty("")]
    #[case::whitespace(" 42")]
    #[case::decimal("4.2")]
    fn should_fail_to_parse_non_numeric_identifier(#[case] id: &str) {
        // given
        let segment = segment_with_ids(&[id]);
        let cursor = IdentifierCursor::new(&segment);

        // when
        let result = cursor.value(0);

        // then
        assert_eq!(
            result,
            Err(Error::ValueParse {
                doc: 0,
                value: id.to_string()
            })
        );
    }

    #[rstest]
    #[case::negative("-1")]
    #[case::above_u32("4294967296")]
    #[case::above_i64("99999999999999999999")]
    fn should_reject_identifier_outside_u32(#[case] id: &str) {
        // given
        let segment = segment_with_ids(&[id]);
        let cursor = IdentifierCursor::new(&segment);

        // when
        let result = cursor.value(0);

        // then
        assert!(matches!(result, Err(Error::ValueOverflow { doc: 0, .. })));
    }

    #[test]
    fn should_report_missing_identifier_as_absent() {
        // given
        let segment = MemorySegment::from_documents(0, vec![MemoryDocument::default()]);
        let cursor = IdentifierCursor::new(&segment);

        // when/then
        assert_eq!(cursor.value(0), Ok(None));
    }

    #[test]
    fn should_signal_no_values_in_segment_at_bind() {
        // given
        let segment = segment_with_ids(&["1", "2"]);

        // when
        let binding = CursorBinding::bind(&segment, &FieldSelector::Stored("price".to_string()));

        // then
        assert!(matches!(binding, CursorBinding::NoValuesInSegment));
    }

    #[test]
    fn should_bind_identifier_cursor_without_doc_values() {
        // given
        let segment = segment_with_ids(&["1"]);

        // when
        let binding = CursorBinding::bind(&segment, &FieldSelector::Identifier);

        // then
        assert!(matches!(
            binding,
            CursorBinding::Bound(ValueCursor::Identifier(_))
        ));
    }

    #[test]
    fn should_read_first_stored_value_per_document() {
        // given
        let segment = MemorySegment::from_documents(
            0,
            vec![
                MemoryDocument::with_id("a").value("price", 30).value("price", 10),
                MemoryDocument::with_id("b"),
                MemoryDocument::with_id("c").value("price", 20),
            ],
        );
        let mut cursor = stored_cursor(&segment, "price");

        // when
        let values: Vec<Option<u32>> = (0..3).map(|doc| cursor.first_value(doc).unwrap()).collect();

        // then
        assert_eq!(values, vec![Some(10), None, Some(20)]);
    }

    #[test]
    fn should_consume_values_one_at_a_time() {
        // given
        let segment = MemorySegment::from_documents(
            0,
            vec![MemoryDocument::with_id("a").value("n", 2).value("n", 1)],
        );
        let mut cursor = StoredFieldCursor::new(segment.numeric_doc_values("n").unwrap());

        // when
        cursor.advance(0).unwrap();

        // then
        assert_eq!(cursor.doc(), Some(0));
        assert_eq!(cursor.next_value(), Ok(Some(1)));
        assert_eq!(cursor.next_value(), Ok(Some(2)));
        assert_eq!(cursor.next_value(), Ok(None));
    }

    #[test]
    fn should_return_nothing_before_first_advance() {
        // given
        let segment = MemorySegment::from_documents(
            0,
            vec![MemoryDocument::with_id("a").value("n", 2)],
        );
        let mut cursor = StoredFieldCursor::new(segment.numeric_doc_values("n").unwrap());

        // when/then
        assert_eq!(cursor.doc(), None);
        assert_eq!(cursor.next_value(), Ok(None));
    }

    #[rstest]
    #[case::same_doc(3, 3)]
    #[case::earlier_doc(3, 1)]
    fn should_reject_non_increasing_advance(#[case] first: DocId, #[case] second: DocId) {
        // given
        let segment = MemorySegment::from_documents(
            0,
            (0..5)
                .map(|i| MemoryDocument::with_id(i.to_string()).value("n", i))
                .collect(),
        );
        let mut cursor = StoredFieldCursor::new(segment.numeric_doc_values("n").unwrap());
        cursor.advance(first).unwrap();

        // when
        let result = cursor.advance(second);

        // then
        assert_eq!(
            result,
            Err(Error::DocOrder {
                current: first,
                requested: second
            })
        );
        assert_eq!(cursor.doc(), Some(first));
    }

    #[rstest]
    #[case::negative(-5)]
    #[case::above_u32(u32::MAX as i64 + 1)]
    #[case::i64_min(i64::MIN)]
    fn should_reject_stored_value_outside_u32(#[case] raw: i64) {
        // given
        let segment = MemorySegment::from_documents(
            0,
            vec![MemoryDocument::with_id("a").value("n", raw)],
        );
        let mut cursor = stored_cursor(&segment, "n");

        // when
        let result = cursor.first_value(0);

        // then
        assert_eq!(
            result,
            Err(Error::ValueOverflow {
                doc: 0,
                value: raw.to_string()
            })
        );
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        fn dense_segment(docs: u32) -> MemorySegment {
            MemorySegment::from_documents(
                0,
                (0..docs)
                    .map(|i| MemoryDocument::with_id(i.to_string()).value("n", i as i64))
                    .collect(),
            )
        }

        proptest! {
            #[test]
            fn should_reject_advance_iff_sequence_stops_increasing(
                docs in prop::collection::vec(0u32..64, 1..32),
            ) {
                let segment = dense_segment(64);
                let mut cursor = StoredFieldCursor::new(segment.numeric_doc_values("n").unwrap());

                let mut previous: Option<DocId> = None;
                for doc in docs {
                    let result = cursor.advance(doc);
                    match previous {
                        Some(current) if doc <= current => {
                            prop_assert_eq!(result, Err(Error::DocOrder { current, requested: doc }));
                            prop_assert_eq!(cursor.doc(), Some(current));
                        }
                        _ => {
                            prop_assert_eq!(result, Ok(()));
                            prop_assert_eq!(cursor.next_value(), Ok(Some(doc)));
                            previous = Some(doc);
                        }
                    }
                }
            }

            #[test]
            fn should_never_reject_strictly_increasing_sequence(
                docs in prop::collection::btree_set(0u32..512, 0..64),
            ) {
                let segment = dense_segment(512);
                let mut cursor = ValueCursor::Stored(
                    StoredFieldCursor::new(segment.numeric_doc_values("n").unwrap()),
                );

                for doc in docs {
                    prop_assert_eq!(cursor.first_value(doc), Ok(Some(doc)));
                }
            }
        }
    }
}
