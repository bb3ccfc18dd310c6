//! Core data types shared by the codec, cursors and evaluators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Document identifier within a segment.
///
/// Doc ids start at 0 and are only meaningful inside their own segment.
pub type DocId = u32;

/// Identifier of an index segment.
pub type SegmentId = u32;

/// Name of the field holding the document's own textual identifier.
pub const ID_FIELD: &str = "_id";

/// The address of a document across segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DocAddress {
    /// The segment holding the document.
    pub segment: SegmentId,
    /// The document's id within the segment.
    pub doc: DocId,
}

impl DocAddress {
    pub fn new(segment: SegmentId, doc: DocId) -> Self {
        Self { segment, doc }
    }
}

impl fmt::Display for DocAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segment, self.doc)
    }
}

/// Whether members of the set pass or fail the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    /// A document passes iff its value is in the set.
    Include,
    /// A document passes iff its value is not in the set.
    Exclude,
}

impl OperationMode {
    /// Returns the parameter spelling of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationMode::Include => "include",
            OperationMode::Exclude => "exclude",
        }
    }

    /// Maps a membership result to a verdict.
    #[inline]
    pub fn verdict(&self, present: bool) -> bool {
        match self {
            OperationMode::Include => present,
            OperationMode::Exclude => !present,
        }
    }

    /// Verdict for a document that has no value at all.
    ///
    /// A missing value is never a member of the set, so it passes an
    /// exclude filter and fails an include filter.
    #[inline]
    pub fn absent_verdict(&self) -> bool {
        self.verdict(false)
    }
}

impl FromStr for OperationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "include" => Ok(OperationMode::Include),
            "exclude" => Ok(OperationMode::Exclude),
            other => Err(Error::InvalidOperation(other.to_string())),
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects the per-document field supplying the value to test.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSelector {
    /// The document's textual identifier, parsed as an integer.
    Identifier,
    /// A numeric field read from the segment's doc values.
    Stored(String),
}

impl FieldSelector {
    /// Builds a selector from a field name. `_id` selects the identifier.
    pub fn from_name(name: &str) -> Self {
        if name == ID_FIELD {
            FieldSelector::Identifier
        } else {
            FieldSelector::Stored(name.to_string())
        }
    }

    /// Returns the field name this selector reads.
    pub fn name(&self) -> &str {
        match self {
            FieldSelector::Identifier => ID_FIELD,
            FieldSelector::Stored(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::include("include", OperationMode::Include)]
    #[case::exclude("exclude", OperationMode::Exclude)]
    fn should_parse_operation_mode(#[case] input: &str, #[case] expected: OperationMode) {
        // when
        let mode: OperationMode = input.parse().unwrap();

        // then
        assert_eq!(mode, expected);
        assert_eq!(mode.as_str(), input);
    }

    #[rstest]
    #[case::empty("")]
    #[case::uppercase("INCLUDE")]
    #[case::padded(" include")]
    #[case::unknown("intersect")]
    fn should_reject_unknown_operation_mode(#[case] input: &str) {
        // when
        let result = input.parse::<OperationMode>();

        // then
        assert_eq!(result, Err(Error::InvalidOperation(input.to_string())));
    }

    #[test]
    fn should_produce_complementary_verdicts() {
        for present in [true, false] {
            assert_eq!(
                OperationMode::Include.verdict(present),
                !OperationMode::Exclude.verdict(present)
            );
        }
    }

    #[test]
    fn should_pass_absent_values_only_when_excluding() {
        assert!(!OperationMode::Include.absent_verdict());
        assert!(OperationMode::Exclude.absent_verdict());
    }

    #[test]
    fn should_select_identifier_for_id_field() {
        // when
        let id = FieldSelector::from_name("_id");
        let stored = FieldSelector::from_name("user_id");

        // then
        assert_eq!(id, FieldSelector::Identifier);
        assert_eq!(id.name(), "_id");
        assert_eq!(stored, FieldSelector::Stored("user_id".to_string()));
        assert_eq!(stored.name(), "user_id");
    }

    #[test]
    fn should_format_doc_address() {
        assert_eq!(DocAddress::new(3, 17).to_string(), "3:17");
    }
}
