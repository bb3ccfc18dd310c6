//! Construction of fast filters from query parameters.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::codec::{DecodedSet, decode_terms};
use crate::error::{Error, Result};
use crate::evaluator::FilterEvaluator;
use crate::model::{FieldSelector, OperationMode};
use crate::segment::SegmentReader;

/// Query parameters as received from the host.
pub type Params = HashMap<String, Value>;

/// Name of the parameter selecting the field to test.
pub const FIELD_PARAM: &str = "field";
/// Name of the parameter holding the base64 encoded set.
pub const TERMS_PARAM: &str = "terms";
/// Name of the parameter holding `include` or `exclude`.
pub const OPERATION_PARAM: &str = "operation";

/// A compiled fast filter.
///
/// The set is decoded once, here, and shared read-only by every evaluator
/// the factory hands out. A factory can be used from many threads at once.
#[derive(Debug, Clone)]
pub struct FilterFactory {
    field: FieldSelector,
    mode: OperationMode,
    set: Arc<DecodedSet>,
}

impl FilterFactory {
    /// Compiles a filter from `field`, `terms` and `operation` parameters.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingParameter`] for the first of `field`, `terms`,
    ///   `operation` that is absent or `null`.
    /// - [`Error::InvalidParameter`] when one of them is an array or object.
    /// - [`Error::InvalidOperation`] when `operation` is not `include` or
    ///   `exclude`.
    /// - [`Error::InvalidEncodingText`] or [`Error::MalformedEncoding`] when
    ///   `terms` does not decode.
    pub fn new(params: &Params) -> Result<Self> {
        let field = required_text(params, FIELD_PARAM)?;
        let terms = required_text(params, TERMS_PARAM)?;
        let operation = required_text(params, OPERATION_PARAM)?;

        let mode: OperationMode = operation.parse()?;
        let set = decode_terms(&terms)?;

        tracing::debug!(
            "Compiled fast filter on [{}] with mode {} over {} values",
            field,
            mode,
            set.len()
        );
        Ok(Self::from_parts(FieldSelector::from_name(&field), mode, set))
    }

    /// Builds a filter from an already decoded set.
    pub fn from_parts(field: FieldSelector, mode: OperationMode, set: DecodedSet) -> Self {
        Self {
            field,
            mode,
            set: Arc::new(set),
        }
    }

    /// The same document always gets the same verdict, so hosts may cache
    /// results.
    pub fn is_result_deterministic(&self) -> bool {
        true
    }

    /// Creates an evaluator bound to `segment`.
    pub fn new_evaluator<'a>(&self, segment: &'a dyn SegmentReader) -> FilterEvaluator<'a> {
        let mut evaluator =
            FilterEvaluator::new(Arc::clone(&self.set), self.mode, self.field.clone());
        evaluator.bind(segment);
        evaluator
    }

    pub fn field(&self) -> &FieldSelector {
        &self.field
    }

    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    pub fn set(&self) -> &DecodedSet {
        &self.set
    }
}

/// Reads a required parameter in its text form.
fn required_text(params: &Params, name: &str) -> Result<String> {
    match params.get(name) {
        None | Some(Value::Null) => Err(Error::MissingParameter(name.to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Array(_)) | Some(Value::Object(_)) => Err(Error::InvalidParameter {
            name: name.to_string(),
            reason: "expected a string".to_string(),
        }),
    }
}
